//! Link configuration.

use crate::contextware::{self, SharedContextware};
use crate::error::ContextError;
use crate::operation::Operation;
use crate::schema_input::SchemaInput;
use qlbridge_runtime::{Context, ExecutorConfig, MockOptions, ResolverMap};
use std::fmt;

/// How responses that carry field errors are delivered.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ErrorPolicy {
    /// Deliver them on the error channel as [`crate::LinkError::GraphQL`].
    #[default]
    None,
    /// Deliver them as the value, errors and partial data included.
    /// Requests the engine rejects before execution (syntax, validation,
    /// variables) are delivered the same way, as a response without data.
    All,
}

/// Options for [`crate::create_bridge_link`].
#[derive(Clone, Default)]
pub struct BridgeOptions {
    /// The schema to execute against. Required.
    pub schema: Option<SchemaInput>,
    /// Resolvers bound to a source or document schema. Ignored for an
    /// executable schema.
    pub resolvers: ResolverMap,
    /// Mock fields that have no explicit resolver.
    pub mock: bool,
    /// Mock generation settings, used when `mock` is set.
    pub mock_options: MockOptions,
    /// Base context merged into every operation's context.
    pub context: Context,
    /// Context transforms, applied in order.
    pub contextware: Vec<SharedContextware>,
    pub error_policy: ErrorPolicy,
    pub executor: ExecutorConfig,
}

impl fmt::Debug for BridgeOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BridgeOptions")
            .field("schema", &self.schema.as_ref().map(SchemaInput::kind))
            .field("resolvers", &self.resolvers)
            .field("mock", &self.mock)
            .field("mock_options", &self.mock_options)
            .field("context", &self.context)
            .field("contextware", &self.contextware.len())
            .field("error_policy", &self.error_policy)
            .field("executor", &self.executor)
            .finish()
    }
}

impl BridgeOptions {
    /// Creates options for a schema.
    pub fn new(schema: impl Into<SchemaInput>) -> Self {
        Self {
            schema: Some(schema.into()),
            ..Default::default()
        }
    }

    /// Sets the schema.
    #[must_use]
    pub fn schema(mut self, schema: impl Into<SchemaInput>) -> Self {
        self.schema = Some(schema.into());
        self
    }

    /// Sets the resolvers.
    #[must_use]
    pub fn resolvers(mut self, resolvers: ResolverMap) -> Self {
        self.resolvers = resolvers;
        self
    }

    /// Enables or disables mocking.
    #[must_use]
    pub fn mock(mut self, mock: bool) -> Self {
        self.mock = mock;
        self
    }

    /// Enables mocking with custom settings.
    #[must_use]
    pub fn mock_with(mut self, options: MockOptions) -> Self {
        self.mock = true;
        self.mock_options = options;
        self
    }

    /// Sets the base context.
    #[must_use]
    pub fn context(mut self, context: Context) -> Self {
        self.context = context;
        self
    }

    /// Appends a contextware.
    #[must_use]
    pub fn contextware(mut self, contextware: SharedContextware) -> Self {
        self.contextware.push(contextware);
        self
    }

    /// Appends a contextware function.
    #[must_use]
    pub fn contextware_fn<F>(self, f: F) -> Self
    where
        F: Fn(&Context, &Operation) -> Option<Context> + Send + Sync + 'static,
    {
        self.contextware(contextware::from_fn(f))
    }

    /// Appends a fallible contextware function.
    #[must_use]
    pub fn try_contextware_fn<F>(self, f: F) -> Self
    where
        F: Fn(&Context, &Operation) -> Result<Option<Context>, ContextError>
            + Send
            + Sync
            + 'static,
    {
        self.contextware(contextware::try_from_fn(f))
    }

    /// Sets the error policy.
    #[must_use]
    pub fn error_policy(mut self, policy: ErrorPolicy) -> Self {
        self.error_policy = policy;
        self
    }

    /// Sets the executor configuration.
    #[must_use]
    pub fn executor(mut self, config: ExecutorConfig) -> Self {
        self.executor = config;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let options = BridgeOptions::default();
        assert!(options.schema.is_none());
        assert!(options.resolvers.is_empty());
        assert!(!options.mock);
        assert!(options.mock_options.preserve_resolvers);
        assert!(options.context.is_empty());
        assert!(options.contextware.is_empty());
        assert_eq!(options.error_policy, ErrorPolicy::None);
        assert!(options.executor.parallel);
    }

    #[test]
    fn test_builder() {
        let options = BridgeOptions::new("type Query { a: Int }")
            .mock_with(MockOptions::new().preserve_resolvers(false))
            .context(Context::new().with("gq", "is cool"))
            .contextware_fn(|_, _| None)
            .try_contextware_fn(|_, _| Ok(None))
            .error_policy(ErrorPolicy::All)
            .executor(ExecutorConfig::new().with_max_depth(5));
        assert!(matches!(options.schema, Some(SchemaInput::Source(_))));
        assert!(options.mock);
        assert!(!options.mock_options.preserve_resolvers);
        assert_eq!(options.contextware.len(), 2);
        assert_eq!(options.executor.max_depth, Some(5));
        assert!(format!("{options:?}").contains("schema: Some(\"source\")"));
    }
}
