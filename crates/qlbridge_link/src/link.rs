//! The bridge link.
//!
//! A bridge link executes operations against an in-process schema instead
//! of sending them over the network. The schema is resolved, and optionally
//! mocked, once when the link is built; every operation then gets a fresh
//! context and its own [`ResultStream`].

use crate::contextware::{self, SharedContextware};
use crate::error::{ConfigError, LinkError};
use crate::observable::ResultStream;
use crate::operation::Operation;
use crate::options::{BridgeOptions, ErrorPolicy};
use crate::schema_input::SchemaInput;
use qlbridge_runtime::{
    add_mocks_to_schema, make_executable_schema, Context, ExecutableSchema, Executor, Request,
    ResolverMap, Response,
};
use qlbridge_syntax::print;
use serde_json::Value;
use std::fmt;
use std::sync::Arc;

/// A step in a transport chain.
pub trait Link: Send + Sync {
    fn request(&self, operation: Operation) -> ResultStream;
}

impl<F> Link for F
where
    F: Fn(Operation) -> ResultStream + Send + Sync,
{
    fn request(&self, operation: Operation) -> ResultStream {
        self(operation)
    }
}

/// Resolves `input` into an executable schema.
fn resolve_schema(
    input: SchemaInput,
    resolvers: ResolverMap,
) -> Result<ExecutableSchema, ConfigError> {
    tracing::debug!(kind = input.kind(), "resolving schema");
    match input {
        SchemaInput::Source(source) => from_source(&source, resolvers),
        SchemaInput::Document(document) => from_source(&print(&document), resolvers),
        SchemaInput::Executable(schema) => {
            if !resolvers.is_empty() {
                tracing::warn!("resolvers are ignored for an executable schema");
            }
            Ok(schema)
        }
        SchemaInput::Unrecognized(_) => Err(ConfigError::UnrecognizedSchema),
    }
}

fn from_source(source: &str, resolvers: ResolverMap) -> Result<ExecutableSchema, ConfigError> {
    if source.trim().is_empty() {
        return Err(ConfigError::MissingSchema);
    }
    Ok(make_executable_schema(source, resolvers)?)
}

/// Shared state of a built link.
struct Bridge {
    schema: ExecutableSchema,
    context: Context,
    contextware: Vec<SharedContextware>,
    error_policy: ErrorPolicy,
    executor: Executor,
}

impl fmt::Debug for Bridge {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Bridge")
            .field("schema", &self.schema)
            .field("context", &self.context)
            .field("contextware", &self.contextware.len())
            .field("error_policy", &self.error_policy)
            .field("executor", &self.executor)
            .finish()
    }
}

impl Bridge {
    /// The base context with the operation's `headers` and `credentials`.
    /// Both keys are always set; the operation's values win over the base.
    fn initial_context(&self, operation: &Operation) -> Context {
        let mut context = self.context.clone();
        for key in ["headers", "credentials"] {
            let value = operation
                .context
                .get(key)
                .or_else(|| self.context.get(key))
                .cloned()
                .unwrap_or(Value::Null);
            context.insert(key, value);
        }
        context
    }

    async fn execute(&self, operation: Operation) -> Result<Response, LinkError> {
        let query = print(&operation.query);
        let context = self.initial_context(&operation);
        let context = contextware::apply_all(&self.contextware, context, &operation)?;
        let name = operation.operation_name.as_deref().unwrap_or("<anonymous>");
        tracing::debug!(operation = name, "executing bridged operation");

        let request = Request {
            query,
            operation_name: operation.operation_name.clone(),
            variables: operation.variables.clone(),
            root_value: Value::Null,
            context,
        };
        let response = match self.executor.execute(&self.schema, request).await {
            Ok(response) => response,
            Err(err) if self.error_policy == ErrorPolicy::All => {
                tracing::debug!(operation = name, error = %err, "request rejected");
                Response::from(err)
            }
            Err(err) => return Err(err.into()),
        };

        match self.error_policy {
            ErrorPolicy::None if response.has_errors() => {
                tracing::debug!(
                    operation = name,
                    errors = response.error_list().len(),
                    "operation returned errors"
                );
                let Response { data, errors } = response;
                Err(LinkError::graphql(errors.unwrap_or_default(), data))
            }
            _ => Ok(response),
        }
    }
}

/// A handler that runs operations against a local schema.
#[derive(Debug, Clone)]
pub struct BridgeHandler {
    bridge: Arc<Bridge>,
}

impl BridgeHandler {
    /// Starts `operation`. Nothing runs until the stream is polled.
    #[must_use]
    pub fn request(&self, operation: Operation) -> ResultStream {
        let bridge = Arc::clone(&self.bridge);
        ResultStream::from_future(async move { bridge.execute(operation).await })
    }

    /// The schema operations run against.
    #[must_use]
    pub fn schema(&self) -> &ExecutableSchema {
        &self.bridge.schema
    }
}

impl Link for BridgeHandler {
    fn request(&self, operation: Operation) -> ResultStream {
        BridgeHandler::request(self, operation)
    }
}

/// Builds a bridge handler.
///
/// The schema is resolved here: SDL text and parsed documents are built
/// with `options.resolvers`, an executable schema is used as it is. With
/// `options.mock` the result is decorated with mock resolvers.
pub fn create_bridge_link(options: BridgeOptions) -> Result<BridgeHandler, ConfigError> {
    let BridgeOptions {
        schema,
        resolvers,
        mock,
        mock_options,
        context,
        contextware,
        error_policy,
        executor,
    } = options;

    let input = schema.ok_or(ConfigError::MissingSchema)?;
    let mut schema = resolve_schema(input, resolvers)?;
    if mock {
        add_mocks_to_schema(&mut schema, mock_options);
    }
    tracing::info!(
        types = schema.schema().types.len(),
        mock,
        contextware = contextware.len(),
        "bridge link ready"
    );

    Ok(BridgeHandler {
        bridge: Arc::new(Bridge {
            schema,
            context,
            contextware,
            error_policy,
            executor: Executor::with_config(executor),
        }),
    })
}

/// A [`Link`] that executes operations against a local schema.
#[derive(Debug, Clone)]
pub struct BridgeLink {
    requester: BridgeHandler,
}

impl BridgeLink {
    pub fn new(options: BridgeOptions) -> Result<Self, ConfigError> {
        Ok(Self {
            requester: create_bridge_link(options)?,
        })
    }

    /// Starts `operation`.
    #[must_use]
    pub fn request(&self, operation: Operation) -> ResultStream {
        self.requester.request(operation)
    }
}

impl Link for BridgeLink {
    fn request(&self, operation: Operation) -> ResultStream {
        BridgeLink::request(self, operation)
    }
}
