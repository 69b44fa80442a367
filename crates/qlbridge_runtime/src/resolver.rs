//! Resolver system.
//!
//! A resolver computes one field from its parent value, the coerced
//! arguments and the request context. Resolvers are registered per
//! `(type, field)` in a [`ResolverMap`]; fields without one fall back to
//! [`DefaultResolver`], which reads the property off the parent.

use crate::context::Context;
use crate::response::PathSegment;
use rustc_hash::FxHashMap;
use serde_json::{Map, Value};
use std::fmt::{self, Debug};
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use thiserror::Error;

/// Arguments passed to a resolver, after coercion against the field's
/// argument definitions.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ResolverArgs {
    args: Map<String, Value>,
}

impl ResolverArgs {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates resolver args from a list of (name, value) pairs.
    pub fn from_pairs(pairs: impl IntoIterator<Item = (String, Value)>) -> Self {
        Self {
            args: pairs.into_iter().collect(),
        }
    }

    #[must_use]
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.args.get(name)
    }

    /// Gets an argument as a specific type.
    pub fn get_as<T: serde::de::DeserializeOwned>(&self, name: &str) -> Option<T> {
        self.args
            .get(name)
            .and_then(|v| serde_json::from_value(v.clone()).ok())
    }

    /// Gets a required argument, returning an error if it is missing or
    /// does not deserialize into `T`.
    pub fn require<T: serde::de::DeserializeOwned>(&self, name: &str) -> Result<T, ResolverError> {
        let value = self
            .args
            .get(name)
            .ok_or_else(|| ResolverError::MissingArgument(name.to_string()))?;
        serde_json::from_value(value.clone())
            .map_err(|e| ResolverError::ArgumentParseError(name.to_string(), e.to_string()))
    }

    #[must_use]
    pub fn all(&self) -> &Map<String, Value> {
        &self.args
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.args.is_empty()
    }

    pub fn set(&mut self, name: impl Into<String>, value: Value) {
        self.args.insert(name.into(), value);
    }
}

/// Info about the field being resolved.
#[derive(Debug, Clone)]
pub struct ResolverInfo {
    /// The field name being resolved (not its alias).
    pub field_name: String,

    /// The declared return type, e.g. `[Post!]!`.
    pub return_type: String,

    /// The type the field belongs to.
    pub parent_type: String,

    /// Response path to this field.
    pub path: Vec<PathSegment>,

    /// Names of the sub-fields selected below this one.
    pub selected_fields: Vec<String>,

    /// Name of the operation being executed.
    pub operation_name: Option<String>,
}

impl ResolverInfo {
    pub fn new(field_name: impl Into<String>, parent_type: impl Into<String>) -> Self {
        Self {
            field_name: field_name.into(),
            return_type: String::new(),
            parent_type: parent_type.into(),
            path: Vec::new(),
            selected_fields: Vec::new(),
            operation_name: None,
        }
    }

    #[must_use]
    pub fn with_return_type(mut self, ty: impl Into<String>) -> Self {
        self.return_type = ty.into();
        self
    }

    #[must_use]
    pub fn with_path(mut self, path: Vec<PathSegment>) -> Self {
        self.path = path;
        self
    }

    #[must_use]
    pub fn with_selected_fields(mut self, fields: Vec<String>) -> Self {
        self.selected_fields = fields;
        self
    }

    #[must_use]
    pub fn with_operation_name(mut self, name: Option<String>) -> Self {
        self.operation_name = name;
        self
    }
}

/// Result type for resolvers.
pub type ResolverResult = Result<Value, ResolverError>;

/// Future type for async resolvers.
pub type ResolverFuture<'a> = Pin<Box<dyn Future<Output = ResolverResult> + Send + 'a>>;

/// Error from a resolver.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ResolverError {
    #[error("Field not found: {0}")]
    FieldNotFound(String),

    #[error("Missing required argument: {0}")]
    MissingArgument(String),

    #[error("Failed to parse argument '{0}': {1}")]
    ArgumentParseError(String, String),

    /// An error raised by user code; displays as the bare message.
    #[error("{0}")]
    Custom(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl ResolverError {
    /// Creates a [`ResolverError::Custom`].
    pub fn custom(message: impl Into<String>) -> Self {
        Self::Custom(message.into())
    }
}

impl From<String> for ResolverError {
    fn from(message: String) -> Self {
        Self::Custom(message)
    }
}

impl From<&str> for ResolverError {
    fn from(message: &str) -> Self {
        Self::Custom(message.to_string())
    }
}

/// Trait for field resolvers.
pub trait Resolver: Send + Sync {
    /// Resolves a field value.
    fn resolve<'a>(
        &'a self,
        parent: &'a Value,
        args: &'a ResolverArgs,
        ctx: &'a Context,
        info: &'a ResolverInfo,
    ) -> ResolverFuture<'a>;
}

/// A shared resolver.
pub type SharedResolver = Arc<dyn Resolver>;

/// A sync resolver function.
pub type SyncResolverFn =
    Arc<dyn Fn(&Value, &ResolverArgs, &Context, &ResolverInfo) -> ResolverResult + Send + Sync>;

/// A wrapper for sync resolver functions.
pub struct FnResolver {
    func: SyncResolverFn,
}

impl FnResolver {
    pub fn new<F>(f: F) -> Self
    where
        F: Fn(&Value, &ResolverArgs, &Context, &ResolverInfo) -> ResolverResult
            + Send
            + Sync
            + 'static,
    {
        Self { func: Arc::new(f) }
    }
}

impl Resolver for FnResolver {
    fn resolve<'a>(
        &'a self,
        parent: &'a Value,
        args: &'a ResolverArgs,
        ctx: &'a Context,
        info: &'a ResolverInfo,
    ) -> ResolverFuture<'a> {
        let result = (self.func)(parent, args, ctx, info);
        Box::pin(async move { result })
    }
}

/// An async resolver function type.
pub type AsyncResolverFn = Arc<
    dyn Fn(Value, ResolverArgs, Context, ResolverInfo) -> ResolverFuture<'static> + Send + Sync,
>;

/// A wrapper for async resolver functions. Inputs are cloned so the
/// returned future can be `'static`.
pub struct AsyncFnResolver {
    func: AsyncResolverFn,
}

impl AsyncFnResolver {
    pub fn new<F, Fut>(f: F) -> Self
    where
        F: Fn(Value, ResolverArgs, Context, ResolverInfo) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = ResolverResult> + Send + 'static,
    {
        Self {
            func: Arc::new(move |parent, args, ctx, info| Box::pin(f(parent, args, ctx, info))),
        }
    }
}

impl Resolver for AsyncFnResolver {
    fn resolve<'a>(
        &'a self,
        parent: &'a Value,
        args: &'a ResolverArgs,
        ctx: &'a Context,
        info: &'a ResolverInfo,
    ) -> ResolverFuture<'a> {
        (self.func)(parent.clone(), args.clone(), ctx.clone(), info.clone())
    }
}

/// Reads the field off the parent object.
///
/// Falls back to the `snake_case` spelling of the field name, so records
/// built from Rust structs resolve without explicit resolvers.
pub struct DefaultResolver;

impl Resolver for DefaultResolver {
    fn resolve<'a>(
        &'a self,
        parent: &'a Value,
        _args: &'a ResolverArgs,
        _ctx: &'a Context,
        info: &'a ResolverInfo,
    ) -> ResolverFuture<'a> {
        let field_name = &info.field_name;
        let result = match parent {
            Value::Object(map) => Ok(map
                .get(field_name)
                .or_else(|| map.get(&to_snake_case(field_name)))
                .cloned()
                .unwrap_or(Value::Null)),
            Value::Null => Ok(Value::Null),
            _ => Err(ResolverError::FieldNotFound(field_name.clone())),
        };
        Box::pin(async move { result })
    }
}

fn to_snake_case(s: &str) -> String {
    let mut result = String::with_capacity(s.len() + 4);
    for (i, c) in s.chars().enumerate() {
        if c.is_uppercase() {
            if i > 0 {
                result.push('_');
            }
            result.extend(c.to_lowercase());
        } else {
            result.push(c);
        }
    }
    result
}

/// Picks the concrete object type of a value returned for an interface or
/// union field.
pub type TypeResolverFn = Arc<dyn Fn(&Value, &Context) -> Option<String> + Send + Sync>;

/// Resolvers organized by type and field.
#[derive(Clone)]
pub struct ResolverMap {
    resolvers: FxHashMap<String, FxHashMap<String, SharedResolver>>,
    type_resolvers: FxHashMap<String, TypeResolverFn>,
    default_resolver: SharedResolver,
}

impl Default for ResolverMap {
    fn default() -> Self {
        Self::new()
    }
}

impl ResolverMap {
    #[must_use]
    pub fn new() -> Self {
        Self {
            resolvers: FxHashMap::default(),
            type_resolvers: FxHashMap::default(),
            default_resolver: Arc::new(DefaultResolver),
        }
    }

    /// Registers a resolver for a specific type and field, replacing any
    /// previous one.
    pub fn register<R: Resolver + 'static>(
        &mut self,
        type_name: impl Into<String>,
        field_name: impl Into<String>,
        resolver: R,
    ) {
        self.register_shared(type_name, field_name, Arc::new(resolver));
    }

    pub fn register_shared(
        &mut self,
        type_name: impl Into<String>,
        field_name: impl Into<String>,
        resolver: SharedResolver,
    ) {
        self.resolvers
            .entry(type_name.into())
            .or_default()
            .insert(field_name.into(), resolver);
    }

    /// Registers a sync function as a resolver.
    pub fn register_fn<F>(
        &mut self,
        type_name: impl Into<String>,
        field_name: impl Into<String>,
        f: F,
    ) where
        F: Fn(&Value, &ResolverArgs, &Context, &ResolverInfo) -> ResolverResult
            + Send
            + Sync
            + 'static,
    {
        self.register(type_name, field_name, FnResolver::new(f));
    }

    /// Registers an async function as a resolver.
    pub fn register_async<F, Fut>(
        &mut self,
        type_name: impl Into<String>,
        field_name: impl Into<String>,
        f: F,
    ) where
        F: Fn(Value, ResolverArgs, Context, ResolverInfo) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = ResolverResult> + Send + 'static,
    {
        self.register(type_name, field_name, AsyncFnResolver::new(f));
    }

    /// Registers the type resolver of an interface or union.
    pub fn register_type_resolver<F>(&mut self, abstract_type: impl Into<String>, f: F)
    where
        F: Fn(&Value, &Context) -> Option<String> + Send + Sync + 'static,
    {
        self.type_resolvers.insert(abstract_type.into(), Arc::new(f));
    }

    /// Builder form of [`ResolverMap::register_fn`].
    #[must_use]
    pub fn with_fn<F>(
        mut self,
        type_name: impl Into<String>,
        field_name: impl Into<String>,
        f: F,
    ) -> Self
    where
        F: Fn(&Value, &ResolverArgs, &Context, &ResolverInfo) -> ResolverResult
            + Send
            + Sync
            + 'static,
    {
        self.register_fn(type_name, field_name, f);
        self
    }

    /// Gets the resolver for a type and field, falling back to the default
    /// resolver.
    #[must_use]
    pub fn get(&self, type_name: &str, field_name: &str) -> &dyn Resolver {
        self.explicit(type_name, field_name)
            .unwrap_or(self.default_resolver.as_ref())
    }

    /// Gets the registered resolver for a type and field, if any.
    #[must_use]
    pub fn explicit(&self, type_name: &str, field_name: &str) -> Option<&dyn Resolver> {
        self.resolvers
            .get(type_name)
            .and_then(|fields| fields.get(field_name))
            .map(|resolver| &**resolver)
    }

    #[must_use]
    pub fn is_explicit(&self, type_name: &str, field_name: &str) -> bool {
        self.explicit(type_name, field_name).is_some()
    }

    /// Runs the type resolver registered for `abstract_type`.
    #[must_use]
    pub fn resolve_type(&self, abstract_type: &str, value: &Value, ctx: &Context) -> Option<String> {
        self.type_resolvers
            .get(abstract_type)
            .and_then(|f| f(value, ctx))
    }

    /// Iterates `(type, field)` pairs that have a registered resolver.
    pub fn fields(&self) -> impl Iterator<Item = (&str, &str)> {
        self.resolvers.iter().flat_map(|(ty, fields)| {
            fields.keys().map(move |field| (ty.as_str(), field.as_str()))
        })
    }

    /// Iterates the abstract types that have a type resolver.
    pub fn type_resolver_names(&self) -> impl Iterator<Item = &str> {
        self.type_resolvers.keys().map(String::as_str)
    }

    /// Replaces the fallback used for fields without a resolver.
    pub fn set_default<R: Resolver + 'static>(&mut self, resolver: R) {
        self.default_resolver = Arc::new(resolver);
    }

    /// Returns the number of registered field resolvers.
    #[must_use]
    pub fn len(&self) -> usize {
        self.resolvers.values().map(FxHashMap::len).sum()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0 && self.type_resolvers.is_empty()
    }
}

impl Debug for ResolverMap {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ResolverMap")
            .field("resolver_count", &self.len())
            .field("type_resolver_count", &self.type_resolvers.len())
            .finish_non_exhaustive()
    }
}
