//! Runtime for qlbridge.
//!
//! This crate provides the in-process GraphQL execution runtime:
//! - `schema`: Schema building from SDL
//! - `resolver`: Field resolvers and resolver maps
//! - `executable`: Schemas bound to resolvers
//! - `context`: Per-request context values
//! - `validation`: Document validation
//! - `values`: Input coercion and result serialization
//! - `executor`: Query execution
//! - `response`: Responses and located errors
//! - `mock`: Mock resolvers

pub mod context;
pub mod executable;
pub mod executor;
pub mod mock;
pub mod resolver;
pub mod response;
pub mod schema;
pub mod validation;
pub mod values;

pub use context::Context;
pub use executable::{make_executable_schema, ExecutableSchema};
pub use executor::{graphql, Executor, ExecutorConfig, Request, RequestError};
pub use mock::{add_mocks_to_schema, MockFn, MockOptions};
pub use resolver::{
    AsyncFnResolver, DefaultResolver, FnResolver, Resolver, ResolverArgs, ResolverError,
    ResolverFuture, ResolverInfo, ResolverMap, ResolverResult, SharedResolver,
};
pub use response::{FieldError, PathSegment, Response};
pub use schema::{Schema, SchemaError, TypeDef, TypeRef};
pub use validation::validate;
