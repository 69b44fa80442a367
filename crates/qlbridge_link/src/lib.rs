//! Bridge link for qlbridge.
//!
//! Runs client operations against an in-process schema instead of a remote
//! endpoint, for tests, mocks and local-first setups.
//!
//! - `link`: The [`Link`] trait, [`create_bridge_link`] and [`BridgeLink`]
//! - `options`: Link configuration
//! - `schema_input`: Accepted schema representations
//! - `operation`: Operations and their transport context
//! - `contextware`: Per-operation context transforms
//! - `observable`: Single-value result streams
//! - `error`: Error types
//!
//! ```ignore
//! use qlbridge_link::{BridgeLink, BridgeOptions, Operation};
//!
//! let link = BridgeLink::new(BridgeOptions::new(SCHEMA).mock(true))?;
//! let response = link.request(Operation::parse("{ posts { id } }")?).await?;
//! ```

pub mod contextware;
pub mod error;
pub mod link;
pub mod observable;
pub mod operation;
pub mod options;
pub mod schema_input;

pub use contextware::{Contextware, SharedContextware};
pub use error::{ConfigError, ContextError, LinkError};
pub use link::{create_bridge_link, BridgeHandler, BridgeLink, Link};
pub use observable::{Observer, ResultStream};
pub use operation::{Operation, OperationContext};
pub use options::{BridgeOptions, ErrorPolicy};
pub use schema_input::SchemaInput;

pub use qlbridge_runtime::{Context, ExecutableSchema, ResolverMap, Response};
