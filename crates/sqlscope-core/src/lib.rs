//! sqlscope-core - Core abstractions for the SQL safety engine
//!
//! This crate provides the fundamental traits and types that all other
//! sqlscope crates depend on. It defines:
//!
//! - `Dialect` - the SQL grammar/catalog variant a data source speaks
//! - `Connection` - trait for the execution substrate supplied by the caller
//! - `RawResultShape` / `NormalizedResult` - driver result shapes
//! - The normalized schema model (`SchemaInfo`, `TableInfo`, ...)
//! - `is_read_only_query` - the hard read-only execution gate

mod connection;
mod dialect;
mod error;
mod readonly;
mod schema;
mod types;

pub use connection::*;
pub use dialect::*;
pub use error::*;
pub use readonly::*;
pub use schema::*;
pub use types::*;
