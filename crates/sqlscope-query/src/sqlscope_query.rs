//! Query execution for sqlscope
//!
//! The ad-hoc execution path: read-only gate, server-side pagination
//! rewriting, bounded execution through the caller's connection, and result
//! shaping into one normalized form.

mod engine;
mod paginate;
mod shape;

pub use engine::{EngineConfig, QueryEngine};
pub use paginate::{rewrite_with_pagination, PageConfig};
pub use shape::normalize_result;
