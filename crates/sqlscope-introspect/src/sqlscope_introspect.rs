//! Schema introspection for sqlscope
//!
//! Queries a live connection's catalog and assembles the normalized
//! `SchemaInfo` model. One strategy per dialect behind a lookup table;
//! adding an engine means implementing `IntrospectionStrategy`, not editing
//! a dispatcher. Every step appends to a timestamped log trail that the UI
//! exposes for diagnosing misbehaving drivers.

mod generic;
mod mssql;
mod mysql;
mod postgres;
mod sqlite;
mod strategy;

pub use generic::GenericStrategy;
pub use mssql::MssqlStrategy;
pub use mysql::MySqlStrategy;
pub use postgres::PostgresStrategy;
pub use sqlite::SqliteStrategy;
pub use strategy::{
    introspect_schema, strategy_for, IntrospectContext, IntrospectOptions, IntrospectionLog,
    IntrospectionReport, IntrospectionStrategy,
};
