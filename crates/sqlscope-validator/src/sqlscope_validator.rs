//! SQL validation for sqlscope
//!
//! Parses untrusted editor SQL under the resolved dialect, runs the advisory
//! security and performance scanners, and pretty-prints parseable input.
//! Everything here degrades to structured results - a malformed statement is
//! data (`ValidationResult`), never an error.

mod extract;
mod format;
mod performance;
mod security;
mod validate;

pub use extract::{extract_columns, extract_tables};
pub use format::format_sql;
pub use performance::scan_performance;
pub use security::scan_security;
pub use validate::{parse_statements, validate, SqlError, SqlWarning, ValidationResult, WarningKind};
