//! Error types for sqlscope

use thiserror::Error;

/// Core error type for sqlscope operations
#[derive(Error, Debug)]
pub enum SqlscopeError {
    /// Statement failed the read-only gate. Raised before any database I/O.
    #[error("Forbidden statement: {0}")]
    Forbidden(String),

    /// Driver failure during execution. The driver's message passes through
    /// verbatim so callers can render it.
    #[error("Execution error: {0}")]
    Execution(String),

    /// The bounded wait for a query elapsed. Distinct from `Execution` so
    /// callers can suggest narrowing filters.
    #[error("Execution timed out after {0}ms")]
    Timeout(u64),

    /// A catalog query failed during introspection. Strategies log and
    /// degrade instead of surfacing this from `introspect_schema`.
    #[error("Introspection error: {0}")]
    Introspection(String),

    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("{0}")]
    Other(String),
}

/// Result type alias for sqlscope operations
pub type Result<T> = std::result::Result<T, SqlscopeError>;
