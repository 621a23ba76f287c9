//! Connection trait
//!
//! The engine does not own connections, pools, or credentials. The caller's
//! connection manager supplies a handle capable of executing raw SQL; this
//! trait is that seam.

use crate::{RawResultShape, Result, SqlscopeError};
use async_trait::async_trait;
use std::time::Duration;

/// A live database connection handle supplied by the connection manager.
///
/// Implementations adapt a concrete driver's result into the tagged
/// `RawResultShape` union at this boundary, so nothing downstream needs to
/// sniff driver-specific envelopes.
#[async_trait]
pub trait Connection: Send + Sync {
    /// Get the driver name (e.g., "sqlite", "postgresql", "mysql")
    fn driver_name(&self) -> &str;

    /// Execute raw SQL and return the driver's result in tagged form
    async fn execute(&self, sql: &str) -> Result<RawResultShape>;

    /// Execute raw SQL with a bounded wait.
    ///
    /// The default implementation wraps `execute` in a timer; an elapsed
    /// timer maps to `SqlscopeError::Timeout` so callers can distinguish a
    /// slow query from a failing one. Drivers with native statement timeouts
    /// may override this.
    async fn execute_with_timeout(
        &self,
        sql: &str,
        timeout: Duration,
    ) -> Result<RawResultShape> {
        match tokio::time::timeout(timeout, self.execute(sql)).await {
            Ok(result) => result,
            Err(_) => {
                tracing::warn!(
                    driver = %self.driver_name(),
                    timeout_ms = timeout.as_millis() as u64,
                    "query timed out"
                );
                Err(SqlscopeError::Timeout(timeout.as_millis() as u64))
            }
        }
    }
}
