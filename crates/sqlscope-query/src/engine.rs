//! Query execution engine
//!
//! The ad-hoc path in order: read-only gate, pagination rewrite, bounded
//! execution through the caller's connection, result shaping. Each call is
//! stateless; the engine holds only configuration.

use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use sqlscope_core::{
    is_read_only_query, Connection, Dialect, ExecutionOutcome, Result, SqlscopeError,
};

use crate::{normalize_result, rewrite_with_pagination, PageConfig};

/// Execution configuration, supplied explicitly by the caller
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineConfig {
    pub page: PageConfig,
    /// Bounded wait per query; elapsing maps to `SqlscopeError::Timeout`
    pub query_timeout: Duration,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            page: PageConfig::default(),
            query_timeout: Duration::from_secs(30),
        }
    }
}

/// Query execution engine
pub struct QueryEngine {
    config: EngineConfig,
}

impl QueryEngine {
    pub fn new(config: EngineConfig) -> Self {
        Self { config }
    }

    /// Execute an ad-hoc query and return a shaped, paged outcome.
    ///
    /// Rejects anything that fails the read-only gate before touching the
    /// connection. Driver errors pass through verbatim as
    /// `SqlscopeError::Execution`; a timed-out wait is `Timeout`.
    #[tracing::instrument(skip(self, conn, sql), fields(sql_preview = %sql.chars().take(100).collect::<String>()))]
    pub async fn execute_query(
        &self,
        conn: &Arc<dyn Connection>,
        sql: &str,
        dialect: Dialect,
        limit: Option<u32>,
        offset: u64,
    ) -> Result<ExecutionOutcome> {
        if !is_read_only_query(sql) {
            tracing::warn!("rejected non-read-only statement on ad-hoc path");
            return Err(SqlscopeError::Forbidden(
                "only SELECT, WITH, EXPLAIN, SHOW, and DESCRIBE statements may run here"
                    .to_string(),
            ));
        }

        let (rewritten, pagination) =
            rewrite_with_pagination(sql, limit, offset, dialect, &self.config.page);

        let start = std::time::Instant::now();
        let raw = conn
            .execute_with_timeout(&rewritten, self.config.query_timeout)
            .await
            .map_err(|e| {
                tracing::error!(error = %e, "query execution failed");
                e
            })?;
        let execution_time_ms = start.elapsed().as_millis() as u64;

        let normalized = normalize_result(raw);
        let row_count = normalized.row_count();
        let page_filled = row_count as u64 >= pagination.limit as u64;

        // Execution-detail audit event; persistence is the caller's concern.
        tracing::info!(
            driver = %conn.driver_name(),
            dialect = %dialect,
            rows = row_count,
            execution_time_ms,
            limit = pagination.limit,
            offset = pagination.offset,
            "query executed"
        );

        Ok(ExecutionOutcome {
            columns: normalized.columns,
            rows: normalized.rows,
            row_count,
            execution_time_ms,
            truncated: page_filled,
            pagination,
            has_more: page_filled,
        })
    }
}

impl Default for QueryEngine {
    fn default() -> Self {
        Self::new(EngineConfig::default())
    }
}
