//! Strategy interface and orchestration
//!
//! `introspect_schema` is the single entry point: it resolves the strategy
//! for the dialect, runs it under an overall budget, enforces the
//! deterministic-ordering invariants, and returns the schema together with
//! the log trail. It never errors - a failing catalog degrades to a partial
//! (or empty) schema with the failure on record in the logs.

use async_trait::async_trait;
use chrono::Utc;
use futures::stream::StreamExt;
use serde::{Deserialize, Serialize};
use sqlscope_core::{
    Connection, Dialect, RawResultShape, Result, RowObject, SchemaInfo, TableInfo,
};
use std::collections::{BTreeSet, HashMap};
use std::sync::LazyLock;
use std::time::{Duration, Instant};

/// Introspection configuration, supplied explicitly by the caller
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct IntrospectOptions {
    /// Overall wall-clock budget. On exhaustion the partial schema gathered
    /// so far is returned with a warning in the logs.
    pub budget: Duration,
    /// Upper bound on concurrent per-table catalog queries
    pub table_concurrency: usize,
}

impl Default for IntrospectOptions {
    fn default() -> Self {
        Self {
            budget: Duration::from_secs(30),
            table_concurrency: 4,
        }
    }
}

/// Per-call context handed to strategies
#[derive(Debug, Clone, Copy)]
pub struct IntrospectContext {
    pub options: IntrospectOptions,
    deadline: Instant,
}

impl IntrospectContext {
    pub fn new(options: IntrospectOptions) -> Self {
        Self {
            options,
            deadline: Instant::now() + options.budget,
        }
    }

    pub fn budget_exhausted(&self) -> bool {
        Instant::now() >= self.deadline
    }
}

/// Timestamped diagnostic trail.
///
/// Part of the introspection contract, not incidental: these lines surface
/// in the UI so users can see what a misbehaving driver actually returned.
/// Each line is mirrored to `tracing` at debug level.
#[derive(Debug, Default, Clone)]
pub struct IntrospectionLog {
    lines: Vec<String>,
}

impl IntrospectionLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn note(&mut self, message: impl AsRef<str>) {
        let message = message.as_ref();
        tracing::debug!("{message}");
        self.lines.push(format!(
            "[{}] {}",
            Utc::now().format("%Y-%m-%dT%H:%M:%S%.3fZ"),
            message
        ));
    }

    /// Merge another log's lines (used when per-table work logs privately
    /// under concurrency and is merged back in deterministic order).
    pub fn absorb(&mut self, other: IntrospectionLog) {
        self.lines.extend(other.lines);
    }

    pub fn lines(&self) -> &[String] {
        &self.lines
    }

    pub fn into_lines(self) -> Vec<String> {
        self.lines
    }
}

/// Schema plus the log trail, returned to the caller as one unit
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IntrospectionReport {
    pub schema: SchemaInfo,
    pub logs: Vec<String>,
}

/// One dialect's way of reading its catalog into the normalized model.
///
/// Strategies degrade internally: a failed per-table query is logged and the
/// table omitted (columns) or its detail left empty (keys/indexes). The
/// returned schema may therefore be partial, but `introspect` itself does
/// not fail.
#[async_trait]
pub trait IntrospectionStrategy: Send + Sync {
    fn dialect(&self) -> Dialect;

    async fn introspect(
        &self,
        conn: &dyn Connection,
        ctx: &IntrospectContext,
        log: &mut IntrospectionLog,
    ) -> SchemaInfo;
}

/// Strategy lookup table keyed by dialect
static STRATEGIES: LazyLock<HashMap<Dialect, Box<dyn IntrospectionStrategy>>> =
    LazyLock::new(|| {
        let mut table: HashMap<Dialect, Box<dyn IntrospectionStrategy>> = HashMap::new();
        table.insert(Dialect::Postgres, Box::new(crate::PostgresStrategy));
        table.insert(Dialect::MySql, Box::new(crate::MySqlStrategy));
        table.insert(Dialect::Sqlite, Box::new(crate::SqliteStrategy));
        table.insert(Dialect::SqlServer, Box::new(crate::MssqlStrategy));
        table.insert(Dialect::Generic, Box::new(crate::GenericStrategy));
        table
    });

/// Resolve the strategy for a dialect. Unknown dialects get the generic
/// fallback rather than an error.
pub fn strategy_for(dialect: Dialect) -> &'static dyn IntrospectionStrategy {
    static GENERIC: crate::GenericStrategy = crate::GenericStrategy;
    STRATEGIES
        .get(&dialect)
        .map(|strategy| strategy.as_ref())
        .unwrap_or(&GENERIC)
}

/// Introspect the live schema behind a connection.
///
/// Never errors: the worst case is an empty schema whose logs say why.
#[tracing::instrument(skip(conn))]
pub async fn introspect_schema(
    conn: &dyn Connection,
    dialect: Dialect,
    options: IntrospectOptions,
) -> IntrospectionReport {
    let mut log = IntrospectionLog::new();
    log.note(format!(
        "starting schema introspection for {} via driver '{}'",
        dialect.display_name(),
        conn.driver_name()
    ));

    let ctx = IntrospectContext::new(options);
    let strategy = strategy_for(dialect);
    let mut schema = strategy.introspect(conn, &ctx, &mut log).await;
    schema.dedup_and_sort();

    log.note(format!(
        "introspection finished: {} tables, {} views",
        schema.tables.len(),
        schema.views.len()
    ));
    IntrospectionReport {
        schema,
        logs: log.into_lines(),
    }
}

/// Result of one table's detail queries, produced under concurrency and
/// merged back deterministically.
pub(crate) struct TableEntry {
    pub schema: Option<String>,
    pub name: String,
    /// None when the table's column query failed and it is being omitted
    pub info: Option<TableInfo>,
    pub log: IntrospectionLog,
}

/// Run per-table detail work with bounded concurrency and the overall
/// budget enforced between completions.
///
/// The resulting table list and the merged log blocks are ordered by
/// `(schema, name)` regardless of completion order. Tables whose detail
/// work never ran (budget exhausted) are kept with empty detail.
pub(crate) async fn run_table_details<F, Fut>(
    names: Vec<(Option<String>, String)>,
    ctx: &IntrospectContext,
    log: &mut IntrospectionLog,
    detail: F,
) -> Vec<TableInfo>
where
    F: Fn(Option<String>, String) -> Fut,
    Fut: std::future::Future<Output = TableEntry>,
{
    let total = names.len();
    let mut pending: BTreeSet<(Option<String>, String)> = names.iter().cloned().collect();

    let mut stream = futures::stream::iter(names.into_iter().map(|(schema, name)| detail(schema, name)))
        .buffer_unordered(ctx.options.table_concurrency.max(1));

    let mut entries: Vec<TableEntry> = Vec::new();
    let mut exhausted = ctx.budget_exhausted();
    while !exhausted {
        let Some(entry) = stream.next().await else {
            break;
        };
        pending.remove(&(entry.schema.clone(), entry.name.clone()));
        entries.push(entry);
        exhausted = ctx.budget_exhausted();
    }
    drop(stream);

    if exhausted {
        log.note(format!(
            "introspection budget exhausted after {} of {} tables; returning partial schema",
            entries.len(),
            total
        ));
    }

    entries.sort_by(|a, b| (&a.schema, &a.name).cmp(&(&b.schema, &b.name)));

    let mut tables = Vec::new();
    for entry in entries {
        log.absorb(entry.log);
        if let Some(info) = entry.info {
            tables.push(info);
        }
    }
    for (schema, name) in pending {
        tables.push(TableInfo::new(name, schema));
    }
    tables
}

/// Unwrap any raw shape into its rows, reporting which shape arrived.
pub(crate) fn rows_from(raw: RawResultShape) -> (Vec<RowObject>, &'static str) {
    match raw {
        RawResultShape::Rows { rows } => (rows, "bare row array"),
        RawResultShape::Wrapped { rows } => (rows, "rows envelope"),
        RawResultShape::Paired { rows, .. } => (rows, "rows+fields pair"),
        RawResultShape::Nested { batches } => (
            batches.into_iter().next().unwrap_or_default(),
            "singly-nested row array",
        ),
    }
}

/// Execute a catalog query and unwrap its rows, ignoring the shape.
pub(crate) async fn fetch_rows(conn: &dyn Connection, sql: &str) -> Result<Vec<RowObject>> {
    let raw = conn.execute(sql).await?;
    Ok(rows_from(raw).0)
}

/// Case-insensitive row field lookup. Catalog column-name casing varies by
/// engine and driver, so the exact key is tried first.
pub(crate) fn field<'a>(row: &'a RowObject, key: &str) -> Option<&'a serde_json::Value> {
    row.get(key)
        .or_else(|| row.iter().find(|(k, _)| k.eq_ignore_ascii_case(key)).map(|(_, v)| v))
}

pub(crate) fn str_field(row: &RowObject, key: &str) -> Option<String> {
    match field(row, key)? {
        serde_json::Value::String(s) => Some(s.clone()),
        serde_json::Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

pub(crate) fn i64_field(row: &RowObject, key: &str) -> Option<i64> {
    match field(row, key)? {
        serde_json::Value::Number(n) => n.as_i64(),
        serde_json::Value::String(s) => s.parse().ok(),
        serde_json::Value::Bool(b) => Some(*b as i64),
        _ => None,
    }
}

pub(crate) fn bool_field(row: &RowObject, key: &str) -> Option<bool> {
    match field(row, key)? {
        serde_json::Value::Bool(b) => Some(*b),
        serde_json::Value::Number(n) => n.as_i64().map(|v| v != 0),
        serde_json::Value::String(s) => match s.to_ascii_lowercase().as_str() {
            "true" | "t" | "yes" | "1" => Some(true),
            "false" | "f" | "no" | "0" => Some(false),
            _ => None,
        },
        _ => None,
    }
}

/// Escape a value for embedding in a single-quoted SQL literal
pub(crate) fn sql_literal(value: &str) -> String {
    value.replace('\'', "''")
}

#[cfg(test)]
mod tests;
