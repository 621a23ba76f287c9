//! SQLite introspection strategy
//!
//! `sqlite_master` lists tables and views; everything per-table comes from
//! PRAGMAs. SQLite drivers are the most shape-inconsistent of the supported
//! engines, so every PRAGMA result logs which raw shape actually arrived
//! and degrades to an empty list instead of failing.

use async_trait::async_trait;
use sqlscope_core::{
    ColumnSchema, Connection, Dialect, ForeignKeyInfo, IndexInfo, RowObject, SchemaInfo,
    TableInfo, ViewInfo,
};

use crate::strategy::{
    fetch_rows, i64_field, rows_from, run_table_details, sql_literal, str_field,
    IntrospectContext, IntrospectionLog, TableEntry,
};
use crate::IntrospectionStrategy;

pub struct SqliteStrategy;

#[async_trait]
impl IntrospectionStrategy for SqliteStrategy {
    fn dialect(&self) -> Dialect {
        Dialect::Sqlite
    }

    async fn introspect(
        &self,
        conn: &dyn Connection,
        ctx: &IntrospectContext,
        log: &mut IntrospectionLog,
    ) -> SchemaInfo {
        let table_names = match fetch_rows(
            conn,
            "SELECT name FROM sqlite_master \
             WHERE type = 'table' AND name NOT LIKE 'sqlite_%' ORDER BY name",
        )
        .await
        {
            Ok(rows) => rows
                .iter()
                .filter_map(|row| Some((None, str_field(row, "name")?)))
                .collect::<Vec<_>>(),
            Err(e) => {
                log.note(format!("failed to query sqlite_master for tables: {e}"));
                return SchemaInfo::default();
            }
        };
        log.note(format!("found {} tables in sqlite_master", table_names.len()));

        let views = match fetch_rows(
            conn,
            "SELECT name, sql FROM sqlite_master WHERE type = 'view' ORDER BY name",
        )
        .await
        {
            Ok(rows) => rows
                .iter()
                .filter_map(|row| {
                    Some(ViewInfo {
                        name: str_field(row, "name")?,
                        schema: None,
                        definition: str_field(row, "sql"),
                    })
                })
                .collect(),
            Err(e) => {
                log.note(format!("failed to query sqlite_master for views: {e}"));
                Vec::new()
            }
        };

        let tables = run_table_details(table_names, ctx, log, |schema, name| {
            self.table_details(conn, schema, name)
        })
        .await;

        SchemaInfo { tables, views }
    }
}

impl SqliteStrategy {
    /// Run a PRAGMA and log the raw shape the driver produced. Falls back
    /// to an empty list on failure rather than propagating.
    async fn pragma_rows(
        &self,
        conn: &dyn Connection,
        pragma: &str,
        log: &mut IntrospectionLog,
    ) -> Option<Vec<RowObject>> {
        match conn.execute(pragma).await {
            Ok(raw) => {
                let (rows, shape) = rows_from(raw);
                log.note(format!("{pragma}: driver returned {shape} ({} rows)", rows.len()));
                Some(rows)
            }
            Err(e) => {
                log.note(format!("{pragma} failed: {e}"));
                None
            }
        }
    }

    async fn table_details(
        &self,
        conn: &dyn Connection,
        schema: Option<String>,
        name: String,
    ) -> TableEntry {
        let mut log = IntrospectionLog::new();
        let escaped = sql_literal(&name);

        let Some(column_rows) = self
            .pragma_rows(conn, &format!("PRAGMA table_info('{escaped}')"), &mut log)
            .await
        else {
            log.note(format!("table {name}: omitted (table_info unavailable)"));
            return TableEntry {
                schema,
                name,
                info: None,
                log,
            };
        };

        let mut columns = Vec::new();
        // (pk ordinal, column name) pairs; table_info reports pk as the
        // 1-based position within the primary key, 0 for non-key columns.
        let mut key_columns = Vec::new();
        for row in &column_rows {
            let Some(column_name) = str_field(row, "name") else {
                continue;
            };
            let pk_ordinal = i64_field(row, "pk").unwrap_or(0);
            if pk_ordinal > 0 {
                key_columns.push((pk_ordinal, column_name.clone()));
            }
            columns.push(ColumnSchema {
                name: column_name,
                data_type: str_field(row, "type").unwrap_or_default(),
                nullable: i64_field(row, "notnull").unwrap_or(0) == 0 && pk_ordinal == 0,
                default_value: str_field(row, "dflt_value"),
                is_primary_key: pk_ordinal > 0,
            });
        }
        key_columns.sort_by_key(|(ordinal, _)| *ordinal);
        let primary_key: Vec<String> = key_columns.into_iter().map(|(_, name)| name).collect();

        let foreign_keys = match self
            .pragma_rows(conn, &format!("PRAGMA foreign_key_list('{escaped}')"), &mut log)
            .await
        {
            Some(rows) => rows
                .iter()
                .filter_map(|row| {
                    Some(ForeignKeyInfo {
                        column: str_field(row, "from")?,
                        referenced_table: str_field(row, "table")?,
                        referenced_column: str_field(row, "to").unwrap_or_default(),
                    })
                })
                .collect(),
            None => Vec::new(),
        };

        let mut indexes = Vec::new();
        if let Some(index_rows) = self
            .pragma_rows(conn, &format!("PRAGMA index_list('{escaped}')"), &mut log)
            .await
        {
            for index_row in &index_rows {
                let Some(index_name) = str_field(index_row, "name") else {
                    continue;
                };
                let unique = i64_field(index_row, "unique").unwrap_or(0) != 0;
                let columns = match self
                    .pragma_rows(
                        conn,
                        &format!("PRAGMA index_info('{}')", sql_literal(&index_name)),
                        &mut log,
                    )
                    .await
                {
                    Some(rows) => rows
                        .iter()
                        .filter_map(|row| str_field(row, "name"))
                        .collect(),
                    None => Vec::new(),
                };
                indexes.push(IndexInfo {
                    name: index_name,
                    columns,
                    unique,
                });
            }
        }

        log.note(format!(
            "table {name}: {} columns, {} foreign keys, {} indexes",
            columns.len(),
            foreign_keys.len(),
            indexes.len()
        ));

        TableEntry {
            schema,
            name: name.clone(),
            info: Some(TableInfo {
                name,
                schema: None,
                columns,
                primary_key,
                foreign_keys,
                indexes,
            }),
            log,
        }
    }
}
