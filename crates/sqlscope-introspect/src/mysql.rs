//! MySQL introspection strategy
//!
//! Table and view lists are scoped to `DATABASE()`; per-table columns come
//! from `DESCRIBE`, with the primary key inferred from `Key='PRI'`. MySQL's
//! `DESCRIBE` does not expose foreign keys or secondary index detail, so
//! those collections stay empty here.

use async_trait::async_trait;
use sqlscope_core::{ColumnSchema, Connection, Dialect, SchemaInfo, TableInfo, ViewInfo};

use crate::strategy::{
    fetch_rows, run_table_details, str_field, IntrospectContext, IntrospectionLog, TableEntry,
};
use crate::IntrospectionStrategy;

pub struct MySqlStrategy;

#[async_trait]
impl IntrospectionStrategy for MySqlStrategy {
    fn dialect(&self) -> Dialect {
        Dialect::MySql
    }

    async fn introspect(
        &self,
        conn: &dyn Connection,
        ctx: &IntrospectContext,
        log: &mut IntrospectionLog,
    ) -> SchemaInfo {
        let rows = match fetch_rows(
            conn,
            "SELECT TABLE_NAME AS table_name, TABLE_TYPE AS table_type \
             FROM information_schema.tables \
             WHERE TABLE_SCHEMA = DATABASE() \
             ORDER BY TABLE_NAME",
        )
        .await
        {
            Ok(rows) => rows,
            Err(e) => {
                log.note(format!("failed to list tables: {e}"));
                return SchemaInfo::default();
            }
        };

        let mut table_names = Vec::new();
        let mut views = Vec::new();
        for row in &rows {
            let Some(name) = str_field(row, "table_name") else {
                continue;
            };
            match str_field(row, "table_type").as_deref() {
                Some("VIEW") => views.push(ViewInfo {
                    name,
                    schema: None,
                    definition: None,
                }),
                _ => table_names.push((None, name)),
            }
        }
        log.note(format!(
            "found {} tables and {} views in current database",
            table_names.len(),
            views.len()
        ));

        let tables = run_table_details(table_names, ctx, log, |schema, name| {
            self.table_details(conn, schema, name)
        })
        .await;

        SchemaInfo { tables, views }
    }
}

impl MySqlStrategy {
    async fn table_details(
        &self,
        conn: &dyn Connection,
        schema: Option<String>,
        name: String,
    ) -> TableEntry {
        let mut log = IntrospectionLog::new();
        let describe = format!("DESCRIBE {}", Dialect::MySql.quote_ident(&name));

        let rows = match fetch_rows(conn, &describe).await {
            Ok(rows) => rows,
            Err(e) => {
                log.note(format!("table {name}: DESCRIBE failed ({e}); omitting table"));
                return TableEntry {
                    schema,
                    name,
                    info: None,
                    log,
                };
            }
        };

        let mut columns = Vec::new();
        let mut primary_key = Vec::new();
        for row in &rows {
            let Some(column_name) = str_field(row, "Field") else {
                continue;
            };
            let is_primary_key = str_field(row, "Key").as_deref() == Some("PRI");
            if is_primary_key {
                primary_key.push(column_name.clone());
            }
            columns.push(ColumnSchema {
                name: column_name,
                data_type: str_field(row, "Type").unwrap_or_default(),
                nullable: str_field(row, "Null").as_deref() == Some("YES"),
                default_value: str_field(row, "Default"),
                is_primary_key,
            });
        }
        log.note(format!("table {name}: {} columns", columns.len()));

        TableEntry {
            schema,
            name: name.clone(),
            info: Some(TableInfo {
                name,
                schema: None,
                columns,
                primary_key,
                foreign_keys: Vec::new(),
                indexes: Vec::new(),
            }),
            log,
        }
    }
}
