//! SQL Server introspection strategy
//!
//! Uses `information_schema` exclusively: tables, views, columns, and the
//! foreign-key constraint chain. Primary-key and index detail would need
//! the `sys.*` catalogs, which this strategy deliberately does not touch -
//! a documented limitation, noted in the log trail.

use async_trait::async_trait;
use sqlscope_core::{
    ColumnSchema, Connection, Dialect, ForeignKeyInfo, SchemaInfo, TableInfo, ViewInfo,
};

use crate::strategy::{
    fetch_rows, i64_field, run_table_details, sql_literal, str_field, IntrospectContext,
    IntrospectionLog, TableEntry,
};
use crate::IntrospectionStrategy;

pub struct MssqlStrategy;

#[async_trait]
impl IntrospectionStrategy for MssqlStrategy {
    fn dialect(&self) -> Dialect {
        Dialect::SqlServer
    }

    async fn introspect(
        &self,
        conn: &dyn Connection,
        ctx: &IntrospectContext,
        log: &mut IntrospectionLog,
    ) -> SchemaInfo {
        let table_names = match fetch_rows(
            conn,
            "SELECT TABLE_SCHEMA AS table_schema, TABLE_NAME AS table_name \
             FROM information_schema.tables \
             WHERE TABLE_TYPE = 'BASE TABLE' \
             ORDER BY TABLE_SCHEMA, TABLE_NAME",
        )
        .await
        {
            Ok(rows) => rows
                .iter()
                .filter_map(|row| {
                    Some((str_field(row, "table_schema"), str_field(row, "table_name")?))
                })
                .collect::<Vec<_>>(),
            Err(e) => {
                log.note(format!("failed to list tables: {e}"));
                return SchemaInfo::default();
            }
        };
        log.note(format!("found {} tables", table_names.len()));
        log.note("primary key and index detail is not exposed via information_schema on SQL Server");

        let views = match fetch_rows(
            conn,
            "SELECT TABLE_SCHEMA AS table_schema, TABLE_NAME AS table_name \
             FROM information_schema.views \
             ORDER BY TABLE_SCHEMA, TABLE_NAME",
        )
        .await
        {
            Ok(rows) => rows
                .iter()
                .filter_map(|row| {
                    Some(ViewInfo {
                        name: str_field(row, "table_name")?,
                        schema: str_field(row, "table_schema"),
                        definition: None,
                    })
                })
                .collect(),
            Err(e) => {
                log.note(format!("failed to list views: {e}"));
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

impl MssqlStrategy {
    async fn table_details(
        &self,
        conn: &dyn Connection,
        schema: Option<String>,
        name: String,
    ) -> TableEntry {
        let mut log = IntrospectionLog::new();
        let schema_name = schema.clone().unwrap_or_else(|| "dbo".to_string());

        let columns = match self.columns(conn, &schema_name, &name).await {
            Ok(columns) => columns,
            Err(e) => {
                log.note(format!(
                    "table {schema_name}.{name}: column query failed ({e}); omitting table"
                ));
                return TableEntry {
                    schema,
                    name,
                    info: None,
                    log,
                };
            }
        };
        log.note(format!("table {schema_name}.{name}: {} columns", columns.len()));

        let foreign_keys = match self.foreign_keys(conn, &schema_name, &name).await {
            Ok(fks) => fks,
            Err(e) => {
                log.note(format!(
                    "table {schema_name}.{name}: foreign key query failed ({e})"
                ));
                Vec::new()
            }
        };

        TableEntry {
            schema,
            name: name.clone(),
            info: Some(TableInfo {
                name,
                schema: Some(schema_name),
                columns,
                primary_key: Vec::new(),
                foreign_keys,
                indexes: Vec::new(),
            }),
            log,
        }
    }

    async fn columns(
        &self,
        conn: &dyn Connection,
        schema: &str,
        table: &str,
    ) -> sqlscope_core::Result<Vec<ColumnSchema>> {
        let rows = fetch_rows(
            conn,
            &format!(
                "SELECT COLUMN_NAME AS column_name, DATA_TYPE AS data_type, \
                        CHARACTER_MAXIMUM_LENGTH AS character_maximum_length, \
                        IS_NULLABLE AS is_nullable, COLUMN_DEFAULT AS column_default \
                 FROM information_schema.columns \
                 WHERE TABLE_SCHEMA = '{}' AND TABLE_NAME = '{}' \
                 ORDER BY ORDINAL_POSITION",
                sql_literal(schema),
                sql_literal(table)
            ),
        )
        .await?;

        Ok(rows
            .iter()
            .filter_map(|row| {
                let name = str_field(row, "column_name")?;
                let mut data_type = str_field(row, "data_type").unwrap_or_default();
                if let Some(max_len) = i64_field(row, "character_maximum_length") {
                    data_type = format!("{data_type}({max_len})");
                }
                Some(ColumnSchema {
                    name,
                    data_type,
                    nullable: str_field(row, "is_nullable").as_deref() == Some("YES"),
                    default_value: str_field(row, "column_default"),
                    is_primary_key: false,
                })
            })
            .collect())
    }

    async fn foreign_keys(
        &self,
        conn: &dyn Connection,
        schema: &str,
        table: &str,
    ) -> sqlscope_core::Result<Vec<ForeignKeyInfo>> {
        let rows = fetch_rows(
            conn,
            &format!(
                "SELECT kcu.COLUMN_NAME AS column_name, \
                        ccu.TABLE_NAME AS referenced_table, \
                        ccu.COLUMN_NAME AS referenced_column \
                 FROM information_schema.table_constraints tc \
                 JOIN information_schema.key_column_usage kcu \
                   ON tc.CONSTRAINT_NAME = kcu.CONSTRAINT_NAME \
                  AND tc.TABLE_SCHEMA = kcu.TABLE_SCHEMA \
                 JOIN information_schema.constraint_column_usage ccu \
                   ON ccu.CONSTRAINT_NAME = tc.CONSTRAINT_NAME \
                  AND ccu.TABLE_SCHEMA = tc.TABLE_SCHEMA \
                 WHERE tc.CONSTRAINT_TYPE = 'FOREIGN KEY' \
                   AND tc.TABLE_SCHEMA = '{}' AND tc.TABLE_NAME = '{}'",
                sql_literal(schema),
                sql_literal(table)
            ),
        )
        .await?;

        Ok(rows
            .iter()
            .filter_map(|row| {
                Some(ForeignKeyInfo {
                    column: str_field(row, "column_name")?,
                    referenced_table: str_field(row, "referenced_table")?,
                    referenced_column: str_field(row, "referenced_column")?,
                })
            })
            .collect())
    }
}
