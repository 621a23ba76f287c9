//! PostgreSQL introspection strategy
//!
//! Tables and views come from `information_schema` with system schemas
//! excluded; primary keys and indexes need `pg_catalog` because
//! `information_schema` hides expression indexes and key ordering. One
//! query per concern per table - introspection is on-demand, not hot-path,
//! so the N+1 is accepted.

use async_trait::async_trait;
use sqlscope_core::{
    ColumnSchema, Connection, Dialect, ForeignKeyInfo, IndexInfo, SchemaInfo, TableInfo, ViewInfo,
};

use crate::strategy::{
    fetch_rows, i64_field, run_table_details, sql_literal, str_field, IntrospectContext,
    IntrospectionLog, TableEntry,
};
use crate::IntrospectionStrategy;

pub struct PostgresStrategy;

#[async_trait]
impl IntrospectionStrategy for PostgresStrategy {
    fn dialect(&self) -> Dialect {
        Dialect::Postgres
    }

    async fn introspect(
        &self,
        conn: &dyn Connection,
        ctx: &IntrospectContext,
        log: &mut IntrospectionLog,
    ) -> SchemaInfo {
        let table_names = match fetch_rows(
            conn,
            "SELECT table_schema, table_name \
             FROM information_schema.tables \
             WHERE table_type = 'BASE TABLE' \
               AND table_schema NOT IN ('pg_catalog', 'information_schema', 'pg_toast') \
             ORDER BY table_schema, table_name",
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

        let views = match fetch_rows(
            conn,
            "SELECT table_schema, table_name, view_definition \
             FROM information_schema.views \
             WHERE table_schema NOT IN ('pg_catalog', 'information_schema') \
             ORDER BY table_schema, table_name",
        )
        .await
        {
            Ok(rows) => rows
                .iter()
                .filter_map(|row| {
                    Some(ViewInfo {
                        name: str_field(row, "table_name")?,
                        schema: str_field(row, "table_schema"),
                        definition: str_field(row, "view_definition"),
                    })
                })
                .collect(),
            Err(e) => {
                log.note(format!("failed to list views: {e}"));
                Vec::new()
            }
        };
        log.note(format!("found {} views", views.len()));

        let tables = run_table_details(table_names, ctx, log, |schema, name| {
            self.table_details(conn, schema, name)
        })
        .await;

        SchemaInfo { tables, views }
    }
}

impl PostgresStrategy {
    async fn table_details(
        &self,
        conn: &dyn Connection,
        schema: Option<String>,
        name: String,
    ) -> TableEntry {
        let mut log = IntrospectionLog::new();
        let schema_name = schema.as_deref().unwrap_or("public");
        let qualified = format!(
            "{}.{}",
            Dialect::Postgres.quote_ident(schema_name),
            Dialect::Postgres.quote_ident(&name)
        );

        let columns = match self.columns(conn, schema_name, &name).await {
            Ok(columns) => columns,
            Err(e) => {
                log.note(format!("table {qualified}: column query failed ({e}); omitting table"));
                return TableEntry {
                    schema,
                    name,
                    info: None,
                    log,
                };
            }
        };
        log.note(format!("table {qualified}: {} columns", columns.len()));

        let primary_key = match self.primary_key(conn, &qualified).await {
            Ok(pk) => pk,
            Err(e) => {
                log.note(format!("table {qualified}: primary key query failed ({e})"));
                Vec::new()
            }
        };

        let foreign_keys = match self.foreign_keys(conn, schema_name, &name).await {
            Ok(fks) => fks,
            Err(e) => {
                log.note(format!("table {qualified}: foreign key query failed ({e})"));
                Vec::new()
            }
        };

        let indexes = match self.indexes(conn, schema_name, &name).await {
            Ok(indexes) => indexes,
            Err(e) => {
                log.note(format!("table {qualified}: index query failed ({e})"));
                Vec::new()
            }
        };

        let mut columns = columns;
        for column in &mut columns {
            column.is_primary_key = primary_key.contains(&column.name);
        }

        TableEntry {
            schema: schema.clone(),
            name: name.clone(),
            info: Some(TableInfo {
                name,
                schema: Some(schema_name.to_string()),
                columns,
                primary_key,
                foreign_keys,
                indexes,
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
                "SELECT column_name, data_type, character_maximum_length, is_nullable, column_default \
                 FROM information_schema.columns \
                 WHERE table_schema = '{}' AND table_name = '{}' \
                 ORDER BY ordinal_position",
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

    async fn primary_key(
        &self,
        conn: &dyn Connection,
        qualified: &str,
    ) -> sqlscope_core::Result<Vec<String>> {
        let rows = fetch_rows(
            conn,
            &format!(
                "SELECT a.attname AS column_name \
                 FROM pg_index i \
                 JOIN pg_attribute a ON a.attrelid = i.indrelid AND a.attnum = ANY(i.indkey) \
                 WHERE i.indrelid = '{}'::regclass AND i.indisprimary \
                 ORDER BY a.attnum",
                sql_literal(qualified)
            ),
        )
        .await?;

        Ok(rows
            .iter()
            .filter_map(|row| str_field(row, "column_name"))
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
                "SELECT kcu.column_name, \
                        ccu.table_name AS referenced_table, \
                        ccu.column_name AS referenced_column \
                 FROM information_schema.table_constraints tc \
                 JOIN information_schema.key_column_usage kcu \
                   ON tc.constraint_name = kcu.constraint_name \
                  AND tc.table_schema = kcu.table_schema \
                 JOIN information_schema.constraint_column_usage ccu \
                   ON ccu.constraint_name = tc.constraint_name \
                  AND ccu.table_schema = tc.table_schema \
                 WHERE tc.constraint_type = 'FOREIGN KEY' \
                   AND tc.table_schema = '{}' AND tc.table_name = '{}'",
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

    async fn indexes(
        &self,
        conn: &dyn Connection,
        schema: &str,
        table: &str,
    ) -> sqlscope_core::Result<Vec<IndexInfo>> {
        let rows = fetch_rows(
            conn,
            &format!(
                "SELECT c2.relname AS index_name, i.indisunique AS is_unique, a.attname AS column_name \
                 FROM pg_index i \
                 JOIN pg_class c ON c.oid = i.indrelid \
                 JOIN pg_namespace n ON n.oid = c.relnamespace \
                 JOIN pg_class c2 ON c2.oid = i.indexrelid \
                 JOIN pg_attribute a ON a.attrelid = c.oid AND a.attnum = ANY(i.indkey) \
                 WHERE n.nspname = '{}' AND c.relname = '{}' AND NOT i.indisprimary \
                 ORDER BY c2.relname, a.attnum",
                sql_literal(schema),
                sql_literal(table)
            ),
        )
        .await?;

        // Rows arrive one per (index, column); fold them into IndexInfo
        // entries preserving column order.
        let mut indexes: Vec<IndexInfo> = Vec::new();
        for row in &rows {
            let Some(index_name) = str_field(row, "index_name") else {
                continue;
            };
            let Some(column) = str_field(row, "column_name") else {
                continue;
            };
            let unique = crate::strategy::bool_field(row, "is_unique").unwrap_or(false);
            match indexes.iter_mut().find(|i| i.name == index_name) {
                Some(index) => index.columns.push(column),
                None => indexes.push(IndexInfo {
                    name: index_name,
                    columns: vec![column],
                    unique,
                }),
            }
        }
        Ok(indexes)
    }
}
