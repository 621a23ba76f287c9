//! Tests for introspection orchestration and the per-dialect strategies,
//! driven through a scripted mock connection.

use super::*;
use async_trait::async_trait;
use serde_json::{json, Value};
use sqlscope_core::SqlscopeError;
use std::sync::Mutex;

#[derive(Clone)]
enum Scripted {
    Reply(RawResultShape),
    Fail(String),
}

/// Connection double that matches incoming SQL against substring needles
/// and replays canned results. Unmatched SQL returns an empty row set.
struct ScriptedConnection {
    script: Vec<(&'static str, Scripted)>,
    seen: Mutex<Vec<String>>,
}

impl ScriptedConnection {
    fn new(script: Vec<(&'static str, Scripted)>) -> Self {
        Self {
            script,
            seen: Mutex::new(Vec::new()),
        }
    }
}

#[async_trait]
impl Connection for ScriptedConnection {
    fn driver_name(&self) -> &str {
        "scripted"
    }

    async fn execute(&self, sql: &str) -> sqlscope_core::Result<RawResultShape> {
        self.seen.lock().unwrap().push(sql.to_string());
        for (needle, response) in &self.script {
            if sql.contains(needle) {
                return match response {
                    Scripted::Reply(shape) => Ok(shape.clone()),
                    Scripted::Fail(message) => Err(SqlscopeError::Execution(message.clone())),
                };
            }
        }
        Ok(RawResultShape::Rows { rows: Vec::new() })
    }
}

fn row(pairs: &[(&str, Value)]) -> RowObject {
    pairs
        .iter()
        .map(|(k, v)| (k.to_string(), v.clone()))
        .collect()
}

fn rows(rows: Vec<RowObject>) -> Scripted {
    Scripted::Reply(RawResultShape::Rows { rows })
}

fn sqlite_table_info_rows() -> Vec<RowObject> {
    vec![
        row(&[
            ("cid", json!(0)),
            ("name", json!("id")),
            ("type", json!("INTEGER")),
            ("notnull", json!(0)),
            ("dflt_value", json!(null)),
            ("pk", json!(1)),
        ]),
        row(&[
            ("cid", json!(1)),
            ("name", json!("name")),
            ("type", json!("TEXT")),
            ("notnull", json!(0)),
            ("dflt_value", json!(null)),
            ("pk", json!(0)),
        ]),
    ]
}

fn sqlite_script(table_info: RawResultShape) -> Vec<(&'static str, Scripted)> {
    vec![
        (
            "type = 'table'",
            rows(vec![row(&[("name", json!("t"))])]),
        ),
        ("type = 'view'", rows(Vec::new())),
        ("PRAGMA table_info", Scripted::Reply(table_info)),
        ("PRAGMA foreign_key_list", rows(Vec::new())),
        ("PRAGMA index_list", rows(Vec::new())),
    ]
}

/// The §8 SQLite property, once per raw shape the driver might produce.
async fn assert_sqlite_table_introspects(table_info: RawResultShape, expected_shape: &str) {
    let conn = ScriptedConnection::new(sqlite_script(table_info));
    let report = introspect_schema(&conn, Dialect::Sqlite, IntrospectOptions::default()).await;

    assert_eq!(report.schema.tables.len(), 1);
    let table = &report.schema.tables[0];
    assert_eq!(table.name, "t");
    assert_eq!(table.columns.len(), 2);
    assert_eq!(table.columns[0].name, "id");
    assert!(table.columns[0].is_primary_key);
    assert!(!table.columns[0].nullable);
    assert_eq!(table.columns[1].name, "name");
    assert!(!table.columns[1].is_primary_key);
    assert_eq!(table.primary_key, vec!["id".to_string()]);

    assert!(
        report
            .logs
            .iter()
            .any(|line| line.contains("PRAGMA table_info") && line.contains(expected_shape)),
        "logs should record the detected shape {expected_shape:?}: {:#?}",
        report.logs
    );
}

#[tokio::test]
async fn test_sqlite_primary_key_from_bare_rows() {
    assert_sqlite_table_introspects(
        RawResultShape::Rows {
            rows: sqlite_table_info_rows(),
        },
        "bare row array",
    )
    .await;
}

#[tokio::test]
async fn test_sqlite_primary_key_from_wrapped_rows() {
    assert_sqlite_table_introspects(
        RawResultShape::Wrapped {
            rows: sqlite_table_info_rows(),
        },
        "rows envelope",
    )
    .await;
}

#[tokio::test]
async fn test_sqlite_primary_key_from_nested_rows() {
    assert_sqlite_table_introspects(
        RawResultShape::Nested {
            batches: vec![sqlite_table_info_rows()],
        },
        "singly-nested row array",
    )
    .await;
}

#[tokio::test]
async fn test_failed_table_detail_is_logged_and_omitted() {
    let conn = ScriptedConnection::new(vec![
        (
            "type = 'table'",
            rows(vec![
                row(&[("name", json!("broken"))]),
                row(&[("name", json!("healthy"))]),
            ]),
        ),
        ("type = 'view'", rows(Vec::new())),
        (
            "PRAGMA table_info('broken')",
            Scripted::Fail("no such table: broken".to_string()),
        ),
        (
            "PRAGMA table_info('healthy')",
            rows(sqlite_table_info_rows()),
        ),
        ("PRAGMA foreign_key_list", rows(Vec::new())),
        ("PRAGMA index_list", rows(Vec::new())),
    ]);

    let report = introspect_schema(&conn, Dialect::Sqlite, IntrospectOptions::default()).await;

    assert_eq!(report.schema.tables.len(), 1);
    assert_eq!(report.schema.tables[0].name, "healthy");
    assert!(report
        .logs
        .iter()
        .any(|line| line.contains("broken") && line.contains("omitted")));
}

#[tokio::test]
async fn test_tables_are_ordered_by_name_regardless_of_catalog_order() {
    let conn = ScriptedConnection::new(vec![
        (
            "type = 'table'",
            rows(vec![
                row(&[("name", json!("zebra"))]),
                row(&[("name", json!("alpha"))]),
                row(&[("name", json!("middle"))]),
            ]),
        ),
        ("type = 'view'", rows(Vec::new())),
        ("PRAGMA table_info", rows(sqlite_table_info_rows())),
        ("PRAGMA foreign_key_list", rows(Vec::new())),
        ("PRAGMA index_list", rows(Vec::new())),
    ]);

    let report = introspect_schema(&conn, Dialect::Sqlite, IntrospectOptions::default()).await;
    let names: Vec<_> = report.schema.tables.iter().map(|t| t.name.as_str()).collect();
    assert_eq!(names, vec!["alpha", "middle", "zebra"]);
}

#[tokio::test]
async fn test_exhausted_budget_returns_partial_schema_with_warning() {
    let conn = ScriptedConnection::new(vec![
        (
            "type = 'table'",
            rows(vec![
                row(&[("name", json!("a"))]),
                row(&[("name", json!("b"))]),
            ]),
        ),
        ("type = 'view'", rows(Vec::new())),
        ("PRAGMA table_info", rows(sqlite_table_info_rows())),
    ]);

    let options = IntrospectOptions {
        budget: Duration::ZERO,
        table_concurrency: 2,
    };
    let report = introspect_schema(&conn, Dialect::Sqlite, options).await;

    // Both tables survive, but without column detail.
    assert_eq!(report.schema.tables.len(), 2);
    assert!(report.schema.tables.iter().all(|t| t.columns.is_empty()));
    assert!(report
        .logs
        .iter()
        .any(|line| line.contains("budget exhausted")));
}

#[tokio::test]
async fn test_postgres_assembles_keys_and_indexes() {
    let conn = ScriptedConnection::new(vec![
        (
            "FROM information_schema.tables",
            rows(vec![row(&[
                ("table_schema", json!("public")),
                ("table_name", json!("users")),
            ])]),
        ),
        (
            "FROM information_schema.views",
            rows(vec![row(&[
                ("table_schema", json!("public")),
                ("table_name", json!("active_users")),
                ("view_definition", json!("SELECT * FROM users WHERE active")),
            ])]),
        ),
        (
            "information_schema.columns",
            rows(vec![
                row(&[
                    ("column_name", json!("id")),
                    ("data_type", json!("integer")),
                    ("character_maximum_length", json!(null)),
                    ("is_nullable", json!("NO")),
                    ("column_default", json!("nextval('users_id_seq')")),
                ]),
                row(&[
                    ("column_name", json!("email")),
                    ("data_type", json!("character varying")),
                    ("character_maximum_length", json!(255)),
                    ("is_nullable", json!("YES")),
                    ("column_default", json!(null)),
                ]),
            ]),
        ),
        (
            "::regclass",
            rows(vec![row(&[("column_name", json!("id"))])]),
        ),
        (
            "FOREIGN KEY",
            rows(vec![row(&[
                ("column_name", json!("org_id")),
                ("referenced_table", json!("orgs")),
                ("referenced_column", json!("id")),
            ])]),
        ),
        (
            "pg_namespace",
            rows(vec![
                row(&[
                    ("index_name", json!("users_email_idx")),
                    ("is_unique", json!(true)),
                    ("column_name", json!("email")),
                ]),
                row(&[
                    ("index_name", json!("users_email_idx")),
                    ("is_unique", json!(true)),
                    ("column_name", json!("org_id")),
                ]),
            ]),
        ),
    ]);

    let report = introspect_schema(&conn, Dialect::Postgres, IntrospectOptions::default()).await;

    assert_eq!(report.schema.tables.len(), 1);
    let table = &report.schema.tables[0];
    assert_eq!(table.name, "users");
    assert_eq!(table.schema.as_deref(), Some("public"));
    assert_eq!(table.primary_key, vec!["id".to_string()]);
    assert!(table.columns[0].is_primary_key);
    assert_eq!(table.columns[1].data_type, "character varying(255)");
    assert_eq!(table.foreign_keys.len(), 1);
    assert_eq!(table.foreign_keys[0].referenced_table, "orgs");
    assert_eq!(table.indexes.len(), 1);
    assert_eq!(table.indexes[0].columns, vec!["email", "org_id"]);
    assert!(table.indexes[0].unique);

    assert_eq!(report.schema.views.len(), 1);
    assert_eq!(report.schema.views[0].name, "active_users");
}

#[tokio::test]
async fn test_mysql_describe_infers_primary_key() {
    let conn = ScriptedConnection::new(vec![
        (
            "information_schema.tables",
            rows(vec![
                row(&[
                    ("table_name", json!("orders")),
                    ("table_type", json!("BASE TABLE")),
                ]),
                row(&[
                    ("table_name", json!("order_totals")),
                    ("table_type", json!("VIEW")),
                ]),
            ]),
        ),
        (
            "DESCRIBE",
            rows(vec![
                row(&[
                    ("Field", json!("id")),
                    ("Type", json!("bigint unsigned")),
                    ("Null", json!("NO")),
                    ("Key", json!("PRI")),
                    ("Default", json!(null)),
                ]),
                row(&[
                    ("Field", json!("total")),
                    ("Type", json!("decimal(10,2)")),
                    ("Null", json!("YES")),
                    ("Key", json!("")),
                    ("Default", json!("0.00")),
                ]),
            ]),
        ),
    ]);

    let report = introspect_schema(&conn, Dialect::MySql, IntrospectOptions::default()).await;

    assert_eq!(report.schema.tables.len(), 1);
    let table = &report.schema.tables[0];
    assert_eq!(table.name, "orders");
    assert_eq!(table.primary_key, vec!["id".to_string()]);
    assert!(table.columns[0].is_primary_key);
    assert_eq!(table.columns[1].data_type, "decimal(10,2)");
    assert_eq!(table.columns[1].default_value.as_deref(), Some("0.00"));
    assert_eq!(report.schema.views.len(), 1);
    assert_eq!(report.schema.views[0].name, "order_totals");
}

#[tokio::test]
async fn test_mssql_has_no_key_detail_and_says_so() {
    let conn = ScriptedConnection::new(vec![
        (
            "FROM information_schema.tables",
            rows(vec![row(&[
                ("table_schema", json!("dbo")),
                ("table_name", json!("invoices")),
            ])]),
        ),
        ("FROM information_schema.views", rows(Vec::new())),
        (
            "information_schema.columns",
            rows(vec![row(&[
                ("column_name", json!("id")),
                ("data_type", json!("int")),
                ("character_maximum_length", json!(null)),
                ("is_nullable", json!("NO")),
                ("column_default", json!(null)),
            ])]),
        ),
        ("FOREIGN KEY", rows(Vec::new())),
    ]);

    let report = introspect_schema(&conn, Dialect::SqlServer, IntrospectOptions::default()).await;

    assert_eq!(report.schema.tables.len(), 1);
    let table = &report.schema.tables[0];
    assert!(table.primary_key.is_empty());
    assert!(table.indexes.is_empty());
    assert!(report
        .logs
        .iter()
        .any(|line| line.contains("not exposed via information_schema")));
}

#[tokio::test]
async fn test_generic_dialect_yields_empty_schema_not_error() {
    let conn = ScriptedConnection::new(Vec::new());
    let report = introspect_schema(&conn, Dialect::Generic, IntrospectOptions::default()).await;
    assert!(report.schema.is_empty());
    assert!(!report.logs.is_empty());
    // The generic strategy never touches the connection.
    assert!(conn.seen.lock().unwrap().is_empty());
}

#[tokio::test]
async fn test_failed_table_listing_yields_empty_schema_with_log() {
    let conn = ScriptedConnection::new(vec![(
        "sqlite_master",
        Scripted::Fail("database is locked".to_string()),
    )]);
    let report = introspect_schema(&conn, Dialect::Sqlite, IntrospectOptions::default()).await;
    assert!(report.schema.is_empty());
    assert!(report
        .logs
        .iter()
        .any(|line| line.contains("database is locked")));
}

mod helpers {
    use super::*;

    #[test]
    fn test_field_lookup_is_case_insensitive() {
        let row: RowObject = [("TABLE_NAME".to_string(), json!("users"))]
            .into_iter()
            .collect();
        assert_eq!(str_field(&row, "table_name").as_deref(), Some("users"));
        assert_eq!(str_field(&row, "TABLE_NAME").as_deref(), Some("users"));
        assert!(str_field(&row, "missing").is_none());
    }

    #[test]
    fn test_numeric_fields_accept_strings() {
        let row: RowObject = [("pk".to_string(), json!("2"))].into_iter().collect();
        assert_eq!(i64_field(&row, "pk"), Some(2));
    }

    #[test]
    fn test_bool_field_accepts_driver_spellings() {
        for (value, expected) in [
            (json!(true), true),
            (json!(1), true),
            (json!("YES"), true),
            (json!("f"), false),
            (json!(0), false),
        ] {
            let row: RowObject = [("u".to_string(), value)].into_iter().collect();
            assert_eq!(bool_field(&row, "u"), Some(expected), "row: {row:?}");
        }
    }

    #[test]
    fn test_rows_from_reports_shape() {
        let (_, shape) = rows_from(RawResultShape::Rows { rows: vec![] });
        assert_eq!(shape, "bare row array");
        let (unwrapped, shape) = rows_from(RawResultShape::Nested {
            batches: vec![vec![[("a".to_string(), json!(1))].into_iter().collect()]],
        });
        assert_eq!(shape, "singly-nested row array");
        assert_eq!(unwrapped.len(), 1);
    }

    #[test]
    fn test_sql_literal_escapes_quotes() {
        assert_eq!(sql_literal("o'brien"), "o''brien");
    }
}
