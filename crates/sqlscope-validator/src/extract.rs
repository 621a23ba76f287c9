//! Best-effort structural extraction
//!
//! Pulls table and column names out of a statement for autocomplete and
//! browsing. These helpers never fail: unparseable SQL yields an empty list.

use sqlparser::ast::{
    Expr, FromTable, Query, Select, SelectItem, SetExpr, Statement, TableFactor, TableWithJoins,
};
use sqlscope_core::Dialect;

use crate::parse_statements;

/// Extract referenced table names from SQL.
///
/// Covers FROM/JOIN chains, set operations, CTE bodies, and the targets of
/// INSERT/UPDATE/DELETE. Names keep whatever qualification the query used.
pub fn extract_tables(sql: &str, dialect: Dialect) -> Vec<String> {
    let Some(statements) = parse_statements(sql, dialect) else {
        return Vec::new();
    };

    let mut tables = Vec::new();
    for statement in &statements {
        collect_statement_tables(statement, &mut tables);
    }
    dedup_preserving_order(tables)
}

/// Extract projected column names from SQL.
///
/// Plain and aliased identifiers in select lists; compound identifiers keep
/// their terminal segment; wildcards are skipped.
pub fn extract_columns(sql: &str, dialect: Dialect) -> Vec<String> {
    let Some(statements) = parse_statements(sql, dialect) else {
        return Vec::new();
    };

    let mut columns = Vec::new();
    for statement in &statements {
        if let Statement::Query(query) = statement {
            collect_query_columns(query, &mut columns);
        }
    }
    dedup_preserving_order(columns)
}

fn collect_statement_tables(statement: &Statement, tables: &mut Vec<String>) {
    match statement {
        Statement::Query(query) => collect_query_tables(query, tables),
        Statement::Insert(insert) => tables.push(insert.table_name.to_string()),
        Statement::Update { table, from, .. } => {
            collect_table_with_joins(table, tables);
            if let Some(from) = from {
                collect_table_with_joins(from, tables);
            }
        }
        Statement::Delete(delete) => {
            let from_tables = match &delete.from {
                FromTable::WithFromKeyword(list) | FromTable::WithoutKeyword(list) => list,
            };
            for twj in from_tables {
                collect_table_with_joins(twj, tables);
            }
        }
        _ => {}
    }
}

fn collect_query_tables(query: &Query, tables: &mut Vec<String>) {
    if let Some(with) = &query.with {
        for cte in &with.cte_tables {
            collect_query_tables(&cte.query, tables);
        }
    }
    collect_set_expr_tables(&query.body, tables);
}

fn collect_set_expr_tables(body: &SetExpr, tables: &mut Vec<String>) {
    match body {
        SetExpr::Select(select) => {
            for twj in &select.from {
                collect_table_with_joins(twj, tables);
            }
        }
        SetExpr::Query(query) => collect_query_tables(query, tables),
        SetExpr::SetOperation { left, right, .. } => {
            collect_set_expr_tables(left, tables);
            collect_set_expr_tables(right, tables);
        }
        _ => {}
    }
}

fn collect_table_with_joins(twj: &TableWithJoins, tables: &mut Vec<String>) {
    collect_table_factor(&twj.relation, tables);
    for join in &twj.joins {
        collect_table_factor(&join.relation, tables);
    }
}

fn collect_table_factor(factor: &TableFactor, tables: &mut Vec<String>) {
    match factor {
        TableFactor::Table { name, .. } => tables.push(name.to_string()),
        TableFactor::Derived { subquery, .. } => collect_query_tables(subquery, tables),
        TableFactor::NestedJoin {
            table_with_joins, ..
        } => collect_table_with_joins(table_with_joins, tables),
        _ => {}
    }
}

fn collect_query_columns(query: &Query, columns: &mut Vec<String>) {
    if let Some(with) = &query.with {
        for cte in &with.cte_tables {
            collect_query_columns(&cte.query, columns);
        }
    }
    collect_set_expr_columns(&query.body, columns);
}

fn collect_set_expr_columns(body: &SetExpr, columns: &mut Vec<String>) {
    match body {
        SetExpr::Select(select) => collect_select_columns(select, columns),
        SetExpr::Query(query) => collect_query_columns(query, columns),
        SetExpr::SetOperation { left, right, .. } => {
            collect_set_expr_columns(left, columns);
            collect_set_expr_columns(right, columns);
        }
        _ => {}
    }
}

fn collect_select_columns(select: &Select, columns: &mut Vec<String>) {
    for item in &select.projection {
        match item {
            SelectItem::UnnamedExpr(expr) | SelectItem::ExprWithAlias { expr, .. } => {
                if let Some(name) = column_name(expr) {
                    columns.push(name);
                }
            }
            // Wildcards expand only against a live schema; skipped here
            SelectItem::Wildcard(_) | SelectItem::QualifiedWildcard(_, _) => {}
        }
    }
}

fn column_name(expr: &Expr) -> Option<String> {
    match expr {
        Expr::Identifier(ident) => Some(ident.value.clone()),
        Expr::CompoundIdentifier(parts) => parts.last().map(|p| p.value.clone()),
        _ => None,
    }
}

fn dedup_preserving_order(items: Vec<String>) -> Vec<String> {
    let mut seen = std::collections::HashSet::new();
    items
        .into_iter()
        .filter(|item| seen.insert(item.clone()))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_extract_tables_from_joins() {
        let tables = extract_tables(
            "SELECT u.id FROM users u JOIN orders o ON o.user_id = u.id",
            Dialect::Postgres,
        );
        assert_eq!(tables, vec!["users", "orders"]);
    }

    #[test]
    fn test_extract_tables_from_cte_and_union() {
        let tables = extract_tables(
            "WITH recent AS (SELECT * FROM events) \
             SELECT * FROM recent UNION ALL SELECT * FROM archive",
            Dialect::Postgres,
        );
        assert!(tables.contains(&"events".to_string()));
        assert!(tables.contains(&"archive".to_string()));
    }

    #[test]
    fn test_extract_tables_from_dml_targets() {
        assert_eq!(
            extract_tables("INSERT INTO audit (id) VALUES (1)", Dialect::Postgres),
            vec!["audit"]
        );
        assert_eq!(
            extract_tables("UPDATE users SET active = false WHERE id = 1", Dialect::Postgres),
            vec!["users"]
        );
        assert_eq!(
            extract_tables("DELETE FROM sessions WHERE expired", Dialect::Postgres),
            vec!["sessions"]
        );
    }

    #[test]
    fn test_extract_tables_on_garbage_returns_empty() {
        assert!(extract_tables("NOT REALLY ( SQL", Dialect::Postgres).is_empty());
    }

    #[test]
    fn test_extract_columns() {
        let columns = extract_columns(
            "SELECT id, u.name, email AS contact FROM users u",
            Dialect::Postgres,
        );
        assert_eq!(columns, vec!["id", "name", "email"]);
    }

    #[test]
    fn test_extract_columns_skips_wildcards() {
        assert!(extract_columns("SELECT * FROM users", Dialect::Postgres).is_empty());
    }

    #[test]
    fn test_extract_columns_on_garbage_returns_empty() {
        assert!(extract_columns("SELECT FROM FROM", Dialect::Postgres).is_empty());
    }

    #[test]
    fn test_duplicates_are_removed() {
        let tables = extract_tables(
            "SELECT a.id FROM t a JOIN t b ON a.id = b.id",
            Dialect::Postgres,
        );
        assert_eq!(tables, vec!["t"]);
    }
}
