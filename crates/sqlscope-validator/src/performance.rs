//! Performance scanner
//!
//! Advisory heuristics for query patterns that tend to hurt on large tables.
//! Like the security scanner this is regex-level and dialect-blind.

use crate::{SqlWarning, WarningKind};
use regex::Regex;
use std::sync::LazyLock;

static SELECT_STAR_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\bSELECT\s+\*").expect("valid regex"));

static STARTS_WITH_SELECT_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?is)^\s*SELECT\b").expect("valid regex"));

static LIMIT_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\bLIMIT\s+\d+").expect("valid regex"));

static TOP_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\bTOP\s*\(?\s*\d+").expect("valid regex"));

static LEADING_WILDCARD_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\bLIKE\s+'%").expect("valid regex"));

static OR_IN_WHERE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?is)\bWHERE\b.*?\bOR\b").expect("valid regex"));

/// Function call wrapping something inside a WHERE clause
static FUNCTION_IN_WHERE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?is)\bWHERE\b.*?\b(UPPER|LOWER|TRIM|SUBSTRING|CAST|CONVERT)\s*\(")
        .expect("valid regex")
});

/// Scan SQL for patterns that commonly cause slow queries.
pub fn scan_performance(sql: &str) -> Vec<SqlWarning> {
    let mut warnings = Vec::new();

    if SELECT_STAR_RE.is_match(sql) {
        warnings.push(performance(
            "SELECT * fetches every column; select only the columns you need".to_string(),
        ));
    }

    if STARTS_WITH_SELECT_RE.is_match(sql) && !LIMIT_RE.is_match(sql) && !TOP_RE.is_match(sql) {
        warnings.push(performance(
            "SELECT without LIMIT or TOP may return an unbounded result set".to_string(),
        ));
    }

    if LEADING_WILDCARD_RE.is_match(sql) {
        warnings.push(performance(
            "Leading-wildcard LIKE '%...' cannot use an index".to_string(),
        ));
    }

    if OR_IN_WHERE_RE.is_match(sql) {
        warnings.push(performance(
            "OR in WHERE may prevent index use; consider IN or UNION".to_string(),
        ));
    }

    if let Some(caps) = FUNCTION_IN_WHERE_RE.captures(sql) {
        let function = caps
            .get(1)
            .map(|m| m.as_str().to_uppercase())
            .unwrap_or_default();
        warnings.push(performance(format!(
            "{function}() on a column inside WHERE defeats index use"
        )));
    }

    warnings
}

fn performance(message: String) -> SqlWarning {
    SqlWarning {
        message,
        kind: WarningKind::Performance,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn messages(sql: &str) -> Vec<String> {
        scan_performance(sql)
            .into_iter()
            .map(|w| w.message)
            .collect()
    }

    #[test]
    fn test_select_star_warns() {
        assert!(messages("SELECT * FROM users LIMIT 10")
            .iter()
            .any(|m| m.contains("SELECT *")));
    }

    #[test]
    fn test_select_without_limit_warns() {
        assert!(messages("SELECT id FROM users")
            .iter()
            .any(|m| m.contains("unbounded")));
    }

    #[test]
    fn test_limit_and_top_suppress_unbounded_warning() {
        assert!(!messages("SELECT id FROM users LIMIT 10")
            .iter()
            .any(|m| m.contains("unbounded")));
        assert!(!messages("SELECT TOP 10 id FROM users")
            .iter()
            .any(|m| m.contains("unbounded")));
    }

    #[test]
    fn test_leading_wildcard_warns() {
        assert!(messages("SELECT id FROM t WHERE name LIKE '%son' LIMIT 5")
            .iter()
            .any(|m| m.contains("Leading-wildcard")));
    }

    #[test]
    fn test_or_in_where_warns() {
        assert!(messages("SELECT id FROM t WHERE a = 1 OR b = 2 LIMIT 5")
            .iter()
            .any(|m| m.contains("OR in WHERE")));
    }

    #[test]
    fn test_function_on_column_in_where_warns() {
        let msgs = messages("SELECT id FROM t WHERE UPPER(name) = 'BOB' LIMIT 5");
        assert!(msgs.iter().any(|m| m.contains("UPPER()")));
    }

    #[test]
    fn test_order_by_does_not_trip_or_heuristic() {
        assert!(!messages("SELECT id FROM t WHERE a = 1 ORDER BY id LIMIT 5")
            .iter()
            .any(|m| m.contains("OR in WHERE")));
    }

    #[test]
    fn test_tight_query_is_clean() {
        assert!(messages("SELECT id, name FROM users WHERE id = 1 LIMIT 10").is_empty());
    }
}
