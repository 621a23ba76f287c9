//! Security scanner
//!
//! Regex heuristics over the raw SQL text. Advisory only and dialect-blind;
//! the hard execution boundary is `sqlscope_core::is_read_only_query`, not
//! this scanner. A hit here renders as a warning in the editor, it never
//! blocks anything.

use crate::{SqlWarning, WarningKind};
use regex::Regex;
use std::sync::LazyLock;

static DROP_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\bDROP\s+(TABLE|DATABASE|INDEX|VIEW)\b").expect("valid regex")
});

static TRUNCATE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\bTRUNCATE\b").expect("valid regex"));

static DELETE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\bDELETE\s+FROM\b").expect("valid regex"));

static UPDATE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\bUPDATE\s+\S+\s+SET\b").expect("valid regex"));

static WHERE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\bWHERE\b").expect("valid regex"));

/// `';--` quote-then-comment sequence
static QUOTE_COMMENT_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"';\s*--").expect("valid regex"));

/// `' OR '1'='1` style quoted tautology
static TAUTOLOGY_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)'\s*OR\s+'[^']*'\s*=\s*'").expect("valid regex")
});

/// Scan SQL for destructive statements and classic injection markers.
pub fn scan_security(sql: &str) -> Vec<SqlWarning> {
    let mut warnings = Vec::new();

    if let Some(caps) = DROP_RE.captures(sql) {
        let object = caps.get(1).map(|m| m.as_str().to_uppercase());
        warnings.push(security(format!(
            "DROP {} permanently removes the object and its data",
            object.as_deref().unwrap_or("OBJECT")
        )));
    }

    if TRUNCATE_RE.is_match(sql) {
        warnings.push(security(
            "TRUNCATE removes all rows and cannot be filtered".to_string(),
        ));
    }

    let has_where = WHERE_RE.is_match(sql);

    if DELETE_RE.is_match(sql) && !has_where {
        warnings.push(security(
            "DELETE without WHERE clause affects every row in the table".to_string(),
        ));
    }

    if UPDATE_RE.is_match(sql) && !has_where {
        warnings.push(security(
            "UPDATE without WHERE clause modifies every row in the table".to_string(),
        ));
    }

    if QUOTE_COMMENT_RE.is_match(sql) {
        warnings.push(security(
            "Possible SQL injection pattern: quote followed by comment ('; --)".to_string(),
        ));
    }

    if TAUTOLOGY_RE.is_match(sql) {
        warnings.push(security(
            "Possible SQL injection pattern: quoted tautology (' OR '1'='1')".to_string(),
        ));
    }

    warnings
}

fn security(message: String) -> SqlWarning {
    SqlWarning {
        message,
        kind: WarningKind::Security,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn messages(sql: &str) -> Vec<String> {
        scan_security(sql).into_iter().map(|w| w.message).collect()
    }

    #[test]
    fn test_drop_variants_warn() {
        assert!(messages("DROP TABLE users")[0].contains("DROP TABLE"));
        assert!(messages("drop database prod")[0].contains("DROP DATABASE"));
        assert!(messages("DROP INDEX idx_users")[0].contains("DROP INDEX"));
        assert!(messages("DROP VIEW v")[0].contains("DROP VIEW"));
    }

    #[test]
    fn test_truncate_warns() {
        assert!(!messages("TRUNCATE TABLE audit_log").is_empty());
    }

    #[test]
    fn test_delete_without_where_warns() {
        let msgs = messages("DELETE FROM users");
        assert!(msgs.iter().any(|m| m.contains("without WHERE")));
    }

    #[test]
    fn test_delete_with_where_is_clean() {
        assert!(messages("DELETE FROM users WHERE id = 1").is_empty());
    }

    #[test]
    fn test_update_without_where_warns() {
        let msgs = messages("UPDATE users SET active = false");
        assert!(msgs.iter().any(|m| m.contains("without WHERE")));
    }

    #[test]
    fn test_injection_markers_warn() {
        assert!(messages("SELECT * FROM t WHERE name = 'x'; -- '")
            .iter()
            .any(|m| m.contains("injection")));
        assert!(messages("SELECT * FROM t WHERE a = '' OR '1'='1'")
            .iter()
            .any(|m| m.contains("tautology")));
    }

    #[test]
    fn test_plain_select_is_clean() {
        assert!(messages("SELECT id FROM users WHERE id = 1").is_empty());
    }

    #[test]
    fn test_all_warnings_are_security_kind() {
        for warning in scan_security("DROP TABLE t; TRUNCATE u; DELETE FROM v") {
            assert_eq!(warning.kind, WarningKind::Security);
        }
    }
}
