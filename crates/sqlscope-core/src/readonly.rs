//! Read-only classification
//!
//! This is the only hard execution gate in the system. It is a pure
//! allow-list over the first keyword of the statement: no parser, no
//! dependencies, so its reliability does not hinge on grammar coverage.
//! Everything else (the scanners) is advisory.

/// Statement prefixes allowed through the ad-hoc query path
const READ_ONLY_PREFIXES: [&str; 5] = ["SELECT", "WITH", "EXPLAIN", "SHOW", "DESCRIBE"];

/// Check whether a statement is read-only.
///
/// True iff the trimmed, uppercased statement starts with SELECT, WITH,
/// EXPLAIN, SHOW, or DESCRIBE.
///
/// Known gap: on engines with writable CTEs, a `WITH x AS (DELETE ...
/// RETURNING *) SELECT * FROM x` lexically passes while mutating data. The
/// check deliberately stays lexical; callers on such engines accept that
/// residual risk.
pub fn is_read_only_query(sql: &str) -> bool {
    let trimmed = sql.trim_start().to_uppercase();
    READ_ONLY_PREFIXES
        .iter()
        .any(|prefix| starts_with_keyword(&trimmed, prefix))
}

/// Prefix match that refuses to match inside a longer word, so that e.g.
/// `SHOWCASE_REPORT()` does not pass as `SHOW`.
fn starts_with_keyword(upper_sql: &str, keyword: &str) -> bool {
    match upper_sql.strip_prefix(keyword) {
        Some(rest) => rest
            .chars()
            .next()
            .map(|c| !c.is_alphanumeric() && c != '_')
            .unwrap_or(true),
        None => false,
    }
}
