//! Best-effort SQL pretty-printing

use sqlformat::{FormatOptions, Indent, QueryParams};

/// Format SQL for display.
///
/// Uppercases keywords and indents with four spaces. Idempotent on
/// parseable input: formatting a formatted query again yields the same
/// string. Callers only invoke this after a successful parse; on garbage
/// input the formatter still returns a string, it is just not meaningful.
pub fn format_sql(sql: &str) -> String {
    let options = FormatOptions {
        indent: Indent::Spaces(4),
        uppercase: Some(true),
        lines_between_queries: 1,
        ..Default::default()
    };

    sqlformat::format(sql, &QueryParams::None, &options)
}
