//! Parser-backed validation with best-effort error positioning

use crate::{format_sql, scan_performance, scan_security};
use regex::Regex;
use serde::{Deserialize, Serialize};
use sqlparser::ast::Statement;
use sqlparser::parser::Parser;
use sqlscope_core::Dialect;
use std::sync::LazyLock;

/// Outcome of validating one SQL string. Ephemeral, never persisted.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ValidationResult {
    pub is_valid: bool,
    pub errors: Vec<SqlError>,
    pub warnings: Vec<SqlWarning>,
    /// Pretty-printed copy of the input, present only when parsing
    /// succeeded. A formatting failure never invalidates the query.
    pub formatted_sql: Option<String>,
}

/// A parse error with best-effort position information
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SqlError {
    pub message: String,
    /// 1-based line, when the parser's message carried one
    pub line: Option<u32>,
    /// 1-based column, when the parser's message carried one
    pub column: Option<u32>,
    /// Byte offset into the source, derived from line/column
    pub offset: Option<u32>,
}

/// An advisory warning. Never blocks execution.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SqlWarning {
    pub message: String,
    #[serde(rename = "type")]
    pub kind: WarningKind,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WarningKind {
    Performance,
    Security,
    Style,
}

/// sqlparser reports positions as `... at Line: 3, Column: 7`
static POSITION_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"Line:\s*(\d+),\s*Column:\s*(\d+)").expect("valid regex"));

/// Validate SQL under the given dialect.
///
/// On successful parse the result carries both scanners' advisory warnings
/// and a best-effort formatted copy. On parse failure it carries exactly one
/// error (no multi-error recovery) with the parser's message and whatever
/// position could be scraped from it.
pub fn validate(sql: &str, dialect: Dialect) -> ValidationResult {
    let parser_dialect = dialect.parser_dialect();
    match Parser::parse_sql(parser_dialect.as_ref(), sql) {
        Ok(statements) => {
            tracing::debug!(
                dialect = %dialect,
                statements = statements.len(),
                "SQL parsed successfully"
            );
            let mut warnings = scan_security(sql);
            warnings.extend(scan_performance(sql));
            ValidationResult {
                is_valid: true,
                errors: Vec::new(),
                warnings,
                formatted_sql: Some(format_sql(sql)),
            }
        }
        Err(e) => {
            let message = e.to_string();
            let (line, column) = extract_position(&message);
            let offset = offset_at(sql, line, column);
            tracing::debug!(dialect = %dialect, error = %message, "SQL failed to parse");
            ValidationResult {
                is_valid: false,
                errors: vec![SqlError {
                    message,
                    line,
                    column,
                    offset,
                }],
                warnings: Vec::new(),
                formatted_sql: None,
            }
        }
    }
}

/// Parse SQL into its statement list.
///
/// Structural consumers (table/column extraction, downstream analysis) use
/// this instead of an AST embedded in `ValidationResult`, which stays pure
/// JSON-serializable data.
pub fn parse_statements(sql: &str, dialect: Dialect) -> Option<Vec<Statement>> {
    let parser_dialect = dialect.parser_dialect();
    Parser::parse_sql(parser_dialect.as_ref(), sql).ok()
}

/// Scrape `Line: N, Column: M` out of a parser error message
fn extract_position(message: &str) -> (Option<u32>, Option<u32>) {
    match POSITION_RE.captures(message) {
        Some(caps) => {
            let line = caps.get(1).and_then(|m| m.as_str().parse().ok());
            let column = caps.get(2).and_then(|m| m.as_str().parse().ok());
            (line, column)
        }
        None => (None, None),
    }
}

/// Byte offset of a 1-based (line, column) position in the source
fn offset_at(sql: &str, line: Option<u32>, column: Option<u32>) -> Option<u32> {
    let line = line? as usize;
    let column = column? as usize;
    if line == 0 || column == 0 {
        return None;
    }

    let mut offset = 0usize;
    for (idx, text) in sql.split('\n').enumerate() {
        if idx + 1 == line {
            // Column is 1-based over characters; clamp to the line length.
            let col_bytes: usize = text
                .chars()
                .take(column - 1)
                .map(|c| c.len_utf8())
                .sum();
            return Some((offset + col_bytes.min(text.len())) as u32);
        }
        offset += text.len() + 1;
    }
    None
}
