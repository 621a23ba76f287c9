//! Server-side pagination rewriting
//!
//! Deliberately string-level: clamping and injecting LIMIT/OFFSET does not
//! warrant a full unparse/reprint per dialect. The scanner that locates
//! existing LIMIT/TOP/OFFSET tokens skips string literals, quoted
//! identifiers, and comments so a `LIMIT` inside a literal is never touched.

use serde::{Deserialize, Serialize};
use sqlscope_core::{Dialect, PaginationDirective};

/// Page-size policy, supplied explicitly by the caller
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct PageConfig {
    /// Hard ceiling on any page size; a user-embedded LIMIT may never
    /// exceed it
    pub max_page_size: u32,
    /// Page size applied when the caller requests none
    pub default_page_size: u32,
}

impl Default for PageConfig {
    fn default() -> Self {
        Self {
            max_page_size: 1000,
            default_page_size: 100,
        }
    }
}

/// A pagination keyword found outside literals and comments
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum PageKeyword {
    Limit,
    Top,
    Offset,
}

#[derive(Debug, Clone)]
struct PageToken {
    keyword: PageKeyword,
    /// Span of the numeric argument, when one follows the keyword
    value_span: Option<(usize, usize)>,
    value: Option<u64>,
}

/// Rewrite SQL so its result set is bounded and paged server-side.
///
/// `effective_limit = clamp(requested, 1, max_page_size)`. Rules in order:
/// no LIMIT/TOP present → append `LIMIT n OFFSET m` (stripping one trailing
/// semicolon); LIMIT present without OFFSET and a positive offset requested
/// → append `OFFSET m`; an embedded LIMIT above policy → its value is
/// replaced. Idempotent: rewriting an already-rewritten query with the same
/// inputs changes nothing.
///
/// Returns the rewritten SQL and the resolved directive.
pub fn rewrite_with_pagination(
    sql: &str,
    requested_limit: Option<u32>,
    offset: u64,
    dialect: Dialect,
    config: &PageConfig,
) -> (String, PaginationDirective) {
    let effective_limit = requested_limit
        .unwrap_or(config.default_page_size)
        .clamp(1, config.max_page_size.max(1));

    let (tokens, _) = scan_page_tokens(sql);
    let has_limit = tokens.iter().any(|t| t.keyword == PageKeyword::Limit);
    let has_top = tokens.iter().any(|t| t.keyword == PageKeyword::Top);
    let limit_token = tokens
        .iter()
        .find(|t| t.keyword == PageKeyword::Limit && t.value.is_some());
    let top_token = tokens
        .iter()
        .find(|t| t.keyword == PageKeyword::Top && t.value.is_some());
    let offset_token = tokens.iter().find(|t| t.keyword == PageKeyword::Offset);

    let (rewritten, resolved_limit, resolved_offset) = if !has_limit && !has_top {
        let base = strip_trailing_semicolon(sql);
        let joiner = append_joiner(&base);
        (
            format!("{base}{joiner}LIMIT {effective_limit} OFFSET {offset}"),
            effective_limit,
            offset,
        )
    } else if has_limit {
        let mut rewritten = sql.to_string();
        let mut resolved_limit = effective_limit;

        if let Some(limit) = limit_token {
            let embedded = limit.value.expect("limit token carries a value");
            if embedded > effective_limit as u64 {
                let (start, end) = limit.value_span.expect("limit token carries a span");
                rewritten.replace_range(start..end, &effective_limit.to_string());
                tracing::debug!(
                    embedded,
                    effective_limit,
                    "clamped user-embedded LIMIT to policy"
                );
            }
            resolved_limit = (embedded.min(effective_limit as u64)).max(1) as u32;
        }

        let resolved_offset = match offset_token.and_then(|t| t.value) {
            Some(embedded_offset) => embedded_offset,
            None if offset > 0 => {
                let base = strip_trailing_semicolon(&rewritten);
                let joiner = append_joiner(&base);
                rewritten = format!("{base}{joiner}OFFSET {offset}");
                offset
            }
            None => 0,
        };
        (rewritten, resolved_limit, resolved_offset)
    } else {
        // TOP already bounds the set; T-SQL OFFSET needs ORDER BY, so the
        // statement is left untouched and only the directive is clamped.
        let embedded = top_token.and_then(|t| t.value).unwrap_or(effective_limit as u64);
        tracing::debug!(dialect = %dialect, embedded, "statement uses TOP, leaving SQL unchanged");
        (
            sql.to_string(),
            (embedded.min(effective_limit as u64)).max(1) as u32,
            offset_token.and_then(|t| t.value).unwrap_or(0),
        )
    };

    let directive = PaginationDirective {
        limit: resolved_limit,
        offset: resolved_offset,
        server_side: true,
    };
    (rewritten, directive)
}

fn strip_trailing_semicolon(sql: &str) -> String {
    let trimmed = sql.trim_end();
    trimmed
        .strip_suffix(';')
        .map(|s| s.trim_end())
        .unwrap_or(trimmed)
        .to_string()
}

/// A clause appended to `base` must not land inside a trailing `--` comment;
/// when it would, join with a newline instead of a space.
fn append_joiner(base: &str) -> &'static str {
    let (_, tail_commented) = scan_page_tokens(base);
    if tail_commented { "\n" } else { " " }
}

/// Find LIMIT/TOP/OFFSET keywords outside string literals, quoted
/// identifiers, and comments, along with the numeric argument following
/// each (if any). The second return says whether the string ends inside a
/// `--` line comment (appending there needs a newline first).
fn scan_page_tokens(sql: &str) -> (Vec<PageToken>, bool) {
    let bytes = sql.as_bytes();
    let mut tokens = Vec::new();
    let mut tail_commented = false;
    let mut i = 0;

    while i < bytes.len() {
        match bytes[i] {
            // String literal with '' escapes
            b'\'' => i = skip_quoted(bytes, i, b'\''),
            // Quoted identifiers: standard, MySQL, T-SQL
            b'"' => i = skip_quoted(bytes, i, b'"'),
            b'`' => i = skip_quoted(bytes, i, b'`'),
            b'[' => {
                i += 1;
                while i < bytes.len() && bytes[i] != b']' {
                    i += 1;
                }
                i += 1;
            }
            b'-' if bytes.get(i + 1) == Some(&b'-') => {
                while i < bytes.len() && bytes[i] != b'\n' {
                    i += 1;
                }
                tail_commented = i >= bytes.len();
            }
            b'/' if bytes.get(i + 1) == Some(&b'*') => {
                i += 2;
                while i + 1 < bytes.len() && !(bytes[i] == b'*' && bytes[i + 1] == b'/') {
                    i += 1;
                }
                i = (i + 2).min(bytes.len());
            }
            c if c.is_ascii_alphabetic() || c == b'_' => {
                let start = i;
                while i < bytes.len()
                    && (bytes[i].is_ascii_alphanumeric() || bytes[i] == b'_')
                {
                    i += 1;
                }
                let word = &sql[start..i];
                let keyword = match word.to_ascii_uppercase().as_str() {
                    "LIMIT" => Some(PageKeyword::Limit),
                    "TOP" => Some(PageKeyword::Top),
                    "OFFSET" => Some(PageKeyword::Offset),
                    _ => None,
                };
                if let Some(keyword) = keyword {
                    let (value_span, value) = number_after(sql, i);
                    tokens.push(PageToken {
                        keyword,
                        value_span,
                        value,
                    });
                }
            }
            _ => i += 1,
        }
    }

    (tokens, tail_commented)
}

fn skip_quoted(bytes: &[u8], start: usize, quote: u8) -> usize {
    let mut i = start + 1;
    while i < bytes.len() {
        if bytes[i] == quote {
            // Doubled quote is an escape
            if bytes.get(i + 1) == Some(&quote) {
                i += 2;
                continue;
            }
            return i + 1;
        }
        i += 1;
    }
    i
}

/// Parse the number following a keyword, skipping whitespace and one
/// optional opening parenthesis (T-SQL `TOP (n)`).
fn number_after(sql: &str, from: usize) -> (Option<(usize, usize)>, Option<u64>) {
    let bytes = sql.as_bytes();
    let mut i = from;
    while i < bytes.len() && bytes[i].is_ascii_whitespace() {
        i += 1;
    }
    if i < bytes.len() && bytes[i] == b'(' {
        i += 1;
        while i < bytes.len() && bytes[i].is_ascii_whitespace() {
            i += 1;
        }
    }
    let start = i;
    while i < bytes.len() && bytes[i].is_ascii_digit() {
        i += 1;
    }
    if i == start {
        return (None, None);
    }
    match sql[start..i].parse::<u64>() {
        Ok(value) => (Some((start, i)), Some(value)),
        Err(_) => (None, None),
    }
}
