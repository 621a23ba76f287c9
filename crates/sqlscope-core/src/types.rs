//! Core result types for sqlscope
//!
//! Raw driver results arrive in one of a few shapes depending on the driver
//! family; `RawResultShape` makes that explicit so everything downstream of
//! the connection boundary consumes one tagged union instead of sniffing.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A single result row as the driver adapter hands it over: column name to
/// JSON value, in result-set order.
pub type RowObject = serde_json::Map<String, Value>;

/// Column metadata reported by drivers that return field descriptors
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldMeta {
    pub name: String,
    /// Engine-native type name, when the driver reports one
    #[serde(default)]
    pub data_type: Option<String>,
}

/// The raw result shapes a connection adapter may produce.
///
/// Drivers disagree on how a result set is wrapped: some return a bare array
/// of row objects, Postgres-style drivers wrap it in `{rows: [...]}`,
/// MySQL-style drivers return a `[rows, fields]` pair, and misbehaving
/// adapters occasionally hand back a singly nested array. The per-driver
/// adapter at the connection-manager boundary tags the shape; the result
/// shaper normalizes all of them to the same `NormalizedResult`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "shape", rename_all = "snake_case")]
pub enum RawResultShape {
    /// Bare array of row objects
    Rows { rows: Vec<RowObject> },
    /// Postgres-style `{rows: [...]}` envelope
    Wrapped { rows: Vec<RowObject> },
    /// MySQL-style `[rows, fields]` pair
    Paired {
        rows: Vec<RowObject>,
        fields: Vec<FieldMeta>,
    },
    /// Singly nested array of row arrays
    Nested { batches: Vec<Vec<RowObject>> },
}

/// Column descriptor in a normalized result
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnMeta {
    pub name: String,
    /// Engine-native or inferred type name
    pub data_type: String,
}

/// A driver result normalized to one shape
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct NormalizedResult {
    pub columns: Vec<ColumnMeta>,
    pub rows: Vec<RowObject>,
}

impl NormalizedResult {
    /// Empty result set. Distinct from an execution error: zero rows with
    /// zero columns and no error attached.
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn row_count(&self) -> usize {
        self.rows.len()
    }
}

/// Resolved server-side pagination applied to a query
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaginationDirective {
    /// Effective page size, always within `1..=max_page_size`
    pub limit: u32,
    pub offset: u64,
    /// Always true: paging happens in the rewritten SQL, never client-side
    pub server_side: bool,
}

/// Outcome of executing one ad-hoc query
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExecutionOutcome {
    pub columns: Vec<ColumnMeta>,
    pub rows: Vec<RowObject>,
    pub row_count: usize,
    pub execution_time_ms: u64,
    /// Whether the result was cut off at the page limit
    pub truncated: bool,
    pub pagination: PaginationDirective,
    /// Whether another page is likely available (the page filled up)
    pub has_more: bool,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn row(pairs: &[(&str, Value)]) -> RowObject {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.clone()))
            .collect()
    }

    #[test]
    fn test_empty_result_is_distinct_from_error() {
        let result = NormalizedResult::empty();
        assert_eq!(result.row_count(), 0);
        assert!(result.columns.is_empty());
    }

    #[test]
    fn test_raw_shape_round_trips_through_json() {
        let shape = RawResultShape::Paired {
            rows: vec![row(&[("id", json!(1))])],
            fields: vec![FieldMeta {
                name: "id".to_string(),
                data_type: Some("int".to_string()),
            }],
        };
        let text = serde_json::to_string(&shape).expect("serialize");
        let back: RawResultShape = serde_json::from_str(&text).expect("deserialize");
        assert_eq!(back, shape);
    }
}
