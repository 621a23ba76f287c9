//! Result shaping
//!
//! Collapses every `RawResultShape` variant to one `NormalizedResult` so
//! nothing downstream cares which driver family produced the rows.

use serde_json::Value;
use sqlscope_core::{ColumnMeta, FieldMeta, NormalizedResult, RawResultShape, RowObject};

/// Normalize a tagged driver result.
///
/// Bare, wrapped, and paired results with equivalent data normalize
/// identically. Columns derive from the first row's keys in result order;
/// for `Paired` the driver's field metadata wins where it names a type.
/// An empty result set yields empty columns with zero rows - distinct from
/// an execution error, which never reaches this function.
pub fn normalize_result(raw: RawResultShape) -> NormalizedResult {
    match raw {
        RawResultShape::Rows { rows } | RawResultShape::Wrapped { rows } => from_rows(rows),
        RawResultShape::Paired { rows, fields } => from_fields(rows, fields),
        RawResultShape::Nested { batches } => {
            from_rows(batches.into_iter().next().unwrap_or_default())
        }
    }
}

fn from_rows(rows: Vec<RowObject>) -> NormalizedResult {
    let columns = match rows.first() {
        Some(first) => first
            .iter()
            .map(|(name, value)| ColumnMeta {
                name: name.clone(),
                data_type: infer_type(value).to_string(),
            })
            .collect(),
        None => Vec::new(),
    };
    NormalizedResult { columns, rows }
}

fn from_fields(rows: Vec<RowObject>, fields: Vec<FieldMeta>) -> NormalizedResult {
    let first = rows.first();
    let columns = fields
        .into_iter()
        .map(|field| {
            let data_type = field.data_type.unwrap_or_else(|| {
                first
                    .and_then(|row| row.get(&field.name))
                    .map(|v| infer_type(v).to_string())
                    .unwrap_or_else(|| "unknown".to_string())
            });
            ColumnMeta {
                name: field.name,
                data_type,
            }
        })
        .collect();
    NormalizedResult { columns, rows }
}

/// Infer a coarse type name from a JSON value when the driver reported none
fn infer_type(value: &Value) -> &'static str {
    match value {
        Value::Null => "unknown",
        Value::Bool(_) => "boolean",
        Value::Number(n) if n.is_i64() || n.is_u64() => "integer",
        Value::Number(_) => "float",
        Value::String(_) => "text",
        Value::Array(_) | Value::Object(_) => "json",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn row(pairs: &[(&str, Value)]) -> RowObject {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.clone()))
            .collect()
    }

    fn sample_rows() -> Vec<RowObject> {
        vec![
            row(&[("id", json!(1)), ("name", json!("ada"))]),
            row(&[("id", json!(2)), ("name", json!("grace"))]),
        ]
    }

    #[test]
    fn test_three_shapes_normalize_identically() {
        let bare = normalize_result(RawResultShape::Rows { rows: sample_rows() });
        let wrapped = normalize_result(RawResultShape::Wrapped { rows: sample_rows() });
        let paired = normalize_result(RawResultShape::Paired {
            rows: sample_rows(),
            fields: vec![
                FieldMeta {
                    name: "id".to_string(),
                    data_type: None,
                },
                FieldMeta {
                    name: "name".to_string(),
                    data_type: None,
                },
            ],
        });

        assert_eq!(bare, wrapped);
        assert_eq!(bare, paired);
        assert_eq!(bare.row_count(), 2);
        assert_eq!(
            bare.columns.iter().map(|c| c.name.as_str()).collect::<Vec<_>>(),
            vec!["id", "name"]
        );
    }

    #[test]
    fn test_paired_field_types_win() {
        let result = normalize_result(RawResultShape::Paired {
            rows: sample_rows(),
            fields: vec![
                FieldMeta {
                    name: "id".to_string(),
                    data_type: Some("bigint".to_string()),
                },
                FieldMeta {
                    name: "name".to_string(),
                    data_type: Some("varchar(64)".to_string()),
                },
            ],
        });
        assert_eq!(result.columns[0].data_type, "bigint");
        assert_eq!(result.columns[1].data_type, "varchar(64)");
    }

    #[test]
    fn test_nested_shape_flattens_first_batch() {
        let result = normalize_result(RawResultShape::Nested {
            batches: vec![sample_rows()],
        });
        assert_eq!(result.row_count(), 2);
        assert_eq!(result.columns.len(), 2);
    }

    #[test]
    fn test_empty_result_has_no_columns_and_zero_rows() {
        let result = normalize_result(RawResultShape::Rows { rows: Vec::new() });
        assert_eq!(result.row_count(), 0);
        assert!(result.columns.is_empty());
    }

    #[test]
    fn test_type_inference() {
        let result = normalize_result(RawResultShape::Rows {
            rows: vec![row(&[
                ("i", json!(1)),
                ("f", json!(1.5)),
                ("s", json!("x")),
                ("b", json!(true)),
                ("j", json!({"k": 1})),
                ("n", json!(null)),
            ])],
        });
        let types: Vec<_> = result
            .columns
            .iter()
            .map(|c| c.data_type.as_str())
            .collect();
        assert_eq!(types, vec!["integer", "float", "text", "boolean", "json", "unknown"]);
    }
}
