//! Normalized schema model
//!
//! Every introspection strategy returns this same shape regardless of how
//! much detail its engine's catalog exposes. Absent detail is an empty
//! collection, never an Option, so callers need no per-dialect branching.

use serde::{Deserialize, Serialize};

/// Normalized schema of one data source: tables and views, rebuilt fresh on
/// each introspection call
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SchemaInfo {
    pub tables: Vec<TableInfo>,
    pub views: Vec<ViewInfo>,
}

/// Table with its columns and whatever key/index detail the engine exposed
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TableInfo {
    pub name: String,
    pub schema: Option<String>,
    pub columns: Vec<ColumnSchema>,
    /// Primary key column names, in key order. Empty when the engine's
    /// catalog does not expose the key (e.g. MSSQL here) or the table has
    /// none.
    #[serde(default)]
    pub primary_key: Vec<String>,
    #[serde(default)]
    pub foreign_keys: Vec<ForeignKeyInfo>,
    #[serde(default)]
    pub indexes: Vec<IndexInfo>,
}

impl TableInfo {
    /// Table with name and columns only; key/index detail defaults empty
    pub fn new(name: impl Into<String>, schema: Option<String>) -> Self {
        Self {
            name: name.into(),
            schema,
            columns: Vec::new(),
            primary_key: Vec::new(),
            foreign_keys: Vec::new(),
            indexes: Vec::new(),
        }
    }
}

/// View information
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ViewInfo {
    pub name: String,
    pub schema: Option<String>,
    pub definition: Option<String>,
}

/// Column information
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ColumnSchema {
    pub name: String,
    /// Engine-native type, possibly parameterized (e.g. `varchar(255)`)
    pub data_type: String,
    pub nullable: bool,
    pub default_value: Option<String>,
    #[serde(default)]
    pub is_primary_key: bool,
}

/// Foreign key information (single-column granularity)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ForeignKeyInfo {
    pub column: String,
    pub referenced_table: String,
    pub referenced_column: String,
}

/// Index information
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IndexInfo {
    pub name: String,
    pub columns: Vec<String>,
    pub unique: bool,
}

impl SchemaInfo {
    /// Enforce the catalog invariants: tables and views unique by
    /// `(schema, name)`, ordered by `(schema, name)` so output is
    /// deterministic regardless of catalog or completion order.
    pub fn dedup_and_sort(&mut self) {
        self.tables
            .sort_by(|a, b| (&a.schema, &a.name).cmp(&(&b.schema, &b.name)));
        self.tables
            .dedup_by(|a, b| a.schema == b.schema && a.name == b.name);
        self.views
            .sort_by(|a, b| (&a.schema, &a.name).cmp(&(&b.schema, &b.name)));
        self.views
            .dedup_by(|a, b| a.schema == b.schema && a.name == b.name);
    }

    pub fn is_empty(&self) -> bool {
        self.tables.is_empty() && self.views.is_empty()
    }
}
