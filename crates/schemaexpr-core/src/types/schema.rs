//! Read-only table snapshot consumed by the validators.
//!
//! The catalog owns the real table descriptor; validators only ever see a
//! [`TableSchema`] borrowed for the duration of one call.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Stable column identifier. Survives renames; never reused within a table.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, JsonSchema,
)]
#[serde(transparent)]
pub struct ColumnId(pub u32);

impl fmt::Display for ColumnId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u32> for ColumnId {
    fn from(id: u32) -> Self {
        Self(id)
    }
}

/// Lifecycle state of a column within a schema change.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema, Default)]
#[serde(rename_all = "lowercase")]
pub enum ColumnState {
    /// Visible, fully backfilled column.
    #[default]
    Public,
    /// Being added by the statement under validation.
    Adding,
    /// Being dropped; invisible to name resolution.
    Dropped,
}

/// Whether a computed column is materialized.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema, Default)]
#[serde(rename_all = "lowercase")]
pub enum ColumnStorage {
    /// Value written alongside the row.
    #[default]
    Stored,
    /// Value recomputed on read.
    Virtual,
}

/// Definition of a computed column as stored in the catalog.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct ComputedColumn {
    /// Dequalified expression text, as produced by a previous validation.
    pub expression: String,
    #[serde(default)]
    pub storage: ColumnStorage,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct ColumnDescriptor {
    pub id: ColumnId,
    pub name: String,
    /// Declared type as written in DDL (e.g. `VARCHAR(20)`)
    pub data_type: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub computed: Option<ComputedColumn>,
    #[serde(default)]
    pub state: ColumnState,
}

impl ColumnDescriptor {
    pub fn new(id: u32, name: impl Into<String>, data_type: impl Into<String>) -> Self {
        Self {
            id: ColumnId(id),
            name: name.into(),
            data_type: data_type.into(),
            computed: None,
            state: ColumnState::Public,
        }
    }

    /// Marks the column as computed from `expression`.
    pub fn computed(mut self, expression: impl Into<String>, storage: ColumnStorage) -> Self {
        self.computed = Some(ComputedColumn {
            expression: expression.into(),
            storage,
        });
        self
    }

    pub fn with_state(mut self, state: ColumnState) -> Self {
        self.state = state;
        self
    }

    pub fn is_computed(&self) -> bool {
        self.computed.is_some()
    }

    pub fn is_virtual(&self) -> bool {
        matches!(
            self.computed,
            Some(ComputedColumn {
                storage: ColumnStorage::Virtual,
                ..
            })
        )
    }

    /// Dropped columns cannot be referenced by new expressions.
    pub fn is_visible(&self) -> bool {
        self.state != ColumnState::Dropped
    }
}

/// Snapshot of a table's columns, in declaration order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct TableSchema {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub database: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub schema: Option<String>,
    pub name: String,
    #[serde(default)]
    pub columns: Vec<ColumnDescriptor>,
}

impl TableSchema {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            database: None,
            schema: None,
            name: name.into(),
            columns: Vec::new(),
        }
    }

    pub fn with_database(mut self, database: impl Into<String>) -> Self {
        self.database = Some(database.into());
        self
    }

    pub fn with_schema(mut self, schema: impl Into<String>) -> Self {
        self.schema = Some(schema.into());
        self
    }

    pub fn with_column(mut self, column: ColumnDescriptor) -> Self {
        self.columns.push(column);
        self
    }

    /// Loads a snapshot exported by the catalog as JSON.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    pub fn column(&self, id: ColumnId) -> Option<&ColumnDescriptor> {
        self.columns.iter().find(|c| c.id == id)
    }

    /// Position of a column in declaration order.
    pub fn position(&self, id: ColumnId) -> Option<usize> {
        self.columns.iter().position(|c| c.id == id)
    }

    pub fn visible_columns(&self) -> impl Iterator<Item = &ColumnDescriptor> {
        self.columns.iter().filter(|c| c.is_visible())
    }

    pub fn computed_columns(&self) -> impl Iterator<Item = &ColumnDescriptor> {
        self.visible_columns().filter(|c| c.is_computed())
    }

    /// Column name for diagnostics, falling back to the numeric id.
    pub(crate) fn column_label(&self, id: ColumnId) -> String {
        self.column(id)
            .map(|c| c.name.clone())
            .unwrap_or_else(|| format!("#{id}"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_table_schema_deserialization() {
        let json = r#"{
            "database": "shop",
            "name": "orders",
            "columns": [
                { "id": 1, "name": "qty", "dataType": "int" },
                { "id": 2, "name": "price", "dataType": "numeric(10, 2)" },
                {
                    "id": 3,
                    "name": "total",
                    "dataType": "numeric",
                    "computed": { "expression": "qty * price", "storage": "virtual" }
                },
                { "id": 4, "name": "legacy", "dataType": "text", "state": "dropped" }
            ]
        }"#;

        let table = TableSchema::from_json(json).unwrap();
        assert_eq!(table.database.as_deref(), Some("shop"));
        assert_eq!(table.columns.len(), 4);
        assert!(table.columns[2].is_virtual());
        assert!(!table.columns[3].is_visible());
        assert_eq!(table.visible_columns().count(), 3);
        assert_eq!(table.computed_columns().count(), 1);
    }

    #[test]
    fn test_column_id_serializes_transparently() {
        let json = serde_json::to_string(&ColumnId(7)).unwrap();
        assert_eq!(json, "7");
    }

    #[test]
    fn test_column_label_falls_back_to_id() {
        let table = TableSchema::new("t").with_column(ColumnDescriptor::new(1, "a", "int"));
        assert_eq!(table.column_label(ColumnId(1)), "a");
        assert_eq!(table.column_label(ColumnId(9)), "#9");
    }
}
