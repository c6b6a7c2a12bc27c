//! Test utilities for loading fixtures and building sample tables.

use std::path::PathBuf;

use sqlparser::ast::Expr;

use crate::types::{ColumnDescriptor, ColumnState, ColumnStorage, TableSchema};

/// Get the path to the test fixtures directory
pub fn fixtures_dir() -> PathBuf {
    let manifest_dir = std::env::var("CARGO_MANIFEST_DIR").unwrap_or_else(|_| ".".to_string());
    PathBuf::from(manifest_dir).join("tests").join("fixtures")
}

/// Load a table snapshot JSON fixture by name
pub fn load_schema_fixture(name: &str) -> TableSchema {
    let path = fixtures_dir().join("schemas").join(name);
    let content = std::fs::read_to_string(&path)
        .unwrap_or_else(|e| panic!("Failed to load schema {path:?}: {e}"));
    TableSchema::from_json(&content)
        .unwrap_or_else(|e| panic!("Failed to parse schema {path:?}: {e}"))
}

/// Parse an expression with the generic dialect, panicking on failure
pub fn expr(sql: &str) -> Expr {
    crate::parser::parse_expr(sql).unwrap_or_else(|e| panic!("Failed to parse {sql:?}: {e}"))
}

/// `shop.orders`: plain columns, a stored and a virtual computed column, and a
/// dropped column.
pub fn orders_table() -> TableSchema {
    TableSchema::new("orders")
        .with_database("shop")
        .with_column(ColumnDescriptor::new(1, "id", "bigint"))
        .with_column(ColumnDescriptor::new(2, "qty", "int"))
        .with_column(ColumnDescriptor::new(3, "price", "numeric(10, 2)"))
        .with_column(ColumnDescriptor::new(4, "status", "varchar(16)"))
        .with_column(ColumnDescriptor::new(5, "placed_at", "timestamp"))
        .with_column(
            ColumnDescriptor::new(6, "total", "numeric").computed("qty * price", ColumnStorage::Stored),
        )
        .with_column(
            ColumnDescriptor::new(7, "label", "text")
                .computed("upper(status)", ColumnStorage::Virtual),
        )
        .with_column(ColumnDescriptor::new(8, "legacy", "int").with_state(ColumnState::Dropped))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fixtures_dir_exists() {
        let dir = fixtures_dir();
        assert!(dir.exists(), "Fixtures directory should exist: {dir:?}");
    }

    #[test]
    fn test_load_orders_fixture_matches_builder() {
        assert_eq!(load_schema_fixture("orders.json"), orders_table());
    }
}
