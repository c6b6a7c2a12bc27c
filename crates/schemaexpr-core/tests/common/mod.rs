#![allow(dead_code)]

use std::path::PathBuf;

use schemaexpr_core::{
    parse_expr_with_dialect, CheckConstraintBuilder, ColumnDescriptor, ComputedColumnValidator,
    Dialect, PartialIndexValidator, Result, SchemaTypeChecker, StoredExpression, TableSchema,
    ValidationOptions,
};
use sqlparser::ast::Expr;

pub fn fixtures_dir() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("tests")
        .join("fixtures")
}

/// Load a table snapshot from `tests/fixtures/schemas`.
pub fn load_table(name: &str) -> TableSchema {
    let path = fixtures_dir().join("schemas").join(format!("{name}.json"));
    let content = std::fs::read_to_string(&path)
        .unwrap_or_else(|e| panic!("Failed to read fixture {path:?}: {e}"));
    TableSchema::from_json(&content)
        .unwrap_or_else(|e| panic!("Failed to parse fixture {path:?}: {e}"))
}

pub fn parse(sql: &str, dialect: Dialect) -> Expr {
    parse_expr_with_dialect(sql, dialect).unwrap_or_else(|e| panic!("Failed to parse {sql:?}: {e}"))
}

pub fn check(table: &TableSchema, sql: &str, dialect: Dialect) -> Result<StoredExpression> {
    let options = ValidationOptions::new(dialect);
    let checker = SchemaTypeChecker::new(options);
    CheckConstraintBuilder::new(table, &checker, options)
        .build(parse(sql, dialect))
        .map(|result| result.stored)
}

pub fn computed(
    table: &TableSchema,
    target: &ColumnDescriptor,
    sql: &str,
    dialect: Dialect,
) -> Result<StoredExpression> {
    let options = ValidationOptions::new(dialect);
    let checker = SchemaTypeChecker::new(options);
    ComputedColumnValidator::new(table, &checker, options)
        .validate(parse(sql, dialect), target)
        .map(|result| result.stored)
}

pub fn partial_index(
    table: &TableSchema,
    sql: &str,
    dialect: Dialect,
    virtual_columns_supported: bool,
) -> Result<StoredExpression> {
    let options = ValidationOptions::new(dialect);
    let checker = SchemaTypeChecker::new(options);
    PartialIndexValidator::new(table, &checker, options)
        .with_virtual_column_support(virtual_columns_supported)
        .validate(parse(sql, dialect))
        .map(|result| result.stored)
}

/// Error message of a failed validation, for snapshotting.
pub fn error_message(result: Result<StoredExpression>) -> String {
    match result {
        Ok(stored) => panic!("expected an error, got {stored:?}"),
        Err(err) => err.to_string(),
    }
}
