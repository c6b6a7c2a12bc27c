//! Fuzz target for the validators.
//!
//! Runs every parseable expression through the three validators against a
//! fixed table and checks that accepted expressions round-trip through their
//! stored text.

#![no_main]

use arbitrary::Arbitrary;
use libfuzzer_sys::fuzz_target;
use schemaexpr_core::{
    parse_expr_with_dialect, CheckConstraintBuilder, ColumnDescriptor, ColumnStorage,
    ComputedColumnValidator, Dialect, PartialIndexValidator, SchemaTypeChecker, TableSchema,
    ValidationOptions,
};

#[derive(Debug, Arbitrary)]
struct FuzzInput {
    sql: String,
    postgres: bool,
    virtual_columns_supported: bool,
}

fn table() -> TableSchema {
    TableSchema::new("t")
        .with_database("db")
        .with_column(ColumnDescriptor::new(1, "a", "int"))
        .with_column(ColumnDescriptor::new(2, "b", "text"))
        .with_column(ColumnDescriptor::new(3, "c", "int").computed("a + 1", ColumnStorage::Stored))
        .with_column(ColumnDescriptor::new(4, "v", "text").computed("upper(b)", ColumnStorage::Virtual))
}

fuzz_target!(|input: FuzzInput| {
    let dialect = if input.postgres {
        Dialect::Postgres
    } else {
        Dialect::Generic
    };
    let Ok(expr) = parse_expr_with_dialect(&input.sql, dialect) else {
        return;
    };

    let table = table();
    let options = ValidationOptions::new(dialect);
    let checker = SchemaTypeChecker::new(options);
    let target = ColumnDescriptor::new(5, "n", "text");

    let results = [
        CheckConstraintBuilder::new(&table, &checker, options).build(expr.clone()),
        ComputedColumnValidator::new(&table, &checker, options).validate(expr.clone(), &target),
        PartialIndexValidator::new(&table, &checker, options)
            .with_virtual_column_support(input.virtual_columns_supported)
            .validate(expr),
    ];

    for result in results.into_iter().flatten() {
        let reparsed = parse_expr_with_dialect(result.text(), dialect)
            .expect("stored text must parse");
        assert_eq!(reparsed.to_string(), result.text());
    }
});
