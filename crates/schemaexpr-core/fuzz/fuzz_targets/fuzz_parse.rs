//! Fuzz target for the expression parser.
//!
//! This tests that `parse_expr_with_dialect()` doesn't panic on arbitrary inputs.

#![no_main]

use arbitrary::Arbitrary;
use libfuzzer_sys::fuzz_target;
use schemaexpr_core::{parse_expr_with_dialect, Dialect};

#[derive(Debug, Arbitrary)]
struct FuzzInput {
    sql: String,
    dialect_idx: u8,
}

impl FuzzInput {
    fn dialect(&self) -> Dialect {
        match self.dialect_idx % 5 {
            0 => Dialect::Generic,
            1 => Dialect::Postgres,
            2 => Dialect::Snowflake,
            3 => Dialect::Mysql,
            _ => Dialect::Duckdb,
        }
    }
}

fuzz_target!(|input: FuzzInput| {
    let dialect = input.dialect();
    // Invalid text must come back as Err, never as a panic.
    let _result = parse_expr_with_dialect(&input.sql, dialect);
});
