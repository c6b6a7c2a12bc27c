//! Validation of expressions embedded in table schemas.
//!
//! CHECK constraints, computed column definitions and partial index predicates
//! are parsed with `sqlparser`, checked against a [`TableSchema`] snapshot,
//! stripped of table qualifiers and handed back in a canonical stored form.
//!
//! ```
//! use schemaexpr_core::{
//!     parse_expr, CheckConstraintBuilder, ColumnDescriptor, SchemaTypeChecker, TableSchema,
//!     ValidationOptions,
//! };
//!
//! let table = TableSchema::new("t")
//!     .with_column(ColumnDescriptor::new(1, "a", "int"))
//!     .with_column(ColumnDescriptor::new(2, "b", "int"));
//! let checker = SchemaTypeChecker::default();
//! let builder = CheckConstraintBuilder::new(&table, &checker, ValidationOptions::default());
//!
//! let result = builder.build(parse_expr("t.a > t.b").unwrap()).unwrap();
//! assert_eq!(result.text(), "a > b");
//! ```

pub mod error;
pub mod expr;
pub mod generated;
pub mod parser;
pub mod types;
pub mod validator;

// Re-export main types and functions
pub use error::{ParseError, ParseErrorKind, Position, Result, SchemaExprError};
pub use expr::{
    check_policy, dequalify_column_refs, referenced_columns, referenced_columns_in_order,
    unsupported_construct, ColumnRef, ColumnResolver, ExprWalker, ForbiddenConstruct, NodeKind,
    NodePath, PolicyChecker, SchemaTypeChecker, TypeChecker, ValidationPolicy, Visit, VisitMut,
};
pub use generated::CanonicalType;
pub use parser::{parse_expr, parse_expr_with_dialect};
pub use validator::{
    CheckConstraintBuilder, ComputedColumnValidator, DependencySet, PartialIndexValidator,
};

// Re-export types explicitly
pub use types::{
    CaseSensitivity,
    CheckConstraint,
    ColumnDescriptor,
    ColumnId,
    ColumnState,
    ColumnStorage,
    ComputedColumn,
    Dialect,
    ExpressionKind,
    StoredExpression,
    TableSchema,
    ValidationOptions,
    ValidationResult,
    Volatility,
};

// Test utilities (must be at end of file)
#[cfg(test)]
pub mod test_utils;
