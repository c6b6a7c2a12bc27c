//! Validators for expressions stored in table schemas.
//!
//! Each validator is built from a table snapshot, a [`TypeChecker`] and the
//! [`ValidationOptions`], and runs the same pipeline with a different policy:
//!
//! 1. reject forbidden constructs ([`PolicyChecker`](crate::expr::PolicyChecker))
//! 2. check the result type
//! 3. strip qualifiers from column references
//! 4. collect referenced column ids and render the canonical text
//!
//! The first failing step ends validation with its error.

use sqlparser::ast::Expr;
#[cfg(feature = "tracing")]
use tracing::debug;

mod check;
mod computed;
mod dependencies;
mod partial_index;

pub use check::CheckConstraintBuilder;
pub use computed::ComputedColumnValidator;
pub use dependencies::DependencySet;
pub use partial_index::PartialIndexValidator;

use crate::error::{Result, SchemaExprError};
use crate::expr::{dequalify_column_refs, referenced_columns, TypeChecker};
use crate::generated::CanonicalType;
use crate::types::{StoredExpression, TableSchema, ValidationOptions, ValidationResult};

/// Rejects results that cannot be used as a predicate. Unknown types pass.
fn require_boolean(
    checker: &dyn TypeChecker,
    expr: &Expr,
    result_type: Option<CanonicalType>,
) -> Result<()> {
    match result_type {
        Some(t) if t != CanonicalType::Boolean && !checker.can_cast(t, CanonicalType::Boolean) => {
            Err(SchemaExprError::TypeMismatch {
                expected: CanonicalType::Boolean.to_string(),
                actual: t.to_string(),
                expr: expr.to_string(),
            })
        }
        _ => Ok(()),
    }
}

/// Dequalifies `expr` and packages it with its references and result type.
fn finish(
    mut expr: Expr,
    table: &TableSchema,
    options: &ValidationOptions,
    result_type: Option<CanonicalType>,
) -> Result<ValidationResult> {
    dequalify_column_refs(&mut expr, table, options)?;
    let referenced = referenced_columns(&expr, table, options)?;
    let text = expr.to_string();

    #[cfg(feature = "tracing")]
    debug!(
        table = %table.name,
        expression = %text,
        referenced = referenced.len(),
        "schema expression accepted"
    );

    Ok(ValidationResult {
        expr,
        stored: StoredExpression {
            text,
            referenced_columns: referenced,
            result_type,
        },
    })
}
