use sqlparser::ast::Expr;
use std::collections::BTreeSet;
#[cfg(feature = "tracing")]
use tracing::debug;

use super::{finish, DependencySet};
use crate::error::{Result, SchemaExprError};
use crate::expr::{PolicyChecker, TypeChecker, ValidationPolicy};
use crate::generated::parse_declared_type;
use crate::types::{ColumnDescriptor, ColumnId, TableSchema, ValidationOptions, ValidationResult};

/// Validates computed column definitions and answers which computed columns
/// depend on a given column.
pub struct ComputedColumnValidator<'a> {
    table: &'a TableSchema,
    checker: &'a dyn TypeChecker,
    options: ValidationOptions,
}

impl<'a> ComputedColumnValidator<'a> {
    pub fn new(
        table: &'a TableSchema,
        checker: &'a dyn TypeChecker,
        options: ValidationOptions,
    ) -> Self {
        Self {
            table,
            checker,
            options,
        }
    }

    /// Validates `expr` as the definition of `target`.
    ///
    /// `target` may already be part of the snapshot (ALTER COLUMN) or be a new
    /// column that is not (ADD COLUMN). The expression must not reference the
    /// target itself nor any computed column declared at or after it, and its
    /// type must equal or implicitly cast to the target's declared type.
    #[cfg_attr(
        feature = "tracing",
        tracing::instrument(skip(self, expr, target), fields(table = %self.table.name, column = %target.name))
    )]
    pub fn validate(&self, expr: Expr, target: &ColumnDescriptor) -> Result<ValidationResult> {
        PolicyChecker::new(ValidationPolicy::COMPUTED_COLUMN, self.table, &self.options)
            .with_target(target)
            .with_type_checker(self.checker)
            .check(&expr)?;

        let declared = parse_declared_type(&target.data_type)
            .ok_or_else(|| SchemaExprError::UnsupportedType(target.data_type.clone()))?;
        let result_type = self.checker.infer_type(&expr, self.table)?;
        if let Some(actual) = result_type {
            if actual != declared && !self.checker.can_cast(actual, declared) {
                return Err(SchemaExprError::TypeMismatch {
                    expected: declared.to_string(),
                    actual: actual.to_string(),
                    expr: expr.to_string(),
                });
            }
        }

        finish(expr, self.table, &self.options, result_type)
    }

    /// Computed columns that depend on `candidate`, directly or transitively.
    ///
    /// Scans the stored expressions of every computed column in the snapshot;
    /// only references are collected, policies are not re-checked.
    pub fn dependent_columns(&self, candidate: ColumnId) -> Result<BTreeSet<ColumnId>> {
        let set = DependencySet::build(self.table, &self.options)?;
        Ok(set.dependents(candidate))
    }

    /// Fails with `ColumnHasDependents` if any computed column depends on `column`.
    ///
    /// Guards DROP COLUMN and type changes of columns other columns compute from.
    pub fn validate_no_dependents(&self, column: ColumnId) -> Result<()> {
        let dependents = self.dependent_columns(column)?;
        if dependents.is_empty() {
            return Ok(());
        }

        #[cfg(feature = "tracing")]
        debug!(column = %column, dependents = dependents.len(), "column has dependents");

        Err(SchemaExprError::ColumnHasDependents {
            column: self.table.column_label(column),
            dependents: dependents
                .into_iter()
                .map(|id| self.table.column_label(id))
                .collect(),
        })
    }
}
