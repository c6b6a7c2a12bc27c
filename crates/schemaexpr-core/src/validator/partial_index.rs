use sqlparser::ast::Expr;

use super::{finish, require_boolean};
use crate::error::Result;
use crate::expr::{PolicyChecker, TypeChecker, ValidationPolicy};
use crate::types::{TableSchema, ValidationOptions, ValidationResult};

/// Validates partial index predicates.
///
/// Predicates get the strictest policy: only immutable functions, and no
/// references to virtual computed columns unless the storage engine can
/// evaluate them while maintaining the index.
pub struct PartialIndexValidator<'a> {
    table: &'a TableSchema,
    checker: &'a dyn TypeChecker,
    options: ValidationOptions,
    virtual_columns_supported: bool,
}

impl<'a> PartialIndexValidator<'a> {
    pub fn new(
        table: &'a TableSchema,
        checker: &'a dyn TypeChecker,
        options: ValidationOptions,
    ) -> Self {
        Self {
            table,
            checker,
            options,
            virtual_columns_supported: false,
        }
    }

    pub fn with_virtual_column_support(mut self, supported: bool) -> Self {
        self.virtual_columns_supported = supported;
        self
    }

    pub fn policy(&self) -> ValidationPolicy {
        ValidationPolicy::partial_index(self.virtual_columns_supported)
    }

    #[cfg_attr(
        feature = "tracing",
        tracing::instrument(skip(self, expr), fields(table = %self.table.name))
    )]
    pub fn validate(&self, expr: Expr) -> Result<ValidationResult> {
        PolicyChecker::new(self.policy(), self.table, &self.options)
            .with_type_checker(self.checker)
            .check(&expr)?;

        let result_type = self.checker.infer_type(&expr, self.table)?;
        require_boolean(self.checker, &expr, result_type)?;

        finish(expr, self.table, &self.options, result_type)
    }
}
