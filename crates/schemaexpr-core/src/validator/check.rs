use sqlparser::ast::Expr;
use std::collections::HashSet;
#[cfg(feature = "tracing")]
use tracing::debug;

use super::{finish, require_boolean};
use crate::error::{Result, SchemaExprError};
use crate::expr::{referenced_columns_in_order, PolicyChecker, TypeChecker, ValidationPolicy};
use crate::types::{CheckConstraint, TableSchema, ValidationOptions, ValidationResult};

/// Validates CHECK constraint expressions and turns them into named constraints.
///
/// The builder remembers every constraint name it hands out, so several
/// constraints built for one table never share a name.
pub struct CheckConstraintBuilder<'a> {
    table: &'a TableSchema,
    checker: &'a dyn TypeChecker,
    options: ValidationOptions,
    names_in_use: HashSet<String>,
}

impl<'a> CheckConstraintBuilder<'a> {
    pub fn new(
        table: &'a TableSchema,
        checker: &'a dyn TypeChecker,
        options: ValidationOptions,
    ) -> Self {
        Self {
            table,
            checker,
            options,
            names_in_use: HashSet::new(),
        }
    }

    /// Registers a constraint name that already exists on the table.
    pub fn mark_name_in_use(&mut self, name: impl Into<String>) {
        self.names_in_use.insert(name.into());
    }

    pub fn is_name_in_use(&self, name: &str) -> bool {
        self.names_in_use.contains(name)
    }

    /// Validates a CHECK expression.
    ///
    /// The expression must pass the CHECK policy and produce a boolean
    /// (or boolean-castable) value. The result is dequalified.
    #[cfg_attr(
        feature = "tracing",
        tracing::instrument(skip(self, expr), fields(table = %self.table.name))
    )]
    pub fn build(&self, expr: Expr) -> Result<ValidationResult> {
        PolicyChecker::new(ValidationPolicy::CHECK, self.table, &self.options)
            .with_type_checker(self.checker)
            .check(&expr)?;

        let result_type = self.checker.infer_type(&expr, self.table)?;
        require_boolean(self.checker, &expr, result_type)?;

        finish(expr, self.table, &self.options, result_type)
    }

    /// Validates `expr` and names the constraint.
    ///
    /// Without an explicit name one is generated from the referenced columns.
    /// The chosen name is marked as in use.
    pub fn build_constraint(&mut self, name: Option<&str>, expr: Expr) -> Result<CheckConstraint> {
        if let Some(name) = name {
            if self.is_name_in_use(name) {
                return Err(SchemaExprError::DuplicateConstraintName(name.to_string()));
            }
        }

        let result = self.build(expr)?;
        let name = match name {
            Some(name) => name.to_string(),
            None => self.default_name(&result.expr)?,
        };

        #[cfg(feature = "tracing")]
        debug!(constraint = %name, "built check constraint");

        self.names_in_use.insert(name.clone());
        Ok(CheckConstraint {
            name,
            expression: result.stored,
        })
    }

    /// Generates `check_<col>_<col>...` from the columns `expr` references, in
    /// order of first appearance, with a numeric suffix if the name is taken.
    pub fn default_name(&self, expr: &Expr) -> Result<String> {
        let ids = referenced_columns_in_order(expr, self.table, &self.options)?;
        let mut base = String::from("check");
        for id in ids {
            base.push('_');
            base.push_str(&self.table.column_label(id));
        }

        if !self.is_name_in_use(&base) {
            return Ok(base);
        }
        let mut suffix = 1;
        loop {
            let candidate = format!("{base}{suffix}");
            if !self.is_name_in_use(&candidate) {
                return Ok(candidate);
            }
            suffix += 1;
        }
    }
}
