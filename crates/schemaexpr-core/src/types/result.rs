//! Validation output types.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use sqlparser::ast::Expr;
use std::collections::BTreeSet;
use std::fmt;

use super::schema::ColumnId;
use crate::generated::CanonicalType;

/// Where a schema expression lives; selects the validation policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub enum ExpressionKind {
    Check,
    ComputedColumn,
    PartialIndex,
}

impl fmt::Display for ExpressionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExpressionKind::Check => write!(f, "CHECK constraints"),
            ExpressionKind::ComputedColumn => write!(f, "computed column expressions"),
            ExpressionKind::PartialIndex => write!(f, "partial index predicates"),
        }
    }
}

/// The persisted form of a validated expression.
///
/// This is what the catalog embeds in a constraint, computed-column or index
/// descriptor. The text is dequalified and can be parsed again with
/// [`crate::parse_expr_with_dialect`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct StoredExpression {
    /// Canonical, dequalified expression text
    pub text: String,
    /// Columns the expression reads, in id order
    pub referenced_columns: BTreeSet<ColumnId>,
    /// Inferred result type, when the type checker could determine one
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub result_type: Option<CanonicalType>,
}

/// Outcome of a successful validation.
#[derive(Debug, Clone, PartialEq)]
pub struct ValidationResult {
    /// The rewritten (dequalified) expression tree.
    pub expr: Expr,
    pub stored: StoredExpression,
}

impl ValidationResult {
    pub fn text(&self) -> &str {
        &self.stored.text
    }

    pub fn referenced_columns(&self) -> &BTreeSet<ColumnId> {
        &self.stored.referenced_columns
    }

    pub fn result_type(&self) -> Option<CanonicalType> {
        self.stored.result_type
    }
}

/// A named CHECK constraint ready to be attached to a table descriptor.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct CheckConstraint {
    pub name: String,
    pub expression: StoredExpression,
}
