//! Semantic policies for schema expressions.
//!
//! A [`ValidationPolicy`] is plain data: the expression kind plus the constructs
//! it forbids. [`PolicyChecker`] walks a tree and reports the first forbidden
//! construct together with its node path.

use serde::Serialize;
use sqlparser::ast::{Expr, FunctionArguments};
use std::fmt;
#[cfg(feature = "tracing")]
use tracing::debug;

use super::column_ref::ColumnRef;
use super::resolver::ColumnResolver;
use super::type_check::TypeChecker;
use super::walk::{function_name, reject_unsupported, ExprWalker, NodePath, Visit};
use crate::error::{Result, SchemaExprError};
use crate::generated::{
    function_volatility, is_aggregate_function, is_udtf_function, is_window_function,
};
use crate::types::{
    ColumnDescriptor, Dialect, ExpressionKind, TableSchema, ValidationOptions, Volatility,
};

/// A construct a policy can forbid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum ForbiddenConstruct {
    Subquery,
    Aggregate,
    WindowFunction,
    SetReturningFunction,
    VolatileFunction,
    StableFunction,
    SelfReference,
    ForwardReference,
    VirtualColumnReference,
}

impl ForbiddenConstruct {
    pub const ALL: [ForbiddenConstruct; 9] = [
        ForbiddenConstruct::Subquery,
        ForbiddenConstruct::Aggregate,
        ForbiddenConstruct::WindowFunction,
        ForbiddenConstruct::SetReturningFunction,
        ForbiddenConstruct::VolatileFunction,
        ForbiddenConstruct::StableFunction,
        ForbiddenConstruct::SelfReference,
        ForbiddenConstruct::ForwardReference,
        ForbiddenConstruct::VirtualColumnReference,
    ];
}

impl fmt::Display for ForbiddenConstruct {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            ForbiddenConstruct::Subquery => "subquery",
            ForbiddenConstruct::Aggregate => "aggregate function",
            ForbiddenConstruct::WindowFunction => "window function",
            ForbiddenConstruct::SetReturningFunction => "set-returning function",
            ForbiddenConstruct::VolatileFunction => "volatile function",
            ForbiddenConstruct::StableFunction => "stable function",
            ForbiddenConstruct::SelfReference => "self reference",
            ForbiddenConstruct::ForwardReference => "reference to later computed column",
            ForbiddenConstruct::VirtualColumnReference => "reference to virtual column",
        };
        f.write_str(text)
    }
}

const CHECK_FORBIDDEN: &[ForbiddenConstruct] = &[
    ForbiddenConstruct::Subquery,
    ForbiddenConstruct::Aggregate,
    ForbiddenConstruct::WindowFunction,
    ForbiddenConstruct::SetReturningFunction,
    ForbiddenConstruct::VolatileFunction,
];

const COMPUTED_COLUMN_FORBIDDEN: &[ForbiddenConstruct] = &[
    ForbiddenConstruct::Subquery,
    ForbiddenConstruct::Aggregate,
    ForbiddenConstruct::WindowFunction,
    ForbiddenConstruct::SetReturningFunction,
    ForbiddenConstruct::VolatileFunction,
    ForbiddenConstruct::StableFunction,
    ForbiddenConstruct::SelfReference,
    ForbiddenConstruct::ForwardReference,
];

const PARTIAL_INDEX_FORBIDDEN: &[ForbiddenConstruct] = &[
    ForbiddenConstruct::Subquery,
    ForbiddenConstruct::Aggregate,
    ForbiddenConstruct::WindowFunction,
    ForbiddenConstruct::SetReturningFunction,
    ForbiddenConstruct::VolatileFunction,
    ForbiddenConstruct::StableFunction,
    ForbiddenConstruct::VirtualColumnReference,
];

const PARTIAL_INDEX_VIRTUAL_FORBIDDEN: &[ForbiddenConstruct] = &[
    ForbiddenConstruct::Subquery,
    ForbiddenConstruct::Aggregate,
    ForbiddenConstruct::WindowFunction,
    ForbiddenConstruct::SetReturningFunction,
    ForbiddenConstruct::VolatileFunction,
    ForbiddenConstruct::StableFunction,
];

/// The set of constructs forbidden in one kind of schema expression.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ValidationPolicy {
    kind: ExpressionKind,
    forbidden: &'static [ForbiddenConstruct],
}

impl ValidationPolicy {
    pub const CHECK: Self = Self {
        kind: ExpressionKind::Check,
        forbidden: CHECK_FORBIDDEN,
    };

    pub const COMPUTED_COLUMN: Self = Self {
        kind: ExpressionKind::ComputedColumn,
        forbidden: COMPUTED_COLUMN_FORBIDDEN,
    };

    /// Partial index predicate for storage engines that cannot evaluate virtual columns.
    pub const PARTIAL_INDEX: Self = Self {
        kind: ExpressionKind::PartialIndex,
        forbidden: PARTIAL_INDEX_FORBIDDEN,
    };

    pub const PARTIAL_INDEX_WITH_VIRTUAL_COLUMNS: Self = Self {
        kind: ExpressionKind::PartialIndex,
        forbidden: PARTIAL_INDEX_VIRTUAL_FORBIDDEN,
    };

    pub const fn partial_index(virtual_columns_supported: bool) -> Self {
        if virtual_columns_supported {
            Self::PARTIAL_INDEX_WITH_VIRTUAL_COLUMNS
        } else {
            Self::PARTIAL_INDEX
        }
    }

    /// Default policy for `kind`; partial indexes get the strict variant.
    pub const fn for_kind(kind: ExpressionKind) -> Self {
        match kind {
            ExpressionKind::Check => Self::CHECK,
            ExpressionKind::ComputedColumn => Self::COMPUTED_COLUMN,
            ExpressionKind::PartialIndex => Self::PARTIAL_INDEX,
        }
    }

    pub fn kind(&self) -> ExpressionKind {
        self.kind
    }

    pub fn forbidden(&self) -> &'static [ForbiddenConstruct] {
        self.forbidden
    }

    pub fn forbids(&self, construct: ForbiddenConstruct) -> bool {
        self.forbidden.contains(&construct)
    }

    /// Most volatile function class the policy accepts.
    pub fn max_volatility(&self) -> Volatility {
        if self.forbids(ForbiddenConstruct::StableFunction) {
            Volatility::Immutable
        } else if self.forbids(ForbiddenConstruct::VolatileFunction) {
            Volatility::Stable
        } else {
            Volatility::Volatile
        }
    }
}

/// Checks an expression against a policy with the builtin volatility table.
///
/// No target column is set, so self and forward references are not detected;
/// use [`PolicyChecker::with_target`] for computed columns.
pub fn check_policy(
    expr: &Expr,
    policy: &ValidationPolicy,
    table: &TableSchema,
    options: &ValidationOptions,
) -> Result<()> {
    PolicyChecker::new(*policy, table, options).check(expr)
}

/// Walks an expression and rejects the first construct the policy forbids.
pub struct PolicyChecker<'a> {
    policy: ValidationPolicy,
    resolver: ColumnResolver<'a>,
    dialect: Dialect,
    target: Option<&'a ColumnDescriptor>,
    type_checker: Option<&'a dyn TypeChecker>,
}

impl<'a> PolicyChecker<'a> {
    pub fn new(
        policy: ValidationPolicy,
        table: &'a TableSchema,
        options: &ValidationOptions,
    ) -> Self {
        Self {
            policy,
            resolver: ColumnResolver::new(table, options),
            dialect: options.dialect,
            target: None,
            type_checker: None,
        }
    }

    /// Column whose definition is being checked, for self and forward references.
    ///
    /// The target need not be in the snapshot yet (ADD COLUMN); references to
    /// it are then recognized by name.
    pub fn with_target(mut self, target: &'a ColumnDescriptor) -> Self {
        self.target = Some(target);
        self
    }

    /// Take function volatility from `checker` instead of the builtin table.
    pub fn with_type_checker(mut self, checker: &'a dyn TypeChecker) -> Self {
        self.type_checker = Some(checker);
        self
    }

    #[cfg_attr(
        feature = "tracing",
        tracing::instrument(skip(self, expr), fields(kind = ?self.policy.kind()))
    )]
    pub fn check(&self, expr: &Expr) -> Result<()> {
        let walker = ExprWalker::new(self.dialect);
        let result = walker.walk(expr, &mut |node, path| -> Result<Visit> {
            self.check_node(node, path)?;
            Ok(Visit::Continue)
        });

        #[cfg(feature = "tracing")]
        if let Err(err) = &result {
            debug!(error = %err, "policy check failed");
        }

        result
    }

    fn check_node(&self, node: &Expr, path: &[usize]) -> Result<()> {
        reject_unsupported(node, path)?;
        match node {
            Expr::Subquery(_) | Expr::Exists { .. } | Expr::InSubquery { .. } => {
                self.deny(ForbiddenConstruct::Subquery, None, path)
            }
            Expr::Function(func) => {
                let name = function_name(func);
                if matches!(func.args, FunctionArguments::Subquery(_)) {
                    self.deny(ForbiddenConstruct::Subquery, Some(&name), path)?;
                }
                if func.over.is_some() || is_window_function(&name) {
                    self.deny(ForbiddenConstruct::WindowFunction, Some(&name), path)?;
                }
                if is_aggregate_function(&name) {
                    self.deny(ForbiddenConstruct::Aggregate, Some(&name), path)?;
                }
                if is_udtf_function(&name) {
                    self.deny(ForbiddenConstruct::SetReturningFunction, Some(&name), path)?;
                }
                self.check_volatility(&name, path)
            }
            Expr::Identifier(_)
            | Expr::CompoundIdentifier(_)
            | Expr::CompoundFieldAccess { .. } => {
                match ColumnRef::from_expr(node)? {
                    Some(column_ref) => self.check_column(&column_ref, path),
                    None => Ok(()),
                }
            }
            _ => Ok(()),
        }
    }

    fn check_volatility(&self, name: &str, path: &[usize]) -> Result<()> {
        let volatility = match self.type_checker {
            Some(checker) => checker.function_volatility(name),
            None => function_volatility(name),
        };
        if volatility <= self.policy.max_volatility() {
            return Ok(());
        }
        let construct = match volatility {
            Volatility::Volatile => ForbiddenConstruct::VolatileFunction,
            _ => ForbiddenConstruct::StableFunction,
        };
        self.deny(construct, Some(name), path)
    }

    fn check_column(&self, column_ref: &ColumnRef, path: &[usize]) -> Result<()> {
        let table = self.resolver.table();
        if let Some(target) = self.target {
            let unsaved = table.column(target.id).is_none();
            if unsaved && self.resolver.refers_to(column_ref, &target.name) {
                self.deny(ForbiddenConstruct::SelfReference, Some(&target.name), path)?;
            }
        }

        let id = self.resolver.resolve_ref(column_ref)?;
        let Some(column) = table.column(id) else {
            return Ok(());
        };

        if let Some(target) = self.target {
            if id == target.id {
                self.deny(ForbiddenConstruct::SelfReference, Some(&column.name), path)?;
            }
            // A target not yet in the snapshot is appended after every existing column.
            let target_position = table.position(target.id).unwrap_or(table.columns.len());
            let is_forward = table
                .position(id)
                .is_some_and(|position| position >= target_position);
            if column.is_computed() && is_forward {
                self.deny(ForbiddenConstruct::ForwardReference, Some(&column.name), path)?;
            }
        }

        if column.is_virtual() {
            self.deny(ForbiddenConstruct::VirtualColumnReference, Some(&column.name), path)?;
        }
        Ok(())
    }

    fn deny(
        &self,
        construct: ForbiddenConstruct,
        subject: Option<&str>,
        path: &[usize],
    ) -> Result<()> {
        if !self.policy.forbids(construct) {
            return Ok(());
        }
        Err(SchemaExprError::PolicyViolation {
            construct,
            subject: subject.map(str::to_string),
            context: self.policy.kind(),
            path: NodePath::from(path),
        })
    }
}
