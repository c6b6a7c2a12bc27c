//! Generic pre-order traversal over `sqlparser` expression trees.
//!
//! Every validator in the crate walks expressions through [`ExprWalker`], so the
//! set of variants that have children, and the child order, is defined once here.
//! Children are numbered by their slot in the parent node; a [`NodePath`] is the
//! sequence of slot numbers from the root.
//!
//! Subqueries are leaves: the walker never descends into a `Query`. Function
//! arguments that hold unit keywords (`DATEDIFF(day, a, b)`) are skipped using
//! the dialect's function argument rules, as are window specifications.
//!
//! Field access (`t.arr[1]`, `(rec).f`) is a column reference when its root is
//! an identifier; the identifier prefix is not a child, only the subscripts are.
//! Field names after a dot are never children.
//!
//! The child enumeration matches every `Expr` variant. Variants with no meaning
//! in a schema expression are leaves here and are reported by
//! [`unsupported_construct`], which every validating walk rejects.

use serde::Serialize;
use sqlparser::ast::{
    AccessExpr, Expr, Function, FunctionArg, FunctionArgExpr, FunctionArgumentClause,
    FunctionArguments, HavingBound, JsonPathElem, ObjectNamePart, Subscript,
};
use std::fmt;

use crate::error::{Result, SchemaExprError};
use crate::generated::skip_args_for_function;
use crate::types::Dialect;

/// What to do after visiting a node.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Visit {
    Continue,
    SkipChildren,
}

/// What to do after visiting a node of a mutable walk.
#[derive(Debug, Clone)]
pub enum VisitMut {
    Continue,
    SkipChildren,
    /// Put this expression in place of the visited node. The replacement is not
    /// visited; the walk continues with the next sibling.
    Replace(Expr),
}

/// Coarse node classification used by the policy checker and the resolver.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeKind {
    ColumnRef,
    FunctionCall,
    Subquery,
    Literal,
    Operator,
    Other,
}

impl NodeKind {
    pub fn of(expr: &Expr) -> Self {
        match expr {
            Expr::Identifier(_) | Expr::CompoundIdentifier(_) => NodeKind::ColumnRef,
            Expr::CompoundFieldAccess { root, .. } if matches!(**root, Expr::Identifier(_)) => {
                NodeKind::ColumnRef
            }
            Expr::Function(_) => NodeKind::FunctionCall,
            Expr::Subquery(_) | Expr::Exists { .. } | Expr::InSubquery { .. } => {
                NodeKind::Subquery
            }
            Expr::Value(_) | Expr::Interval(_) => NodeKind::Literal,
            Expr::BinaryOp { .. }
            | Expr::UnaryOp { .. }
            | Expr::Between { .. }
            | Expr::InList { .. }
            | Expr::Like { .. }
            | Expr::ILike { .. }
            | Expr::SimilarTo { .. }
            | Expr::RLike { .. }
            | Expr::IsNull(_)
            | Expr::IsNotNull(_)
            | Expr::IsTrue(_)
            | Expr::IsNotTrue(_)
            | Expr::IsFalse(_)
            | Expr::IsNotFalse(_)
            | Expr::IsUnknown(_)
            | Expr::IsNotUnknown(_)
            | Expr::IsDistinctFrom(_, _)
            | Expr::IsNotDistinctFrom(_, _)
            | Expr::IsNormalized { .. }
            | Expr::MemberOf(_)
            | Expr::AnyOp { .. }
            | Expr::AllOp { .. } => NodeKind::Operator,
            _ => NodeKind::Other,
        }
    }
}

/// Location of a node: child slot indices from the root.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default, Serialize)]
#[serde(transparent)]
pub struct NodePath(Vec<usize>);

impl NodePath {
    pub fn root() -> Self {
        Self(Vec::new())
    }

    pub fn indices(&self) -> &[usize] {
        &self.0
    }

    pub fn is_root(&self) -> bool {
        self.0.is_empty()
    }
}

impl From<Vec<usize>> for NodePath {
    fn from(indices: Vec<usize>) -> Self {
        Self(indices)
    }
}

impl From<&[usize]> for NodePath {
    fn from(indices: &[usize]) -> Self {
        Self(indices.to_vec())
    }
}

impl fmt::Display for NodePath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "root")?;
        for index in &self.0 {
            write!(f, ".{index}")?;
        }
        Ok(())
    }
}

/// Walks expression trees in pre-order.
///
/// The visitor receives each node together with its path. Returning an error
/// stops the walk immediately and hands the error back to the caller.
#[derive(Debug, Clone, Copy, Default)]
pub struct ExprWalker {
    dialect: Dialect,
}

impl ExprWalker {
    pub fn new(dialect: Dialect) -> Self {
        Self { dialect }
    }

    pub fn walk<F, E>(&self, expr: &Expr, visitor: &mut F) -> std::result::Result<(), E>
    where
        F: FnMut(&Expr, &[usize]) -> std::result::Result<Visit, E>,
    {
        let mut path = Vec::new();
        self.walk_inner(expr, &mut path, visitor)
    }

    fn walk_inner<F, E>(&self, expr: &Expr, path: &mut Vec<usize>, visitor: &mut F) -> std::result::Result<(), E>
    where
        F: FnMut(&Expr, &[usize]) -> std::result::Result<Visit, E>,
    {
        if visitor(expr, path)? == Visit::SkipChildren {
            return Ok(());
        }
        for (slot, child) in children(expr, self.dialect) {
            path.push(slot);
            let result = self.walk_inner(child, path, visitor);
            path.pop();
            result?;
        }
        Ok(())
    }

    /// Like [`ExprWalker::walk`], but the visitor may replace nodes in place.
    pub fn walk_mut<F, E>(&self, expr: &mut Expr, visitor: &mut F) -> std::result::Result<(), E>
    where
        F: FnMut(&Expr, &[usize]) -> std::result::Result<VisitMut, E>,
    {
        let mut path = Vec::new();
        self.walk_mut_inner(expr, &mut path, visitor)
    }

    fn walk_mut_inner<F, E>(
        &self,
        expr: &mut Expr,
        path: &mut Vec<usize>,
        visitor: &mut F,
    ) -> std::result::Result<(), E>
    where
        F: FnMut(&Expr, &[usize]) -> std::result::Result<VisitMut, E>,
    {
        match visitor(expr, path)? {
            VisitMut::Continue => {}
            VisitMut::SkipChildren => return Ok(()),
            VisitMut::Replace(replacement) => {
                *expr = replacement;
                return Ok(());
            }
        }
        for (slot, child) in children_mut(expr, self.dialect) {
            path.push(slot);
            let result = self.walk_mut_inner(child, path, visitor);
            path.pop();
            result?;
        }
        Ok(())
    }
}

/// Lowercased unqualified function name (`pg_catalog.NOW` -> `now`).
pub(crate) fn function_name(function: &Function) -> String {
    function
        .name
        .0
        .last()
        .and_then(ObjectNamePart::as_ident)
        .map(|ident| ident.value.to_ascii_lowercase())
        .unwrap_or_default()
}

/// Name of a construct that has no meaning in a schema expression.
///
/// The walker treats these nodes as leaves, so whatever they hold is never
/// resolved or policy checked. Callers reject them instead of skipping them.
pub fn unsupported_construct(expr: &Expr) -> Option<&'static str> {
    match expr {
        Expr::GroupingSets(_) => Some("GROUPING SETS"),
        Expr::Cube(_) => Some("CUBE"),
        Expr::Rollup(_) => Some("ROLLUP"),
        Expr::Wildcard(_) | Expr::QualifiedWildcard(..) => Some("wildcard"),
        Expr::MatchAgainst { .. } => Some("MATCH ... AGAINST"),
        Expr::OuterJoin(_) => Some("outer join operator (+)"),
        Expr::Prior(_) => Some("PRIOR"),
        Expr::Lambda(_) => Some("lambda function"),
        _ => None,
    }
}

/// Fails with `UnsupportedExpression` if `expr` is an [`unsupported_construct`].
pub(crate) fn reject_unsupported(expr: &Expr, path: &[usize]) -> Result<()> {
    match unsupported_construct(expr) {
        Some(construct) => Err(SchemaExprError::UnsupportedExpression {
            construct: construct.to_string(),
            path: NodePath::from(path),
        }),
        None => Ok(()),
    }
}

/// Generates the child enumeration for shared and mutable references.
///
/// Both expansions must number children identically, so they share one body.
macro_rules! define_children {
    ($name:ident $(, $m:tt)?) => {
        fn $name<'a>(expr: &'a $($m)? Expr, dialect: Dialect) -> Vec<(usize, &'a $($m)? Expr)> {
            let mut out = Vec::new();
            match expr {
                Expr::BinaryOp { left, right, .. }
                | Expr::IsDistinctFrom(left, right)
                | Expr::IsNotDistinctFrom(left, right)
                | Expr::AnyOp { left, right, .. }
                | Expr::AllOp { left, right, .. } => {
                    out.push((0, &$($m)? **left));
                    out.push((1, &$($m)? **right));
                }
                Expr::UnaryOp { expr: inner, .. }
                | Expr::Nested(inner)
                | Expr::Cast { expr: inner, .. }
                | Expr::Collate { expr: inner, .. }
                | Expr::Ceil { expr: inner, .. }
                | Expr::Floor { expr: inner, .. }
                | Expr::Extract { expr: inner, .. }
                | Expr::IsNull(inner)
                | Expr::IsNotNull(inner)
                | Expr::IsTrue(inner)
                | Expr::IsNotTrue(inner)
                | Expr::IsFalse(inner)
                | Expr::IsNotFalse(inner)
                | Expr::IsUnknown(inner)
                | Expr::IsNotUnknown(inner)
                | Expr::InSubquery { expr: inner, .. } => {
                    out.push((0, &$($m)? **inner));
                }
                Expr::Interval(interval) => {
                    out.push((0, &$($m)? *interval.value));
                }
                Expr::Like { expr: inner, pattern, .. }
                | Expr::ILike { expr: inner, pattern, .. }
                | Expr::SimilarTo { expr: inner, pattern, .. }
                | Expr::RLike { expr: inner, pattern, .. } => {
                    out.push((0, &$($m)? **inner));
                    out.push((1, &$($m)? **pattern));
                }
                Expr::Position { expr: inner, r#in } => {
                    out.push((0, &$($m)? **inner));
                    out.push((1, &$($m)? **r#in));
                }
                Expr::AtTimeZone { timestamp, time_zone } => {
                    out.push((0, &$($m)? **timestamp));
                    out.push((1, &$($m)? **time_zone));
                }
                Expr::InUnnest { expr: inner, array_expr, .. } => {
                    out.push((0, &$($m)? **inner));
                    out.push((1, &$($m)? **array_expr));
                }
                Expr::Between { expr: inner, low, high, .. } => {
                    out.push((0, &$($m)? **inner));
                    out.push((1, &$($m)? **low));
                    out.push((2, &$($m)? **high));
                }
                Expr::InList { expr: inner, list, .. } => {
                    out.push((0, &$($m)? **inner));
                    for (index, item) in list.into_iter().enumerate() {
                        out.push((index + 1, item));
                    }
                }
                Expr::Tuple(items) => {
                    for (index, item) in items.into_iter().enumerate() {
                        out.push((index, item));
                    }
                }
                Expr::Array(array) => {
                    for (index, item) in (&$($m)? array.elem).into_iter().enumerate() {
                        out.push((index, item));
                    }
                }
                Expr::Substring { expr: inner, substring_from, substring_for, .. } => {
                    out.push((0, &$($m)? **inner));
                    if let Some(from) = substring_from {
                        out.push((1, &$($m)? **from));
                    }
                    if let Some(count) = substring_for {
                        out.push((2, &$($m)? **count));
                    }
                }
                Expr::Trim { expr: inner, trim_what, trim_characters, .. } => {
                    out.push((0, &$($m)? **inner));
                    if let Some(what) = trim_what {
                        out.push((1, &$($m)? **what));
                    }
                    if let Some(characters) = trim_characters {
                        for (index, item) in characters.into_iter().enumerate() {
                            out.push((index + 2, item));
                        }
                    }
                }
                Expr::Overlay { expr: inner, overlay_what, overlay_from, overlay_for } => {
                    out.push((0, &$($m)? **inner));
                    out.push((1, &$($m)? **overlay_what));
                    out.push((2, &$($m)? **overlay_from));
                    if let Some(count) = overlay_for {
                        out.push((3, &$($m)? **count));
                    }
                }
                Expr::Case { operand, conditions, else_result, .. } => {
                    let mut slot = 0;
                    if let Some(op) = operand {
                        out.push((slot, &$($m)? **op));
                        slot += 1;
                    }
                    for case_when in conditions {
                        out.push((slot, &$($m)? case_when.condition));
                        out.push((slot + 1, &$($m)? case_when.result));
                        slot += 2;
                    }
                    if let Some(el) = else_result {
                        out.push((slot, &$($m)? **el));
                    }
                }
                Expr::Function(func) => {
                    let skip = skip_args_for_function(dialect, &function_name(func));
                    let mut slot = 0;
                    if let FunctionArguments::List(arg_list) = &$($m)? func.args {
                        slot = arg_list.args.len();
                        for (index, arg) in (&$($m)? arg_list.args).into_iter().enumerate() {
                            match arg {
                                FunctionArg::Unnamed(FunctionArgExpr::Expr(e))
                                | FunctionArg::Named {
                                    arg: FunctionArgExpr::Expr(e),
                                    ..
                                }
                                | FunctionArg::ExprNamed {
                                    arg: FunctionArgExpr::Expr(e),
                                    ..
                                } => {
                                    if !skip.contains(&index) {
                                        out.push((index, e));
                                    }
                                }
                                _ => {}
                            }
                        }
                        for clause in &$($m)? arg_list.clauses {
                            match clause {
                                FunctionArgumentClause::OrderBy(order_by_exprs) => {
                                    for order_by_expr in order_by_exprs {
                                        out.push((slot, &$($m)? order_by_expr.expr));
                                        slot += 1;
                                    }
                                }
                                FunctionArgumentClause::Limit(e)
                                | FunctionArgumentClause::Having(HavingBound(_, e)) => {
                                    out.push((slot, e));
                                    slot += 1;
                                }
                                _ => {}
                            }
                        }
                    }
                    if let Some(filter) = &$($m)? func.filter {
                        out.push((slot, &$($m)? **filter));
                        slot += 1;
                    }
                    for order_by_expr in &$($m)? func.within_group {
                        out.push((slot, &$($m)? order_by_expr.expr));
                        slot += 1;
                    }
                }
                Expr::CompoundFieldAccess { root, access_chain } => {
                    if !matches!(**root, Expr::Identifier(_)) {
                        out.push((0, &$($m)? **root));
                    }
                    let mut slot = 1;
                    for access in access_chain {
                        match access {
                            AccessExpr::Dot(Expr::Identifier(_)) => {}
                            AccessExpr::Dot(e)
                            | AccessExpr::Subscript(Subscript::Index { index: e }) => {
                                out.push((slot, e));
                                slot += 1;
                            }
                            AccessExpr::Subscript(Subscript::Slice {
                                lower_bound,
                                upper_bound,
                                stride,
                            }) => {
                                for bound in [lower_bound, upper_bound, stride] {
                                    if let Some(e) = bound {
                                        out.push((slot, e));
                                    }
                                    slot += 1;
                                }
                            }
                        }
                    }
                }
                Expr::JsonAccess { value, path } => {
                    out.push((0, &$($m)? **value));
                    let mut slot = 1;
                    for element in &$($m)? path.path {
                        if let JsonPathElem::Bracket { key } = element {
                            out.push((slot, key));
                            slot += 1;
                        }
                    }
                }
                Expr::Convert { expr: inner, styles, .. } => {
                    out.push((0, &$($m)? **inner));
                    for (index, style) in styles.into_iter().enumerate() {
                        out.push((index + 1, style));
                    }
                }
                Expr::IsNormalized { expr: inner, .. }
                | Expr::Named { expr: inner, .. }
                | Expr::Prefixed { value: inner, .. } => {
                    out.push((0, &$($m)? **inner));
                }
                Expr::Struct { values, .. } => {
                    for (index, value) in values.into_iter().enumerate() {
                        out.push((index, value));
                    }
                }
                Expr::Dictionary(fields) => {
                    for (index, field) in fields.into_iter().enumerate() {
                        out.push((index, &$($m)? *field.value));
                    }
                }
                Expr::Map(map) => {
                    for (index, entry) in (&$($m)? map.entries).into_iter().enumerate() {
                        out.push((2 * index, &$($m)? *entry.key));
                        out.push((2 * index + 1, &$($m)? *entry.value));
                    }
                }
                Expr::MemberOf(member_of) => {
                    out.push((0, &$($m)? *member_of.value));
                    out.push((1, &$($m)? *member_of.array));
                }
                Expr::Identifier(_)
                | Expr::CompoundIdentifier(_)
                | Expr::Value(_)
                | Expr::TypedString(_)
                | Expr::Subquery(_)
                | Expr::Exists { .. } => {}
                Expr::GroupingSets(_)
                | Expr::Cube(_)
                | Expr::Rollup(_)
                | Expr::Wildcard(_)
                | Expr::QualifiedWildcard(..)
                | Expr::MatchAgainst { .. }
                | Expr::OuterJoin(_)
                | Expr::Prior(_)
                | Expr::Lambda(_) => {}
            }
            out
        }
    };
}

define_children!(children);
define_children!(children_mut, mut);
