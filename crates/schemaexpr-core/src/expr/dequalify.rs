//! Qualifier stripping and reference collection.

use sqlparser::ast::Expr;
use std::collections::BTreeSet;

use super::column_ref::{field_access_prefix, ColumnRef};
use super::resolver::ColumnResolver;
use super::walk::{reject_unsupported, ExprWalker, Visit, VisitMut};
use crate::error::Result;
use crate::types::{ColumnId, Dialect, TableSchema, ValidationOptions};

/// Rewrites every qualified column reference in `expr` to its bare column name.
///
/// Each reference is resolved first, so a reference to another table fails with
/// `CrossTableReference` and a missing column with `UnknownColumn`. Unqualified
/// references and all other nodes are left untouched, which makes the rewrite
/// idempotent. On error the tree may be partially rewritten.
pub fn dequalify_column_refs(
    expr: &mut Expr,
    table: &TableSchema,
    options: &ValidationOptions,
) -> Result<()> {
    let resolver = ColumnResolver::new(table, options);
    dequalify_with(expr, resolver, options.dialect)
}

fn dequalify_with(expr: &mut Expr, resolver: ColumnResolver<'_>, dialect: Dialect) -> Result<()> {
    ExprWalker::new(dialect).walk_mut(expr, &mut |node, path| -> Result<VisitMut> {
        reject_unsupported(node, path)?;
        let Some(column_ref) = ColumnRef::from_expr(node)? else {
            return Ok(VisitMut::Continue);
        };
        resolver.resolve_ref(&column_ref)?;
        if !column_ref.is_qualified() {
            return Ok(VisitMut::Continue);
        }
        match node {
            Expr::CompoundFieldAccess { root, access_chain } => {
                // Keep the subscripts, which may hold qualified references themselves.
                let consumed = field_access_prefix(root, access_chain).map_or(0, |(_, n)| n);
                let mut replacement = Expr::CompoundFieldAccess {
                    root: Box::new(Expr::Identifier(column_ref.column)),
                    access_chain: access_chain[consumed..].to_vec(),
                };
                dequalify_with(&mut replacement, resolver, dialect)?;
                Ok(VisitMut::Replace(replacement))
            }
            _ => Ok(VisitMut::Replace(Expr::Identifier(column_ref.column))),
        }
    })
}

/// Resolves every column reference in `expr`, in pre-order, without duplicates.
pub fn referenced_columns_in_order(
    expr: &Expr,
    table: &TableSchema,
    options: &ValidationOptions,
) -> Result<Vec<ColumnId>> {
    collect_references(expr, ColumnResolver::new(table, options), options.dialect)
}

/// Like [`referenced_columns_in_order`], resolving through `resolver`.
pub(crate) fn collect_references(
    expr: &Expr,
    resolver: ColumnResolver<'_>,
    dialect: Dialect,
) -> Result<Vec<ColumnId>> {
    let mut ids = Vec::new();
    ExprWalker::new(dialect).walk(expr, &mut |node, path| -> Result<Visit> {
        reject_unsupported(node, path)?;
        if let Some(column_ref) = ColumnRef::from_expr(node)? {
            let id = resolver.resolve_ref(&column_ref)?;
            if !ids.contains(&id) {
                ids.push(id);
            }
        }
        Ok(Visit::Continue)
    })?;
    Ok(ids)
}

/// Set of column ids referenced by `expr`.
pub fn referenced_columns(
    expr: &Expr,
    table: &TableSchema,
    options: &ValidationOptions,
) -> Result<BTreeSet<ColumnId>> {
    referenced_columns_in_order(expr, table, options).map(|ids| ids.into_iter().collect())
}
