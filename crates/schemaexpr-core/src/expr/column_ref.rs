//! Column references as they appear in expression trees.

use sqlparser::ast::{AccessExpr, Expr, Ident};
use std::fmt;

use crate::error::{Result, SchemaExprError};

/// A possibly-qualified column reference.
///
/// `a` has no qualifiers, `t.a` has a table, `s.t.a` has a namespace (matched
/// against the table's schema or database name) and `db.s.t.a` has both.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnRef {
    pub database: Option<Ident>,
    pub schema: Option<Ident>,
    pub table: Option<Ident>,
    pub column: Ident,
}

impl ColumnRef {
    pub fn unqualified(column: Ident) -> Self {
        Self {
            database: None,
            schema: None,
            table: None,
            column,
        }
    }

    /// Extracts the column reference held by `expr`.
    ///
    /// Field access rooted at an identifier (`t.arr[1]`) references the column
    /// named by the identifiers before the first subscript. Returns `Ok(None)`
    /// for nodes that are not column references, and `UnknownColumn` for
    /// identifier chains with more than four parts.
    pub fn from_expr(expr: &Expr) -> Result<Option<Self>> {
        match expr {
            Expr::Identifier(ident) => Ok(Some(Self::unqualified(ident.clone()))),
            Expr::CompoundIdentifier(parts) => Self::from_parts(parts).map(Some),
            Expr::CompoundFieldAccess { root, access_chain } => {
                match field_access_prefix(root, access_chain) {
                    Some((parts, _)) => Self::from_parts(&parts).map(Some),
                    None => Ok(None),
                }
            }
            _ => Ok(None),
        }
    }

    fn from_parts(parts: &[Ident]) -> Result<Self> {
        match parts {
            [column] => Ok(Self::unqualified(column.clone())),
            [table, column] => Ok(Self {
                table: Some(table.clone()),
                ..Self::unqualified(column.clone())
            }),
            [namespace, table, column] => Ok(Self {
                schema: Some(namespace.clone()),
                table: Some(table.clone()),
                ..Self::unqualified(column.clone())
            }),
            [database, schema, table, column] => Ok(Self {
                database: Some(database.clone()),
                schema: Some(schema.clone()),
                table: Some(table.clone()),
                column: column.clone(),
            }),
            _ => Err(SchemaExprError::UnknownColumn {
                name: join_idents(parts),
            }),
        }
    }

    pub fn is_qualified(&self) -> bool {
        self.table.is_some()
    }
}

impl fmt::Display for ColumnRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for qualifier in [&self.database, &self.schema, &self.table]
            .into_iter()
            .flatten()
        {
            write!(f, "{qualifier}.")?;
        }
        write!(f, "{}", self.column)
    }
}

/// Identifiers naming the accessed column, and how many chain elements they use.
///
/// `None` when the root is not an identifier, e.g. `(SELECT ...)[1]`.
pub(crate) fn field_access_prefix(
    root: &Expr,
    access_chain: &[AccessExpr],
) -> Option<(Vec<Ident>, usize)> {
    let Expr::Identifier(first) = root else {
        return None;
    };
    let mut parts = vec![first.clone()];
    for access in access_chain {
        match access {
            AccessExpr::Dot(Expr::Identifier(ident)) => parts.push(ident.clone()),
            _ => break,
        }
    }
    let consumed = parts.len() - 1;
    Some((parts, consumed))
}

fn join_idents(parts: &[Ident]) -> String {
    parts
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(".")
}
