//! Expression tree infrastructure shared by the validators.
//!
//! Everything here works on `sqlparser::ast::Expr` through the single
//! [`ExprWalker`]: column references are resolved with [`ColumnResolver`],
//! qualifiers are stripped with [`dequalify_column_refs`], forbidden constructs
//! are rejected by [`PolicyChecker`], and result types come from a
//! [`TypeChecker`].

mod column_ref;
mod dequalify;
mod policy;
mod resolver;
mod type_check;
mod walk;

pub use column_ref::ColumnRef;
pub(crate) use dequalify::collect_references;
pub use dequalify::{dequalify_column_refs, referenced_columns, referenced_columns_in_order};
pub use policy::{check_policy, ForbiddenConstruct, PolicyChecker, ValidationPolicy};
pub use resolver::ColumnResolver;
pub use type_check::{SchemaTypeChecker, TypeChecker};
pub use walk::{unsupported_construct, ExprWalker, NodeKind, NodePath, Visit, VisitMut};
