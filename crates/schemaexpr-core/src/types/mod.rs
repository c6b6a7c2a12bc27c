//! Types for the schema expression validators.
//!
//! This module defines the table snapshot the validators read, the options that
//! configure them, and the results they produce.

mod common;
mod options;
mod result;
mod schema;

pub use common::{CaseSensitivity, Volatility};
pub use options::{Dialect, ValidationOptions};
pub use result::{CheckConstraint, ExpressionKind, StoredExpression, ValidationResult};
pub use schema::{
    ColumnDescriptor, ColumnId, ColumnState, ColumnStorage, ComputedColumn, TableSchema,
};
