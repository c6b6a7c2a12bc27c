//! Column name resolution against a table snapshot.

use sqlparser::ast::Ident;
#[cfg(feature = "tracing")]
use tracing::trace;

use super::column_ref::ColumnRef;
use crate::error::{Result, SchemaExprError};
use crate::generated::NormalizationStrategy;
use crate::types::{ColumnDescriptor, ColumnId, TableSchema, ValidationOptions};

/// Resolves column references to stable column ids.
///
/// Only visible (non-dropped) columns take part in resolution unless the
/// resolver was built with [`ColumnResolver::including_dropped`]. Quoted
/// identifiers match exactly; unquoted ones go through the configured
/// normalization strategy.
#[derive(Debug, Clone, Copy)]
pub struct ColumnResolver<'a> {
    table: &'a TableSchema,
    strategy: NormalizationStrategy,
    include_dropped: bool,
}

impl<'a> ColumnResolver<'a> {
    pub fn new(table: &'a TableSchema, options: &ValidationOptions) -> Self {
        Self {
            table,
            strategy: options.normalization_strategy(),
            include_dropped: false,
        }
    }

    /// Also resolve names no visible column matches against dropped columns.
    ///
    /// Stored expressions may still read a column whose drop is in progress.
    pub fn including_dropped(mut self) -> Self {
        self.include_dropped = true;
        self
    }

    pub fn table(&self) -> &'a TableSchema {
        self.table
    }

    /// Resolves an unquoted column name with optional table and database qualifiers.
    pub fn resolve(
        &self,
        name: &str,
        table: Option<&str>,
        database: Option<&str>,
    ) -> Result<ColumnId> {
        let column_ref = ColumnRef {
            database: database.map(Ident::new),
            schema: None,
            table: table.map(Ident::new),
            column: Ident::new(name),
        };
        self.resolve_ref(&column_ref)
    }

    /// Resolves a parsed column reference, checking its qualifiers first.
    pub fn resolve_ref(&self, column_ref: &ColumnRef) -> Result<ColumnId> {
        self.resolve_descriptor(column_ref).map(|column| column.id)
    }

    /// Like [`ColumnResolver::resolve_ref`] but returns the whole descriptor.
    pub fn resolve_descriptor(&self, column_ref: &ColumnRef) -> Result<&'a ColumnDescriptor> {
        self.check_qualifiers(column_ref)?;
        self.lookup(column_ref)
    }

    /// Whether `column_ref` names `column_name` in this table, whether or not
    /// such a column exists yet.
    pub fn refers_to(&self, column_ref: &ColumnRef, column_name: &str) -> bool {
        self.check_qualifiers(column_ref).is_ok()
            && self.ident_matches(&column_ref.column, column_name)
    }

    fn lookup(&self, column_ref: &ColumnRef) -> Result<&'a ColumnDescriptor> {
        match self.lookup_in(column_ref, true)? {
            Some(column) => Ok(column),
            None if self.include_dropped => match self.lookup_in(column_ref, false)? {
                Some(column) => Ok(column),
                None => Err(unknown(column_ref)),
            },
            None => Err(unknown(column_ref)),
        }
    }

    fn lookup_in(
        &self,
        column_ref: &ColumnRef,
        visible: bool,
    ) -> Result<Option<&'a ColumnDescriptor>> {
        let mut matches = self.table.columns.iter().filter(|column| {
            column.is_visible() == visible && self.ident_matches(&column_ref.column, &column.name)
        });

        let Some(first) = matches.next() else {
            return Ok(None);
        };
        let rest: Vec<&ColumnDescriptor> = matches.collect();
        if !rest.is_empty() {
            let candidates = std::iter::once(first)
                .chain(rest)
                .map(|column| column.name.clone())
                .collect();
            return Err(SchemaExprError::AmbiguousReference {
                name: column_ref.to_string(),
                candidates,
            });
        }

        #[cfg(feature = "tracing")]
        trace!(reference = %column_ref, column = %first.id, "resolved column reference");

        Ok(Some(first))
    }

    fn check_qualifiers(&self, column_ref: &ColumnRef) -> Result<()> {
        let table_ok = column_ref
            .table
            .as_ref()
            .is_none_or(|table| self.ident_matches(table, &self.table.name));

        // A lone namespace qualifier (`s.t.a`) may name either the schema or the
        // database; a full four-part name must match both.
        let namespace_ok = match (&column_ref.database, &column_ref.schema) {
            (None, None) => true,
            (None, Some(namespace)) => {
                self.optional_matches(namespace, self.table.schema.as_deref())
                    || self.optional_matches(namespace, self.table.database.as_deref())
            }
            (Some(database), schema) => {
                self.optional_matches(database, self.table.database.as_deref())
                    && schema
                        .as_ref()
                        .is_none_or(|s| self.optional_matches(s, self.table.schema.as_deref()))
            }
        };

        if table_ok && namespace_ok {
            Ok(())
        } else {
            Err(SchemaExprError::CrossTableReference {
                reference: column_ref.to_string(),
                table: self.qualified_table_name(),
            })
        }
    }

    fn optional_matches(&self, ident: &Ident, stored: Option<&str>) -> bool {
        stored.is_some_and(|stored| self.ident_matches(ident, stored))
    }

    fn ident_matches(&self, ident: &Ident, stored: &str) -> bool {
        if ident.quote_style.is_some() {
            ident.value == stored
        } else {
            self.strategy.matches(&ident.value, stored)
        }
    }

    fn qualified_table_name(&self) -> String {
        [
            self.table.database.as_deref(),
            self.table.schema.as_deref(),
            Some(self.table.name.as_str()),
        ]
        .into_iter()
        .flatten()
        .collect::<Vec<_>>()
        .join(".")
    }
}

fn unknown(column_ref: &ColumnRef) -> SchemaExprError {
    SchemaExprError::UnknownColumn {
        name: column_ref.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::parse_expr;
    use crate::types::{CaseSensitivity, ColumnState, Dialect};

    fn orders() -> TableSchema {
        TableSchema::new("orders")
            .with_database("shop")
            .with_schema("public")
            .with_column(ColumnDescriptor::new(1, "qty", "int"))
            .with_column(ColumnDescriptor::new(2, "price", "numeric"))
            .with_column(ColumnDescriptor::new(3, "Note", "text"))
            .with_column(ColumnDescriptor::new(4, "old", "text").with_state(ColumnState::Dropped))
    }

    fn resolve_sql(table: &TableSchema, options: &ValidationOptions, sql: &str) -> Result<ColumnId> {
        let expr = parse_expr(sql).unwrap();
        let column_ref = ColumnRef::from_expr(&expr).unwrap().unwrap();
        ColumnResolver::new(table, options).resolve_ref(&column_ref)
    }

    #[test]
    fn test_resolve_by_name() {
        let table = orders();
        let resolver = ColumnResolver::new(&table, &ValidationOptions::default());
        assert_eq!(resolver.resolve("qty", None, None).unwrap(), ColumnId(1));
        assert_eq!(
            resolver.resolve("PRICE", Some("orders"), Some("shop")).unwrap(),
            ColumnId(2)
        );
    }

    #[test]
    fn test_dropped_column_is_unknown() {
        let table = orders();
        let resolver = ColumnResolver::new(&table, &ValidationOptions::default());
        let err = resolver.resolve("old", None, None).unwrap_err();
        assert!(matches!(err, SchemaExprError::UnknownColumn { name } if name == "old"));
    }

    #[test]
    fn test_including_dropped_prefers_visible_columns() {
        let table = orders().with_column(ColumnDescriptor::new(5, "old", "int"));
        let options = ValidationOptions::default();
        let resolver = ColumnResolver::new(&table, &options).including_dropped();
        assert_eq!(resolver.resolve("old", None, None).unwrap(), ColumnId(5));

        let table = orders();
        let resolver = ColumnResolver::new(&table, &options).including_dropped();
        assert_eq!(resolver.resolve("old", None, None).unwrap(), ColumnId(4));
        assert!(matches!(
            resolver.resolve("missing", None, None),
            Err(SchemaExprError::UnknownColumn { .. })
        ));
    }

    #[test]
    fn test_refers_to_unsaved_column() {
        let table = orders();
        let options = ValidationOptions::default();
        let resolver = ColumnResolver::new(&table, &options);
        let column_ref = |sql: &str| ColumnRef::from_expr(&parse_expr(sql).unwrap()).unwrap().unwrap();

        assert!(resolver.refers_to(&column_ref("GROSS"), "gross"));
        assert!(resolver.refers_to(&column_ref("orders.gross"), "gross"));
        assert!(!resolver.refers_to(&column_ref("items.gross"), "gross"));
        assert!(!resolver.refers_to(&column_ref("\"Gross\""), "gross"));
    }

    #[test]
    fn test_other_table_rejected() {
        let table = orders();
        let err = resolve_sql(&table, &ValidationOptions::default(), "items.qty").unwrap_err();
        match err {
            SchemaExprError::CrossTableReference { reference, table } => {
                assert_eq!(reference, "items.qty");
                assert_eq!(table, "shop.public.orders");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_namespace_qualifiers() {
        let table = orders();
        let options = ValidationOptions::default();
        assert_eq!(resolve_sql(&table, &options, "public.orders.qty").unwrap(), ColumnId(1));
        assert_eq!(resolve_sql(&table, &options, "shop.orders.qty").unwrap(), ColumnId(1));
        assert_eq!(
            resolve_sql(&table, &options, "shop.public.orders.qty").unwrap(),
            ColumnId(1)
        );
        assert!(matches!(
            resolve_sql(&table, &options, "other.orders.qty"),
            Err(SchemaExprError::CrossTableReference { .. })
        ));
        assert!(matches!(
            resolve_sql(&table, &options, "shop.other.orders.qty"),
            Err(SchemaExprError::CrossTableReference { .. })
        ));
    }

    #[test]
    fn test_quoted_identifier_is_exact() {
        let table = orders();
        let options = ValidationOptions::default();
        assert_eq!(resolve_sql(&table, &options, "\"Note\"").unwrap(), ColumnId(3));
        assert!(matches!(
            resolve_sql(&table, &options, "\"note\""),
            Err(SchemaExprError::UnknownColumn { .. })
        ));
    }

    #[test]
    fn test_postgres_folding() {
        let table = orders();
        let options = ValidationOptions::new(Dialect::Postgres);
        // Unquoted `Note` folds to `note`, which is not the stored spelling.
        assert!(matches!(
            resolve_sql(&table, &options, "Note"),
            Err(SchemaExprError::UnknownColumn { .. })
        ));
        assert_eq!(resolve_sql(&table, &options, "QTY").unwrap(), ColumnId(1));
    }

    #[test]
    fn test_ambiguous_under_case_insensitive_matching() {
        let table = TableSchema::new("t")
            .with_column(ColumnDescriptor::new(1, "a", "int"))
            .with_column(ColumnDescriptor::new(2, "A", "int"));

        let err = resolve_sql(&table, &ValidationOptions::default(), "a").unwrap_err();
        match err {
            SchemaExprError::AmbiguousReference { name, candidates } => {
                assert_eq!(name, "a");
                assert_eq!(candidates, vec!["a".to_string(), "A".to_string()]);
            }
            other => panic!("unexpected error: {other:?}"),
        }

        let exact = ValidationOptions::default().with_case_sensitivity(CaseSensitivity::Exact);
        assert_eq!(resolve_sql(&table, &exact, "A").unwrap(), ColumnId(2));
    }
}
