//! Dependency graph between computed columns and the columns they read.

use std::collections::{BTreeMap, BTreeSet, HashMap, VecDeque};
#[cfg(feature = "tracing")]
use tracing::debug;

use crate::error::{Result, SchemaExprError};
use crate::expr::{collect_references, ColumnResolver};
use crate::parser::parse_expr_with_dialect;
use crate::types::{ColumnId, TableSchema, ValidationOptions};

/// Computed column id -> ids of the columns its stored expression references.
///
/// Built from a snapshot on demand and never persisted.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DependencySet {
    direct: BTreeMap<ColumnId, BTreeSet<ColumnId>>,
}

#[derive(Clone, Copy, PartialEq, Eq)]
enum Mark {
    Visiting,
    Done,
}

impl DependencySet {
    /// Parses the stored expression of every visible computed column.
    ///
    /// Stored expressions are already validated, so no policy is applied; they
    /// only have to parse and resolve. References may resolve to dropped
    /// columns, which a pending drop leaves in the snapshot. Fails with
    /// `DependencyCycle` if computed columns reference each other in a loop.
    pub fn build(table: &TableSchema, options: &ValidationOptions) -> Result<Self> {
        let resolver = ColumnResolver::new(table, options).including_dropped();
        let mut direct = BTreeMap::new();
        for column in table.computed_columns() {
            let Some(computed) = &column.computed else {
                continue;
            };
            let expr = parse_expr_with_dialect(&computed.expression, options.dialect)?;
            let refs = collect_references(&expr, resolver, options.dialect)?;
            direct.insert(column.id, refs.into_iter().collect());
        }

        let set = Self { direct };
        if let Some(cycle) = set.find_cycle() {
            return Err(SchemaExprError::DependencyCycle {
                columns: cycle.into_iter().map(|id| table.column_label(id)).collect(),
            });
        }

        #[cfg(feature = "tracing")]
        debug!(table = %table.name, computed = set.direct.len(), "built dependency set");

        Ok(set)
    }

    pub fn is_empty(&self) -> bool {
        self.direct.is_empty()
    }

    /// Columns read by the computed column `computed`, if it is one.
    pub fn references_of(&self, computed: ColumnId) -> Option<&BTreeSet<ColumnId>> {
        self.direct.get(&computed)
    }

    /// Computed columns whose expression references `column` directly.
    pub fn direct_dependents(&self, column: ColumnId) -> BTreeSet<ColumnId> {
        self.direct
            .iter()
            .filter(|(_, refs)| refs.contains(&column))
            .map(|(id, _)| *id)
            .collect()
    }

    /// Computed columns that depend on `column` directly or through other
    /// computed columns.
    pub fn dependents(&self, column: ColumnId) -> BTreeSet<ColumnId> {
        let mut found = BTreeSet::new();
        let mut queue = VecDeque::from([column]);
        while let Some(current) = queue.pop_front() {
            for dependent in self.direct_dependents(current) {
                if dependent != column && found.insert(dependent) {
                    queue.push_back(dependent);
                }
            }
        }
        found
    }

    fn find_cycle(&self) -> Option<Vec<ColumnId>> {
        let mut marks = HashMap::new();
        let mut stack = Vec::new();
        self.direct
            .keys()
            .find_map(|&start| self.visit(start, &mut marks, &mut stack))
    }

    fn visit(
        &self,
        id: ColumnId,
        marks: &mut HashMap<ColumnId, Mark>,
        stack: &mut Vec<ColumnId>,
    ) -> Option<Vec<ColumnId>> {
        match marks.get(&id) {
            Some(Mark::Done) => return None,
            Some(Mark::Visiting) => {
                let start = stack.iter().position(|s| *s == id).unwrap_or(0);
                let mut cycle = stack[start..].to_vec();
                cycle.push(id);
                return Some(cycle);
            }
            None => {}
        }

        marks.insert(id, Mark::Visiting);
        stack.push(id);
        if let Some(refs) = self.direct.get(&id) {
            for &next in refs {
                if let Some(cycle) = self.visit(next, marks, stack) {
                    return Some(cycle);
                }
            }
        }
        stack.pop();
        marks.insert(id, Mark::Done);
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{ColumnDescriptor, ColumnState, ColumnStorage};

    fn chain() -> TableSchema {
        TableSchema::new("t")
            .with_column(ColumnDescriptor::new(1, "a", "int"))
            .with_column(ColumnDescriptor::new(2, "b", "int"))
            .with_column(
                ColumnDescriptor::new(3, "c1", "int").computed("a + 1", ColumnStorage::Stored),
            )
            .with_column(
                ColumnDescriptor::new(4, "c2", "int").computed("c1 * 2", ColumnStorage::Virtual),
            )
    }

    fn ids(raw: &[u32]) -> BTreeSet<ColumnId> {
        raw.iter().copied().map(ColumnId).collect()
    }

    #[test]
    fn test_direct_and_transitive_dependents() {
        let set = DependencySet::build(&chain(), &ValidationOptions::default()).unwrap();
        assert_eq!(set.references_of(ColumnId(4)), Some(&ids(&[3])));
        assert_eq!(set.references_of(ColumnId(1)), None);
        assert_eq!(set.direct_dependents(ColumnId(1)), ids(&[3]));
        assert_eq!(set.dependents(ColumnId(1)), ids(&[3, 4]));
        assert_eq!(set.dependents(ColumnId(2)), ids(&[]));
    }

    #[test]
    fn test_cycle_detected() {
        let table = TableSchema::new("t")
            .with_column(
                ColumnDescriptor::new(1, "x", "int").computed("y + 1", ColumnStorage::Stored),
            )
            .with_column(
                ColumnDescriptor::new(2, "y", "int").computed("x + 1", ColumnStorage::Stored),
            );
        let err = DependencySet::build(&table, &ValidationOptions::default()).unwrap_err();
        match err {
            SchemaExprError::DependencyCycle { columns } => {
                assert_eq!(columns, vec!["x", "y", "x"]);
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_references_to_dropped_columns_count() {
        let table = TableSchema::new("t")
            .with_column(ColumnDescriptor::new(1, "a", "int").with_state(ColumnState::Dropped))
            .with_column(
                ColumnDescriptor::new(2, "c", "int").computed("a + 1", ColumnStorage::Stored),
            );
        let set = DependencySet::build(&table, &ValidationOptions::default()).unwrap();
        assert_eq!(set.references_of(ColumnId(2)), Some(&ids(&[1])));
        assert_eq!(set.dependents(ColumnId(1)), ids(&[2]));
    }

    #[test]
    fn test_unparseable_stored_expression() {
        let table = TableSchema::new("t")
            .with_column(ColumnDescriptor::new(1, "a", "int"))
            .with_column(
                ColumnDescriptor::new(2, "c", "int").computed("a +", ColumnStorage::Stored),
            );
        assert!(matches!(
            DependencySet::build(&table, &ValidationOptions::default()),
            Err(SchemaExprError::Parse(_))
        ));
    }
}
