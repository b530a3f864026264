use super::{CollectionStore, LoadQuery};
use crate::core::{DbError, Result, Row, Value};
use crate::result::QueryResult;
use crate::results::SelectionExpression;
use std::collections::{BTreeMap, HashMap, HashSet};
use std::fmt;

type StoredRow = BTreeMap<String, Value>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct StoreStats {
    pub loads: usize,
    pub inserts: usize,
    pub deletes: usize,
}

impl StoreStats {
    pub fn total_calls(&self) -> usize {
        self.loads + self.inserts + self.deletes
    }
}

impl fmt::Display for StoreStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Store Stats: {} load(s), {} insert(s), {} delete(s)",
            self.loads, self.inserts, self.deletes
        )
    }
}

/// Collection tables kept in memory, keyed by table name.
///
/// Only column selections can be evaluated; formula selections are rejected.
#[derive(Debug, Default)]
pub struct MemoryCollectionStore {
    tables: HashMap<String, Vec<StoredRow>>,
    stats: StoreStats,
}

impl MemoryCollectionStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn stats(&self) -> StoreStats {
        self.stats
    }

    pub fn row_count(&self, table: &str) -> usize {
        self.tables.get(table).map_or(0, Vec::len)
    }

    fn matches(row: &StoredRow, criteria: &[(&str, Value)]) -> bool {
        criteria
            .iter()
            .all(|(column, value)| row.get(*column) == Some(value))
    }
}

impl CollectionStore for MemoryCollectionStore {
    fn load(&mut self, query: &LoadQuery) -> Result<QueryResult> {
        self.stats.loads += 1;

        let columns: Vec<String> = query.selections.iter().map(|s| s.alias.clone()).collect();
        let Some(stored) = self.tables.get(&query.table) else {
            return Ok(QueryResult::new(columns, Vec::new()));
        };

        let owners: HashSet<&Value> = query.owner_ids.iter().collect();
        let mut rows = Vec::new();
        for stored_row in stored {
            let owner = stored_row.get(&query.owner_column).unwrap_or(&Value::Null);
            if !owners.contains(owner) {
                continue;
            }

            let mut row: Row = Vec::with_capacity(query.selections.len());
            for selection in &query.selections {
                match &selection.expression {
                    SelectionExpression::Column(column) => {
                        row.push(stored_row.get(column).cloned().unwrap_or(Value::Null));
                    }
                    SelectionExpression::Formula(formula) => {
                        return Err(DbError::UnsupportedOperation(format!(
                            "In-memory store cannot evaluate formula '{}'",
                            formula
                        )));
                    }
                }
            }
            rows.push(row);
        }

        Ok(QueryResult::new(columns, rows))
    }

    fn insert_row(&mut self, table: &str, row: &[(&str, Value)]) -> Result<()> {
        self.stats.inserts += 1;
        let stored: StoredRow = row
            .iter()
            .map(|(column, value)| (column.to_string(), value.clone()))
            .collect();
        self.tables.entry(table.to_string()).or_default().push(stored);
        Ok(())
    }

    fn delete_rows(&mut self, table: &str, criteria: &[(&str, Value)]) -> Result<usize> {
        self.stats.deletes += 1;
        let Some(rows) = self.tables.get_mut(table) else {
            return Ok(0);
        };
        let before = rows.len();
        rows.retain(|row| !Self::matches(row, criteria));
        Ok(before - rows.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::results::SqlSelection;

    fn column(position: usize, name: &str) -> SqlSelection {
        SqlSelection {
            position,
            expression: SelectionExpression::Column(name.into()),
            alias: format!("c{}_", position),
        }
    }

    #[test]
    fn test_load_filters_by_owner_and_projects() {
        let mut store = MemoryCollectionStore::new();
        store
            .insert_row("tags", &[("post_id", Value::Integer(1)), ("tag", "rust".into())])
            .unwrap();
        store
            .insert_row("tags", &[("post_id", Value::Integer(2)), ("tag", "db".into())])
            .unwrap();

        let result = store
            .load(&LoadQuery {
                table: "tags".into(),
                owner_column: "post_id".into(),
                owner_ids: vec![Value::Integer(1)],
                selections: vec![column(0, "post_id"), column(1, "tag")],
            })
            .unwrap();

        assert_eq!(result.row_count(), 1);
        assert_eq!(result.rows()[0], vec![Value::Integer(1), Value::from("rust")]);
        assert_eq!(store.stats().total_calls(), 3);
    }

    #[test]
    fn test_delete_rows_matches_all_criteria() {
        let mut store = MemoryCollectionStore::new();
        for tag in ["a", "b", "a"] {
            store
                .insert_row("tags", &[("post_id", Value::Integer(1)), ("tag", tag.into())])
                .unwrap();
        }

        let deleted = store
            .delete_rows("tags", &[("post_id", Value::Integer(1)), ("tag", "a".into())])
            .unwrap();
        assert_eq!(deleted, 2);
        assert_eq!(store.row_count("tags"), 1);
        assert_eq!(store.delete_rows("missing", &[]).unwrap(), 0);
    }

    #[test]
    fn test_formula_selection_is_unsupported() {
        let mut store = MemoryCollectionStore::new();
        store
            .insert_row("prefs", &[("owner", Value::Integer(1)), ("k", "A".into())])
            .unwrap();

        let err = store
            .load(&LoadQuery {
                table: "prefs".into(),
                owner_column: "owner".into(),
                owner_ids: vec![Value::Integer(1)],
                selections: vec![SqlSelection {
                    position: 0,
                    expression: SelectionExpression::Formula("lower(k)".into()),
                    alias: "c0_".into(),
                }],
            })
            .unwrap_err();
        assert!(matches!(err, DbError::UnsupportedOperation(_)));
    }
}
