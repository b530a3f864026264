//! Backing-store seam for collection tables.

mod memory;

pub use memory::{MemoryCollectionStore, StoreStats};

use crate::core::{Result, Value};
use crate::result::QueryResult;
use crate::results::SqlSelection;

/// Statement loading the collection rows of a batch of owners.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadQuery {
    pub table: String,
    pub owner_column: String,
    pub owner_ids: Vec<Value>,
    pub selections: Vec<SqlSelection>,
}

impl LoadQuery {
    pub fn to_sql(&self) -> String {
        let columns: Vec<String> = self
            .selections
            .iter()
            .map(|s| format!("{} AS {}", s.expression, s.alias))
            .collect();
        let ids: Vec<String> = self.owner_ids.iter().map(Value::to_sql_literal).collect();

        format!(
            "SELECT {} FROM {} WHERE {} IN ({})",
            columns.join(", "),
            self.table,
            self.owner_column,
            ids.join(", ")
        )
    }
}

/// Relational store holding collection tables.
pub trait CollectionStore {
    /// Run a load statement; row columns follow `query.selections` order.
    fn load(&mut self, query: &LoadQuery) -> Result<QueryResult>;

    fn insert_row(&mut self, table: &str, row: &[(&str, Value)]) -> Result<()>;

    /// Delete rows matching every `(column, value)` pair; returns the count.
    fn delete_rows(&mut self, table: &str, criteria: &[(&str, Value)]) -> Result<usize>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::results::SelectionExpression;

    #[test]
    fn test_load_query_sql() {
        let query = LoadQuery {
            table: "customer_prefs".into(),
            owner_column: "customer_id".into(),
            owner_ids: vec![Value::Integer(1), Value::Text("x'y".into())],
            selections: vec![
                SqlSelection {
                    position: 0,
                    expression: SelectionExpression::Column("customer_id".into()),
                    alias: "c0_".into(),
                },
                SqlSelection {
                    position: 1,
                    expression: SelectionExpression::Formula("lower(k)".into()),
                    alias: "c1_".into(),
                },
            ],
        };

        assert_eq!(
            query.to_sql(),
            "SELECT customer_id AS c0_, (lower(k)) AS c1_ FROM customer_prefs \
             WHERE customer_id IN (1, 'x''y')"
        );
    }
}
