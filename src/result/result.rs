use crate::core::{DbError, Result, Row, Value};

/// Rows returned by a [`CollectionStore`](crate::storage::CollectionStore) query.
#[derive(Debug, Clone, Default)]
pub struct QueryResult {
    pub columns: Vec<String>,
    pub rows: Vec<Row>,
}

impl QueryResult {
    pub fn empty() -> Self {
        Self {
            columns: Vec::new(),
            rows: Vec::new(),
        }
    }

    pub fn new(columns: Vec<String>, rows: Vec<Row>) -> Self {
        Self { columns, rows }
    }

    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn rows(&self) -> &[Row] {
        &self.rows
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c.eq_ignore_ascii_case(name))
    }

    /// Iterate rows as positional views.
    pub fn iter(&self) -> impl Iterator<Item = RowView<'_>> {
        self.rows.iter().map(|row| RowView { row })
    }
}

/// Positional, read-only access to one result row.
#[derive(Debug, Clone, Copy)]
pub struct RowView<'a> {
    row: &'a [Value],
}

impl<'a> RowView<'a> {
    pub fn new(row: &'a [Value]) -> Self {
        Self { row }
    }

    pub fn len(&self) -> usize {
        self.row.len()
    }

    pub fn is_empty(&self) -> bool {
        self.row.is_empty()
    }

    /// Read the value at `position`; a short row is an execution error.
    pub fn get(&self, position: usize) -> Result<&'a Value> {
        self.row.get(position).ok_or_else(|| {
            DbError::ExecutionError(format!(
                "Row has {} column(s), selection expects position {}",
                self.row.len(),
                position
            ))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_column_lookup_is_case_insensitive() {
        let result = QueryResult::new(vec!["owner_id".into(), "KEY".into()], vec![]);
        assert_eq!(result.column_index("key"), Some(1));
        assert_eq!(result.column_index("missing"), None);
        assert!(result.is_empty());
    }

    #[test]
    fn test_row_view_out_of_range() {
        let result = QueryResult::new(vec!["a".into()], vec![vec![Value::Integer(1)]]);
        let row = result.iter().next().unwrap();
        assert_eq!(row.get(0).unwrap(), &Value::Integer(1));
        assert!(matches!(row.get(3), Err(DbError::ExecutionError(_))));
    }
}
