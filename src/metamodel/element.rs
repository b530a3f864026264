use crate::core::{Column, DataType, DbError, Result, Value};
use crate::mapping::IndexMapping;

/// Foreign key from the collection table back to its owner.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CollectionKey {
    pub column: String,
    pub data_type: DataType,
}

impl CollectionKey {
    pub const NAVIGABLE_NAME: &'static str = "{key}";
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IndexSource {
    Column(String),
    Formula(String),
}

/// Map key or list position of an indexed collection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CollectionIndex {
    source: IndexSource,
    data_type: DataType,
}

impl CollectionIndex {
    pub const NAVIGABLE_NAME: &'static str = "{index}";

    pub fn from_mapping(mapping: &IndexMapping, role: &str) -> Result<Self> {
        let source = match (&mapping.column, &mapping.formula) {
            (Some(column), None) => IndexSource::Column(column.clone()),
            (None, Some(formula)) => IndexSource::Formula(formula.clone()),
            (Some(_), Some(_)) => {
                return Err(DbError::Mapping(format!(
                    "Index of '{}' declares both a column and a formula",
                    role
                )));
            }
            (None, None) => {
                return Err(DbError::Mapping(format!(
                    "Index of '{}' declares neither a column nor a formula",
                    role
                )));
            }
        };

        if let IndexSource::Formula(formula) | IndexSource::Column(formula) = &source {
            if formula.trim().is_empty() {
                return Err(DbError::Mapping(format!("Index of '{}' is empty", role)));
            }
        }

        Ok(Self {
            source,
            data_type: mapping.data_type.clone(),
        })
    }

    pub fn source(&self) -> &IndexSource {
        &self.source
    }

    pub fn data_type(&self) -> &DataType {
        &self.data_type
    }

    pub fn has_formula(&self) -> bool {
        matches!(self.source, IndexSource::Formula(_))
    }

    pub fn read(&self, raw: Value) -> Result<Value> {
        self.data_type.coerce(raw)
    }
}

/// Value side of a collection entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CollectionElement {
    Basic(Column),
    Entity {
        entity_name: String,
        column: String,
        id_type: DataType,
    },
}

impl CollectionElement {
    pub const NAVIGABLE_NAME: &'static str = "{element}";

    pub fn column_name(&self) -> &str {
        match self {
            Self::Basic(column) => &column.name,
            Self::Entity { column, .. } => column,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_formula_index() {
        let index = CollectionIndex::from_mapping(
            &IndexMapping::formula("lower(code)", DataType::Text),
            "Order.lines",
        )
        .unwrap();
        assert!(index.has_formula());
        assert_eq!(index.source(), &IndexSource::Formula("lower(code)".to_string()));
    }

    #[test]
    fn test_column_index() {
        let index = CollectionIndex::from_mapping(
            &IndexMapping::column("position", DataType::Integer),
            "Order.lines",
        )
        .unwrap();
        assert!(!index.has_formula());
        assert_eq!(index.source(), &IndexSource::Column("position".to_string()));
        assert_eq!(index.read(Value::Float(2.0)).unwrap(), Value::Integer(2));
    }

    #[test]
    fn test_index_needs_exactly_one_source() {
        let both = IndexMapping {
            column: Some("k".into()),
            formula: Some("upper(k)".into()),
            data_type: DataType::Text,
        };
        let neither = IndexMapping {
            column: None,
            formula: None,
            data_type: DataType::Text,
        };
        let blank = IndexMapping::formula("  ", DataType::Text);

        for mapping in [both, neither, blank] {
            let err = CollectionIndex::from_mapping(&mapping, "A.b").unwrap_err();
            assert!(matches!(err, DbError::Mapping(_)));
        }
    }
}
