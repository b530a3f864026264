use crate::core::{Column, DbError, Result};
use crate::mapping::{EntityMapping, ValueMapping};
use std::collections::HashSet;

/// Structural description of one mapped entity.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntityDescriptor {
    name: String,
    table: String,
    id: Column,
    columns: Vec<(String, Column)>,
    collections: Vec<String>,
}

impl EntityDescriptor {
    pub fn from_mapping(mapping: &EntityMapping) -> Result<Self> {
        if mapping.name.trim().is_empty() {
            return Err(DbError::Mapping("Entity name cannot be empty".to_string()));
        }

        let mut seen = HashSet::new();
        let mut columns = Vec::new();
        let mut collections = Vec::new();

        for property in &mapping.properties {
            if !seen.insert(property.name.as_str()) {
                return Err(DbError::Mapping(format!(
                    "Entity '{}' maps property '{}' twice",
                    mapping.name, property.name
                )));
            }

            match &property.value {
                ValueMapping::Basic {
                    column,
                    data_type,
                    nullable,
                } => {
                    let mut col = Column::new(column.clone(), data_type.clone());
                    if !nullable {
                        col = col.not_null();
                    }
                    columns.push((property.name.clone(), col));
                }
                ValueMapping::Collection(_) => collections.push(property.name.clone()),
            }
        }

        Ok(Self {
            name: mapping.name.clone(),
            table: mapping.table.clone(),
            id: Column::new(mapping.id.column.clone(), mapping.id.data_type.clone()).not_null(),
            columns,
            collections,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn table(&self) -> &str {
        &self.table
    }

    pub fn id(&self) -> &Column {
        &self.id
    }

    /// Column backing a basic property.
    pub fn column(&self, property: &str) -> Option<&Column> {
        self.columns
            .iter()
            .find(|(name, _)| name == property)
            .map(|(_, column)| column)
    }

    pub fn basic_properties(&self) -> impl Iterator<Item = (&str, &Column)> {
        self.columns.iter().map(|(name, column)| (name.as_str(), column))
    }

    /// Names of collection-valued properties, in mapping order.
    pub fn collection_properties(&self) -> &[String] {
        &self.collections
    }
}
