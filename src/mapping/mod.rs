//! Declarative mapping documents.
//!
//! A mapping document lists entities, their basic properties, and their
//! collection properties. It is the input to
//! [`MetamodelBuilder`](crate::metamodel::MetamodelBuilder).

mod collection;

pub use collection::{
    CacheMapping, CacheStrategy, CollectionKind, CollectionMapping, ElementMapping, IndexMapping,
    SortMapping,
};

use crate::config::MetamodelSettings;
use crate::core::{DataType, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct MappingDocument {
    #[serde(default)]
    pub settings: MetamodelSettings,
    #[serde(default)]
    pub entities: Vec<EntityMapping>,
}

impl MappingDocument {
    pub fn from_json_str(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let contents = fs::read_to_string(path.as_ref())?;
        Self::from_json_str(&contents)
    }

    pub fn entity(&self, name: &str) -> Option<&EntityMapping> {
        self.entities.iter().find(|e| e.name == name)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntityMapping {
    pub name: String,
    pub table: String,
    pub id: IdMapping,
    #[serde(default)]
    pub properties: Vec<PropertyMapping>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IdMapping {
    pub column: String,
    #[serde(rename = "type")]
    pub data_type: DataType,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PropertyMapping {
    pub name: String,
    #[serde(default)]
    pub access: AccessStrategy,
    pub value: ValueMapping,
}

impl PropertyMapping {
    pub fn basic(name: impl Into<String>, column: impl Into<String>, data_type: DataType) -> Self {
        Self {
            name: name.into(),
            access: AccessStrategy::Field,
            value: ValueMapping::Basic {
                column: column.into(),
                data_type,
                nullable: true,
            },
        }
    }

    pub fn collection(name: impl Into<String>, mapping: CollectionMapping) -> Self {
        Self {
            name: name.into(),
            access: AccessStrategy::Field,
            value: ValueMapping::Collection(mapping),
        }
    }

    pub fn as_collection(&self) -> Option<&CollectionMapping> {
        match &self.value {
            ValueMapping::Collection(mapping) => Some(mapping),
            ValueMapping::Basic { .. } => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AccessStrategy {
    #[default]
    Field,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ValueMapping {
    Basic {
        column: String,
        #[serde(rename = "type")]
        data_type: DataType,
        #[serde(default = "default_nullable")]
        nullable: bool,
    },
    Collection(CollectionMapping),
}

fn default_nullable() -> bool {
    true
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::DbError;

    const DOCUMENT: &str = r#"{
        "settings": { "batch_fetch_size": 2 },
        "entities": [
            {
                "name": "Customer",
                "table": "customers",
                "id": { "column": "id", "type": "integer" },
                "properties": [
                    { "name": "name", "value": { "basic": { "column": "name", "type": "text" } } },
                    {
                        "name": "preferences",
                        "value": { "collection": {
                            "kind": "map",
                            "table": "customer_prefs",
                            "key_column": "customer_id",
                            "index": { "column": "pref_key", "type": "text" },
                            "element": { "basic": { "column": "pref_value", "type": "text" } }
                        } }
                    }
                ]
            }
        ]
    }"#;

    #[test]
    fn test_document_parses() {
        let doc = MappingDocument::from_json_str(DOCUMENT).unwrap();
        assert_eq!(doc.settings.batch_fetch_size, 2);

        let customer = doc.entity("Customer").unwrap();
        assert_eq!(customer.properties.len(), 2);
        assert!(customer.properties[0].as_collection().is_none());
        assert_eq!(customer.properties[1].access, AccessStrategy::Field);
        assert_eq!(
            customer.properties[1].as_collection().unwrap().kind,
            CollectionKind::Map
        );
    }

    #[test]
    fn test_unknown_access_strategy_is_config_error() {
        let json = r#"{ "name": "x", "access": "reflection",
            "value": { "basic": { "column": "x", "type": "text" } } }"#;
        let err = serde_json::from_str::<PropertyMapping>(json)
            .map_err(DbError::from)
            .unwrap_err();
        assert!(matches!(err, DbError::Config(_)));
    }

    #[test]
    fn test_missing_file_is_io_error() {
        let err = MappingDocument::from_path("/definitely/not/here.json").unwrap_err();
        assert!(matches!(err, DbError::IoError(_)));
    }
}
