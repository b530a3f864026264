use crate::core::DataType;
use serde::{Deserialize, Serialize};
use std::fmt;

/// The collection semantics a property is mapped with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CollectionKind {
    Map,
    Set,
    List,
    Bag,
}

impl CollectionKind {
    /// Map and list collections are keyed (by map key or list position).
    pub fn is_indexed(&self) -> bool {
        matches!(self, Self::Map | Self::List)
    }
}

impl fmt::Display for CollectionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Map => write!(f, "map"),
            Self::Set => write!(f, "set"),
            Self::List => write!(f, "list"),
            Self::Bag => write!(f, "bag"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CollectionMapping {
    pub kind: CollectionKind,

    /// Collection table holding one row per entry
    pub table: String,

    /// Foreign-key column pointing back at the owner
    pub key_column: String,

    /// Map key or list position; required for indexed kinds
    #[serde(default)]
    pub index: Option<IndexMapping>,

    pub element: ElementMapping,

    #[serde(default)]
    pub sort: SortMapping,

    #[serde(default)]
    pub cache: Option<CacheMapping>,
}

/// Map key / list position source. Exactly one of `column` and `formula`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndexMapping {
    #[serde(default)]
    pub column: Option<String>,

    /// SQL expression computing the key
    #[serde(default)]
    pub formula: Option<String>,

    #[serde(rename = "type")]
    pub data_type: DataType,
}

impl IndexMapping {
    pub fn column(name: impl Into<String>, data_type: DataType) -> Self {
        Self {
            column: Some(name.into()),
            formula: None,
            data_type,
        }
    }

    pub fn formula(expression: impl Into<String>, data_type: DataType) -> Self {
        Self {
            column: None,
            formula: Some(expression.into()),
            data_type,
        }
    }

    pub fn has_formula(&self) -> bool {
        self.formula.is_some()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ElementMapping {
    Basic {
        column: String,
        #[serde(rename = "type")]
        data_type: DataType,
    },
    /// Reference to another mapped entity through a foreign-key column
    Entity { entity: String, column: String },
}

impl ElementMapping {
    pub fn column_name(&self) -> &str {
        match self {
            Self::Basic { column, .. } | Self::Entity { column, .. } => column,
        }
    }
}

/// Ordering applied to map keys (or set elements).
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortMapping {
    #[default]
    Unsorted,
    Natural,
    Reverse,
    /// Comparator registered on the metamodel builder under this name
    Custom(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CacheStrategy {
    ReadOnly,
    ReadWrite,
    NonstrictReadWrite,
    Transactional,
}

impl CacheStrategy {
    /// Strategies that write updated collection state back into the region.
    pub fn is_writable(&self) -> bool {
        !matches!(self, Self::ReadOnly)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CacheMapping {
    pub region: String,
    pub strategy: CacheStrategy,
    #[serde(default)]
    pub capacity: Option<usize>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_collection_mapping_from_json() {
        let mapping: CollectionMapping = serde_json::from_str(
            r#"{
                "kind": "map",
                "table": "customer_prefs",
                "key_column": "customer_id",
                "index": { "formula": "lower(pref_key)", "type": "text" },
                "element": { "basic": { "column": "pref_value", "type": "text" } },
                "sort": { "custom": "by_length" },
                "cache": { "region": "prefs", "strategy": "read_only" }
            }"#,
        )
        .unwrap();

        assert_eq!(mapping.kind, CollectionKind::Map);
        assert!(mapping.index.as_ref().unwrap().has_formula());
        assert_eq!(mapping.sort, SortMapping::Custom("by_length".into()));
        assert_eq!(mapping.element.column_name(), "pref_value");
        assert_eq!(mapping.cache.unwrap().capacity, None);
    }

    #[test]
    fn test_sort_defaults_to_unsorted() {
        let mapping: CollectionMapping = serde_json::from_str(
            r#"{
                "kind": "bag",
                "table": "tags",
                "key_column": "post_id",
                "element": { "basic": { "column": "tag", "type": "text" } }
            }"#,
        )
        .unwrap();
        assert_eq!(mapping.sort, SortMapping::Unsorted);
        assert!(mapping.index.is_none());
        assert!(!mapping.kind.is_indexed());
    }
}
