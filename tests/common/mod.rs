#![allow(dead_code)]

use rustmemodb_metamodel::core::Value;
use rustmemodb_metamodel::{
    KeyComparator, MappingDocument, Metamodel, MetamodelBuilder, MetamodelSettings,
};

pub const MAPPING: &str = r#"{
    "settings": { "batch_fetch_size": 2 },
    "entities": [
        {
            "name": "Product",
            "table": "products",
            "id": { "column": "id", "type": "integer" },
            "properties": [
                { "name": "title", "value": { "basic": { "column": "title", "type": "text" } } }
            ]
        },
        {
            "name": "Customer",
            "table": "customers",
            "id": { "column": "id", "type": "integer" },
            "properties": [
                {
                    "name": "ratings",
                    "value": { "collection": {
                        "kind": "map",
                        "table": "customer_ratings",
                        "key_column": "customer_id",
                        "index": { "column": "rank", "type": "integer" },
                        "element": { "basic": { "column": "label", "type": "text" } }
                    } }
                },
                {
                    "name": "preferences",
                    "value": { "collection": {
                        "kind": "map",
                        "table": "customer_prefs",
                        "key_column": "customer_id",
                        "index": { "column": "pref_key", "type": "text" },
                        "element": { "basic": { "column": "pref_value", "type": "text" } },
                        "sort": "natural",
                        "cache": { "region": "prefs", "strategy": "read_write" }
                    } }
                },
                {
                    "name": "aliases",
                    "value": { "collection": {
                        "kind": "map",
                        "table": "customer_aliases",
                        "key_column": "customer_id",
                        "index": { "formula": "lower(alias)", "type": "text" },
                        "element": { "basic": { "column": "target", "type": "text" } },
                        "cache": { "region": "aliases", "strategy": "read_only" }
                    } }
                },
                {
                    "name": "favorites",
                    "value": { "collection": {
                        "kind": "map",
                        "table": "customer_favorites",
                        "key_column": "customer_id",
                        "index": { "column": "slot", "type": "text" },
                        "element": { "entity": { "entity": "Product", "column": "product_id" } }
                    } }
                },
                {
                    "name": "tags",
                    "value": { "collection": {
                        "kind": "set",
                        "table": "customer_tags",
                        "key_column": "customer_id",
                        "element": { "basic": { "column": "tag", "type": "text" } },
                        "sort": "reverse"
                    } }
                },
                {
                    "name": "visits",
                    "value": { "collection": {
                        "kind": "bag",
                        "table": "customer_visits",
                        "key_column": "customer_id",
                        "element": { "basic": { "column": "city", "type": "text" } }
                    } }
                },
                {
                    "name": "wishlist",
                    "value": { "collection": {
                        "kind": "list",
                        "table": "customer_wishlist",
                        "key_column": "customer_id",
                        "index": { "column": "position", "type": "integer" },
                        "element": { "entity": { "entity": "Product", "column": "product_id" } }
                    } }
                }
            ]
        }
    ]
}"#;

pub fn document() -> MappingDocument {
    MappingDocument::from_json_str(MAPPING).unwrap()
}

pub fn model() -> Metamodel {
    let doc = document();
    MetamodelBuilder::for_document(&doc).build(&doc).unwrap()
}

pub fn model_with(settings: MetamodelSettings) -> Metamodel {
    MetamodelBuilder::new(settings).build(&document()).unwrap()
}

pub fn by_length() -> KeyComparator {
    KeyComparator::new("by_length", |a: &Value, b: &Value| {
        let len = |v: &Value| v.as_str().map_or(0, str::len);
        len(a).cmp(&len(b)).then_with(|| a.sort_cmp(b))
    })
}
