use crate::core::{DbError, Result, Value};
use crate::mapping::SortMapping;
use std::cmp::Ordering;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

type CompareFn = dyn Fn(&Value, &Value) -> Ordering + Send + Sync;

/// Ordering applied to map keys or set elements.
#[derive(Clone)]
pub struct KeyComparator {
    name: String,
    compare: Arc<CompareFn>,
}

impl KeyComparator {
    pub fn new<F>(name: impl Into<String>, compare: F) -> Self
    where
        F: Fn(&Value, &Value) -> Ordering + Send + Sync + 'static,
    {
        Self {
            name: name.into(),
            compare: Arc::new(compare),
        }
    }

    /// Ascending order, NULL last.
    pub fn natural() -> Self {
        Self::new("natural", |a, b| a.sort_cmp(b))
    }

    pub fn reverse() -> Self {
        Self::new("reverse", |a, b| b.sort_cmp(a))
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn compare(&self, a: &Value, b: &Value) -> Ordering {
        (self.compare)(a, b)
    }
}

impl fmt::Debug for KeyComparator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("KeyComparator")
            .field("name", &self.name)
            .finish()
    }
}

/// Named comparators that mappings can refer to with `{"custom": "<name>"}`.
#[derive(Debug, Clone, Default)]
pub struct ComparatorRegistry {
    comparators: HashMap<String, KeyComparator>,
}

impl ComparatorRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, comparator: KeyComparator) {
        self.comparators
            .insert(comparator.name().to_string(), comparator);
    }

    pub fn get(&self, name: &str) -> Option<&KeyComparator> {
        self.comparators.get(name)
    }

    pub fn resolve(&self, sort: &SortMapping, role: &str) -> Result<Option<KeyComparator>> {
        match sort {
            SortMapping::Unsorted => Ok(None),
            SortMapping::Natural => Ok(Some(KeyComparator::natural())),
            SortMapping::Reverse => Ok(Some(KeyComparator::reverse())),
            SortMapping::Custom(name) => self.get(name).cloned().map(Some).ok_or_else(|| {
                DbError::Mapping(format!(
                    "Collection '{}' refers to unknown comparator '{}'",
                    role, name
                ))
            }),
        }
    }
}
