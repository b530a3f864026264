//! Runtime collection instances and owning entity state.
//!
//! Descriptors never own these values; they only inspect and populate them.

mod bag;
mod list;
mod map;
mod queue;
mod set;

pub use bag::PersistentBag;
pub use list::PersistentList;
pub use map::PersistentMap;
pub use queue::QueuedOperation;
pub use set::PersistentSet;

use crate::core::{DbError, Result, Value};
use crate::mapping::CollectionKind;
use std::collections::BTreeMap;

#[derive(Debug, Clone)]
pub enum CollectionInstance {
    Map(PersistentMap),
    Set(PersistentSet),
    List(PersistentList),
    Bag(PersistentBag),
}

impl CollectionInstance {
    pub fn kind(&self) -> CollectionKind {
        match self {
            Self::Map(_) => CollectionKind::Map,
            Self::Set(_) => CollectionKind::Set,
            Self::List(_) => CollectionKind::List,
            Self::Bag(_) => CollectionKind::Bag,
        }
    }

    pub fn len(&self) -> usize {
        match self {
            Self::Map(m) => m.len(),
            Self::Set(s) => s.len(),
            Self::List(l) => l.len(),
            Self::Bag(b) => b.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn queued_operations(&self) -> &[QueuedOperation] {
        match self {
            Self::Map(m) => m.queued_operations(),
            Self::Set(s) => s.queued_operations(),
            Self::List(l) => l.queued_operations(),
            Self::Bag(b) => b.queued_operations(),
        }
    }

    pub fn as_map(&self) -> Result<&PersistentMap> {
        match self {
            Self::Map(m) => Ok(m),
            other => Err(kind_mismatch(CollectionKind::Map, other.kind())),
        }
    }

    pub fn as_map_mut(&mut self) -> Result<&mut PersistentMap> {
        match self {
            Self::Map(m) => Ok(m),
            other => Err(kind_mismatch(CollectionKind::Map, other.kind())),
        }
    }

    pub fn as_set(&self) -> Result<&PersistentSet> {
        match self {
            Self::Set(s) => Ok(s),
            other => Err(kind_mismatch(CollectionKind::Set, other.kind())),
        }
    }

    pub fn as_list(&self) -> Result<&PersistentList> {
        match self {
            Self::List(l) => Ok(l),
            other => Err(kind_mismatch(CollectionKind::List, other.kind())),
        }
    }

    pub fn as_bag(&self) -> Result<&PersistentBag> {
        match self {
            Self::Bag(b) => Ok(b),
            other => Err(kind_mismatch(CollectionKind::Bag, other.kind())),
        }
    }
}

pub(crate) fn kind_mismatch(expected: CollectionKind, actual: CollectionKind) -> DbError {
    DbError::TypeMismatch(format!(
        "Expected a {} collection instance, got a {}",
        expected, actual
    ))
}

impl From<PersistentMap> for CollectionInstance {
    fn from(map: PersistentMap) -> Self {
        Self::Map(map)
    }
}

impl From<PersistentSet> for CollectionInstance {
    fn from(set: PersistentSet) -> Self {
        Self::Set(set)
    }
}

impl From<PersistentList> for CollectionInstance {
    fn from(list: PersistentList) -> Self {
        Self::List(list)
    }
}

impl From<PersistentBag> for CollectionInstance {
    fn from(bag: PersistentBag) -> Self {
        Self::Bag(bag)
    }
}

/// Mutable state of one owning entity instance.
#[derive(Debug, Clone)]
pub struct EntityState {
    pub entity_name: String,
    pub id: Value,
    pub attributes: BTreeMap<String, Value>,
    pub collections: BTreeMap<String, CollectionInstance>,
}

impl EntityState {
    pub fn new(entity_name: impl Into<String>, id: impl Into<Value>) -> Self {
        Self {
            entity_name: entity_name.into(),
            id: id.into(),
            attributes: BTreeMap::new(),
            collections: BTreeMap::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_accessors() {
        let instance = CollectionInstance::from(PersistentMap::new());
        assert_eq!(instance.kind(), CollectionKind::Map);
        assert!(instance.as_map().is_ok());
        assert!(matches!(instance.as_set(), Err(DbError::TypeMismatch(_))));
        assert!(instance.is_empty());
    }
}
