use crate::collection::{CollectionInstance, kind_mismatch};
use crate::config::MetamodelSettings;
use crate::core::{DbError, Result, Value};
use crate::mapping::{CacheMapping, CacheStrategy, CollectionKind};
use crate::results::ExecutionContext;
use lru::LruCache;
use std::num::NonZeroUsize;
use std::sync::Mutex;
use std::sync::atomic::{AtomicU64, Ordering};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CacheStats {
    pub hits: u64,
    pub misses: u64,
    pub entries: usize,
}

/// One cached value. Entity values keep only their name and id; the
/// instance is looked up again in whichever context reads the entry.
#[derive(Debug, Clone, PartialEq)]
pub enum CachedValue {
    Scalar(Value),
    EntityId { entity_name: String, id: Value },
}

impl CachedValue {
    fn disassemble(value: &Value) -> Self {
        match value {
            Value::Entity(entity) => Self::EntityId {
                entity_name: entity.entity_name().to_string(),
                id: entity.id().clone(),
            },
            other => Self::Scalar(other.clone()),
        }
    }

    fn assemble(&self, ctx: &mut dyn ExecutionContext) -> Result<Value> {
        match self {
            Self::Scalar(value) => Ok(value.clone()),
            Self::EntityId { entity_name, id } => {
                Ok(Value::Entity(ctx.resolve_entity(entity_name, id.clone())?))
            }
        }
    }
}

/// Disassembled state of one loaded collection.
#[derive(Debug, Clone, PartialEq)]
pub enum CachedCollection {
    Map(Vec<(CachedValue, CachedValue)>),
    Set(Vec<CachedValue>),
    List(Vec<CachedValue>),
    Bag(Vec<CachedValue>),
}

impl CachedCollection {
    pub fn disassemble(collection: &CollectionInstance) -> Self {
        fn values<'a>(iter: impl Iterator<Item = &'a Value>) -> Vec<CachedValue> {
            iter.map(CachedValue::disassemble).collect()
        }

        match collection {
            CollectionInstance::Map(map) => Self::Map(
                map.iter()
                    .map(|(k, v)| (CachedValue::disassemble(k), CachedValue::disassemble(v)))
                    .collect(),
            ),
            CollectionInstance::Set(set) => Self::Set(values(set.iter())),
            CollectionInstance::List(list) => Self::List(values(list.iter())),
            CollectionInstance::Bag(bag) => Self::Bag(values(bag.iter())),
        }
    }

    pub fn kind(&self) -> CollectionKind {
        match self {
            Self::Map(_) => CollectionKind::Map,
            Self::Set(_) => CollectionKind::Set,
            Self::List(_) => CollectionKind::List,
            Self::Bag(_) => CollectionKind::Bag,
        }
    }

    /// Fill `target`, a fresh instance of the same kind, resolving entity
    /// values through `ctx` the way a row read does.
    pub fn assemble(
        &self,
        target: CollectionInstance,
        ctx: &mut dyn ExecutionContext,
    ) -> Result<CollectionInstance> {
        match (self, target) {
            (Self::Map(entries), CollectionInstance::Map(mut map)) => {
                for (key, value) in entries {
                    map.put(key.assemble(ctx)?, value.assemble(ctx)?);
                }
                Ok(map.into())
            }
            (Self::Set(elements), CollectionInstance::Set(mut set)) => {
                for element in elements {
                    set.insert(element.assemble(ctx)?);
                }
                Ok(set.into())
            }
            (Self::List(elements), CollectionInstance::List(mut list)) => {
                for element in elements {
                    list.push(element.assemble(ctx)?);
                }
                Ok(list.into())
            }
            (Self::Bag(elements), CollectionInstance::Bag(mut bag)) => {
                for element in elements {
                    bag.add(element.assemble(ctx)?);
                }
                Ok(bag.into())
            }
            (cached, other) => Err(kind_mismatch(cached.kind(), other.kind())),
        }
    }
}

/// Second-level cache region for loaded collections, keyed by owner id.
#[derive(Debug)]
pub struct CollectionCacheAccess {
    region: String,
    strategy: CacheStrategy,
    entries: Mutex<LruCache<Value, CachedCollection>>,
    hits: AtomicU64,
    misses: AtomicU64,
}

impl CollectionCacheAccess {
    /// Resolve a cache mapping for collection `role`.
    ///
    /// `read_only_index` marks collections whose key is computed by a formula;
    /// writable strategies are rejected for them.
    pub fn from_mapping(
        mapping: &CacheMapping,
        settings: &MetamodelSettings,
        role: &str,
        read_only_index: bool,
    ) -> Result<Self> {
        if mapping.region.trim().is_empty() {
            return Err(DbError::Cache(format!(
                "Collection '{}' declares a cache with an empty region name",
                role
            )));
        }

        if read_only_index && mapping.strategy.is_writable() {
            return Err(DbError::Cache(format!(
                "Collection '{}' has a formula-derived key and cannot use a {:?} cache",
                role, mapping.strategy
            )));
        }

        let capacity = mapping.capacity.unwrap_or(settings.default_cache_capacity);
        let capacity = NonZeroUsize::new(capacity).ok_or_else(|| {
            DbError::Cache(format!(
                "Cache region '{}' for '{}' has zero capacity",
                mapping.region, role
            ))
        })?;

        Ok(Self {
            region: mapping.region.clone(),
            strategy: mapping.strategy,
            entries: Mutex::new(LruCache::new(capacity)),
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
        })
    }

    pub fn region(&self) -> &str {
        &self.region
    }

    pub fn strategy(&self) -> CacheStrategy {
        self.strategy
    }

    pub fn get(&self, owner_id: &Value) -> Result<Option<CachedCollection>> {
        let mut entries = self.entries.lock()?;
        let found = entries.get(owner_id).cloned();
        if found.is_some() {
            self.hits.fetch_add(1, Ordering::Relaxed);
        } else {
            self.misses.fetch_add(1, Ordering::Relaxed);
        }
        Ok(found)
    }

    /// Store a snapshot. Read-only regions keep the first snapshot they saw.
    pub fn put(&self, owner_id: Value, collection: CachedCollection) -> Result<()> {
        let mut entries = self.entries.lock()?;
        if !self.strategy.is_writable() && entries.contains(&owner_id) {
            return Ok(());
        }
        entries.put(owner_id, collection);
        Ok(())
    }

    pub fn evict(&self, owner_id: &Value) -> Result<bool> {
        Ok(self.entries.lock()?.pop(owner_id).is_some())
    }

    pub fn evict_all(&self) -> Result<()> {
        self.entries.lock()?.clear();
        Ok(())
    }

    pub fn stats(&self) -> Result<CacheStats> {
        let entries = self.entries.lock()?.len();
        Ok(CacheStats {
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
            entries,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::collection::{PersistentList, PersistentMap};
    use crate::core::{EntityInstance, EntityRef};
    use crate::results::PersistenceContext;

    fn mapping(strategy: CacheStrategy, capacity: Option<usize>) -> CacheMapping {
        CacheMapping {
            region: "prefs".to_string(),
            strategy,
            capacity,
        }
    }

    fn map_with(key: i64, value: &str) -> CachedCollection {
        let mut map = PersistentMap::new();
        map.put(Value::Integer(key), Value::from(value));
        CachedCollection::disassemble(&map.into())
    }

    #[test]
    fn test_lru_eviction_and_stats() {
        let settings = MetamodelSettings::default();
        let cache = CollectionCacheAccess::from_mapping(
            &mapping(CacheStrategy::ReadWrite, Some(1)),
            &settings,
            "A.b",
            false,
        )
        .unwrap();

        cache.put(Value::Integer(1), map_with(1, "a")).unwrap();
        cache.put(Value::Integer(2), map_with(2, "b")).unwrap();

        assert!(cache.get(&Value::Integer(1)).unwrap().is_none());
        assert!(cache.get(&Value::Integer(2)).unwrap().is_some());

        let stats = cache.stats().unwrap();
        assert_eq!(stats.hits, 1);
        assert_eq!(stats.misses, 1);
        assert_eq!(stats.entries, 1);
    }

    #[test]
    fn test_read_only_keeps_first_snapshot() {
        let cache = CollectionCacheAccess::from_mapping(
            &mapping(CacheStrategy::ReadOnly, None),
            &MetamodelSettings::default(),
            "A.b",
            true,
        )
        .unwrap();

        cache.put(Value::Integer(1), map_with(1, "first")).unwrap();
        cache.put(Value::Integer(1), map_with(1, "second")).unwrap();

        let cached = cache.get(&Value::Integer(1)).unwrap().unwrap();
        let map = cached
            .assemble(PersistentMap::new().into(), &mut PersistenceContext::default())
            .unwrap();
        assert_eq!(
            map.as_map().unwrap().get(&Value::Integer(1)),
            Some(&Value::from("first"))
        );
        assert!(cache.evict(&Value::Integer(1)).unwrap());
    }

    #[test]
    fn test_invalid_cache_mappings() {
        let settings = MetamodelSettings::default();
        let cases = [
            (mapping(CacheStrategy::ReadWrite, Some(0)), false),
            (mapping(CacheStrategy::ReadWrite, None), true),
            (
                CacheMapping {
                    region: " ".to_string(),
                    strategy: CacheStrategy::ReadOnly,
                    capacity: None,
                },
                false,
            ),
        ];

        for (cache_mapping, formula) in cases {
            let err =
                CollectionCacheAccess::from_mapping(&cache_mapping, &settings, "A.b", formula)
                    .unwrap_err();
            assert!(matches!(err, DbError::Cache(_)));
        }
    }

    #[test]
    fn test_entity_values_resolve_in_the_reading_context() {
        let mut map = PersistentMap::new();
        let loaded = EntityRef::new(EntityInstance::new("Product", 7));
        map.put(Value::from("first"), Value::Entity(loaded.clone()));
        let cached = CachedCollection::disassemble(&map.into());

        assert_eq!(
            cached,
            CachedCollection::Map(vec![(
                CachedValue::Scalar(Value::from("first")),
                CachedValue::EntityId {
                    entity_name: "Product".to_string(),
                    id: Value::Integer(7),
                },
            )])
        );

        let mut ctx = PersistenceContext::default();
        let managed = ctx.register(EntityInstance::new("Product", 7));
        let map = cached
            .assemble(PersistentMap::new().into(), &mut ctx)
            .unwrap();
        let value = map.as_map().unwrap().get(&Value::from("first")).unwrap();
        assert!(value.as_entity().unwrap().ptr_eq(&managed));
        assert!(!value.as_entity().unwrap().ptr_eq(&loaded));
    }

    #[test]
    fn test_assemble_rejects_other_kind() {
        let cached = map_with(1, "a");
        let err = cached
            .assemble(PersistentList::new().into(), &mut PersistenceContext::default())
            .unwrap_err();
        assert!(matches!(err, DbError::TypeMismatch(_)));
    }
}
