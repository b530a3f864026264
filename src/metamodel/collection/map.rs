use super::{
    CollectionDescriptor, CollectionDescriptorCore, CollectionSemantics, ElementIter,
    QueuedOpsReplay,
};
use crate::collection::{CollectionInstance, PersistentMap};
use crate::core::{DbError, Result, Value};
use crate::mapping::{CollectionKind, PropertyMapping};
use crate::metamodel::{
    CollectionIndex, EntityDescriptor, KeyComparator, NavigablePath, PluralAttribute,
    PropertyAccess, RuntimeModelCreationContext,
};
use crate::results::{
    CollectionInitializerProducer, DomainResultCreationState, DomainResultGenerator,
    ExecutionContext, LockMode, MapInitializerProducer,
};
use crate::storage::CollectionStore;
use std::sync::Arc;
use tracing::{Level, event};

/// Descriptor of a persisted key-to-value collection.
///
/// Cheap to clone: structural facts are shared.
#[derive(Debug, Clone)]
pub struct MapDescriptor {
    core: Arc<CollectionDescriptorCore>,
    index: Arc<CollectionIndex>,
    comparator: Option<KeyComparator>,
    has_formula: bool,
}

impl MapDescriptor {
    pub fn new(
        property: &PropertyMapping,
        owner: &EntityDescriptor,
        ctx: &RuntimeModelCreationContext<'_>,
    ) -> Result<Self> {
        let role = format!("{}.{}", owner.name(), property.name);
        let mapping = property.as_collection().ok_or_else(|| {
            DbError::Mapping(format!("Property '{}' is not a collection", role))
        })?;

        if mapping.kind != CollectionKind::Map {
            return Err(DbError::Mapping(format!(
                "Property '{}' is mapped as a {}, not a map",
                role, mapping.kind
            )));
        }

        let index_mapping = mapping.index.as_ref().ok_or_else(|| {
            DbError::Mapping(format!(
                "Property '{}' does not describe an indexed collection",
                role
            ))
        })?;
        let index = CollectionIndex::from_mapping(index_mapping, &role)?;
        let has_formula = index.has_formula();
        let comparator = ctx.comparators().resolve(&mapping.sort, &role)?;
        let core = CollectionDescriptorCore::build(property, mapping, owner, ctx, has_formula)?;

        Ok(Self {
            core: Arc::new(core),
            index: Arc::new(index),
            comparator,
            has_formula,
        })
    }

    pub fn index(&self) -> &CollectionIndex {
        &self.index
    }

    /// Key containment, kept apart from [`CollectionSemantics::contains`]
    /// which only looks at values.
    pub fn contains_key(&self, collection: &CollectionInstance, key: &Value) -> Result<bool> {
        Ok(collection.as_map()?.contains_key(key))
    }
}

impl CollectionSemantics for MapDescriptor {
    fn core(&self) -> &CollectionDescriptorCore {
        &self.core
    }

    fn sorting_comparator(&self) -> Option<&KeyComparator> {
        self.comparator.as_ref()
    }

    fn contains(&self, collection: &CollectionInstance, candidate: &Value) -> Result<bool> {
        Ok(collection.as_map()?.contains_value(candidate))
    }

    fn has_index(&self) -> bool {
        true
    }

    fn index_contains_formula(&self) -> bool {
        self.has_formula
    }

    fn elements<'a>(
        &self,
        collection: &'a CollectionInstance,
        _ctx: &dyn ExecutionContext,
    ) -> Result<ElementIter<'a>> {
        Ok(Box::new(collection.as_map()?.values()))
    }

    fn index_of(&self, collection: &CollectionInstance, element: &Value) -> Result<Option<Value>> {
        Ok(collection
            .as_map()?
            .iter()
            .find(|(_, value)| value.same_instance(element))
            .map(|(key, _)| key.clone()))
    }

    fn create_attribute(&self, access: Arc<dyn PropertyAccess>) -> PluralAttribute {
        PluralAttribute::new(CollectionDescriptor::Map(self.clone()), access)
    }

    fn process_queued_ops(
        &self,
        collection: &mut CollectionInstance,
        _owner_id: &Value,
        _store: &mut dyn CollectionStore,
    ) -> Result<QueuedOpsReplay> {
        let pending = collection.as_map()?.queued_operations().len();
        if pending == 0 {
            return Ok(QueuedOpsReplay::Applied { operations: 0 });
        }

        event!(
            Level::WARN,
            role = %self.core.role(),
            pending,
            "queued map operations are not replayed"
        );
        Ok(QueuedOpsReplay::Unsupported { pending })
    }

    fn create_initializer_producer_with(
        &self,
        generator: &dyn DomainResultGenerator,
        path: &NavigablePath,
        selected: bool,
        result_variable: Option<&str>,
        lock_mode: LockMode,
        state: &mut DomainResultCreationState,
    ) -> Result<CollectionInitializerProducer> {
        let owner_result = self.core.owner_key_result(generator, path, state);
        let key_result = self
            .core
            .index_result(generator, &self.index, path, selected, state);
        let value_result = self.core.element_result(generator, path, selected, state);

        Ok(CollectionInitializerProducer::Map(MapInitializerProducer::new(
            self.clone(),
            selected,
            result_variable.map(str::to_string),
            lock_mode,
            owner_result,
            key_result,
            value_result,
        )))
    }

    fn instantiate(&self) -> CollectionInstance {
        PersistentMap::with_comparator(self.comparator.clone()).into()
    }
}
