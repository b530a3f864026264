use super::{
    CollectionDescriptor, CollectionDescriptorCore, CollectionSemantics, ElementIter,
    QueuedOpsReplay, replay_element_ops,
};
use crate::collection::{kind_mismatch, CollectionInstance, PersistentSet};
use crate::core::{DbError, Result, Value};
use crate::mapping::{CollectionKind, PropertyMapping};
use crate::metamodel::{
    EntityDescriptor, KeyComparator, NavigablePath, PluralAttribute, PropertyAccess,
    RuntimeModelCreationContext,
};
use crate::results::{
    CollectionInitializerProducer, DomainResultCreationState, DomainResultGenerator,
    ExecutionContext, LockMode, PluralInitializerProducer,
};
use crate::storage::CollectionStore;
use std::sync::Arc;

/// Descriptor of a collection of distinct elements, optionally sorted.
#[derive(Debug, Clone)]
pub struct SetDescriptor {
    core: Arc<CollectionDescriptorCore>,
    comparator: Option<KeyComparator>,
}

impl SetDescriptor {
    pub fn new(
        property: &PropertyMapping,
        owner: &EntityDescriptor,
        ctx: &RuntimeModelCreationContext<'_>,
    ) -> Result<Self> {
        let role = format!("{}.{}", owner.name(), property.name);
        let mapping = property
            .as_collection()
            .filter(|m| m.kind == CollectionKind::Set)
            .ok_or_else(|| DbError::Mapping(format!("Property '{}' is not a set", role)))?;

        let comparator = ctx.comparators().resolve(&mapping.sort, &role)?;
        let core = CollectionDescriptorCore::build(property, mapping, owner, ctx, false)?;

        Ok(Self {
            core: Arc::new(core),
            comparator,
        })
    }
}

impl CollectionSemantics for SetDescriptor {
    fn core(&self) -> &CollectionDescriptorCore {
        &self.core
    }

    fn sorting_comparator(&self) -> Option<&KeyComparator> {
        self.comparator.as_ref()
    }

    fn contains(&self, collection: &CollectionInstance, candidate: &Value) -> Result<bool> {
        Ok(collection.as_set()?.contains(candidate))
    }

    fn has_index(&self) -> bool {
        false
    }

    fn index_contains_formula(&self) -> bool {
        false
    }

    fn elements<'a>(
        &self,
        collection: &'a CollectionInstance,
        _ctx: &dyn ExecutionContext,
    ) -> Result<ElementIter<'a>> {
        Ok(Box::new(collection.as_set()?.iter()))
    }

    fn index_of(&self, collection: &CollectionInstance, _element: &Value) -> Result<Option<Value>> {
        collection.as_set()?;
        Ok(None)
    }

    fn create_attribute(&self, access: Arc<dyn PropertyAccess>) -> PluralAttribute {
        PluralAttribute::new(CollectionDescriptor::Set(self.clone()), access)
    }

    fn process_queued_ops(
        &self,
        collection: &mut CollectionInstance,
        owner_id: &Value,
        store: &mut dyn CollectionStore,
    ) -> Result<QueuedOpsReplay> {
        let set = match collection {
            CollectionInstance::Set(set) => set,
            other => return Err(kind_mismatch(CollectionKind::Set, other.kind())),
        };
        let (applied, outcome) =
            replay_element_ops(&self.core, set.queued_operations(), owner_id, store);
        set.acknowledge_queued_operations(applied);
        outcome?;
        Ok(QueuedOpsReplay::Applied {
            operations: applied,
        })
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
        let element_result = self.core.element_result(generator, path, selected, state);

        Ok(CollectionInitializerProducer::Plural(
            PluralInitializerProducer::new(
                CollectionDescriptor::Set(self.clone()),
                selected,
                result_variable.map(str::to_string),
                lock_mode,
                owner_result,
                None,
                element_result,
            ),
        ))
    }

    fn instantiate(&self) -> CollectionInstance {
        PersistentSet::with_comparator(self.comparator.clone()).into()
    }
}
