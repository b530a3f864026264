use super::{
    CollectionDescriptor, CollectionDescriptorCore, CollectionSemantics, ElementIter,
    QueuedOpsReplay, replay_element_ops,
};
use crate::collection::{kind_mismatch, CollectionInstance, PersistentBag};
use crate::core::{DbError, Result, Value};
use crate::mapping::{CollectionKind, PropertyMapping, SortMapping};
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

/// Descriptor of an unordered collection that allows duplicates.
#[derive(Debug, Clone)]
pub struct BagDescriptor {
    core: Arc<CollectionDescriptorCore>,
}

impl BagDescriptor {
    pub fn new(
        property: &PropertyMapping,
        owner: &EntityDescriptor,
        ctx: &RuntimeModelCreationContext<'_>,
    ) -> Result<Self> {
        let role = format!("{}.{}", owner.name(), property.name);
        let mapping = property
            .as_collection()
            .filter(|m| m.kind == CollectionKind::Bag)
            .ok_or_else(|| DbError::Mapping(format!("Property '{}' is not a bag", role)))?;

        if mapping.sort != SortMapping::Unsorted {
            return Err(DbError::Mapping(format!(
                "Bag '{}' cannot declare an ordering",
                role
            )));
        }

        let core = CollectionDescriptorCore::build(property, mapping, owner, ctx, false)?;
        Ok(Self {
            core: Arc::new(core),
        })
    }
}

impl CollectionSemantics for BagDescriptor {
    fn core(&self) -> &CollectionDescriptorCore {
        &self.core
    }

    fn sorting_comparator(&self) -> Option<&KeyComparator> {
        None
    }

    fn contains(&self, collection: &CollectionInstance, candidate: &Value) -> Result<bool> {
        Ok(collection.as_bag()?.contains(candidate))
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
        Ok(Box::new(collection.as_bag()?.iter()))
    }

    fn index_of(&self, collection: &CollectionInstance, _element: &Value) -> Result<Option<Value>> {
        collection.as_bag()?;
        Ok(None)
    }

    fn create_attribute(&self, access: Arc<dyn PropertyAccess>) -> PluralAttribute {
        PluralAttribute::new(CollectionDescriptor::Bag(self.clone()), access)
    }

    fn process_queued_ops(
        &self,
        collection: &mut CollectionInstance,
        owner_id: &Value,
        store: &mut dyn CollectionStore,
    ) -> Result<QueuedOpsReplay> {
        let bag = match collection {
            CollectionInstance::Bag(bag) => bag,
            other => return Err(kind_mismatch(CollectionKind::Bag, other.kind())),
        };
        let (applied, outcome) =
            replay_element_ops(&self.core, bag.queued_operations(), owner_id, store);
        bag.acknowledge_queued_operations(applied);
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
                CollectionDescriptor::Bag(self.clone()),
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
        PersistentBag::new().into()
    }
}
