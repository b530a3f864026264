use super::{
    CollectionDescriptor, CollectionDescriptorCore, CollectionSemantics, ElementIter,
    QueuedOpsReplay,
};
use crate::collection::{CollectionInstance, PersistentList};
use crate::core::{DataType, DbError, Result, Value};
use crate::mapping::{CollectionKind, PropertyMapping, SortMapping};
use crate::metamodel::{
    CollectionIndex, EntityDescriptor, KeyComparator, NavigablePath, PluralAttribute,
    PropertyAccess, RuntimeModelCreationContext,
};
use crate::results::{
    CollectionInitializerProducer, DomainResultCreationState, DomainResultGenerator,
    ExecutionContext, LockMode, PluralInitializerProducer,
};
use crate::storage::CollectionStore;
use std::sync::Arc;
use tracing::{Level, event};

/// Descriptor of a positionally indexed collection.
#[derive(Debug, Clone)]
pub struct ListDescriptor {
    core: Arc<CollectionDescriptorCore>,
    index: Arc<CollectionIndex>,
    max_position_gap: usize,
}

impl ListDescriptor {
    pub fn new(
        property: &PropertyMapping,
        owner: &EntityDescriptor,
        ctx: &RuntimeModelCreationContext<'_>,
    ) -> Result<Self> {
        let role = format!("{}.{}", owner.name(), property.name);
        let mapping = property
            .as_collection()
            .filter(|m| m.kind == CollectionKind::List)
            .ok_or_else(|| DbError::Mapping(format!("Property '{}' is not a list", role)))?;

        let index_mapping = mapping.index.as_ref().ok_or_else(|| {
            DbError::Mapping(format!("List '{}' has no position column", role))
        })?;
        if index_mapping.has_formula() || index_mapping.data_type != DataType::Integer {
            return Err(DbError::Mapping(format!(
                "List '{}' needs an INTEGER position column",
                role
            )));
        }
        if mapping.sort != SortMapping::Unsorted {
            return Err(DbError::Mapping(format!(
                "List '{}' is ordered by position and cannot declare a sort",
                role
            )));
        }

        let index = CollectionIndex::from_mapping(index_mapping, &role)?;
        let core = CollectionDescriptorCore::build(property, mapping, owner, ctx, false)?;

        Ok(Self {
            core: Arc::new(core),
            index: Arc::new(index),
            max_position_gap: ctx.settings().max_list_position_gap,
        })
    }

    pub fn index(&self) -> &CollectionIndex {
        &self.index
    }

    /// NULL padding one row may add past the current list length.
    pub fn max_position_gap(&self) -> usize {
        self.max_position_gap
    }
}

impl CollectionSemantics for ListDescriptor {
    fn core(&self) -> &CollectionDescriptorCore {
        &self.core
    }

    fn sorting_comparator(&self) -> Option<&KeyComparator> {
        None
    }

    fn contains(&self, collection: &CollectionInstance, candidate: &Value) -> Result<bool> {
        Ok(collection.as_list()?.contains(candidate))
    }

    fn has_index(&self) -> bool {
        true
    }

    fn index_contains_formula(&self) -> bool {
        false
    }

    fn elements<'a>(
        &self,
        collection: &'a CollectionInstance,
        _ctx: &dyn ExecutionContext,
    ) -> Result<ElementIter<'a>> {
        Ok(Box::new(collection.as_list()?.iter()))
    }

    fn index_of(&self, collection: &CollectionInstance, element: &Value) -> Result<Option<Value>> {
        Ok(collection
            .as_list()?
            .iter()
            .position(|value| value.same_instance(element))
            .map(|pos| Value::Integer(pos as i64)))
    }

    fn create_attribute(&self, access: Arc<dyn PropertyAccess>) -> PluralAttribute {
        PluralAttribute::new(CollectionDescriptor::List(self.clone()), access)
    }

    fn process_queued_ops(
        &self,
        collection: &mut CollectionInstance,
        _owner_id: &Value,
        _store: &mut dyn CollectionStore,
    ) -> Result<QueuedOpsReplay> {
        let pending = collection.as_list()?.queued_operations().len();
        if pending == 0 {
            return Ok(QueuedOpsReplay::Applied { operations: 0 });
        }

        event!(
            Level::WARN,
            role = %self.core.role(),
            pending,
            "queued list operations are not replayed"
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
        let index_result = self
            .core
            .index_result(generator, &self.index, path, selected, state);
        let element_result = self.core.element_result(generator, path, selected, state);

        Ok(CollectionInitializerProducer::Plural(
            PluralInitializerProducer::new(
                CollectionDescriptor::List(self.clone()),
                selected,
                result_variable.map(str::to_string),
                lock_mode,
                owner_result,
                Some(index_result),
                element_result,
            ),
        ))
    }

    fn instantiate(&self) -> CollectionInstance {
        PersistentList::new().into()
    }
}
