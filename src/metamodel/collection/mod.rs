//! Collection descriptors.
//!
//! Each persisted collection attribute gets exactly one descriptor, chosen by
//! its mapped [`CollectionKind`] when the metamodel is built. All variants
//! implement [`CollectionSemantics`]; [`CollectionDescriptor`] dispatches over
//! the closed set without virtual calls.

mod bag;
mod list;
mod map;
mod set;

pub use bag::BagDescriptor;
pub use list::ListDescriptor;
pub use map::MapDescriptor;
pub use set::SetDescriptor;

use super::cache::CollectionCacheAccess;
use super::element::{CollectionElement, CollectionKey};
use super::{
    CollectionIndex, EntityDescriptor, KeyComparator, NavigablePath, PluralAttribute,
    PropertyAccess, RuntimeModelCreationContext,
};
use crate::collection::{CollectionInstance, QueuedOperation};
use crate::core::{Column, DbError, Result, Value};
use crate::mapping::{CollectionKind, CollectionMapping, ElementMapping, PropertyMapping};
use crate::results::{
    CollectionInitializerProducer, DomainResult, DomainResultCreationState,
    DomainResultGenerator, ExecutionContext, LockMode, SqlAstHelper,
};
use crate::storage::CollectionStore;
use std::sync::Arc;
use tracing::{Level, event};

/// Lazy, forward-only iterator over collection values.
pub type ElementIter<'a> = Box<dyn Iterator<Item = &'a Value> + 'a>;

/// Outcome of replaying queued collection operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QueuedOpsReplay {
    /// Every queued operation was written to the store.
    Applied { operations: usize },
    /// Nothing was written; the queue is left as it was.
    Unsupported { pending: usize },
}

/// Capabilities shared by every collection descriptor variant.
pub trait CollectionSemantics {
    fn core(&self) -> &CollectionDescriptorCore;

    /// Key (or element) ordering; `None` means no defined order.
    fn sorting_comparator(&self) -> Option<&KeyComparator>;

    /// Whether `candidate` is one of the collection's values.
    fn contains(&self, collection: &CollectionInstance, candidate: &Value) -> Result<bool>;

    fn has_index(&self) -> bool;

    /// True when the index is computed by a formula and is therefore read-only.
    fn index_contains_formula(&self) -> bool;

    /// Values of `collection` as they are when iteration starts.
    fn elements<'a>(
        &self,
        collection: &'a CollectionInstance,
        ctx: &dyn ExecutionContext,
    ) -> Result<ElementIter<'a>>;

    /// Index of the entry holding this exact instance.
    ///
    /// Matching uses reference identity ([`Value::same_instance`]), not value
    /// equality: an equal-but-distinct entity instance is not found.
    fn index_of(&self, collection: &CollectionInstance, element: &Value) -> Result<Option<Value>>;

    fn create_attribute(&self, access: Arc<dyn PropertyAccess>) -> PluralAttribute;

    /// Write queued mutations to the store.
    ///
    /// Written operations leave the queue; on a store error the unwritten
    /// ones stay queued.
    fn process_queued_ops(
        &self,
        collection: &mut CollectionInstance,
        owner_id: &Value,
        store: &mut dyn CollectionStore,
    ) -> Result<QueuedOpsReplay>;

    fn create_initializer_producer_with(
        &self,
        generator: &dyn DomainResultGenerator,
        path: &NavigablePath,
        selected: bool,
        result_variable: Option<&str>,
        lock_mode: LockMode,
        state: &mut DomainResultCreationState,
    ) -> Result<CollectionInitializerProducer>;

    fn create_initializer_producer(
        &self,
        path: &NavigablePath,
        selected: bool,
        result_variable: Option<&str>,
        lock_mode: LockMode,
        state: &mut DomainResultCreationState,
    ) -> Result<CollectionInitializerProducer> {
        self.create_initializer_producer_with(
            &SqlAstHelper,
            path,
            selected,
            result_variable,
            lock_mode,
            state,
        )
    }

    /// A new, empty instance carrying this descriptor's ordering.
    fn instantiate(&self) -> CollectionInstance;
}

/// Structural facts common to all collection kinds.
#[derive(Debug)]
pub struct CollectionDescriptorCore {
    role: String,
    owner_entity: String,
    property_name: String,
    kind: CollectionKind,
    table: String,
    key: CollectionKey,
    element: CollectionElement,
    cache: Option<CollectionCacheAccess>,
}

impl CollectionDescriptorCore {
    pub(crate) fn build(
        property: &PropertyMapping,
        mapping: &CollectionMapping,
        owner: &EntityDescriptor,
        ctx: &RuntimeModelCreationContext<'_>,
        read_only_index: bool,
    ) -> Result<Self> {
        let role = format!("{}.{}", owner.name(), property.name);

        let element = match &mapping.element {
            ElementMapping::Basic { column, data_type } => {
                CollectionElement::Basic(Column::new(column.clone(), data_type.clone()))
            }
            ElementMapping::Entity { entity, column } => {
                let target = ctx.entity(entity).ok_or_else(|| {
                    DbError::Mapping(format!(
                        "Collection '{}' references unknown entity '{}'",
                        role, entity
                    ))
                })?;
                CollectionElement::Entity {
                    entity_name: entity.clone(),
                    column: column.clone(),
                    id_type: target.id().data_type.clone(),
                }
            }
        };

        let cache = match (&mapping.cache, ctx.settings().second_level_cache) {
            (Some(cache), true) => Some(CollectionCacheAccess::from_mapping(
                cache,
                ctx.settings(),
                &role,
                read_only_index,
            )?),
            _ => None,
        };

        Ok(Self {
            key: CollectionKey {
                column: mapping.key_column.clone(),
                data_type: owner.id().data_type.clone(),
            },
            owner_entity: owner.name().to_string(),
            property_name: property.name.clone(),
            kind: mapping.kind,
            table: mapping.table.clone(),
            element,
            cache,
            role,
        })
    }

    /// `Owner.property`
    pub fn role(&self) -> &str {
        &self.role
    }

    pub fn owner_entity(&self) -> &str {
        &self.owner_entity
    }

    pub fn property_name(&self) -> &str {
        &self.property_name
    }

    pub fn kind(&self) -> CollectionKind {
        self.kind
    }

    pub fn table(&self) -> &str {
        &self.table
    }

    pub fn key(&self) -> &CollectionKey {
        &self.key
    }

    pub fn element(&self) -> &CollectionElement {
        &self.element
    }

    pub fn cache(&self) -> Option<&CollectionCacheAccess> {
        self.cache.as_ref()
    }

    /// Root path of this collection inside a load tree.
    pub fn navigable_path(&self) -> NavigablePath {
        NavigablePath::new(self.owner_entity.clone()).append(&self.property_name)
    }

    pub(crate) fn owner_key_result(
        &self,
        generator: &dyn DomainResultGenerator,
        path: &NavigablePath,
        state: &mut DomainResultCreationState,
    ) -> DomainResult {
        generator.collection_key_result(&path.append(CollectionKey::NAVIGABLE_NAME), &self.key, state)
    }

    pub(crate) fn element_result(
        &self,
        generator: &dyn DomainResultGenerator,
        path: &NavigablePath,
        selected: bool,
        state: &mut DomainResultCreationState,
    ) -> DomainResult {
        generator.collection_element_result(
            &path.append(CollectionElement::NAVIGABLE_NAME),
            &self.element,
            selected,
            None,
            state,
        )
    }

    pub(crate) fn index_result(
        &self,
        generator: &dyn DomainResultGenerator,
        index: &CollectionIndex,
        path: &NavigablePath,
        selected: bool,
        state: &mut DomainResultCreationState,
    ) -> DomainResult {
        generator.collection_index_result(
            &path.append(CollectionIndex::NAVIGABLE_NAME),
            index,
            selected,
            None,
            state,
        )
    }
}

/// Stored column value for an element; entity elements store their id.
pub(crate) fn element_column_value(element: &Value) -> Value {
    match element {
        Value::Entity(entity) => entity.id().clone(),
        other => other.clone(),
    }
}

/// Replay element-level operations (set/bag semantics) against `store`.
///
/// Stops at the first failure. Returns how many operations were written
/// along with the outcome, so the caller can keep the unwritten tail queued.
pub(crate) fn replay_element_ops(
    core: &CollectionDescriptorCore,
    operations: &[QueuedOperation],
    owner_id: &Value,
    store: &mut dyn CollectionStore,
) -> (usize, Result<()>) {
    for (applied, operation) in operations.iter().enumerate() {
        if let Err(err) = replay_element_op(core, operation, owner_id, store) {
            event!(
                Level::WARN,
                role = %core.role(),
                applied,
                pending = operations.len() - applied,
                operation = operation.name(),
                "queued operation replay stopped"
            );
            return (applied, Err(err));
        }
    }
    (operations.len(), Ok(()))
}

fn replay_element_op(
    core: &CollectionDescriptorCore,
    operation: &QueuedOperation,
    owner_id: &Value,
    store: &mut dyn CollectionStore,
) -> Result<()> {
    let owner_column = core.key().column.as_str();
    let element_column = core.element().column_name();

    match operation {
        QueuedOperation::AddElement { element } => store.insert_row(
            core.table(),
            &[
                (owner_column, owner_id.clone()),
                (element_column, element_column_value(element)),
            ],
        ),
        QueuedOperation::RemoveElement { element } => store
            .delete_rows(
                core.table(),
                &[
                    (owner_column, owner_id.clone()),
                    (element_column, element_column_value(element)),
                ],
            )
            .map(|_| ()),
        QueuedOperation::Clear => store
            .delete_rows(core.table(), &[(owner_column, owner_id.clone())])
            .map(|_| ()),
        other => Err(DbError::UnsupportedOperation(format!(
            "Operation '{}' is not valid for collection '{}'",
            other.name(),
            core.role()
        ))),
    }
}

/// Descriptor for one collection attribute, selected by collection kind.
#[derive(Debug, Clone)]
pub enum CollectionDescriptor {
    Map(MapDescriptor),
    Set(SetDescriptor),
    List(ListDescriptor),
    Bag(BagDescriptor),
}

impl CollectionDescriptor {
    /// Build the descriptor matching the property's mapped kind.
    pub fn from_property(
        property: &PropertyMapping,
        owner: &EntityDescriptor,
        ctx: &RuntimeModelCreationContext<'_>,
    ) -> Result<Self> {
        let mapping = property.as_collection().ok_or_else(|| {
            DbError::Mapping(format!(
                "Property '{}.{}' is not a collection",
                owner.name(),
                property.name
            ))
        })?;

        Ok(match mapping.kind {
            CollectionKind::Map => Self::Map(MapDescriptor::new(property, owner, ctx)?),
            CollectionKind::Set => Self::Set(SetDescriptor::new(property, owner, ctx)?),
            CollectionKind::List => Self::List(ListDescriptor::new(property, owner, ctx)?),
            CollectionKind::Bag => Self::Bag(BagDescriptor::new(property, owner, ctx)?),
        })
    }

    pub fn kind(&self) -> CollectionKind {
        self.core().kind()
    }

    pub fn role(&self) -> &str {
        self.core().role()
    }

    pub fn as_map(&self) -> Option<&MapDescriptor> {
        match self {
            Self::Map(map) => Some(map),
            _ => None,
        }
    }

    /// Index descriptor for map and list variants.
    pub fn index(&self) -> Option<&CollectionIndex> {
        match self {
            Self::Map(map) => Some(map.index()),
            Self::List(list) => Some(list.index()),
            Self::Set(_) | Self::Bag(_) => None,
        }
    }
}

macro_rules! dispatch {
    ($self:ident, $d:ident => $body:expr) => {
        match $self {
            CollectionDescriptor::Map($d) => $body,
            CollectionDescriptor::Set($d) => $body,
            CollectionDescriptor::List($d) => $body,
            CollectionDescriptor::Bag($d) => $body,
        }
    };
}

impl CollectionSemantics for CollectionDescriptor {
    fn core(&self) -> &CollectionDescriptorCore {
        dispatch!(self, d => d.core())
    }

    fn sorting_comparator(&self) -> Option<&KeyComparator> {
        dispatch!(self, d => d.sorting_comparator())
    }

    fn contains(&self, collection: &CollectionInstance, candidate: &Value) -> Result<bool> {
        dispatch!(self, d => d.contains(collection, candidate))
    }

    fn has_index(&self) -> bool {
        dispatch!(self, d => d.has_index())
    }

    fn index_contains_formula(&self) -> bool {
        dispatch!(self, d => d.index_contains_formula())
    }

    fn elements<'a>(
        &self,
        collection: &'a CollectionInstance,
        ctx: &dyn ExecutionContext,
    ) -> Result<ElementIter<'a>> {
        dispatch!(self, d => d.elements(collection, ctx))
    }

    fn index_of(&self, collection: &CollectionInstance, element: &Value) -> Result<Option<Value>> {
        dispatch!(self, d => d.index_of(collection, element))
    }

    fn create_attribute(&self, access: Arc<dyn PropertyAccess>) -> PluralAttribute {
        dispatch!(self, d => d.create_attribute(access))
    }

    fn process_queued_ops(
        &self,
        collection: &mut CollectionInstance,
        owner_id: &Value,
        store: &mut dyn CollectionStore,
    ) -> Result<QueuedOpsReplay> {
        dispatch!(self, d => d.process_queued_ops(collection, owner_id, store))
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
        dispatch!(self, d => d.create_initializer_producer_with(
            generator,
            path,
            selected,
            result_variable,
            lock_mode,
            state,
        ))
    }

    fn instantiate(&self) -> CollectionInstance {
        dispatch!(self, d => d.instantiate())
    }
}
