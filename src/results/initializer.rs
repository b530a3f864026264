use super::{DomainResult, ExecutionContext, LockMode};
use crate::collection::CollectionInstance;
use crate::core::{DbError, Result, Value};
use crate::metamodel::{CollectionDescriptor, CollectionSemantics, MapDescriptor};
use crate::result::RowView;
use std::collections::HashMap;

/// Producer for map initializers: owner key, map key and map value results.
#[derive(Debug, Clone)]
pub struct MapInitializerProducer {
    descriptor: MapDescriptor,
    selected: bool,
    result_variable: Option<String>,
    lock_mode: LockMode,
    owner_result: DomainResult,
    key_result: DomainResult,
    value_result: DomainResult,
}

impl MapInitializerProducer {
    pub fn new(
        descriptor: MapDescriptor,
        selected: bool,
        result_variable: Option<String>,
        lock_mode: LockMode,
        owner_result: DomainResult,
        key_result: DomainResult,
        value_result: DomainResult,
    ) -> Self {
        Self {
            descriptor,
            selected,
            result_variable,
            lock_mode,
            owner_result,
            key_result,
            value_result,
        }
    }

    pub fn descriptor(&self) -> &MapDescriptor {
        &self.descriptor
    }

    pub fn key_result(&self) -> &DomainResult {
        &self.key_result
    }

    pub fn value_result(&self) -> &DomainResult {
        &self.value_result
    }
}

/// Producer for set, list and bag initializers.
#[derive(Debug, Clone)]
pub struct PluralInitializerProducer {
    descriptor: CollectionDescriptor,
    selected: bool,
    result_variable: Option<String>,
    lock_mode: LockMode,
    owner_result: DomainResult,
    index_result: Option<DomainResult>,
    element_result: DomainResult,
}

impl PluralInitializerProducer {
    pub fn new(
        descriptor: CollectionDescriptor,
        selected: bool,
        result_variable: Option<String>,
        lock_mode: LockMode,
        owner_result: DomainResult,
        index_result: Option<DomainResult>,
        element_result: DomainResult,
    ) -> Self {
        Self {
            descriptor,
            selected,
            result_variable,
            lock_mode,
            owner_result,
            index_result,
            element_result,
        }
    }

    pub fn descriptor(&self) -> &CollectionDescriptor {
        &self.descriptor
    }
}

#[derive(Debug, Clone)]
pub enum CollectionInitializerProducer {
    Map(MapInitializerProducer),
    Plural(PluralInitializerProducer),
}

impl CollectionInitializerProducer {
    pub fn role(&self) -> &str {
        match self {
            Self::Map(p) => p.descriptor.core().role(),
            Self::Plural(p) => p.descriptor.core().role(),
        }
    }

    /// Whether this collection is the primary selected result.
    pub fn is_selected(&self) -> bool {
        match self {
            Self::Map(p) => p.selected,
            Self::Plural(p) => p.selected,
        }
    }

    pub fn result_variable(&self) -> Option<&str> {
        match self {
            Self::Map(p) => p.result_variable.as_deref(),
            Self::Plural(p) => p.result_variable.as_deref(),
        }
    }

    pub fn lock_mode(&self) -> LockMode {
        match self {
            Self::Map(p) => p.lock_mode,
            Self::Plural(p) => p.lock_mode,
        }
    }

    pub fn owner_result(&self) -> &DomainResult {
        match self {
            Self::Map(p) => &p.owner_result,
            Self::Plural(p) => &p.owner_result,
        }
    }

    /// Map key or list position result.
    pub fn index_result(&self) -> Option<&DomainResult> {
        match self {
            Self::Map(p) => Some(&p.key_result),
            Self::Plural(p) => p.index_result.as_ref(),
        }
    }

    pub fn element_result(&self) -> &DomainResult {
        match self {
            Self::Map(p) => &p.value_result,
            Self::Plural(p) => &p.element_result,
        }
    }

    pub fn produce_initializer(&self) -> CollectionInitializer {
        let template = match self {
            Self::Map(p) => p.descriptor.instantiate(),
            Self::Plural(p) => p.descriptor.instantiate(),
        };
        let max_list_gap = match self {
            Self::Plural(PluralInitializerProducer {
                descriptor: CollectionDescriptor::List(list),
                ..
            }) => list.max_position_gap(),
            _ => 0,
        };

        CollectionInitializer {
            role: self.role().to_string(),
            owner_result: self.owner_result().clone(),
            index_result: self.index_result().cloned(),
            element_result: self.element_result().clone(),
            template,
            max_list_gap,
            collections: Vec::new(),
            positions: HashMap::new(),
            rows_processed: 0,
        }
    }
}

/// Populates one collection instance per owner from result rows.
#[derive(Debug)]
pub struct CollectionInitializer {
    role: String,
    owner_result: DomainResult,
    index_result: Option<DomainResult>,
    element_result: DomainResult,
    template: CollectionInstance,
    max_list_gap: usize,
    collections: Vec<(Value, CollectionInstance)>,
    positions: HashMap<Value, usize>,
    rows_processed: usize,
}

impl CollectionInitializer {
    /// Apply one row. Rows with a NULL owner key are skipped; rows with a
    /// NULL element only register the owner (empty collection).
    ///
    /// A list position may land at most `max_list_position_gap` slots past
    /// the owner's current list length.
    pub fn process_row(&mut self, row: RowView<'_>, ctx: &mut dyn ExecutionContext) -> Result<()> {
        self.rows_processed += 1;

        let owner = self.owner_result.assemble(row, ctx)?;
        if owner.is_null() {
            return Ok(());
        }

        let slot = match self.positions.get(&owner) {
            Some(&slot) => slot,
            None => {
                self.collections.push((owner.clone(), self.template.clone()));
                self.positions.insert(owner, self.collections.len() - 1);
                self.collections.len() - 1
            }
        };

        let element = self.element_result.assemble(row, ctx)?;
        if element.is_null() {
            return Ok(());
        }
        let index = match &self.index_result {
            Some(result) => Some(result.assemble(row, ctx)?),
            None => None,
        };

        let role = &self.role;
        let max_list_gap = self.max_list_gap;
        match &mut self.collections[slot].1 {
            CollectionInstance::Map(map) => {
                let key = required_index(index, role)?;
                map.put(key, element);
            }
            CollectionInstance::List(list) => {
                let key = required_index(index, role)?;
                let limit = list.len().saturating_add(max_list_gap);
                let position = key
                    .as_i64()
                    .and_then(|p| usize::try_from(p).ok())
                    .filter(|p| *p <= limit)
                    .ok_or_else(|| {
                        DbError::ConstraintViolation(format!(
                            "List '{}' has invalid position {} (at most {} for this row)",
                            role, key, limit
                        ))
                    })?;
                list.set(position, element);
            }
            CollectionInstance::Set(set) => {
                set.insert(element);
            }
            CollectionInstance::Bag(bag) => bag.add(element),
        }

        Ok(())
    }

    pub fn rows_processed(&self) -> usize {
        self.rows_processed
    }

    pub fn finish(self) -> LoadedCollections {
        LoadedCollections {
            role: self.role,
            entries: self.collections,
        }
    }
}

fn required_index(index: Option<Value>, role: &str) -> Result<Value> {
    match index {
        Some(key) if !key.is_null() => Ok(key),
        _ => Err(DbError::ConstraintViolation(format!(
            "Collection '{}' read a NULL index",
            role
        ))),
    }
}

/// Collections built by one initializer, in first-seen owner order.
#[derive(Debug, Clone, Default)]
pub struct LoadedCollections {
    role: String,
    entries: Vec<(Value, CollectionInstance)>,
}

impl LoadedCollections {
    pub fn new(role: impl Into<String>) -> Self {
        Self {
            role: role.into(),
            entries: Vec::new(),
        }
    }

    pub fn role(&self) -> &str {
        &self.role
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn get(&self, owner_id: &Value) -> Option<&CollectionInstance> {
        self.entries
            .iter()
            .find(|(owner, _)| owner == owner_id)
            .map(|(_, collection)| collection)
    }

    pub fn take(&mut self, owner_id: &Value) -> Option<CollectionInstance> {
        let pos = self.entries.iter().position(|(owner, _)| owner == owner_id)?;
        Some(self.entries.remove(pos).1)
    }

    pub fn push(&mut self, owner_id: Value, collection: CollectionInstance) {
        self.entries.push((owner_id, collection));
    }

    pub fn owners(&self) -> impl Iterator<Item = &Value> {
        self.entries.iter().map(|(owner, _)| owner)
    }

    pub fn into_entries(self) -> Vec<(Value, CollectionInstance)> {
        self.entries
    }
}
