use super::{
    CollectionInitializerProducer, DomainResultCreationState, ExecutionContext, LoadedCollections,
    LockMode,
};
use crate::collection::CollectionInstance;
use crate::config::MetamodelSettings;
use crate::core::{Result, Value};
use crate::metamodel::{CachedCollection, CollectionDescriptor, CollectionSemantics};
use crate::storage::{CollectionStore, LoadQuery};
use std::collections::{HashMap, HashSet};
use tracing::{Level, event, info_span};

/// Loads the collections of one role for a set of owners.
#[derive(Debug, Clone)]
pub struct CollectionLoader {
    descriptor: CollectionDescriptor,
    batch_size: usize,
}

impl CollectionLoader {
    pub fn new(descriptor: CollectionDescriptor, settings: &MetamodelSettings) -> Self {
        Self {
            descriptor,
            batch_size: settings.effective_batch_size(),
        }
    }

    pub fn descriptor(&self) -> &CollectionDescriptor {
        &self.descriptor
    }

    pub fn batch_size(&self) -> usize {
        self.batch_size
    }

    /// Statement for one batch of owners, paired with the producer whose
    /// selections it renders.
    pub fn load_query(
        &self,
        owner_ids: &[Value],
        lock_mode: LockMode,
    ) -> Result<(LoadQuery, CollectionInitializerProducer)> {
        let core = self.descriptor.core();
        let mut state = DomainResultCreationState::new();
        let producer = self.descriptor.create_initializer_producer(
            &core.navigable_path(),
            true,
            None,
            lock_mode,
            &mut state,
        )?;

        let query = LoadQuery {
            table: core.table().to_string(),
            owner_column: core.key().column.clone(),
            owner_ids: owner_ids.to_vec(),
            selections: state.selections().to_vec(),
        };
        Ok((query, producer))
    }

    pub fn load_statement(&self, owner_ids: &[Value]) -> Result<String> {
        let (query, _) = self.load_query(owner_ids, LockMode::None)?;
        Ok(query.to_sql())
    }

    /// Load the collections of `owner_ids`, in request order.
    ///
    /// Owners found in the cache region are not queried; their cached
    /// entity elements are resolved through `ctx`. Owners without any row
    /// get an empty collection.
    pub fn load(
        &self,
        owner_ids: &[Value],
        store: &mut dyn CollectionStore,
        ctx: &mut dyn ExecutionContext,
    ) -> Result<LoadedCollections> {
        let core = self.descriptor.core();
        let span = info_span!(
            "collection.load",
            role = %core.role(),
            owners = owner_ids.len()
        );
        let _guard = span.enter();

        let key_type = &core.key().data_type;
        let mut requested = Vec::with_capacity(owner_ids.len());
        let mut seen = HashSet::new();
        for id in owner_ids {
            let id = key_type.coerce(id.clone())?;
            if !id.is_null() && seen.insert(id.clone()) {
                requested.push(id);
            }
        }

        let mut found: HashMap<Value, CollectionInstance> = HashMap::new();
        let mut missing = Vec::new();
        match core.cache() {
            Some(cache) => {
                for id in &requested {
                    match cache.get(id)? {
                        Some(cached) => {
                            let collection = cached.assemble(self.descriptor.instantiate(), ctx)?;
                            found.insert(id.clone(), collection);
                        }
                        None => missing.push(id.clone()),
                    }
                }
            }
            None => missing.extend(requested.iter().cloned()),
        }

        event!(
            Level::DEBUG,
            cached = found.len(),
            missing = missing.len(),
            "collection load planned"
        );

        for batch in missing.chunks(self.batch_size) {
            let (query, producer) = self.load_query(batch, ctx.lock_mode())?;
            let rows = store.load(&query)?;
            let mut initializer = producer.produce_initializer();
            for row in rows.iter() {
                initializer.process_row(row, ctx)?;
            }
            event!(
                Level::DEBUG,
                owners = batch.len(),
                rows = initializer.rows_processed(),
                "collection batch loaded"
            );

            for (owner, collection) in initializer.finish().into_entries() {
                found.insert(owner, collection);
            }
            for id in batch {
                let collection = found
                    .entry(id.clone())
                    .or_insert_with(|| self.descriptor.instantiate());
                if let Some(cache) = core.cache() {
                    cache.put(id.clone(), CachedCollection::disassemble(collection))?;
                }
            }
        }

        let mut loaded = LoadedCollections::new(core.role());
        for id in requested {
            let collection = found
                .remove(&id)
                .unwrap_or_else(|| self.descriptor.instantiate());
            loaded.push(id, collection);
        }
        Ok(loaded)
    }
}
