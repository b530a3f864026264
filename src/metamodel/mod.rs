//! Runtime metamodel: entity and collection descriptors built once from a
//! mapping document and shared read-only afterwards.

mod attribute;
mod cache;
mod collection;
mod comparator;
mod element;
mod entity;
mod navigable_path;
mod property_access;

pub use attribute::PluralAttribute;
pub use cache::{CacheStats, CachedCollection, CachedValue, CollectionCacheAccess};
pub use collection::{
    BagDescriptor, CollectionDescriptor, CollectionDescriptorCore, CollectionSemantics,
    ElementIter, ListDescriptor, MapDescriptor, QueuedOpsReplay, SetDescriptor,
};
pub use comparator::{ComparatorRegistry, KeyComparator};
pub use element::{CollectionElement, CollectionIndex, CollectionKey, IndexSource};
pub use entity::EntityDescriptor;
pub use navigable_path::NavigablePath;
pub use property_access::{FieldPropertyAccess, PropertyAccess};

use crate::config::MetamodelSettings;
use crate::core::{DbError, Result};
use crate::mapping::{AccessStrategy, MappingDocument};
use crate::results::CollectionLoader;
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;
use tracing::{Level, event, info_span};

/// Services available to descriptors while the metamodel is being built.
#[derive(Debug)]
pub struct RuntimeModelCreationContext<'a> {
    settings: &'a MetamodelSettings,
    comparators: &'a ComparatorRegistry,
    entities: &'a HashMap<String, EntityDescriptor>,
}

impl<'a> RuntimeModelCreationContext<'a> {
    pub fn new(
        settings: &'a MetamodelSettings,
        comparators: &'a ComparatorRegistry,
        entities: &'a HashMap<String, EntityDescriptor>,
    ) -> Self {
        Self {
            settings,
            comparators,
            entities,
        }
    }

    pub fn settings(&self) -> &MetamodelSettings {
        self.settings
    }

    pub fn comparators(&self) -> &ComparatorRegistry {
        self.comparators
    }

    pub fn entity(&self, name: &str) -> Option<&EntityDescriptor> {
        self.entities.get(name)
    }
}

/// Builds a [`Metamodel`] from a mapping document.
#[derive(Debug, Default)]
pub struct MetamodelBuilder {
    settings: MetamodelSettings,
    comparators: ComparatorRegistry,
}

impl MetamodelBuilder {
    pub fn new(settings: MetamodelSettings) -> Self {
        Self {
            settings,
            comparators: ComparatorRegistry::new(),
        }
    }

    /// Builder using the settings embedded in `doc`.
    pub fn for_document(doc: &MappingDocument) -> Self {
        Self::new(doc.settings.clone())
    }

    pub fn settings(&self) -> &MetamodelSettings {
        &self.settings
    }

    /// Register a named comparator for `"sort": {"custom": name}` mappings.
    pub fn with_comparator(mut self, comparator: KeyComparator) -> Self {
        self.comparators.register(comparator);
        self
    }

    pub fn build(&self, doc: &MappingDocument) -> Result<Metamodel> {
        let span = info_span!("metamodel.build", entities = doc.entities.len());
        let _guard = span.enter();

        let mut entities = HashMap::new();
        for mapping in &doc.entities {
            let entity = EntityDescriptor::from_mapping(mapping)?;
            if entities.insert(mapping.name.clone(), entity).is_some() {
                return Err(DbError::Mapping(format!(
                    "Entity '{}' is mapped twice",
                    mapping.name
                )));
            }
        }

        let ctx = RuntimeModelCreationContext::new(&self.settings, &self.comparators, &entities);
        let mut collections = BTreeMap::new();
        let mut attributes = HashMap::new();

        for mapping in &doc.entities {
            let owner = ctx.entity(&mapping.name).ok_or_else(|| {
                DbError::Mapping(format!("Entity '{}' was not registered", mapping.name))
            })?;

            for property in mapping.properties.iter().filter(|p| p.as_collection().is_some()) {
                let descriptor = CollectionDescriptor::from_property(property, owner, &ctx)?;
                let access: Arc<dyn PropertyAccess> = match property.access {
                    AccessStrategy::Field => {
                        Arc::new(FieldPropertyAccess::new(owner.name(), &property.name))
                    }
                };
                let attribute = descriptor.create_attribute(access);

                event!(
                    Level::DEBUG,
                    role = %descriptor.role(),
                    kind = %descriptor.kind(),
                    cached = descriptor.core().cache().is_some(),
                    "collection descriptor built"
                );

                attributes.insert(
                    (owner.name().to_string(), property.name.clone()),
                    attribute,
                );
                collections.insert(descriptor.role().to_string(), descriptor);
            }
        }

        event!(
            Level::INFO,
            entities = entities.len(),
            collections = collections.len(),
            "metamodel built"
        );

        Ok(Metamodel {
            settings: Arc::new(self.settings.clone()),
            entities: Arc::new(entities),
            collections: Arc::new(collections),
            attributes: Arc::new(attributes),
        })
    }
}

/// Immutable metamodel; cheap to clone and share across threads.
#[derive(Debug, Clone)]
pub struct Metamodel {
    settings: Arc<MetamodelSettings>,
    entities: Arc<HashMap<String, EntityDescriptor>>,
    collections: Arc<BTreeMap<String, CollectionDescriptor>>,
    attributes: Arc<HashMap<(String, String), PluralAttribute>>,
}

impl Metamodel {
    pub fn settings(&self) -> &MetamodelSettings {
        &self.settings
    }

    pub fn entity(&self, name: &str) -> Option<&EntityDescriptor> {
        self.entities.get(name)
    }

    /// Descriptor for role `Owner.property`.
    pub fn collection(&self, role: &str) -> Option<&CollectionDescriptor> {
        self.collections.get(role)
    }

    pub fn attribute(&self, owner: &str, property: &str) -> Option<&PluralAttribute> {
        self.attributes
            .get(&(owner.to_string(), property.to_string()))
    }

    /// All collection descriptors, ordered by role.
    pub fn collections(&self) -> impl Iterator<Item = &CollectionDescriptor> {
        self.collections.values()
    }

    pub fn entity_count(&self) -> usize {
        self.entities.len()
    }

    pub fn loader(&self, role: &str) -> Result<CollectionLoader> {
        let descriptor = self
            .collection(role)
            .ok_or_else(|| DbError::Mapping(format!("Unknown collection role '{}'", role)))?;
        Ok(CollectionLoader::new(descriptor.clone(), &self.settings))
    }
}
