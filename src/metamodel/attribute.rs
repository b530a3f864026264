use super::{CollectionDescriptor, CollectionSemantics, PropertyAccess};
use crate::collection::{CollectionInstance, EntityState, kind_mismatch};
use crate::core::{DataType, Result};
use crate::mapping::CollectionKind;
use std::sync::Arc;

/// Collection-valued attribute of an entity.
///
/// Shares its descriptor with the metamodel and every other attribute built
/// from it.
#[derive(Debug, Clone)]
pub struct PluralAttribute {
    descriptor: CollectionDescriptor,
    access: Arc<dyn PropertyAccess>,
}

impl PluralAttribute {
    pub fn new(descriptor: CollectionDescriptor, access: Arc<dyn PropertyAccess>) -> Self {
        Self { descriptor, access }
    }

    pub fn name(&self) -> &str {
        self.descriptor.core().property_name()
    }

    pub fn kind(&self) -> CollectionKind {
        self.descriptor.kind()
    }

    pub fn owner(&self) -> &str {
        self.descriptor.core().owner_entity()
    }

    pub fn descriptor(&self) -> &CollectionDescriptor {
        &self.descriptor
    }

    pub fn access(&self) -> &Arc<dyn PropertyAccess> {
        &self.access
    }

    /// Key type for maps, position type for lists.
    pub fn key_type(&self) -> Option<&DataType> {
        self.descriptor.index().map(|index| index.data_type())
    }

    pub fn collection<'a>(&self, owner: &'a EntityState) -> Option<&'a CollectionInstance> {
        self.access.get(owner)
    }

    /// Store a loaded collection on `owner`; its kind must match this attribute.
    pub fn inject(&self, owner: &mut EntityState, collection: CollectionInstance) -> Result<()> {
        if collection.kind() != self.kind() {
            return Err(kind_mismatch(self.kind(), collection.kind()));
        }
        self.access.set(owner, collection)?;
        Ok(())
    }

    /// Give `owner` an empty collection unless it already has one.
    pub fn initialize_empty(&self, owner: &mut EntityState) -> Result<()> {
        if self.access.get(owner).is_none() {
            self.access.set(owner, self.descriptor.instantiate())?;
        }
        Ok(())
    }
}
