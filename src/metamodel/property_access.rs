use crate::collection::{CollectionInstance, EntityState};
use crate::core::{DbError, Result};
use std::fmt;

/// Reads and writes one collection property on owning entity state.
pub trait PropertyAccess: Send + Sync + fmt::Debug {
    fn property_name(&self) -> &str;

    fn get<'a>(&self, owner: &'a EntityState) -> Option<&'a CollectionInstance>;

    /// Replace the property value, returning the previous one.
    fn set(
        &self,
        owner: &mut EntityState,
        collection: CollectionInstance,
    ) -> Result<Option<CollectionInstance>>;
}

/// Stores the collection under its property name in
/// [`EntityState::collections`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldPropertyAccess {
    entity_name: String,
    property_name: String,
}

impl FieldPropertyAccess {
    pub fn new(entity_name: impl Into<String>, property_name: impl Into<String>) -> Self {
        Self {
            entity_name: entity_name.into(),
            property_name: property_name.into(),
        }
    }

    fn check_owner(&self, owner: &EntityState) -> Result<()> {
        if owner.entity_name != self.entity_name {
            return Err(DbError::TypeMismatch(format!(
                "Property '{}.{}' cannot be set on a '{}' instance",
                self.entity_name, self.property_name, owner.entity_name
            )));
        }
        Ok(())
    }
}

impl PropertyAccess for FieldPropertyAccess {
    fn property_name(&self) -> &str {
        &self.property_name
    }

    fn get<'a>(&self, owner: &'a EntityState) -> Option<&'a CollectionInstance> {
        owner.collections.get(&self.property_name)
    }

    fn set(
        &self,
        owner: &mut EntityState,
        collection: CollectionInstance,
    ) -> Result<Option<CollectionInstance>> {
        self.check_owner(owner)?;
        Ok(owner
            .collections
            .insert(self.property_name.clone(), collection))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::collection::PersistentSet;

    #[test]
    fn test_set_replaces_previous_value() {
        let access = FieldPropertyAccess::new("Customer", "tags");
        let mut owner = EntityState::new("Customer", 1);

        assert!(access.get(&owner).is_none());
        let previous = access.set(&mut owner, PersistentSet::new().into()).unwrap();
        assert!(previous.is_none());
        assert!(access.get(&owner).is_some());
        assert!(access.set(&mut owner, PersistentSet::new().into()).unwrap().is_some());
    }

    #[test]
    fn test_wrong_owner_is_rejected() {
        let access = FieldPropertyAccess::new("Customer", "tags");
        let mut owner = EntityState::new("Order", 1);
        assert!(access.set(&mut owner, PersistentSet::new().into()).is_err());
    }
}
