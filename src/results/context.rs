use crate::core::{EntityInstance, EntityRef, Result, Value};
use std::collections::HashMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LockMode {
    #[default]
    None,
    Read,
    Optimistic,
    PessimisticRead,
    PessimisticWrite,
}

/// Session-side services used during row processing.
pub trait ExecutionContext {
    fn lock_mode(&self) -> LockMode;

    /// Return the managed instance for `(entity_name, id)`.
    ///
    /// Repeated calls with the same key must return the same instance.
    fn resolve_entity(&mut self, entity_name: &str, id: Value) -> Result<EntityRef>;
}

/// Identity map scoped to one unit of work.
#[derive(Debug, Default)]
pub struct PersistenceContext {
    lock_mode: LockMode,
    entities: HashMap<(String, Value), EntityRef>,
}

impl PersistenceContext {
    pub fn new(lock_mode: LockMode) -> Self {
        Self {
            lock_mode,
            entities: HashMap::new(),
        }
    }

    /// Register a loaded instance, replacing any reference already held.
    pub fn register(&mut self, instance: EntityInstance) -> EntityRef {
        let key = (instance.entity_name.clone(), instance.id.clone());
        let entity = EntityRef::new(instance);
        self.entities.insert(key, entity.clone());
        entity
    }

    pub fn get(&self, entity_name: &str, id: &Value) -> Option<&EntityRef> {
        self.entities.get(&(entity_name.to_string(), id.clone()))
    }

    pub fn len(&self) -> usize {
        self.entities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }
}

impl ExecutionContext for PersistenceContext {
    fn lock_mode(&self) -> LockMode {
        self.lock_mode
    }

    fn resolve_entity(&mut self, entity_name: &str, id: Value) -> Result<EntityRef> {
        let entity = self
            .entities
            .entry((entity_name.to_string(), id.clone()))
            .or_insert_with(|| EntityRef::new(EntityInstance::new(entity_name, id)));
        Ok(entity.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_registered_instance_is_returned() {
        let mut ctx = PersistenceContext::new(LockMode::Read);
        let registered =
            ctx.register(EntityInstance::new("Product", 1).with_attribute("name", "Lamp"));

        let resolved = ctx.resolve_entity("Product", Value::Integer(1)).unwrap();
        assert!(resolved.ptr_eq(&registered));
        assert_eq!(resolved.attribute("name"), Some(&Value::from("Lamp")));
        assert_eq!(ctx.lock_mode(), LockMode::Read);
    }

    #[test]
    fn test_unknown_ids_become_references() {
        let mut ctx = PersistenceContext::default();
        let a = ctx.resolve_entity("Product", Value::Integer(5)).unwrap();
        let b = ctx.resolve_entity("Product", Value::Float(5.0)).unwrap();
        assert!(a.ptr_eq(&b));
        assert_eq!(ctx.len(), 1);
    }
}
