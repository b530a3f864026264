use super::QueuedOperation;
use crate::core::Value;

/// Runtime collection indexed by position.
#[derive(Debug, Clone, Default)]
pub struct PersistentList {
    elements: Vec<Value>,
    queue: Vec<QueuedOperation>,
}

impl PersistentList {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.elements.len()
    }

    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }

    pub fn get(&self, position: usize) -> Option<&Value> {
        self.elements.get(position)
    }

    pub fn push(&mut self, element: Value) {
        self.elements.push(element);
    }

    /// Place `element` at `position`, padding any gap with NULL.
    ///
    /// Every gap slot is allocated, so callers bound `position` first.
    pub fn set(&mut self, position: usize, element: Value) -> Option<Value> {
        if position >= self.elements.len() {
            self.elements.resize(position + 1, Value::Null);
            self.elements[position] = element;
            return None;
        }
        Some(std::mem::replace(&mut self.elements[position], element))
    }

    pub fn contains(&self, element: &Value) -> bool {
        self.elements.contains(element)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Value> {
        self.elements.iter()
    }

    pub fn queue_add(&mut self, element: Value) {
        self.queue.push(QueuedOperation::AddElement { element });
    }

    pub fn queue_clear(&mut self) {
        self.queue.push(QueuedOperation::Clear);
    }

    pub fn queued_operations(&self) -> &[QueuedOperation] {
        &self.queue
    }
}

impl FromIterator<Value> for PersistentList {
    fn from_iter<I: IntoIterator<Item = Value>>(iter: I) -> Self {
        Self {
            elements: iter.into_iter().collect(),
            queue: Vec::new(),
        }
    }
}
