use super::QueuedOperation;
use crate::core::Value;
use crate::metamodel::KeyComparator;

/// Runtime collection of distinct elements.
///
/// With a comparator, elements comparing `Equal` count as duplicates.
#[derive(Debug, Clone, Default)]
pub struct PersistentSet {
    elements: Vec<Value>,
    comparator: Option<KeyComparator>,
    queue: Vec<QueuedOperation>,
}

impl PersistentSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_comparator(comparator: Option<KeyComparator>) -> Self {
        Self {
            comparator,
            ..Self::default()
        }
    }

    pub fn len(&self) -> usize {
        self.elements.len()
    }

    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }

    pub fn contains(&self, element: &Value) -> bool {
        self.find(element).is_some()
    }

    /// Returns false when an equal element is already present.
    pub fn insert(&mut self, element: Value) -> bool {
        if self.contains(&element) {
            return false;
        }
        let pos = match &self.comparator {
            Some(cmp) => self
                .elements
                .partition_point(|existing| cmp.compare(existing, &element).is_lt()),
            None => self.elements.len(),
        };
        self.elements.insert(pos, element);
        true
    }

    pub fn remove(&mut self, element: &Value) -> bool {
        match self.find(element) {
            Some(pos) => {
                self.elements.remove(pos);
                true
            }
            None => false,
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = &Value> {
        self.elements.iter()
    }

    pub fn queue_add(&mut self, element: Value) {
        self.queue.push(QueuedOperation::AddElement { element });
    }

    pub fn queue_remove(&mut self, element: Value) {
        self.queue.push(QueuedOperation::RemoveElement { element });
    }

    pub fn queue_clear(&mut self) {
        self.queue.push(QueuedOperation::Clear);
    }

    pub fn queued_operations(&self) -> &[QueuedOperation] {
        &self.queue
    }

    /// Drop the first `count` queued operations once they are written.
    pub fn acknowledge_queued_operations(&mut self, count: usize) {
        self.queue.drain(..count.min(self.queue.len()));
    }

    fn find(&self, element: &Value) -> Option<usize> {
        match &self.comparator {
            Some(cmp) => {
                let pos = self
                    .elements
                    .partition_point(|existing| cmp.compare(existing, element).is_lt());
                self.elements
                    .get(pos)
                    .filter(|existing| cmp.compare(existing, element).is_eq())
                    .map(|_| pos)
            }
            None => self.elements.iter().position(|e| e == element),
        }
    }
}
