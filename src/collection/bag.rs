use super::QueuedOperation;
use crate::core::Value;

/// Runtime collection allowing duplicates, with no defined order.
#[derive(Debug, Clone, Default)]
pub struct PersistentBag {
    elements: Vec<Value>,
    queue: Vec<QueuedOperation>,
}

impl PersistentBag {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.elements.len()
    }

    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }

    pub fn add(&mut self, element: Value) {
        self.elements.push(element);
    }

    pub fn contains(&self, element: &Value) -> bool {
        self.elements.contains(element)
    }

    pub fn occurrences(&self, element: &Value) -> usize {
        self.elements.iter().filter(|e| *e == element).count()
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
}

impl FromIterator<Value> for PersistentBag {
    fn from_iter<I: IntoIterator<Item = Value>>(iter: I) -> Self {
        Self {
            elements: iter.into_iter().collect(),
            queue: Vec::new(),
        }
    }
}
