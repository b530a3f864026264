use super::QueuedOperation;
use crate::core::Value;
use crate::metamodel::KeyComparator;
use std::collections::HashMap;

/// Runtime key-to-value collection owned by one entity.
///
/// Without a comparator, keys are unique under `Value` equality and
/// iteration follows insertion order. With one, the comparator decides both
/// order and uniqueness: a key comparing `Equal` to a present key replaces
/// that entry's value and the present key is kept.
#[derive(Debug, Clone, Default)]
pub struct PersistentMap {
    entries: Vec<(Value, Value)>,
    positions: HashMap<Value, usize>,
    comparator: Option<KeyComparator>,
    queue: Vec<QueuedOperation>,
}

impl PersistentMap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_comparator(comparator: Option<KeyComparator>) -> Self {
        Self {
            comparator,
            ..Self::default()
        }
    }

    pub fn comparator(&self) -> Option<&KeyComparator> {
        self.comparator.as_ref()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn get(&self, key: &Value) -> Option<&Value> {
        self.find(key).map(|pos| &self.entries[pos].1)
    }

    pub fn contains_key(&self, key: &Value) -> bool {
        self.find(key).is_some()
    }

    /// Value containment under `Value` equality.
    pub fn contains_value(&self, value: &Value) -> bool {
        self.entries.iter().any(|(_, v)| v == value)
    }

    /// Insert or replace; returns the previous value for the key.
    pub fn put(&mut self, key: Value, value: Value) -> Option<Value> {
        if let Some(pos) = self.find(&key) {
            return Some(std::mem::replace(&mut self.entries[pos].1, value));
        }

        let pos = match &self.comparator {
            Some(cmp) => self
                .entries
                .partition_point(|(existing, _)| cmp.compare(existing, &key).is_lt()),
            None => self.entries.len(),
        };
        self.entries.insert(pos, (key, value));
        self.reindex(pos);
        None
    }

    pub fn remove(&mut self, key: &Value) -> Option<Value> {
        let pos = self.find(key)?;
        let (removed, value) = self.entries.remove(pos);
        self.positions.remove(&removed);
        self.reindex(pos);
        Some(value)
    }

    pub fn clear(&mut self) {
        self.entries.clear();
        self.positions.clear();
    }

    pub fn iter(&self) -> impl Iterator<Item = (&Value, &Value)> {
        self.entries.iter().map(|(k, v)| (k, v))
    }

    pub fn keys(&self) -> impl Iterator<Item = &Value> {
        self.entries.iter().map(|(k, _)| k)
    }

    pub fn values(&self) -> impl Iterator<Item = &Value> {
        self.entries.iter().map(|(_, v)| v)
    }

    /// Record a put to replay later instead of applying it now.
    pub fn queue_put(&mut self, key: Value, value: Value) {
        self.queue.push(QueuedOperation::PutEntry { key, value });
    }

    pub fn queue_remove(&mut self, key: Value) {
        self.queue.push(QueuedOperation::RemoveKey { key });
    }

    pub fn queue_clear(&mut self) {
        self.queue.push(QueuedOperation::Clear);
    }

    pub fn queued_operations(&self) -> &[QueuedOperation] {
        &self.queue
    }

    fn find(&self, key: &Value) -> Option<usize> {
        match &self.comparator {
            Some(cmp) => {
                let pos = self
                    .entries
                    .partition_point(|(existing, _)| cmp.compare(existing, key).is_lt());
                self.entries
                    .get(pos)
                    .filter(|(existing, _)| cmp.compare(existing, key).is_eq())
                    .map(|_| pos)
            }
            None => self.positions.get(key).copied(),
        }
    }

    fn reindex(&mut self, from: usize) {
        for (pos, (key, _)) in self.entries.iter().enumerate().skip(from) {
            self.positions.insert(key.clone(), pos);
        }
    }
}

impl FromIterator<(Value, Value)> for PersistentMap {
    fn from_iter<I: IntoIterator<Item = (Value, Value)>>(iter: I) -> Self {
        let mut map = Self::new();
        for (key, value) in iter {
            map.put(key, value);
        }
        map
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn text(s: &str) -> Value {
        Value::Text(s.to_string())
    }

    #[test]
    fn test_put_replaces_existing_key() {
        let mut map = PersistentMap::new();
        assert_eq!(map.put(Value::Integer(1), text("a")), None);
        assert_eq!(map.put(Value::Integer(1), text("b")), Some(text("a")));
        assert_eq!(map.len(), 1);
        assert_eq!(map.get(&Value::Integer(1)), Some(&text("b")));
    }

    #[test]
    fn test_insertion_order_without_comparator() {
        let map: PersistentMap = [(Value::Integer(3), text("c")), (Value::Integer(1), text("a"))]
            .into_iter()
            .collect();
        let keys: Vec<_> = map.keys().cloned().collect();
        assert_eq!(keys, vec![Value::Integer(3), Value::Integer(1)]);
    }

    #[test]
    fn test_comparator_order_and_remove() {
        let mut map = PersistentMap::with_comparator(Some(KeyComparator::reverse()));
        map.put(Value::Integer(1), text("a"));
        map.put(Value::Integer(3), text("c"));
        map.put(Value::Integer(2), text("b"));

        let keys: Vec<_> = map.keys().cloned().collect();
        assert_eq!(keys, vec![Value::Integer(3), Value::Integer(2), Value::Integer(1)]);

        assert_eq!(map.remove(&Value::Integer(3)), Some(text("c")));
        assert_eq!(map.get(&Value::Integer(1)), Some(&text("a")));
        assert_eq!(map.get(&Value::Integer(2)), Some(&text("b")));
        assert!(!map.contains_key(&Value::Integer(3)));
    }

    #[test]
    fn test_comparator_equal_keys_share_an_entry() {
        let by_length = KeyComparator::new("by_length", |a, b| {
            a.as_str().map(str::len).cmp(&b.as_str().map(str::len))
        });
        let mut map = PersistentMap::with_comparator(Some(by_length));
        assert_eq!(map.put(text("ab"), text("first")), None);
        assert_eq!(map.put(text("xyz"), text("long")), None);
        assert_eq!(map.put(text("cd"), text("second")), Some(text("first")));

        assert_eq!(map.len(), 2);
        let keys: Vec<_> = map.keys().cloned().collect();
        assert_eq!(keys, vec![text("ab"), text("xyz")]);
        assert_eq!(map.get(&text("zz")), Some(&text("second")));

        assert_eq!(map.remove(&text("qq")), Some(text("second")));
        assert!(!map.contains_key(&text("ab")));
        assert_eq!(map.get(&text("xyz")), Some(&text("long")));
    }

    #[test]
    fn test_natural_order_merges_equal_numeric_keys() {
        let mut map = PersistentMap::with_comparator(Some(KeyComparator::natural()));
        map.put(Value::Integer(2), text("int"));
        assert_eq!(map.put(Value::Float(2.0), text("float")), Some(text("int")));
        assert_eq!(map.len(), 1);
        assert_eq!(map.keys().next(), Some(&Value::Integer(2)));
    }

    #[test]
    fn test_queue_does_not_touch_entries() {
        let mut map = PersistentMap::new();
        map.queue_put(Value::Integer(1), text("a"));
        map.queue_clear();

        assert!(map.is_empty());
        assert_eq!(map.queued_operations().len(), 2);
        assert_eq!(map.queued_operations()[1], QueuedOperation::Clear);
    }
}
