use crate::core::Value;

/// A collection mutation recorded while the owner was detached.
///
/// Queued operations are replayed against the backing store by
/// [`CollectionSemantics::process_queued_ops`](crate::metamodel::CollectionSemantics::process_queued_ops).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QueuedOperation {
    PutEntry { key: Value, value: Value },
    RemoveKey { key: Value },
    AddElement { element: Value },
    RemoveElement { element: Value },
    Clear,
}

impl QueuedOperation {
    pub fn name(&self) -> &'static str {
        match self {
            Self::PutEntry { .. } => "put-entry",
            Self::RemoveKey { .. } => "remove-key",
            Self::AddElement { .. } => "add-element",
            Self::RemoveElement { .. } => "remove-element",
            Self::Clear => "clear",
        }
    }
}
