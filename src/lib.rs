// ============================================================================
// RustMemDB Metamodel Library
// ============================================================================

pub mod collection;
pub mod config;
pub mod core;
pub mod mapping;
pub mod metamodel;
pub mod result;
pub mod results;
pub mod storage;

// Re-export main types for convenience
pub use collection::{CollectionInstance, EntityState, PersistentMap, QueuedOperation};
pub use config::MetamodelSettings;
pub use core::{DataType, DbError, EntityInstance, EntityRef, Result, Value};
pub use mapping::MappingDocument;
pub use metamodel::{
    CollectionDescriptor, CollectionSemantics, KeyComparator, MapDescriptor, Metamodel,
    MetamodelBuilder, PluralAttribute, QueuedOpsReplay,
};
pub use result::QueryResult;
pub use results::{
    CollectionInitializerProducer, CollectionLoader, DomainResultCreationState, LoadedCollections,
    LockMode, PersistenceContext,
};
pub use storage::{CollectionStore, MemoryCollectionStore};
