//! Load-side plumbing: domain results, row initializers and the loader.

mod context;
mod domain_result;
mod initializer;
mod loader;

pub use context::{ExecutionContext, LockMode, PersistenceContext};
pub use domain_result::{
    DomainResult, DomainResultCreationState, DomainResultGenerator, DomainResultKind,
    SelectionExpression, SqlAstHelper, SqlSelection,
};
pub use initializer::{
    CollectionInitializer, CollectionInitializerProducer, LoadedCollections,
    MapInitializerProducer, PluralInitializerProducer,
};
pub use loader::CollectionLoader;
