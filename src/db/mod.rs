pub mod catalog_cache;

pub use catalog_cache::{
    CacheSettings, CacheState, CatalogCache, CatalogSnapshot, CatalogStatus, FailurePolicy,
    SnapshotHealth,
};
