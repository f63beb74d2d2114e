//! Service layer: trajectory reconstruction, caching and catalog access

pub mod bounds;
pub mod catalog;
pub mod log_service;
pub mod memo_cache;
pub mod preview;
pub mod trajectory;

pub use bounds::compute_bounds;
pub use catalog::{CatalogPage, LogCatalog, PageRequest};
pub use log_service::{LogCacheStats, LogService};
pub use memo_cache::{CacheStats, MemoCache};
pub use trajectory::TrajectoryReconstructor;
