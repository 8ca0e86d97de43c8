//! Pagination cache for large backend payloads.
//!
//! A payload reaching the size threshold is stored once under a
//! [`CacheKey`] and served page by page afterwards. Smaller payloads are
//! returned inline and never stored.

pub mod entry;
pub mod store;

pub use entry::{CacheEntry, CacheKey, EntrySummary, Page, PageContent, UnitKind, Units};
pub use store::{CacheSlot, CacheStats, PageCache, StoreResult, Stored};
