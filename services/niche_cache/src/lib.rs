//! Niche Option Cache Service
//!
//! Canonical, process-wide list of niche options merged from every niche
//! field configuration in the record store.
//!
//! Features:
//! - Lazy load on first request, one shared snapshot afterwards
//! - Concurrent requests during a load share a single store fetch
//! - Push invalidation through the [`invalidation_bus::InvalidationBus`]
//! - Fetch failures and timeouts degrade to an empty list
//! - JSON fixture store for local tooling and tests

pub mod cache;
pub mod fixture;
pub mod store;
pub mod test_utils;

pub use cache::{CacheMetrics, CacheState, NicheOptionCache, OptionList};
pub use fixture::{Fixture, FormFixture, JsonFileStore};
pub use store::{NicheFieldConfig, RecordStore, StoreError};
