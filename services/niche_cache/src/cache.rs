//! # Canonical Niche Option Cache
//!
//! Deduplicated list of every niche option configured across all niche
//! fields, loaded lazily from the record store and shared by every consumer.
//!
//! ## States
//!
//! ```text
//! Unloaded --get_all_options--> Loading --fetch done--> Loaded
//!    ^                             |                      |
//!    +------- clear_cache / invalidation event -----------+
//! ```
//!
//! - While `Loading`, callers attach to the single in-flight load instead of
//!   starting another fetch; all of them receive the same result.
//! - `clear_cache` forgets the in-flight load for new callers. Existing
//!   awaiters still get its result, but it is not cached.
//! - An invalidation event only clears; the reload waits for the next
//!   `get_all_options` call.
//! - A failed, timed-out or panicking fetch resolves to an empty list and
//!   counts as loaded. Callers never see an error.

use crate::store::{RecordStore, StoreError};
use futures::future::{BoxFuture, FutureExt, Shared};
use invalidation_bus::{InvalidationBus, Subscription};
use niche_codec::{dedup_options, parse_niche_value, prune_orphans};
use niche_config::CacheSettings;
use niche_types::{ChangeEvent, NicheOption, SelectedNiche};
use parking_lot::Mutex;
use std::any::Any;
use std::fmt::Debug;
use std::panic::AssertUnwindSafe;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Weak};
use std::time::Duration;
use tracing::{debug, info, warn};

/// Shared snapshot of the canonical option list
pub type OptionList = Arc<Vec<NicheOption>>;

type SharedLoad = Shared<BoxFuture<'static, OptionList>>;

/// Observable load state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CacheState {
    Unloaded,
    Loading,
    Loaded,
}

/// Counters for monitoring cache behaviour
#[derive(Debug, Default)]
pub struct CacheMetrics {
    /// Record store fetches started
    pub fetches_started: AtomicU64,
    /// Fetches that failed, timed out or panicked
    pub fetch_failures: AtomicU64,
    /// Calls that attached to an in-flight load
    pub coalesced_waits: AtomicU64,
    /// Calls served straight from a loaded snapshot
    pub cache_hits: AtomicU64,
    /// Invalidation events received from the bus
    pub invalidations: AtomicU64,
    /// Loads whose result was discarded because the cache was cleared meanwhile
    pub stale_loads: AtomicU64,
}

enum Slot {
    Unloaded,
    Loading(SharedLoad),
    Loaded(OptionList),
}

struct Entry {
    slot: Slot,
    /// Bumped on every clear; a load only populates the generation it started in
    generation: u64,
}

struct CacheCore {
    store: Arc<dyn RecordStore>,
    fetch_timeout: Duration,
    entry: Mutex<Entry>,
    metrics: CacheMetrics,
}

impl CacheCore {
    fn state(&self) -> CacheState {
        match self.entry.lock().slot {
            Slot::Unloaded => CacheState::Unloaded,
            Slot::Loading(_) => CacheState::Loading,
            Slot::Loaded(_) => CacheState::Loaded,
        }
    }

    fn clear(&self) {
        let mut entry = self.entry.lock();
        entry.generation += 1;
        entry.slot = Slot::Unloaded;
        debug!(generation = entry.generation, "Niche option cache cleared");
    }

    fn invalidate(&self, event: &ChangeEvent) {
        self.metrics.invalidations.fetch_add(1, Ordering::Relaxed);
        debug!(topic = %event.topic, kind = ?event.kind, record = ?event.record_id, "Invalidating niche option cache");
        self.clear();
    }

    /// Store a finished load if nothing cleared the cache since it started
    fn complete_load(&self, generation: u64, options: &OptionList) {
        let mut entry = self.entry.lock();
        if entry.generation == generation && matches!(entry.slot, Slot::Loading(_)) {
            entry.slot = Slot::Loaded(Arc::clone(options));
            debug!(options = options.len(), generation, "Niche option cache loaded");
        } else {
            self.metrics.stale_loads.fetch_add(1, Ordering::Relaxed);
            debug!(
                load_generation = generation,
                current_generation = entry.generation,
                "Discarding stale niche option load"
            );
        }
    }

    fn start_load(core: &Arc<CacheCore>, generation: u64) -> SharedLoad {
        core.metrics.fetches_started.fetch_add(1, Ordering::Relaxed);

        let store = Arc::clone(&core.store);
        let timeout = core.fetch_timeout;
        let weak: Weak<CacheCore> = Arc::downgrade(core);

        async move {
            // A panicking store must not poison the shared load for later callers
            let result = match AssertUnwindSafe(fetch_options(store.as_ref(), timeout))
                .catch_unwind()
                .await
            {
                Ok(result) => result,
                Err(panic) => Err(StoreError::Panicked(panic_message(panic.as_ref()))),
            };
            let core = weak.upgrade();

            let options: OptionList = match result {
                Ok(options) => Arc::new(options),
                Err(e) => {
                    warn!(error = %e, "Niche option fetch failed, serving empty list");
                    if let Some(core) = &core {
                        core.metrics.fetch_failures.fetch_add(1, Ordering::Relaxed);
                    }
                    Arc::new(Vec::new())
                }
            };

            if let Some(core) = core {
                core.complete_load(generation, &options);
            }
            options
        }
        .boxed()
        .shared()
    }
}

fn panic_message(panic: &(dyn Any + Send)) -> String {
    if let Some(msg) = panic.downcast_ref::<&str>() {
        (*msg).to_string()
    } else if let Some(msg) = panic.downcast_ref::<String>() {
        msg.clone()
    } else {
        "unknown panic".to_string()
    }
}

async fn fetch_options(
    store: &dyn RecordStore,
    timeout: Duration,
) -> Result<Vec<NicheOption>, StoreError> {
    let configs = tokio::time::timeout(timeout, store.fetch_niche_field_configs())
        .await
        .map_err(|_| StoreError::Timeout(timeout.as_millis() as u64))??;

    let options = dedup_options(
        configs
            .iter()
            .flat_map(|config| parse_niche_value(&config.options)),
    );
    debug!(configs = configs.len(), options = options.len(), "Fetched niche field configs");
    Ok(options)
}

/// Process-wide niche option cache
///
/// Construct one per process (or per test) and share it; there is no
/// hidden global instance.
pub struct NicheOptionCache {
    core: Arc<CacheCore>,
    subscription: Mutex<Option<Subscription>>,
}

impl Debug for NicheOptionCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NicheOptionCache")
            .field("state", &self.state())
            .field("fetch_timeout", &self.core.fetch_timeout)
            .finish_non_exhaustive()
    }
}

impl NicheOptionCache {
    /// Create a cache with no invalidation source; only `clear_cache` resets it
    pub fn new(store: Arc<dyn RecordStore>, settings: &CacheSettings) -> Self {
        Self {
            core: Arc::new(CacheCore {
                store,
                fetch_timeout: settings.fetch_timeout(),
                entry: Mutex::new(Entry {
                    slot: Slot::Unloaded,
                    generation: 0,
                }),
                metrics: CacheMetrics::default(),
            }),
            subscription: Mutex::new(None),
        }
    }

    /// Create a cache that clears itself on every event from `bus`
    pub async fn with_bus(
        store: Arc<dyn RecordStore>,
        settings: &CacheSettings,
        bus: &InvalidationBus,
    ) -> Self {
        let cache = Self::new(store, settings);
        let weak = Arc::downgrade(&cache.core);

        let subscription = bus
            .subscribe(move |event: &ChangeEvent| {
                if let Some(core) = weak.upgrade() {
                    core.invalidate(event);
                }
                Ok(())
            })
            .await;

        info!(topic = bus.topic(), "Niche option cache subscribed to invalidations");
        *cache.subscription.lock() = Some(subscription);
        cache
    }

    /// Every configured niche option, deduplicated
    pub async fn get_all_options(&self) -> OptionList {
        let load = {
            let mut entry = self.core.entry.lock();
            match &entry.slot {
                Slot::Loaded(options) => {
                    self.core.metrics.cache_hits.fetch_add(1, Ordering::Relaxed);
                    return Arc::clone(options);
                }
                Slot::Loading(load) => {
                    self.core
                        .metrics
                        .coalesced_waits
                        .fetch_add(1, Ordering::Relaxed);
                    load.clone()
                }
                Slot::Unloaded => {
                    debug!(generation = entry.generation, "Starting niche option load");
                    let load = CacheCore::start_load(&self.core, entry.generation);
                    entry.slot = Slot::Loading(load.clone());
                    load
                }
            }
        };

        load.await
    }

    /// Forget the cached list and any in-flight load
    pub fn clear_cache(&self) {
        self.core.clear();
    }

    /// Clear and stop listening for invalidations
    pub async fn destroy(&self) {
        self.clear_cache();
        let subscription = self.subscription.lock().take();
        if let Some(subscription) = subscription {
            subscription.unsubscribe().await;
            info!("Niche option cache unsubscribed from invalidations");
        }
    }

    /// Drop selections whose niche is no longer configured
    pub async fn prune_selection(&self, selected: &[SelectedNiche]) -> Vec<SelectedNiche> {
        let options = self.get_all_options().await;
        prune_orphans(selected, &options)
    }

    pub fn state(&self) -> CacheState {
        self.core.state()
    }

    pub fn metrics(&self) -> &CacheMetrics {
        &self.core.metrics
    }

    pub fn is_subscribed(&self) -> bool {
        self.subscription.lock().is_some()
    }
}
