//! Record store doubles for exercising the cache

use crate::store::{NicheFieldConfig, RecordStore, StoreError};
use async_trait::async_trait;
use parking_lot::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;
use tokio::sync::Semaphore;

/// Serves a fixed, replaceable set of configs and counts fetches
#[derive(Debug, Default)]
pub struct CountingStore {
    configs: Mutex<Vec<NicheFieldConfig>>,
    calls: AtomicUsize,
    delay: Option<Duration>,
}

impl CountingStore {
    pub fn new(configs: Vec<NicheFieldConfig>) -> Self {
        Self {
            configs: Mutex::new(configs),
            ..Default::default()
        }
    }

    /// Sleep this long inside every fetch
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn set_configs(&self, configs: Vec<NicheFieldConfig>) {
        *self.configs.lock() = configs;
    }

    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl RecordStore for CountingStore {
    async fn fetch_niche_field_configs(&self) -> Result<Vec<NicheFieldConfig>, StoreError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        Ok(self.configs.lock().clone())
    }
}

/// Always fails
#[derive(Debug, Default)]
pub struct FailingStore {
    calls: AtomicUsize,
}

impl FailingStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl RecordStore for FailingStore {
    async fn fetch_niche_field_configs(&self) -> Result<Vec<NicheFieldConfig>, StoreError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Err(StoreError::unavailable("connection refused"))
    }
}

/// Holds every fetch until [`GatedStore::release`] lets one through
#[derive(Debug)]
pub struct GatedStore {
    inner: CountingStore,
    gate: Semaphore,
}

impl GatedStore {
    pub fn new(configs: Vec<NicheFieldConfig>) -> Self {
        Self {
            inner: CountingStore::new(configs),
            gate: Semaphore::new(0),
        }
    }

    /// Let `fetches` pending or future fetches complete
    pub fn release(&self, fetches: usize) {
        self.gate.add_permits(fetches);
    }

    pub fn set_configs(&self, configs: Vec<NicheFieldConfig>) {
        self.inner.set_configs(configs);
    }

    pub fn call_count(&self) -> usize {
        self.inner.call_count()
    }
}

#[async_trait]
impl RecordStore for GatedStore {
    async fn fetch_niche_field_configs(&self) -> Result<Vec<NicheFieldConfig>, StoreError> {
        self.inner.calls.fetch_add(1, Ordering::SeqCst);
        match self.gate.acquire().await {
            Ok(permit) => permit.forget(),
            Err(_) => return Err(StoreError::unavailable("gate closed")),
        }
        Ok(self.inner.configs.lock().clone())
    }
}

/// Panics on its first fetch, then behaves like [`CountingStore`]
#[derive(Debug)]
pub struct PanickingStore {
    inner: CountingStore,
}

impl PanickingStore {
    pub fn new(configs: Vec<NicheFieldConfig>) -> Self {
        Self {
            inner: CountingStore::new(configs),
        }
    }

    pub fn call_count(&self) -> usize {
        self.inner.call_count()
    }
}

#[async_trait]
impl RecordStore for PanickingStore {
    async fn fetch_niche_field_configs(&self) -> Result<Vec<NicheFieldConfig>, StoreError> {
        if self.inner.calls.fetch_add(1, Ordering::SeqCst) == 0 {
            panic!("record store driver crashed");
        }
        Ok(self.inner.configs.lock().clone())
    }
}
