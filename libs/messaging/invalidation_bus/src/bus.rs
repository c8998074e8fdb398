//! # Invalidation Bus
//!
//! Multicast layer between one upstream change feed topic and any number of
//! local subscribers.
//!
//! ## Lifecycle
//!
//! - The upstream subscription opens lazily when the first local subscriber
//!   arrives and closes when the last one leaves (reference counted).
//! - Every event fans out to all subscribers in subscription order, exactly
//!   once per subscriber.
//! - A subscriber that errors or panics is logged and skipped; the remaining
//!   subscribers still run.
//!
//! Connect and disconnect are serialised through one async mutex so a
//! subscribe racing the last unsubscribe never leaves the feed closed while
//! subscribers exist.

use crate::error::CallbackResult;
use crate::source::{ChangeFeedSource, ChangeStream};
use futures::StreamExt;
use niche_types::ChangeEvent;
use parking_lot::Mutex;
use std::fmt::Debug;
use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Weak};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

type Callback = Arc<dyn Fn(&ChangeEvent) -> CallbackResult + Send + Sync>;

/// Identifier of one local subscription
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriberId(pub u64);

/// Counters for monitoring the bus
#[derive(Debug, Default)]
pub struct BusMetrics {
    /// Events received from upstream or delivered manually
    pub events_dispatched: AtomicU64,
    /// Callbacks that returned an error or panicked
    pub callback_failures: AtomicU64,
    /// Upstream subscriptions opened
    pub upstream_connects: AtomicU64,
    /// Upstream subscriptions closed
    pub upstream_disconnects: AtomicU64,
}

/// Outcome of fanning one event out
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DeliveryReport {
    pub delivered: usize,
    pub failed: usize,
}

struct Subscriber {
    id: SubscriberId,
    callback: Callback,
}

#[derive(Default)]
struct Upstream {
    pump: Option<JoinHandle<()>>,
}

impl Upstream {
    fn is_running(&self) -> bool {
        self.pump.as_ref().is_some_and(|pump| !pump.is_finished())
    }
}

struct BusInner {
    source: Arc<dyn ChangeFeedSource>,
    topic: String,
    subscribers: Mutex<Vec<Subscriber>>,
    upstream: tokio::sync::Mutex<Upstream>,
    next_id: AtomicU64,
    metrics: BusMetrics,
}

/// Multicast invalidation bus for one change-feed topic
///
/// Cheap to clone; clones share subscribers and the upstream subscription.
#[derive(Clone)]
pub struct InvalidationBus {
    inner: Arc<BusInner>,
}

impl Debug for InvalidationBus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InvalidationBus")
            .field("topic", &self.inner.topic)
            .field("subscribers", &self.subscriber_count())
            .finish_non_exhaustive()
    }
}

impl InvalidationBus {
    pub fn new(source: Arc<dyn ChangeFeedSource>, topic: impl Into<String>) -> Self {
        Self {
            inner: Arc::new(BusInner {
                source,
                topic: topic.into(),
                subscribers: Mutex::new(Vec::new()),
                upstream: tokio::sync::Mutex::new(Upstream::default()),
                next_id: AtomicU64::new(1),
                metrics: BusMetrics::default(),
            }),
        }
    }

    pub fn topic(&self) -> &str {
        &self.inner.topic
    }

    pub fn metrics(&self) -> &BusMetrics {
        &self.inner.metrics
    }

    pub fn subscriber_count(&self) -> usize {
        self.inner.subscribers.lock().len()
    }

    /// Whether the upstream subscription is currently open
    pub async fn is_connected(&self) -> bool {
        self.inner.upstream.lock().await.is_running()
    }

    /// Register a callback, opening the upstream feed if this is the first
    ///
    /// A failed upstream connect is logged; the subscription is still
    /// registered and the next subscribe retries the connect.
    pub async fn subscribe<F>(&self, callback: F) -> Subscription
    where
        F: Fn(&ChangeEvent) -> CallbackResult + Send + Sync + 'static,
    {
        let id = SubscriberId(self.inner.next_id.fetch_add(1, Ordering::Relaxed));

        let mut upstream = self.inner.upstream.lock().await;
        self.inner.subscribers.lock().push(Subscriber {
            id,
            callback: Arc::new(callback),
        });
        debug!(topic = %self.inner.topic, subscriber = id.0, "Subscriber registered");

        if !upstream.is_running() {
            self.connect(&mut upstream).await;
        }
        drop(upstream);

        Subscription {
            id,
            bus: Arc::downgrade(&self.inner),
            active: true,
        }
    }

    /// Fan an event out to every subscriber, in subscription order
    pub fn deliver(&self, event: &ChangeEvent) -> DeliveryReport {
        self.inner.dispatch(event)
    }

    async fn connect(&self, upstream: &mut Upstream) {
        match self.inner.source.subscribe(&self.inner.topic).await {
            Ok(stream) => {
                let pump = tokio::spawn(pump_events(Arc::downgrade(&self.inner), stream));
                upstream.pump = Some(pump);
                self.inner
                    .metrics
                    .upstream_connects
                    .fetch_add(1, Ordering::Relaxed);
                info!(topic = %self.inner.topic, "Change feed connected");
            }
            Err(e) => {
                warn!(topic = %self.inner.topic, error = %e, "Change feed connect failed");
            }
        }
    }
}

impl BusInner {
    fn dispatch(&self, event: &ChangeEvent) -> DeliveryReport {
        self.metrics.events_dispatched.fetch_add(1, Ordering::Relaxed);

        // Snapshot so callbacks may subscribe or unsubscribe without deadlocking
        let callbacks: Vec<(SubscriberId, Callback)> = self
            .subscribers
            .lock()
            .iter()
            .map(|s| (s.id, Arc::clone(&s.callback)))
            .collect();

        let mut report = DeliveryReport::default();
        for (id, callback) in callbacks {
            match panic::catch_unwind(AssertUnwindSafe(|| callback(event))) {
                Ok(Ok(())) => report.delivered += 1,
                Ok(Err(e)) => {
                    report.failed += 1;
                    warn!(topic = %self.topic, subscriber = id.0, error = %e, "Invalidation callback failed");
                }
                Err(_) => {
                    report.failed += 1;
                    warn!(topic = %self.topic, subscriber = id.0, "Invalidation callback panicked");
                }
            }
        }

        if report.failed > 0 {
            self.metrics
                .callback_failures
                .fetch_add(report.failed as u64, Ordering::Relaxed);
        }
        report
    }

    fn remove(&self, id: SubscriberId) -> bool {
        let mut subscribers = self.subscribers.lock();
        subscribers.retain(|s| s.id != id);
        subscribers.is_empty()
    }

    /// Close the upstream feed if nobody is listening any more
    async fn release_upstream(&self) {
        let mut upstream = self.upstream.lock().await;
        if !self.subscribers.lock().is_empty() {
            return;
        }

        if let Some(pump) = upstream.pump.take() {
            pump.abort();
            if let Err(e) = self.source.unsubscribe(&self.topic).await {
                warn!(topic = %self.topic, error = %e, "Change feed disconnect failed");
            }
            self.metrics
                .upstream_disconnects
                .fetch_add(1, Ordering::Relaxed);
            info!(topic = %self.topic, "Change feed disconnected");
        }
    }
}

async fn pump_events(bus: Weak<BusInner>, mut stream: ChangeStream) {
    while let Some(event) = stream.next().await {
        let Some(bus) = bus.upgrade() else {
            break;
        };
        debug!(topic = %event.topic, kind = ?event.kind, "Change event received");
        bus.dispatch(&event);
    }
    debug!("Change feed stream ended");
}

/// Handle for one local subscription
///
/// Call [`Subscription::unsubscribe`] to leave and, if last, wait for the
/// upstream feed to close. Dropping the handle also unsubscribes; the
/// upstream close then happens on a spawned task.
#[derive(Debug)]
pub struct Subscription {
    id: SubscriberId,
    bus: Weak<BusInner>,
    active: bool,
}

impl Subscription {
    pub fn id(&self) -> SubscriberId {
        self.id
    }

    pub async fn unsubscribe(mut self) {
        self.active = false;
        let Some(bus) = self.bus.upgrade() else {
            return;
        };
        debug!(topic = %bus.topic, subscriber = self.id.0, "Subscriber removed");
        if bus.remove(self.id) {
            bus.release_upstream().await;
        }
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        if !self.active {
            return;
        }
        let Some(bus) = self.bus.upgrade() else {
            return;
        };
        if bus.remove(self.id) {
            match tokio::runtime::Handle::try_current() {
                Ok(handle) => {
                    handle.spawn(async move { bus.release_upstream().await });
                }
                Err(_) => {
                    warn!(topic = %bus.topic, "Last subscriber dropped outside a runtime, change feed left open");
                }
            }
        }
    }
}

impl Debug for BusInner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BusInner")
            .field("topic", &self.topic)
            .finish_non_exhaustive()
    }
}
