//! In-memory change feed adapter over a tokio broadcast channel
//!
//! Stands in for the record store's realtime channel in tests and local
//! tooling. Publishing is synchronous; every open upstream subscription
//! receives the events for its topic.

use crate::source::{ChangeFeedSource, ChangeStream};
use crate::BusError;
use async_trait::async_trait;
use futures::StreamExt;
use niche_types::{ChangeEvent, ChangeKind};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use tokio::sync::broadcast::{self, error::RecvError};
use tracing::{debug, warn};

#[derive(Debug)]
pub struct BroadcastFeed {
    sender: broadcast::Sender<ChangeEvent>,
    connects: AtomicU64,
    disconnects: AtomicU64,
    fail_connect: AtomicBool,
}

impl BroadcastFeed {
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity.max(1));
        Self {
            sender,
            connects: AtomicU64::new(0),
            disconnects: AtomicU64::new(0),
            fail_connect: AtomicBool::new(false),
        }
    }

    /// Publish an event; returns how many open subscriptions received it
    pub fn publish(&self, event: ChangeEvent) -> usize {
        self.sender.send(event).unwrap_or(0)
    }

    pub fn connect_count(&self) -> u64 {
        self.connects.load(Ordering::Relaxed)
    }

    pub fn disconnect_count(&self) -> u64 {
        self.disconnects.load(Ordering::Relaxed)
    }

    /// Make subsequent connects fail (for exercising degraded paths)
    pub fn set_fail_connect(&self, fail: bool) {
        self.fail_connect.store(fail, Ordering::Relaxed);
    }
}

#[async_trait]
impl ChangeFeedSource for BroadcastFeed {
    async fn subscribe(&self, topic: &str) -> Result<ChangeStream, BusError> {
        if self.fail_connect.load(Ordering::Relaxed) {
            return Err(BusError::connect_failed(topic, "feed refused connection"));
        }

        self.connects.fetch_add(1, Ordering::Relaxed);
        debug!(topic, "Broadcast feed subscription opened");

        let topic = topic.to_string();
        let receiver = self.sender.subscribe();
        let stream = futures::stream::unfold(receiver, move |mut receiver| {
            let topic = topic.clone();
            async move {
                loop {
                    match receiver.recv().await {
                        Ok(event) if event.topic == topic => return Some((event, receiver)),
                        Ok(_) => continue,
                        Err(RecvError::Lagged(missed)) => {
                            // Missed events still mean "something changed"
                            warn!(topic = %topic, missed, "Broadcast feed lagged");
                            return Some((ChangeEvent::new(topic, ChangeKind::Unknown), receiver));
                        }
                        Err(RecvError::Closed) => return None,
                    }
                }
            }
        });

        Ok(stream.boxed())
    }

    async fn unsubscribe(&self, topic: &str) -> Result<(), BusError> {
        self.disconnects.fetch_add(1, Ordering::Relaxed);
        debug!(topic, "Broadcast feed subscription released");
        Ok(())
    }
}
