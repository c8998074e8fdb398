//! Upstream change feed seam
//!
//! The concrete transport (websocket, polling, message bus) lives in an
//! adapter implementing [`ChangeFeedSource`]; the bus only needs a stream of
//! events per topic and a way to release it.

use crate::BusError;
use async_trait::async_trait;
use futures::stream::BoxStream;
use niche_types::ChangeEvent;
use std::fmt::Debug;

/// Stream of change events for one topic
pub type ChangeStream = BoxStream<'static, ChangeEvent>;

#[async_trait]
pub trait ChangeFeedSource: Send + Sync + Debug {
    /// Open the upstream subscription for `topic`
    async fn subscribe(&self, topic: &str) -> Result<ChangeStream, BusError>;

    /// Release the upstream subscription for `topic`
    async fn unsubscribe(&self, topic: &str) -> Result<(), BusError>;
}
