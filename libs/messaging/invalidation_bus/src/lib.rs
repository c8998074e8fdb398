//! # Invalidation Bus
//!
//! Decouples consumers that must react to niche configuration changes from
//! the transport that reports them.
//!
//! ```text
//! record store feed --> ChangeFeedSource --> InvalidationBus --> subscriber callbacks
//!   (adapter)             (seam)              (multicast)         (e.g. cache clear)
//! ```
//!
//! - [`ChangeFeedSource`]: injected upstream, one stream per topic
//! - [`InvalidationBus`]: lazy, reference-counted upstream subscription with
//!   ordered, failure-isolated fan-out
//! - [`BroadcastFeed`]: in-memory adapter for tests and local tools

pub mod broadcast;
pub mod bus;
pub mod error;
pub mod source;

pub use broadcast::BroadcastFeed;
pub use bus::{BusMetrics, DeliveryReport, InvalidationBus, SubscriberId, Subscription};
pub use error::{BusError, CallbackError, CallbackResult};
pub use source::{ChangeFeedSource, ChangeStream};
