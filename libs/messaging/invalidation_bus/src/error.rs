//! Invalidation bus errors

use thiserror::Error;

/// Error a subscriber callback may return; logged, never propagated
pub type CallbackError = Box<dyn std::error::Error + Send + Sync>;

/// Result of one subscriber callback
pub type CallbackResult = Result<(), CallbackError>;

#[derive(Debug, Clone, Error, PartialEq)]
pub enum BusError {
    #[error("Change feed connect failed for topic '{topic}': {reason}")]
    ConnectFailed { topic: String, reason: String },

    #[error("Change feed disconnect failed for topic '{topic}': {reason}")]
    DisconnectFailed { topic: String, reason: String },

    #[error("Change feed closed")]
    Closed,
}

impl BusError {
    pub fn connect_failed(topic: impl Into<String>, reason: impl Into<String>) -> Self {
        BusError::ConnectFailed {
            topic: topic.into(),
            reason: reason.into(),
        }
    }

    pub fn disconnect_failed(topic: impl Into<String>, reason: impl Into<String>) -> Self {
        BusError::DisconnectFailed {
            topic: topic.into(),
            reason: reason.into(),
        }
    }
}
