//! Change feed events

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Kind of upstream change, when the feed reports one
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChangeKind {
    Insert,
    Update,
    Delete,
    #[default]
    #[serde(other)]
    Unknown,
}

/// Opaque change notification from the record store's feed
///
/// Consumers react to the presence of an event; the payload is carried for
/// logging only and is never interpreted field by field.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChangeEvent {
    pub topic: String,
    #[serde(default)]
    pub kind: ChangeKind,
    #[serde(default)]
    pub record_id: Option<String>,
    #[serde(default)]
    pub payload: Value,
}

impl ChangeEvent {
    pub fn new(topic: impl Into<String>, kind: ChangeKind) -> Self {
        Self {
            topic: topic.into(),
            kind,
            record_id: None,
            payload: Value::Null,
        }
    }

    pub fn with_record(mut self, record_id: impl Into<String>) -> Self {
        self.record_id = Some(record_id.into());
        self
    }
}
