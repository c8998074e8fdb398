//! Record store seam
//!
//! The cache reads niche field configurations through [`RecordStore`]; the
//! transport and schema of the real store stay outside this crate.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt::Debug;
use thiserror::Error;

/// Configuration of one niche-type field, as stored
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NicheFieldConfig {
    #[serde(default)]
    pub form_id: Option<String>,
    #[serde(default)]
    pub field_id: Option<String>,
    /// Configured options in any shape the option parser accepts
    #[serde(default)]
    pub options: Value,
}

impl NicheFieldConfig {
    pub fn new(options: Value) -> Self {
        Self {
            options,
            ..Default::default()
        }
    }
}

#[derive(Debug, Clone, Error, PartialEq)]
pub enum StoreError {
    #[error("Record store unavailable: {0}")]
    Unavailable(String),

    #[error("Record store fetch timed out after {0} ms")]
    Timeout(u64),

    #[error("Record store fetch panicked: {0}")]
    Panicked(String),

    #[error("Fixture {path} unreadable: {reason}")]
    Fixture { path: String, reason: String },
}

impl StoreError {
    pub fn unavailable(msg: impl Into<String>) -> Self {
        StoreError::Unavailable(msg.into())
    }
}

#[async_trait]
pub trait RecordStore: Send + Sync + Debug {
    /// Every niche-type field configuration known to the store
    async fn fetch_niche_field_configs(&self) -> Result<Vec<NicheFieldConfig>, StoreError>;
}
