//! Form schema and record provider seams

use async_trait::async_trait;
use niche_types::{FieldDescriptor, Record};
use thiserror::Error;

#[derive(Debug, Clone, Error, PartialEq)]
pub enum ProviderError {
    #[error("Form '{0}' not found")]
    FormNotFound(String),

    #[error("Provider unavailable: {0}")]
    Unavailable(String),
}

/// Supplies the field descriptors of a form
#[async_trait]
pub trait SchemaProvider: Send + Sync {
    async fn fields(&self, form_id: &str) -> Result<Vec<FieldDescriptor>, ProviderError>;
}

/// Supplies the records captured by a form
#[async_trait]
pub trait RecordProvider: Send + Sync {
    async fn records(&self, form_id: &str) -> Result<Vec<Record>, ProviderError>;
}
