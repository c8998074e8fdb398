//! JSON fixture-backed store
//!
//! Reads a file shaped like
//!
//! ```json
//! {
//!   "field_configs": [{ "field_id": "f1", "options": "[\"SEO\", \"Tech\"]" }],
//!   "forms": {
//!     "listings": {
//!       "fields": [{ "id": "f1", "field_type": "niche", "label": "Niche" }],
//!       "records": [{ "id": "r1", "values": { "f1": [{ "niche": "SEO", "price": "10" }] } }]
//!     }
//!   }
//! }
//! ```
//!
//! The file is re-read on every fetch so edits show up after the next
//! invalidation.

use crate::store::{NicheFieldConfig, RecordStore, StoreError};
use async_trait::async_trait;
use niche_filter::{ProviderError, RecordProvider, SchemaProvider};
use niche_types::{FieldDescriptor, Record};
use serde::Deserialize;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use tracing::debug;

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Fixture {
    #[serde(default)]
    pub field_configs: Vec<NicheFieldConfig>,
    #[serde(default)]
    pub forms: HashMap<String, FormFixture>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct FormFixture {
    #[serde(default)]
    pub fields: Vec<FieldDescriptor>,
    #[serde(default)]
    pub records: Vec<Record>,
}

#[derive(Debug, Clone)]
pub struct JsonFileStore {
    path: PathBuf,
}

impl JsonFileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub async fn read(&self) -> Result<Fixture, StoreError> {
        let data = tokio::fs::read_to_string(&self.path)
            .await
            .map_err(|e| self.fixture_error(e))?;
        let fixture: Fixture = serde_json::from_str(&data).map_err(|e| self.fixture_error(e))?;
        debug!(
            path = %self.path.display(),
            configs = fixture.field_configs.len(),
            forms = fixture.forms.len(),
            "Fixture loaded"
        );
        Ok(fixture)
    }

    async fn form(&self, form_id: &str) -> Result<FormFixture, ProviderError> {
        let mut fixture = self
            .read()
            .await
            .map_err(|e| ProviderError::Unavailable(e.to_string()))?;
        fixture
            .forms
            .remove(form_id)
            .ok_or_else(|| ProviderError::FormNotFound(form_id.to_string()))
    }

    fn fixture_error(&self, err: impl std::fmt::Display) -> StoreError {
        StoreError::Fixture {
            path: self.path.display().to_string(),
            reason: err.to_string(),
        }
    }
}

#[async_trait]
impl RecordStore for JsonFileStore {
    async fn fetch_niche_field_configs(&self) -> Result<Vec<NicheFieldConfig>, StoreError> {
        Ok(self.read().await?.field_configs)
    }
}

#[async_trait]
impl SchemaProvider for JsonFileStore {
    async fn fields(&self, form_id: &str) -> Result<Vec<FieldDescriptor>, ProviderError> {
        Ok(self.form(form_id).await?.fields)
    }
}

#[async_trait]
impl RecordProvider for JsonFileStore {
    async fn records(&self, form_id: &str) -> Result<Vec<Record>, ProviderError> {
        Ok(self.form(form_id).await?.records)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;
    use tokio_test::assert_ok;

    const FIXTURE: &str = r#"{
        "field_configs": [
            { "field_id": "f1", "options": "[\"SEO\", \"Tech\"]" },
            { "field_id": "f2", "options": [{ "text": "seo", "icon": "BoltIcon" }] }
        ],
        "forms": {
            "listings": {
                "fields": [{ "id": "f1", "field_type": "niche", "label": "Niche" }],
                "records": [{ "id": "r1", "values": { "f1": ["SEO"] } }]
            }
        }
    }"#;

    #[tokio::test]
    async fn test_reads_configs_schema_and_records() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("fixture.json");
        fs::write(&path, FIXTURE).unwrap();

        let store = JsonFileStore::new(&path);
        assert_eq!(assert_ok!(store.fetch_niche_field_configs().await).len(), 2);
        assert_eq!(assert_ok!(store.fields("listings").await).len(), 1);
        assert_eq!(assert_ok!(store.records("listings").await)[0].id, "r1");
        assert_eq!(
            store.fields("orders").await,
            Err(ProviderError::FormNotFound("orders".into()))
        );
    }

    #[tokio::test]
    async fn test_missing_or_corrupt_file() {
        let dir = tempdir().unwrap();

        let store = JsonFileStore::new(dir.path().join("absent.json"));
        assert!(matches!(
            store.fetch_niche_field_configs().await,
            Err(StoreError::Fixture { .. })
        ));

        let path = dir.path().join("corrupt.json");
        fs::write(&path, "{ not json").unwrap();
        let store = JsonFileStore::new(&path);
        assert!(matches!(
            store.fetch_niche_field_configs().await,
            Err(StoreError::Fixture { .. })
        ));
        assert!(matches!(
            store.records("listings").await,
            Err(ProviderError::Unavailable(_))
        ));
    }
}
