//! Niche report service
//!
//! Pulls schema and records for a form from the providers and runs the
//! counter / predicate over them. Provider failures are logged and produce
//! an empty report; a listing page never errors because upstream did.

use crate::counter::NicheFilter;
use crate::predicate::search_filter;
use crate::provider::{RecordProvider, SchemaProvider};
use niche_types::{FieldDescriptor, NicheCount, Record};
use std::sync::Arc;
use tracing::warn;

pub struct NicheReport {
    schema: Arc<dyn SchemaProvider>,
    records: Arc<dyn RecordProvider>,
}

impl NicheReport {
    pub fn new(schema: Arc<dyn SchemaProvider>, records: Arc<dyn RecordProvider>) -> Self {
        Self { schema, records }
    }

    /// Niche counts for a form, optionally narrowed by a search term
    pub async fn counts(&self, form_id: &str, search: &str) -> Vec<NicheCount> {
        let (fields, records) = self.load(form_id).await;
        let counts = NicheFilter::from_schema(&fields).extract_with_counts(&records);
        search_filter(&counts, search)
    }

    /// Records of a form carrying any of the `selected` niches
    pub async fn matching_records<S: AsRef<str>>(&self, form_id: &str, selected: &[S]) -> Vec<Record> {
        let (fields, records) = self.load(form_id).await;
        let predicate = NicheFilter::from_schema(&fields).build_predicate(selected);
        records.into_iter().filter(|r| predicate.matches(r)).collect()
    }

    async fn load(&self, form_id: &str) -> (Vec<FieldDescriptor>, Vec<Record>) {
        let fields = match self.schema.fields(form_id).await {
            Ok(fields) => fields,
            Err(e) => {
                warn!(form_id, error = %e, "Schema fetch failed, reporting no niches");
                return (Vec::new(), Vec::new());
            }
        };

        let records = match self.records.records(form_id).await {
            Ok(records) => records,
            Err(e) => {
                warn!(form_id, error = %e, "Record fetch failed, reporting no niches");
                Vec::new()
            }
        };

        (fields, records)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::provider::ProviderError;
    use async_trait::async_trait;
    use serde_json::json;

    struct StaticForm {
        fields: Vec<FieldDescriptor>,
        records: Vec<Record>,
    }

    #[async_trait]
    impl SchemaProvider for StaticForm {
        async fn fields(&self, form_id: &str) -> Result<Vec<FieldDescriptor>, ProviderError> {
            match form_id {
                "listings" => Ok(self.fields.clone()),
                other => Err(ProviderError::FormNotFound(other.to_string())),
            }
        }
    }

    #[async_trait]
    impl RecordProvider for StaticForm {
        async fn records(&self, _form_id: &str) -> Result<Vec<Record>, ProviderError> {
            Ok(self.records.clone())
        }
    }

    struct DownRecords;

    #[async_trait]
    impl RecordProvider for DownRecords {
        async fn records(&self, _form_id: &str) -> Result<Vec<Record>, ProviderError> {
            Err(ProviderError::Unavailable("timeout".into()))
        }
    }

    fn form() -> Arc<StaticForm> {
        Arc::new(StaticForm {
            fields: vec![FieldDescriptor::new("f1", "niche")],
            records: vec![
                Record::new("r1").with_value("f1", json!(["SEO", "Tech"])),
                Record::new("r2").with_value("f1", json!(["seo"])),
            ],
        })
    }

    #[tokio::test]
    async fn test_counts_and_search() {
        let form = form();
        let report = NicheReport::new(form.clone(), form);

        let counts = report.counts("listings", "").await;
        assert_eq!(counts.len(), 2);
        assert_eq!((counts[0].option.text.as_str(), counts[0].count), ("SEO", 2));

        let counts = report.counts("listings", "tec").await;
        assert_eq!(counts.len(), 1);
    }

    #[tokio::test]
    async fn test_matching_records() {
        let form = form();
        let report = NicheReport::new(form.clone(), form);

        let records = report.matching_records("listings", &["TECH"]).await;
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].id, "r1");
    }

    #[tokio::test]
    async fn test_provider_failures_degrade_to_empty() {
        let form = form();
        let report = NicheReport::new(form.clone(), form.clone());
        assert!(report.counts("unknown-form", "").await.is_empty());

        let report = NicheReport::new(form, Arc::new(DownRecords));
        assert!(report.counts("listings", "").await.is_empty());
        let none: [&str; 0] = [];
        assert!(report.matching_records("listings", &none).await.is_empty());
    }
}
