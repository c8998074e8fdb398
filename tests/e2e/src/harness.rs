//! Fixture-backed stack

use anyhow::{Context, Result};
use invalidation_bus::{BroadcastFeed, InvalidationBus};
use niche_cache::{JsonFileStore, NicheOptionCache};
use niche_config::NicheSettings;
use niche_filter::NicheReport;
use niche_types::{ChangeEvent, ChangeKind};
use serde_json::{json, Value};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Once};
use tempfile::TempDir;
use tracing::debug;

static INIT_LOGGING: Once = Once::new();

/// Route test logs through the fmt subscriber when RUST_LOG is set
pub fn init_test_logging() {
    INIT_LOGGING.call_once(|| {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
            .with_test_writer()
            .try_init();
    });
}

/// Three options across two fields, one listings form with three records
pub fn sample_fixture() -> Value {
    json!({
        "field_configs": [
            { "form_id": "listings", "field_id": "f1", "options": "[\"Marketing\", \"SEO\"]" },
            { "form_id": "sellers", "field_id": "f9", "options": [{ "text": "seo", "icon": "BoltIcon" }, { "text": "Tech" }] }
        ],
        "forms": {
            "listings": {
                "fields": [
                    { "id": "title", "field_type": "text", "label": "Title" },
                    { "id": "f1", "field_type": "niche", "label": "Niche" }
                ],
                "records": [
                    { "id": "r1", "values": { "title": "Blog A", "f1": [{ "niche": "SEO", "price": "10" }] } },
                    { "id": "r2", "values": { "title": "Blog B", "f1": "[{\"niche\":\"seo\",\"price\":\"12\"},{\"niche\":\"Tech\"}]" } },
                    { "id": "r3", "values": { "title": "Blog C", "f1": "Marketing" } }
                ]
            }
        }
    })
}

/// Store, feed, bus and cache sharing one fixture file
pub struct NicheStack {
    _dir: TempDir,
    pub path: PathBuf,
    pub settings: NicheSettings,
    pub store: Arc<JsonFileStore>,
    pub feed: Arc<BroadcastFeed>,
    pub bus: InvalidationBus,
    pub cache: NicheOptionCache,
}

impl NicheStack {
    pub async fn new(fixture: &Value) -> Result<Self> {
        init_test_logging();

        let dir = tempfile::tempdir().context("Failed to create fixture dir")?;
        let path = dir.path().join("niche_fixture.json");
        write_fixture(&path, fixture)?;

        let mut settings = NicheSettings::default();
        settings.store.fixture_path = path.clone();

        let store = Arc::new(JsonFileStore::new(&path));
        let feed = Arc::new(BroadcastFeed::new(settings.bus.broadcast_capacity));
        let bus = InvalidationBus::new(feed.clone(), settings.bus.topic.clone());
        let cache = NicheOptionCache::with_bus(store.clone(), &settings.cache, &bus).await;

        Ok(Self {
            _dir: dir,
            path,
            settings,
            store,
            feed,
            bus,
            cache,
        })
    }

    pub fn report(&self) -> NicheReport {
        NicheReport::new(self.store.clone(), self.store.clone())
    }

    /// Overwrite the fixture and announce the change on the feed
    pub fn update_fixture(&self, fixture: &Value) -> Result<usize> {
        write_fixture(&self.path, fixture)?;
        let event = ChangeEvent::new(self.settings.bus.topic.clone(), ChangeKind::Update);
        let receivers = self.feed.publish(event);
        debug!(receivers, "Fixture change published");
        Ok(receivers)
    }
}

fn write_fixture(path: &Path, fixture: &Value) -> Result<()> {
    let data = serde_json::to_string_pretty(fixture).context("Failed to encode fixture")?;
    std::fs::write(path, data).with_context(|| format!("Failed to write {}", path.display()))
}
