//! Cross-crate scenarios: parser -> cache -> bus -> filter

use niche_cache::test_utils::GatedStore;
use niche_cache::{CacheState, NicheFieldConfig, NicheOptionCache};
use niche_codec::{encode_options, parse_niche_str, parse_niche_value, parse_selection, prune_orphans};
use niche_config::CacheSettings;
use niche_e2e_tests::{sample_fixture, NicheStack};
use niche_filter::extract_with_counts;
use niche_types::{FieldDescriptor, NicheCount, NicheOption, Record, SelectedNiche};
use serde_json::json;
use std::sync::atomic::Ordering;
use std::sync::Arc;
use tokio_test::assert_ok;

async fn wait_for_state(cache: &NicheOptionCache, state: CacheState) {
    for _ in 0..200 {
        if cache.state() == state {
            return;
        }
        tokio::task::yield_now().await;
    }
}

#[test]
fn test_embedded_option_selection_unwraps() {
    let raw = json!(r#"[{"niche":"{\"text\":\"SEO\",\"icon\":\"BoltIcon\"}","price":""}]"#);
    assert_eq!(parse_selection(&raw), vec![SelectedNiche::new("SEO", "")]);
}

#[test]
fn test_plain_list_and_single_object() {
    assert_eq!(
        parse_niche_value(&json!(["Marketing", "SEO"])),
        vec![NicheOption::new("Marketing"), NicheOption::new("SEO")]
    );
    assert_eq!(
        parse_niche_value(&json!({"text": "Finanças"})),
        vec![NicheOption::new("Finanças")]
    );
}

#[test]
fn test_counts_across_records() {
    let fields = vec![FieldDescriptor::new("f1", "niche")];
    let records = vec![
        Record::new("r1").with_value("f1", json!([{"niche": "SEO"}])),
        Record::new("r2").with_value("f1", json!([{"niche": "SEO"}])),
    ];

    assert_eq!(
        extract_with_counts(&records, &fields),
        vec![NicheCount {
            option: NicheOption::new("SEO"),
            count: 2
        }]
    );
}

#[test]
fn test_encoded_options_reparse() {
    let options = vec![NicheOption::with_icon("SEO", "BoltIcon"), NicheOption::new("Tech")];
    assert_eq!(parse_niche_str(&encode_options(&options)), options);
}

#[tokio::test]
async fn test_concurrent_loads_coalesce() {
    let store = Arc::new(GatedStore::new(vec![NicheFieldConfig::new(json!([
        "Marketing", "SEO", "Tech"
    ]))]));
    let cache = Arc::new(NicheOptionCache::new(store.clone(), &CacheSettings::default()));

    let handles: Vec<_> = (0..5)
        .map(|_| {
            let cache = Arc::clone(&cache);
            tokio::spawn(async move { cache.get_all_options().await })
        })
        .collect();

    for _ in 0..200 {
        if cache.metrics().coalesced_waits.load(Ordering::Relaxed) == 4 {
            break;
        }
        tokio::task::yield_now().await;
    }
    store.release(1);

    let mut results = Vec::new();
    for handle in handles {
        results.push(handle.await.unwrap());
    }

    assert_eq!(store.call_count(), 1);
    assert_eq!(results.len(), 5);
    assert!(results.iter().all(|r| *r == results[0]));
}

#[tokio::test]
async fn test_invalidation_triggers_one_fresh_fetch() {
    let stack = assert_ok!(NicheStack::new(&sample_fixture()).await);

    let options = stack.cache.get_all_options().await;
    assert_eq!(
        *options,
        vec![
            NicheOption::new("Marketing"),
            NicheOption::with_icon("SEO", "BoltIcon"),
            NicheOption::new("Tech"),
        ]
    );
    assert_eq!(stack.cache.metrics().fetches_started.load(Ordering::Relaxed), 1);

    let mut fixture = sample_fixture();
    fixture["field_configs"][0]["options"] = json!(["Marketing", "SEO", "Crypto"]);
    assert_eq!(stack.update_fixture(&fixture).unwrap(), 1);

    wait_for_state(&stack.cache, CacheState::Unloaded).await;
    assert_eq!(stack.cache.state(), CacheState::Unloaded);
    // Invalidation alone does not reload
    assert_eq!(stack.cache.metrics().fetches_started.load(Ordering::Relaxed), 1);

    let refreshed = stack.cache.get_all_options().await;
    assert_eq!(refreshed.len(), 4);
    assert!(refreshed.contains(&NicheOption::new("Crypto")));
    assert_eq!(stack.cache.metrics().fetches_started.load(Ordering::Relaxed), 2);

    stack.cache.destroy().await;
    assert_eq!(stack.bus.subscriber_count(), 0);
    assert_eq!(stack.feed.disconnect_count(), 1);
}

#[tokio::test]
async fn test_report_counts_and_matching() {
    let stack = assert_ok!(NicheStack::new(&sample_fixture()).await);
    let report = stack.report();

    let counts = report.counts("listings", "").await;
    let summary: Vec<(&str, usize)> = counts
        .iter()
        .map(|c| (c.option.text.as_str(), c.count))
        .collect();
    assert_eq!(summary, vec![("SEO", 2), ("Marketing", 1), ("Tech", 1)]);

    let searched = report.counts("listings", "  te ").await;
    assert_eq!(searched.len(), 1);
    assert_eq!(searched[0].option.text, "Tech");

    let ids = |records: Vec<Record>| records.into_iter().map(|r| r.id).collect::<Vec<_>>();
    assert_eq!(ids(report.matching_records("listings", &["seo"]).await), vec!["r1", "r2"]);
    assert_eq!(
        ids(report.matching_records::<&str>("listings", &[]).await),
        vec!["r1", "r2", "r3"]
    );

    // Unknown forms degrade to empty
    assert!(report.counts("missing", "").await.is_empty());
}

#[tokio::test]
async fn test_selection_pruned_after_option_removed() {
    let stack = assert_ok!(NicheStack::new(&sample_fixture()).await);

    let raw = json!([{"niche": "SEO", "price": 10}, "Tech", {"niche": "Crypto", "price": "5"}]);
    let selected = parse_selection(&raw);
    assert_eq!(
        stack.cache.prune_selection(&selected).await,
        vec![SelectedNiche::new("SEO", "10"), SelectedNiche::unpriced("Tech")]
    );

    let mut fixture = sample_fixture();
    fixture["field_configs"][1]["options"] = json!([{"text": "seo", "icon": "BoltIcon"}]);
    stack.update_fixture(&fixture).unwrap();
    wait_for_state(&stack.cache, CacheState::Unloaded).await;

    let options = stack.cache.get_all_options().await;
    assert_eq!(
        prune_orphans(&selected, &options),
        vec![SelectedNiche::new("SEO", "10")]
    );
}
