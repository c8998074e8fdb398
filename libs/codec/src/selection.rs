//! Selection parser and orphan pruning
//!
//! A record's niche field stores the niches chosen for it, each with a
//! price. Shapes are as tolerant as the option parser's, plus legacy bare
//! strings (`"SEO"` -> `{niche: "SEO", price: ""}`).

use crate::normalize::{self, Node};
use crate::option::resolve_embedded;
use niche_types::{NicheOption, SelectedNiche};
use serde_json::{Map, Value};
use std::collections::HashSet;
use tracing::{debug, warn};

/// Normalise a raw per-record value into selected niches
///
/// Order and duplicates are preserved; entries without niche text are dropped.
pub fn parse_selection(raw: &Value) -> Vec<SelectedNiche> {
    normalize::flatten(raw)
        .into_iter()
        .filter_map(|node| match node {
            Node::Text(text) => Some(SelectedNiche::unpriced(text)),
            Node::Object(map) => selection_from_object(&map),
        })
        .filter(|selected| !selected.niche.is_empty())
        .collect()
}

fn selection_from_object(map: &Map<String, Value>) -> Option<SelectedNiche> {
    let niche = match map.get("niche") {
        Some(value) => resolve_embedded(value, 0).0,
        None => String::new(),
    };
    let niche = if niche.is_empty() {
        normalize::scalar_text(map.get("text")).unwrap_or_default()
    } else {
        niche
    };

    if niche.is_empty() {
        debug!(keys = ?map.keys().collect::<Vec<_>>(), "Selection entry without niche text");
        return None;
    }

    Some(SelectedNiche::new(niche, normalize_price(map.get("price"))))
}

/// Price as stored text: strings trimmed, numbers rendered, anything else empty
pub fn normalize_price(value: Option<&Value>) -> String {
    match value {
        None | Some(Value::Null) => String::new(),
        Some(Value::String(s)) => s.trim().to_string(),
        Some(Value::Number(n)) => n.to_string(),
        Some(other) => {
            debug!(price = %other, "Ignoring non-scalar price");
            String::new()
        }
    }
}

/// Remove selections whose niche is no longer an available option
///
/// Matching is exact and case-sensitive against option text. When nothing
/// is orphaned the result equals the input.
pub fn prune_orphans(selected: &[SelectedNiche], available: &[NicheOption]) -> Vec<SelectedNiche> {
    let known: HashSet<&str> = available.iter().map(|o| o.text.as_str()).collect();

    let kept: Vec<SelectedNiche> = selected
        .iter()
        .filter(|s| known.contains(s.niche.as_str()))
        .cloned()
        .collect();

    let pruned = selected.len() - kept.len();
    if pruned > 0 {
        debug!(pruned, remaining = kept.len(), "Pruned orphaned niche selections");
    }
    kept
}

/// Niche texts of a selection, in order
pub fn selected_texts(selected: &[SelectedNiche]) -> Vec<String> {
    selected.iter().map(|s| s.niche.clone()).collect()
}

/// Encode selections in the canonical `[{niche, price}]` form
pub fn encode_selection(selected: &[SelectedNiche]) -> String {
    serde_json::to_string(selected).unwrap_or_else(|e| {
        warn!(error = %e, "Failed to encode niche selection");
        "[]".to_string()
    })
}
