//! Option parser: raw value -> canonical [`NicheOption`] list
//!
//! Accepted shapes, applied recursively:
//!
//! | Raw shape | Result |
//! |-----------|--------|
//! | `null`, `""` | nothing |
//! | `"SEO"` | `[{text: "SEO"}]` |
//! | `"[\"SEO\"]"`, `"{\"text\":\"SEO\"}"` | decoded, then parsed again |
//! | `["Marketing", "SEO"]` | one option per element |
//! | `{text, icon}` | one option |
//! | `{niche: "{\"text\":\"SEO\",\"icon\":\"BoltIcon\"}"}` | embedded object decoded |
//!
//! Malformed input never fails: it degrades to literal text or to nothing.

use crate::normalize::{self, Node, MAX_DECODE_DEPTH};
use niche_types::NicheOption;
use serde_json::{Map, Value};
use std::collections::HashMap;
use tracing::{debug, warn};

/// Normalise any raw niche value into an ordered list of options
///
/// Entries with neither text nor icon are dropped. Duplicates are kept;
/// merging is the caller's choice (see [`dedup_options`]).
pub fn parse_niche_value(raw: &Value) -> Vec<NicheOption> {
    normalize::flatten(raw)
        .into_iter()
        .map(|node| match node {
            Node::Text(text) => NicheOption::new(text),
            Node::Object(map) => option_from_object(&map, 0),
        })
        .filter(|option| !option.is_blank())
        .collect()
}

/// Parse a raw string as it comes off the wire
pub fn parse_niche_str(raw: &str) -> Vec<NicheOption> {
    parse_niche_value(&Value::String(raw.to_string()))
}

/// Resolve one object into an option
///
/// Text comes from `text`, else from `niche`. The icon comes from the
/// object's own `icon`, else from an embedded option found under `niche`.
pub(crate) fn option_from_object(map: &Map<String, Value>, depth: usize) -> NicheOption {
    let own_icon = normalize::scalar_text(map.get("icon")).unwrap_or_default();

    let (text, embedded_icon) = match normalize::scalar_text(map.get("text")) {
        Some(text) if !text.is_empty() => (text, None),
        _ => match map.get("niche") {
            Some(niche) => resolve_embedded(niche, depth),
            None => (String::new(), None),
        },
    };

    let icon = if own_icon.is_empty() {
        embedded_icon.unwrap_or_default()
    } else {
        own_icon
    };
    NicheOption::with_icon(text, icon)
}

/// Resolve a `niche` property that may hold an embedded option
///
/// Only object-looking strings mentioning `"text"` are decoded; anything
/// else under `niche` is taken literally.
pub(crate) fn resolve_embedded(value: &Value, depth: usize) -> (String, Option<String>) {
    match value {
        Value::String(s) if normalize::looks_like_embedded_option(s) => {
            match normalize::decode_embedded(s, depth) {
                Ok(Value::Object(inner)) => {
                    let option = option_from_object(&inner, depth + 1);
                    (option.text, option.icon)
                }
                Ok(_) => (s.trim().to_string(), None),
                Err(e) => {
                    debug!(error = %e, "Embedded niche option unreadable, using literal text");
                    (s.trim().to_string(), None)
                }
            }
        }
        Value::Object(inner) if depth < MAX_DECODE_DEPTH => {
            let option = option_from_object(inner, depth + 1);
            (option.text, option.icon)
        }
        other => (normalize::scalar_text(Some(other)).unwrap_or_default(), None),
    }
}

/// Merge options by lower-cased text, keeping first-seen order and casing
///
/// A later duplicate carrying a non-empty icon replaces the icon kept so
/// far, so the last non-empty icon wins. Icon-only options share the empty
/// key and merge into one entry; blank options are dropped.
pub fn dedup_options<I>(options: I) -> Vec<NicheOption>
where
    I: IntoIterator<Item = NicheOption>,
{
    let mut merged: Vec<NicheOption> = Vec::new();
    let mut index: HashMap<String, usize> = HashMap::new();

    for option in options {
        if option.is_blank() {
            continue;
        }
        let key = option.key();
        match index.get(&key) {
            Some(&position) => {
                if option.has_icon() {
                    merged[position].icon = option.icon;
                }
            }
            None => {
                index.insert(key, merged.len());
                merged.push(option);
            }
        }
    }

    merged
}

/// Encode options in the canonical JSON array form the parser accepts
pub fn encode_options(options: &[NicheOption]) -> String {
    serde_json::to_string(options).unwrap_or_else(|e| {
        warn!(error = %e, "Failed to encode niche options");
        "[]".to_string()
    })
}
