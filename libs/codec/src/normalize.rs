//! Shared "decode if it looks like JSON, else literal" normalisation
//!
//! Niche values reach us as plain strings, JSON-encoded strings, arrays of
//! either, objects, and objects whose fields hold more JSON-encoded strings.
//! Everything funnels through [`flatten`], which decodes embedded JSON
//! recursively and flattens arrays, leaving a list of [`Node`]s for the
//! option and selection parsers to interpret.

use crate::error::ShapeError;
use serde_json::{Map, Value};
use tracing::debug;

/// Maximum number of nested JSON-in-string decodes before giving up
pub const MAX_DECODE_DEPTH: usize = 8;

/// A leaf produced by [`flatten`]
#[derive(Debug, Clone, PartialEq)]
pub enum Node {
    /// Literal text, already trimmed and non-empty
    Text(String),
    /// An object to be interpreted by the caller
    Object(Map<String, Value>),
}

/// Whether a string should be treated as embedded JSON
pub fn looks_like_json(input: &str) -> bool {
    let trimmed = input.trim_start();
    trimmed.starts_with('{') || trimmed.starts_with('[')
}

/// Whether a string is an embedded option object, e.g. `{"text":"SEO"}`
pub fn looks_like_embedded_option(input: &str) -> bool {
    input.trim_start().starts_with('{') && input.contains("\"text\"")
}

/// Decode embedded JSON one level down from `depth`
pub fn decode_embedded(input: &str, depth: usize) -> Result<Value, ShapeError> {
    if depth >= MAX_DECODE_DEPTH {
        return Err(ShapeError::DepthExceeded {
            depth,
            limit: MAX_DECODE_DEPTH,
        });
    }
    serde_json::from_str(input.trim()).map_err(|e| ShapeError::invalid_json(input, &e))
}

/// Flatten any raw value into text and object leaves
pub fn flatten(raw: &Value) -> Vec<Node> {
    let mut nodes = Vec::new();
    walk(raw, 0, &mut nodes);
    nodes
}

fn walk(raw: &Value, depth: usize, out: &mut Vec<Node>) {
    match raw {
        Value::Null => {}
        Value::Bool(_) => {
            debug!(error = %ShapeError::UnsupportedScalar { kind: "bool" }, "Dropping niche value");
        }
        Value::Number(n) => out.push(Node::Text(n.to_string())),
        Value::String(s) => walk_str(s, depth, out),
        Value::Array(items) => {
            for item in items {
                walk(item, depth, out);
            }
        }
        Value::Object(map) => out.push(Node::Object(map.clone())),
    }
}

fn walk_str(input: &str, depth: usize, out: &mut Vec<Node>) {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        return;
    }

    if looks_like_json(trimmed) {
        match decode_embedded(trimmed, depth) {
            Ok(decoded) => return walk(&decoded, depth + 1, out),
            Err(e) => debug!(error = %e, "Treating niche value as literal text"),
        }
    }

    out.push(Node::Text(trimmed.to_string()));
}

/// Text of a scalar property: trimmed strings and numbers, nothing else
pub fn scalar_text(value: Option<&Value>) -> Option<String> {
    match value? {
        Value::String(s) => Some(s.trim().to_string()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}
