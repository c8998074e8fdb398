//! Form schema and record shapes consumed from the record store

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::HashMap;

/// Field type tag identifying niche fields
pub const NICHE_FIELD_TYPE: &str = "niche";

pub type FieldId = String;
pub type RecordId = String;

/// Schema metadata for one form field
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldDescriptor {
    pub id: FieldId,
    pub field_type: String,
    #[serde(default)]
    pub label: String,
    /// Any further schema keys, carried through untouched
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl FieldDescriptor {
    pub fn new(id: impl Into<FieldId>, field_type: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            field_type: field_type.into(),
            label: String::new(),
            extra: Map::new(),
        }
    }

    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = label.into();
        self
    }

    /// Whether this descriptor is a niche field
    pub fn is_niche(&self) -> bool {
        self.field_type == NICHE_FIELD_TYPE
    }
}

/// One form entry: raw values keyed by field id
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Record {
    pub id: RecordId,
    #[serde(default)]
    pub values: HashMap<FieldId, Value>,
}

impl Record {
    pub fn new(id: impl Into<RecordId>) -> Self {
        Self {
            id: id.into(),
            values: HashMap::new(),
        }
    }

    pub fn with_value(mut self, field_id: impl Into<FieldId>, value: Value) -> Self {
        self.values.insert(field_id.into(), value);
        self
    }

    pub fn value(&self, field_id: &str) -> Option<&Value> {
        self.values.get(field_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_niche_detection_is_exact() {
        assert!(FieldDescriptor::new("f1", "niche").is_niche());
        assert!(!FieldDescriptor::new("f2", "Niche").is_niche());
        assert!(!FieldDescriptor::new("f3", "select").is_niche());
    }

    #[test]
    fn test_descriptor_keeps_unknown_keys() {
        let descriptor: FieldDescriptor = serde_json::from_value(json!({
            "id": "f1",
            "field_type": "niche",
            "label": "Nicho",
            "required": true
        }))
        .unwrap();

        assert_eq!(descriptor.label, "Nicho");
        assert_eq!(descriptor.extra.get("required"), Some(&json!(true)));
    }
}
