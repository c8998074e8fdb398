//! Niche extraction and counting over record collections
//!
//! Only fields whose descriptor says `field_type == "niche"` are read. A
//! schema without niche fields yields nothing rather than guessing which
//! column might hold niche data.

use niche_codec::parse_niche_value;
use niche_types::{niche_key, FieldDescriptor, FieldId, NicheCount, NicheOption, Record};
use std::collections::HashMap;
use tracing::debug;

/// Niche field selection derived from a form schema
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NicheFilter {
    field_ids: Vec<FieldId>,
}

impl NicheFilter {
    pub fn from_schema(fields: &[FieldDescriptor]) -> Self {
        let field_ids: Vec<FieldId> = fields
            .iter()
            .filter(|f| f.is_niche())
            .map(|f| f.id.clone())
            .collect();
        debug!(niche_fields = field_ids.len(), total_fields = fields.len(), "Niche fields selected");
        Self { field_ids }
    }

    pub fn field_ids(&self) -> &[FieldId] {
        &self.field_ids
    }

    pub fn has_niche_fields(&self) -> bool {
        !self.field_ids.is_empty()
    }

    /// Options carried by one record across all niche fields
    ///
    /// Case-insensitive duplicates within the record collapse into the
    /// first occurrence, picking up the first non-empty icon.
    pub fn record_options(&self, record: &Record) -> Vec<NicheOption> {
        let mut options: Vec<NicheOption> = Vec::new();
        let mut seen: HashMap<String, usize> = HashMap::new();

        for raw in self.field_ids.iter().filter_map(|id| record.value(id)) {
            for option in parse_niche_value(raw) {
                let key = option.key();
                if key.is_empty() {
                    continue;
                }
                match seen.get(&key) {
                    Some(&i) => {
                        if !options[i].has_icon() && option.has_icon() {
                            options[i].icon = option.icon;
                        }
                    }
                    None => {
                        seen.insert(key, options.len());
                        options.push(option);
                    }
                }
            }
        }

        options
    }

    /// Lower-cased niche keys carried by one record
    pub fn record_keys(&self, record: &Record) -> Vec<String> {
        self.record_options(record)
            .iter()
            .map(NicheOption::key)
            .collect()
    }

    /// Count how many records carry each niche
    ///
    /// Sorted by count descending, ties by case-insensitive text ascending.
    pub fn extract_with_counts(&self, records: &[Record]) -> Vec<NicheCount> {
        if !self.has_niche_fields() {
            return Vec::new();
        }

        let mut counts: Vec<NicheCount> = Vec::new();
        let mut index: HashMap<String, usize> = HashMap::new();

        for record in records {
            for option in self.record_options(record) {
                match index.get(&option.key()) {
                    Some(&i) => {
                        let entry = &mut counts[i];
                        entry.count += 1;
                        if !entry.option.has_icon() && option.has_icon() {
                            entry.option.icon = option.icon;
                        }
                    }
                    None => {
                        index.insert(option.key(), counts.len());
                        counts.push(NicheCount { option, count: 1 });
                    }
                }
            }
        }

        counts.sort_by(|a, b| {
            b.count
                .cmp(&a.count)
                .then_with(|| niche_key(&a.option.text).cmp(&niche_key(&b.option.text)))
        });
        counts
    }
}

/// Count niches across `records` using the niche fields in `fields`
pub fn extract_with_counts(records: &[Record], fields: &[FieldDescriptor]) -> Vec<NicheCount> {
    NicheFilter::from_schema(fields).extract_with_counts(records)
}
