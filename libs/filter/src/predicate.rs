//! Record predicates and option search

use crate::counter::NicheFilter;
use niche_types::{niche_key, FieldDescriptor, NicheCount, NicheOption, Record, SelectedNiche};
use std::collections::HashSet;

/// Anything that displays a niche text
pub trait NicheText {
    fn niche_text(&self) -> &str;
}

impl NicheText for NicheOption {
    fn niche_text(&self) -> &str {
        &self.text
    }
}

impl NicheText for NicheCount {
    fn niche_text(&self) -> &str {
        &self.option.text
    }
}

impl NicheText for SelectedNiche {
    fn niche_text(&self) -> &str {
        &self.niche
    }
}

/// Record predicate matching any of a set of niches, case-insensitively
#[derive(Debug, Clone)]
pub struct NichePredicate {
    filter: NicheFilter,
    selected: HashSet<String>,
}

impl NichePredicate {
    pub fn new<S: AsRef<str>>(filter: NicheFilter, selected: &[S]) -> Self {
        let selected = selected
            .iter()
            .map(|s| niche_key(s.as_ref()))
            .filter(|key| !key.is_empty())
            .collect();
        Self { filter, selected }
    }

    /// An empty selection accepts every record
    pub fn accepts_all(&self) -> bool {
        self.selected.is_empty()
    }

    pub fn matches(&self, record: &Record) -> bool {
        if self.accepts_all() {
            return true;
        }
        self.filter
            .record_keys(record)
            .iter()
            .any(|key| self.selected.contains(key))
    }

    pub fn into_fn(self) -> impl Fn(&Record) -> bool + Send + Sync + 'static {
        move |record| self.matches(record)
    }
}

impl NicheFilter {
    pub fn build_predicate<S: AsRef<str>>(&self, selected: &[S]) -> NichePredicate {
        NichePredicate::new(self.clone(), selected)
    }
}

/// Build a record predicate for `selected` niches over the niche fields in `fields`
pub fn build_predicate<S: AsRef<str>>(
    fields: &[FieldDescriptor],
    selected: &[S],
) -> impl Fn(&Record) -> bool + Send + Sync + 'static {
    NicheFilter::from_schema(fields)
        .build_predicate(selected)
        .into_fn()
}

/// Case-insensitive substring search on niche text
///
/// A blank term returns the input unchanged, in order.
pub fn search_filter<T: NicheText + Clone>(items: &[T], term: &str) -> Vec<T> {
    let needle = term.trim().to_lowercase();
    if needle.is_empty() {
        return items.to_vec();
    }
    items
        .iter()
        .filter(|item| item.niche_text().to_lowercase().contains(&needle))
        .cloned()
        .collect()
}
