//! Niche option and selection types

use serde::{Deserialize, Serialize};

/// Identity key for a niche: the trimmed text, lower-cased.
///
/// Two options are the same niche iff their keys are equal.
pub fn niche_key(text: &str) -> String {
    text.trim().to_lowercase()
}

/// Canonical niche option
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct NicheOption {
    /// Display text, always trimmed
    pub text: String,

    /// Icon identifier (e.g. `"BoltIcon"`), absent when not configured
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub icon: Option<String>,
}

impl NicheOption {
    /// Create an option without an icon
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into().trim().to_string(),
            icon: None,
        }
    }

    /// Create an option with an icon; a blank icon is stored as `None`
    pub fn with_icon(text: impl Into<String>, icon: impl Into<String>) -> Self {
        let icon = icon.into();
        let mut option = Self::new(text);
        option.icon = if icon.trim().is_empty() {
            None
        } else {
            Some(icon.trim().to_string())
        };
        option
    }

    /// Dedup key (lower-cased text)
    pub fn key(&self) -> String {
        niche_key(&self.text)
    }

    pub fn has_icon(&self) -> bool {
        self.icon.as_deref().is_some_and(|icon| !icon.trim().is_empty())
    }

    /// True when the option carries neither text nor icon
    pub fn is_blank(&self) -> bool {
        self.text.trim().is_empty() && !self.has_icon()
    }
}

/// A niche chosen on a specific record, with its per-record price
///
/// `niche` must name the `text` of a currently available [`NicheOption`];
/// entries that don't are orphans and get pruned when the option set changes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SelectedNiche {
    pub niche: String,
    #[serde(default)]
    pub price: String,
}

impl SelectedNiche {
    pub fn new(niche: impl Into<String>, price: impl Into<String>) -> Self {
        Self {
            niche: niche.into(),
            price: price.into(),
        }
    }

    /// Legacy bare-string entry: no price recorded
    pub fn unpriced(niche: impl Into<String>) -> Self {
        Self::new(niche, "")
    }
}

/// An option and how many records carry it
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NicheCount {
    pub option: NicheOption,
    pub count: usize,
}
