//! The user-facing category label list.
//!
//! Labels are a convenience list for pickers, not an enum: events may be
//! recorded under any category, and removing a label leaves historical
//! breakdowns untouched.

use serde::{Deserialize, Serialize};

use crate::bucket::UNCATEGORIZED;

/// Labels a fresh document starts with.
pub const DEFAULT_LABELS: [&str; 4] = ["study", "programming", "reading", "work"];

/// Trims and lowercases a category. Blank input maps to [`UNCATEGORIZED`].
pub fn normalize_category(raw: &str) -> String {
    let normalized = raw.trim().to_lowercase();
    if normalized.is_empty() {
        UNCATEGORIZED.to_string()
    } else {
        normalized
    }
}

/// Result of a label mutation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LabelChange {
    Added,
    AlreadyPresent,
    Removed,
    NotFound,
    /// Removal refused because the set would become empty.
    LastLabel,
    /// The name was blank after trimming.
    Blank,
}

impl LabelChange {
    #[must_use]
    pub const fn changed(self) -> bool {
        matches!(self, Self::Added | Self::Removed)
    }
}

/// Ordered, case-normalized, never-empty set of labels.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "Vec<String>", into = "Vec<String>")]
pub struct LabelSet(Vec<String>);

impl Default for LabelSet {
    fn default() -> Self {
        Self(DEFAULT_LABELS.iter().map(ToString::to_string).collect())
    }
}

impl From<Vec<String>> for LabelSet {
    /// Normalizes and deduplicates, keeping first occurrences in order. An
    /// empty result falls back to the defaults.
    fn from(raw: Vec<String>) -> Self {
        let mut labels: Vec<String> = Vec::with_capacity(raw.len());
        for label in raw {
            let label = label.trim().to_lowercase();
            if !label.is_empty() && !labels.contains(&label) {
                labels.push(label);
            }
        }
        if labels.is_empty() {
            return Self::default();
        }
        Self(labels)
    }
}

impl From<LabelSet> for Vec<String> {
    fn from(set: LabelSet) -> Self {
        set.0
    }
}

impl LabelSet {
    #[must_use]
    pub fn as_slice(&self) -> &[String] {
        &self.0
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        let name = name.trim().to_lowercase();
        self.0.contains(&name)
    }

    pub fn add(&mut self, name: &str) -> LabelChange {
        let name = name.trim().to_lowercase();
        if name.is_empty() {
            return LabelChange::Blank;
        }
        if self.0.contains(&name) {
            return LabelChange::AlreadyPresent;
        }
        self.0.push(name);
        LabelChange::Added
    }

    pub fn remove(&mut self, name: &str) -> LabelChange {
        let name = name.trim().to_lowercase();
        let Some(index) = self.0.iter().position(|label| *label == name) else {
            return LabelChange::NotFound;
        };
        if self.0.len() == 1 {
            return LabelChange::LastLabel;
        }
        self.0.remove(index);
        LabelChange::Removed
    }
}
