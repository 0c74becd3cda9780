//! Bounded, ordered set of previously observed record ids.

use serde::{Deserialize, Serialize};

/// Ordered record of previously seen ids for one filter,
/// most-recent-first, capped at a retention limit.
///
/// Invariant: no duplicate ids. The cap is enforced by the change
/// detector when it produces an updated set; a `SeenSet` loaded from
/// storage is truncated defensively on construction.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SeenSet {
    ids: Vec<String>,
}

impl SeenSet {
    /// Create an empty seen-set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Build from an id list, dropping duplicates (first wins) and
    /// truncating to `cap`.
    pub fn from_ids(ids: impl IntoIterator<Item = String>, cap: usize) -> Self {
        let mut out: Vec<String> = Vec::new();
        for id in ids {
            if out.len() >= cap {
                break;
            }
            if !out.iter().any(|existing| *existing == id) {
                out.push(id);
            }
        }
        Self { ids: out }
    }

    /// Whether this id has been observed before.
    pub fn contains(&self, id: &str) -> bool {
        self.ids.iter().any(|existing| existing == id)
    }

    /// Ids most-recent-first.
    pub fn ids(&self) -> &[String] {
        &self.ids
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }
}

impl FromIterator<String> for SeenSet {
    fn from_iter<I: IntoIterator<Item = String>>(iter: I) -> Self {
        Self::from_ids(iter, usize::MAX)
    }
}
