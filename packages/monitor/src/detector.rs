//! Change detection: diff the current run against the seen-set.
//!
//! Pure functions, no I/O.

use crate::types::{Record, RecencyPolicy, SeenSet};

/// Result of diffing one traversal against a seen-set partition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Detection {
    /// Records not present in the seen-set, in traversal order
    pub new_records: Vec<Record>,

    /// The seen-set with the current run folded in, capped
    pub updated: SeenSet,
}

/// Diff `current` against `seen`.
///
/// A record is new iff its id is absent from `seen`. The updated set
/// places the current run's ids most-recent-first ahead of the
/// existing ids, drops duplicates, and truncates to `cap`. Under
/// `RecencyPolicy::KeepOriginal` a re-observed id keeps its prior
/// position; under `Refresh` it moves to the front with the rest of
/// the current run.
pub fn detect(
    current: &[Record],
    seen: &SeenSet,
    cap: usize,
    policy: RecencyPolicy,
) -> Detection {
    let new_records: Vec<Record> = current
        .iter()
        .filter(|r| !seen.contains(&r.id))
        .cloned()
        .collect();

    let current_ids = current.iter().map(|r| r.id.clone());
    let updated = match policy {
        RecencyPolicy::KeepOriginal => {
            // Only genuinely new ids go to the front; known ids keep
            // their existing recency.
            let fresh = current_ids.filter(|id| !seen.contains(id));
            SeenSet::from_ids(fresh.chain(seen.ids().iter().cloned()), cap)
        }
        RecencyPolicy::Refresh => {
            // The whole current run goes to the front; from_ids drops
            // the stale copies further down.
            SeenSet::from_ids(current_ids.chain(seen.ids().iter().cloned()), cap)
        }
    };

    Detection {
        new_records,
        updated,
    }
}
