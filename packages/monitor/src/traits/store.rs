//! Seen-set store trait: the persistence boundary.

use async_trait::async_trait;

use crate::error::StoreResult;
use crate::types::SeenSet;

/// Persists the per-filter seen-sets across process restarts.
///
/// The store is the sole authority over persisted identity history.
/// Concurrent processes must not share the same store.
#[async_trait]
pub trait SeenStore: Send + Sync {
    /// Load the seen-set partition for a filter.
    ///
    /// A filter with no persisted state yields an empty set. A
    /// `ReadFailure` is for genuinely failed reads; callers degrade
    /// it to empty state with a warning rather than failing the run.
    async fn load(&self, filter: &str) -> StoreResult<SeenSet>;

    /// Persist the seen-set partition for a filter.
    async fn save(&self, filter: &str, seen: &SeenSet) -> StoreResult<()>;
}
