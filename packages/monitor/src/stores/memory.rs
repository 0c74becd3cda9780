//! In-memory seen-set store for testing and development.

use std::collections::HashMap;
use std::sync::RwLock;

use async_trait::async_trait;

use crate::error::{StoreError, StoreResult};
use crate::traits::SeenStore;
use crate::types::SeenSet;

/// In-memory store keyed by filter name.
///
/// Useful for testing and development. Not suitable for production
/// as state is lost on restart. Reads and writes can be made to fail
/// on demand for error-path tests.
#[derive(Default)]
pub struct MemoryStore {
    partitions: RwLock<HashMap<String, SeenSet>>,
    fail_reads: RwLock<bool>,
    fail_writes: RwLock<bool>,
}

impl MemoryStore {
    /// Create a new empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Make subsequent loads fail.
    pub fn fail_reads(&self, fail: bool) {
        *self.fail_reads.write().unwrap() = fail;
    }

    /// Make subsequent saves fail.
    pub fn fail_writes(&self, fail: bool) {
        *self.fail_writes.write().unwrap() = fail;
    }

    /// Number of partitions with persisted state.
    pub fn partition_count(&self) -> usize {
        self.partitions.read().unwrap().len()
    }
}

#[async_trait]
impl SeenStore for MemoryStore {
    async fn load(&self, filter: &str) -> StoreResult<SeenSet> {
        if *self.fail_reads.read().unwrap() {
            return Err(StoreError::ReadFailure("scripted read failure".into()));
        }
        Ok(self
            .partitions
            .read()
            .unwrap()
            .get(filter)
            .cloned()
            .unwrap_or_default())
    }

    async fn save(&self, filter: &str, seen: &SeenSet) -> StoreResult<()> {
        if *self.fail_writes.read().unwrap() {
            return Err(StoreError::WriteFailure("scripted write failure".into()));
        }
        self.partitions
            .write()
            .unwrap()
            .insert(filter.to_string(), seen.clone());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn missing_partition_loads_empty() {
        let store = MemoryStore::new();
        let seen = store.load("swap").await.unwrap();
        assert!(seen.is_empty());
    }

    #[tokio::test]
    async fn save_then_load_round_trips() {
        let store = MemoryStore::new();
        let seen: SeenSet = ["a".to_string(), "b".to_string()].into_iter().collect();

        store.save("swap", &seen).await.unwrap();
        assert_eq!(store.load("swap").await.unwrap(), seen);
        assert_eq!(store.partition_count(), 1);
    }

    #[tokio::test]
    async fn scripted_failures_surface_as_store_errors() {
        let store = MemoryStore::new();
        store.fail_reads(true);
        assert!(matches!(
            store.load("swap").await,
            Err(StoreError::ReadFailure(_))
        ));

        store.fail_reads(false);
        store.fail_writes(true);
        assert!(matches!(
            store.save("swap", &SeenSet::new()).await,
            Err(StoreError::WriteFailure(_))
        ));
    }
}
