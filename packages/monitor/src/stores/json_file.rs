//! File-backed seen-set store.
//!
//! All partitions live in a single JSON document mapping filter name
//! to its id list. The document is rewritten atomically (temp file
//! plus rename) so a crash mid-write never leaves a torn state file.
//! One store instance per process; concurrent processes must not
//! share the same file.

use std::collections::BTreeMap;
use std::path::PathBuf;

use async_trait::async_trait;
use tokio::sync::Mutex;
use tracing::warn;

use crate::error::{StoreError, StoreResult};
use crate::traits::SeenStore;
use crate::types::SeenSet;

type StateDocument = BTreeMap<String, SeenSet>;

/// Seen-set store persisted as one JSON file.
pub struct JsonFileStore {
    path: PathBuf,
    // Serializes read-modify-write cycles across partitions.
    write_lock: Mutex<()>,
}

impl JsonFileStore {
    /// Create a store backed by `path`. The file is created on the
    /// first save; a missing file reads as empty state.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            write_lock: Mutex::new(()),
        }
    }

    /// Path of the backing file.
    pub fn path(&self) -> &std::path::Path {
        &self.path
    }

    async fn read_document(&self) -> StoreResult<StateDocument> {
        let raw = match tokio::fs::read(&self.path).await {
            Ok(raw) => raw,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
                return Ok(StateDocument::new());
            }
            Err(err) => return Err(StoreError::ReadFailure(Box::new(err))),
        };

        match serde_json::from_slice(&raw) {
            Ok(document) => Ok(document),
            Err(err) => {
                // Unparsable state is treated as empty, not fatal;
                // the next save rewrites the file.
                warn!(
                    path = %self.path.display(),
                    error = %err,
                    "seen state file is unparsable, starting from empty state"
                );
                Ok(StateDocument::new())
            }
        }
    }

    async fn write_document(&self, document: &StateDocument) -> StoreResult<()> {
        let raw = serde_json::to_vec_pretty(document)
            .map_err(|err| StoreError::WriteFailure(Box::new(err)))?;

        let tmp = self.path.with_extension("tmp");
        tokio::fs::write(&tmp, &raw)
            .await
            .map_err(|err| StoreError::WriteFailure(Box::new(err)))?;
        tokio::fs::rename(&tmp, &self.path)
            .await
            .map_err(|err| StoreError::WriteFailure(Box::new(err)))?;
        Ok(())
    }
}

#[async_trait]
impl SeenStore for JsonFileStore {
    async fn load(&self, filter: &str) -> StoreResult<SeenSet> {
        let document = self.read_document().await?;
        Ok(document.get(filter).cloned().unwrap_or_default())
    }

    async fn save(&self, filter: &str, seen: &SeenSet) -> StoreResult<()> {
        let _guard = self.write_lock.lock().await;
        let mut document = self.read_document().await?;
        document.insert(filter.to_string(), seen.clone());
        self.write_document(&document).await
    }
}
