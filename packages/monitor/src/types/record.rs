//! Core record and page types.

use serde::{Deserialize, Serialize};

/// One record observed at the monitored source.
///
/// Identity is `id` alone; `timestamp` and `url` are descriptive
/// metadata carried through for notification purposes only.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Record {
    /// Opaque source-assigned identifier, unique within the source
    pub id: String,

    /// Human-readable timestamp, if the source provided one
    pub timestamp: Option<String>,

    /// Link to the record at the source
    pub url: String,
}

impl Record {
    /// Create a record with an id and link.
    pub fn new(id: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            timestamp: None,
            url: url.into(),
        }
    }

    /// Set the timestamp.
    pub fn with_timestamp(mut self, timestamp: impl Into<String>) -> Self {
        self.timestamp = Some(timestamp.into());
        self
    }
}

/// The resource being monitored (e.g. an account address).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Target {
    /// Address or identifier of the external resource
    pub locator: String,
}

impl Target {
    pub fn new(locator: impl Into<String>) -> Self {
        Self {
            locator: locator.into(),
        }
    }
}

/// One page of records returned by a source, with a continuation flag.
///
/// Ephemeral; never persisted beyond the run.
#[derive(Debug, Clone, Default)]
pub struct PageBatch {
    /// Records in source order
    pub records: Vec<Record>,

    /// Whether the source indicates a further page exists
    pub has_more: bool,
}

impl PageBatch {
    /// A final, empty page. Valid output, not an error.
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn new(records: Vec<Record>, has_more: bool) -> Self {
        Self { records, has_more }
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}
