//! Typed errors for the monitoring pipeline.
//!
//! Uses `thiserror` for library errors (not `anyhow`) to provide
//! strongly-typed, composable error handling.

use thiserror::Error;

/// Errors raised by a page source while fetching one page.
///
/// Transient errors are retried by the traversal engine; permanent
/// errors abort traversal for the affected filter only.
#[derive(Debug, Error)]
pub enum SourceError {
    /// Request or content wait exceeded its bounded deadline
    #[error("timeout fetching page {page} for filter {filter}")]
    Timeout { filter: String, page: u32 },

    /// HTTP transport failed (connection reset, DNS, 5xx, ...)
    #[error("HTTP error: {0}")]
    Http(#[source] Box<dyn std::error::Error + Send + Sync>),

    /// Upstream returned a payload we could not interpret
    #[error("unexpected payload from source: {reason}")]
    UnexpectedPayload { reason: String },

    /// Target locator is malformed or rejected by the source
    #[error("invalid target: {target}")]
    InvalidTarget { target: String },

    /// Upstream rejected the request outright (4xx other than 429)
    #[error("source rejected request with status {status}")]
    Rejected { status: u16 },
}

impl SourceError {
    /// Whether the traversal engine should retry this page.
    ///
    /// Timeouts, transport failures, and garbled payloads are
    /// transient; malformed targets and outright rejections are not.
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            SourceError::Timeout { .. }
                | SourceError::Http(_)
                | SourceError::UnexpectedPayload { .. }
        )
    }
}

/// Errors raised by the seen-set store.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Persisted state could not be read
    #[error("failed to read seen state: {0}")]
    ReadFailure(#[source] Box<dyn std::error::Error + Send + Sync>),

    /// Persisted state could not be written
    #[error("failed to write seen state: {0}")]
    WriteFailure(#[source] Box<dyn std::error::Error + Send + Sync>),
}

/// Errors raised by a notification sink.
#[derive(Debug, Error)]
pub enum SinkError {
    /// Delivery to the external channel failed
    #[error("notification delivery failed: {0}")]
    Delivery(#[source] Box<dyn std::error::Error + Send + Sync>),

    /// Sink rejected the notification (bad destination, payload too large)
    #[error("notification rejected: {reason}")]
    Rejected { reason: String },
}

/// Outcome-level errors for a single run.
#[derive(Debug, Error)]
pub enum RunError {
    /// Some filters failed or some state could not be persisted;
    /// the run still produced usable results for the others.
    #[error("run completed partially: {detail}")]
    Partial { detail: String },

    /// Internal state is corrupt; the process should stop scheduling.
    #[error("fatal run failure: {detail}")]
    Fatal { detail: String },
}

/// Result type alias for source operations.
pub type SourceResult<T> = std::result::Result<T, SourceError>;

/// Result type alias for store operations.
pub type StoreResult<T> = std::result::Result<T, StoreError>;

/// Result type alias for sink operations.
pub type SinkResult<T> = std::result::Result<T, SinkError>;
