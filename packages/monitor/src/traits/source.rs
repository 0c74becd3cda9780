//! Page source trait: the extraction boundary.
//!
//! The underlying transport (a direct API call, a headless browser
//! session) is an implementation detail behind this trait and can be
//! swapped without touching traversal, detection, or notification.

use async_trait::async_trait;

use crate::error::SourceResult;
use crate::types::{PageBatch, Target};

/// A paginated source of records for a (target, filter) stream.
///
/// Implementations fetch exactly one page per call and never retry
/// internally; retry policy belongs to the traversal engine. A page
/// with zero records is a valid result, not an error, and any wait
/// for content must be bounded.
#[async_trait]
pub trait PageSource: Send + Sync {
    /// Fetch one page of records. Pages are numbered from 1.
    async fn fetch_page(
        &self,
        target: &Target,
        filter: &str,
        page: u32,
    ) -> SourceResult<PageBatch>;
}
