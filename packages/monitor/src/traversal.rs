//! Bounded pagination traversal with per-page retry.
//!
//! The traversal engine is the single dedup authority for a run:
//! records are accumulated by id, first occurrence wins, and a record
//! appearing on two pages is redundant rather than an error.

use std::time::Duration;

use indexmap::IndexMap;
use tracing::{debug, warn};

use crate::error::{SourceError, SourceResult};
use crate::traits::PageSource;
use crate::types::{PageBatch, Record, Target};

/// Retry policy for transient page failures.
#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
    /// Retries per page after the first attempt
    pub attempts: u32,

    /// Base delay, doubled per retry
    pub backoff: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            attempts: 2,
            backoff: Duration::from_secs(1),
        }
    }
}

/// Why a traversal stopped before exhausting the listing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StopCause {
    /// Source reported no further page
    Exhausted,

    /// Page bound reached while the source still had more
    PageBound,

    /// Transient failures exhausted retries on this page; records
    /// accumulated so far are still used
    RetriesExhausted { page: u32 },
}

/// Result of walking one (target, filter) listing.
#[derive(Debug, Clone)]
pub struct TraversalOutcome {
    /// Deduplicated records in first-occurrence order
    pub records: Vec<Record>,

    /// Pages successfully fetched
    pub pages_fetched: u32,

    /// Why the walk ended
    pub stop: StopCause,
}

impl TraversalOutcome {
    /// Whether the listing was only partially covered.
    pub fn is_partial(&self) -> bool {
        matches!(self.stop, StopCause::RetriesExhausted { .. })
    }
}

/// Drives a [`PageSource`] across a bounded number of pages.
pub struct Traverser<'a, S: PageSource + ?Sized> {
    source: &'a S,
    max_pages: u32,
    retry: RetryPolicy,
}

impl<'a, S: PageSource + ?Sized> Traverser<'a, S> {
    pub fn new(source: &'a S, max_pages: u32, retry: RetryPolicy) -> Self {
        Self {
            source,
            max_pages,
            retry,
        }
    }

    /// Walk pages 1..=max_pages, accumulating deduplicated records.
    ///
    /// Stops when the source reports no continuation, when the page
    /// bound is hit, or when a page yields zero records and no
    /// continuation signal. Transient failures are retried per page
    /// with exponential backoff; once retries are exhausted the
    /// partial accumulation is returned. Permanent failures propagate
    /// so the caller can isolate the affected filter.
    pub async fn traverse(&self, target: &Target, filter: &str) -> SourceResult<TraversalOutcome> {
        let mut accumulated: IndexMap<String, Record> = IndexMap::new();
        let mut pages_fetched = 0u32;

        for page in 1..=self.max_pages {
            let batch = match self.fetch_with_retry(target, filter, page).await {
                Ok(batch) => batch,
                Err(err) if err.is_transient() => {
                    warn!(
                        filter = %filter,
                        page = page,
                        error = %err,
                        "giving up on page after retries, keeping partial results"
                    );
                    return Ok(TraversalOutcome {
                        records: accumulated.into_values().collect(),
                        pages_fetched,
                        stop: StopCause::RetriesExhausted { page },
                    });
                }
                Err(err) => return Err(err),
            };

            pages_fetched += 1;
            let batch_len = batch.records.len();
            for record in batch.records {
                // First occurrence wins; duplicates across pages are
                // dropped silently.
                accumulated.entry(record.id.clone()).or_insert(record);
            }

            debug!(
                filter = %filter,
                page = page,
                records = batch_len,
                total = accumulated.len(),
                has_more = batch.has_more,
                "fetched page"
            );

            if !batch.has_more {
                return Ok(TraversalOutcome {
                    records: accumulated.into_values().collect(),
                    pages_fetched,
                    stop: StopCause::Exhausted,
                });
            }
            // An empty page with a continuation signal is a valid
            // window mid-listing; keep walking. max_pages bounds any
            // run of empty pages.
        }

        Ok(TraversalOutcome {
            records: accumulated.into_values().collect(),
            pages_fetched,
            stop: StopCause::PageBound,
        })
    }

    async fn fetch_with_retry(
        &self,
        target: &Target,
        filter: &str,
        page: u32,
    ) -> SourceResult<PageBatch> {
        let mut delay = self.retry.backoff;
        let mut last_err: Option<SourceError> = None;

        for attempt in 0..=self.retry.attempts {
            match self.source.fetch_page(target, filter, page).await {
                Ok(batch) => return Ok(batch),
                Err(err) if err.is_transient() && attempt < self.retry.attempts => {
                    warn!(
                        filter = %filter,
                        page = page,
                        attempt = attempt + 1,
                        error = %err,
                        "transient page failure, retrying"
                    );
                    tokio::time::sleep(delay).await;
                    delay *= 2;
                    last_err = Some(err);
                }
                Err(err) => return Err(err),
            }
        }

        // Unreachable: the loop always returns. Kept for the compiler.
        Err(last_err.unwrap_or(SourceError::Timeout {
            filter: filter.to_string(),
            page,
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::MockSource;
    use crate::types::PageBatch;

    fn rec(id: &str) -> Record {
        Record::new(id, format!("https://example.org/tx/{id}"))
    }

    fn fast_retry() -> RetryPolicy {
        RetryPolicy {
            attempts: 2,
            backoff: Duration::from_millis(1),
        }
    }

    #[tokio::test]
    async fn walks_until_source_is_exhausted() {
        let source = MockSource::new()
            .with_page("swap", 1, PageBatch::new(vec![rec("a"), rec("b")], true))
            .with_page("swap", 2, PageBatch::new(vec![rec("c")], false));

        let traverser = Traverser::new(&source, 5, fast_retry());
        let outcome = traverser
            .traverse(&Target::new("prog1"), "swap")
            .await
            .unwrap();

        let ids: Vec<&str> = outcome.records.iter().map(|r| r.id.as_str()).collect();
        assert_eq!(ids, ["a", "b", "c"]);
        assert_eq!(outcome.pages_fetched, 2);
        assert_eq!(outcome.stop, StopCause::Exhausted);
    }

    #[tokio::test]
    async fn dedups_records_across_pages() {
        let source = MockSource::new()
            .with_page("swap", 1, PageBatch::new(vec![rec("a"), rec("b")], true))
            .with_page("swap", 2, PageBatch::new(vec![rec("b"), rec("c")], false));

        let traverser = Traverser::new(&source, 5, fast_retry());
        let outcome = traverser
            .traverse(&Target::new("prog1"), "swap")
            .await
            .unwrap();

        let ids: Vec<&str> = outcome.records.iter().map(|r| r.id.as_str()).collect();
        assert_eq!(ids, ["a", "b", "c"]);
    }

    #[tokio::test]
    async fn stops_at_page_bound() {
        let source = MockSource::new()
            .with_page("swap", 1, PageBatch::new(vec![rec("a")], true))
            .with_page("swap", 2, PageBatch::new(vec![rec("b")], true))
            .with_page("swap", 3, PageBatch::new(vec![rec("c")], true));

        let traverser = Traverser::new(&source, 2, fast_retry());
        let outcome = traverser
            .traverse(&Target::new("prog1"), "swap")
            .await
            .unwrap();

        assert_eq!(outcome.records.len(), 2);
        assert_eq!(outcome.stop, StopCause::PageBound);
    }

    #[tokio::test]
    async fn empty_page_with_continuation_keeps_walking() {
        // An empty window mid-listing must not swallow later pages.
        let source = MockSource::new()
            .with_page("swap", 1, PageBatch::new(vec![], true))
            .with_page("swap", 2, PageBatch::new(vec![rec("a")], true))
            .with_page("swap", 3, PageBatch::new(vec![rec("b")], false));

        let traverser = Traverser::new(&source, 5, fast_retry());
        let outcome = traverser
            .traverse(&Target::new("prog1"), "swap")
            .await
            .unwrap();

        let ids: Vec<&str> = outcome.records.iter().map(|r| r.id.as_str()).collect();
        assert_eq!(ids, ["a", "b"]);
        assert_eq!(outcome.pages_fetched, 3);
        assert_eq!(outcome.stop, StopCause::Exhausted);
    }

    #[tokio::test]
    async fn run_of_empty_pages_is_bounded_by_max_pages() {
        let source = MockSource::new()
            .with_page("swap", 1, PageBatch::new(vec![], true))
            .with_page("swap", 2, PageBatch::new(vec![], true))
            .with_page("swap", 3, PageBatch::new(vec![], true));

        let traverser = Traverser::new(&source, 3, fast_retry());
        let outcome = traverser
            .traverse(&Target::new("prog1"), "swap")
            .await
            .unwrap();

        assert!(outcome.records.is_empty());
        assert_eq!(outcome.pages_fetched, 3);
        assert_eq!(outcome.stop, StopCause::PageBound);
    }

    #[tokio::test]
    async fn empty_first_page_ends_traversal() {
        let source = MockSource::new().with_page("swap", 1, PageBatch::empty());

        let traverser = Traverser::new(&source, 5, fast_retry());
        let outcome = traverser
            .traverse(&Target::new("prog1"), "swap")
            .await
            .unwrap();

        assert!(outcome.records.is_empty());
        assert_eq!(outcome.pages_fetched, 1);
        assert_eq!(outcome.stop, StopCause::Exhausted);
    }

    #[tokio::test]
    async fn retries_transient_failure_then_succeeds() {
        let source = MockSource::new()
            .with_page("swap", 1, PageBatch::new(vec![rec("a")], false))
            .failing_times("swap", 1, 2);

        let traverser = Traverser::new(&source, 5, fast_retry());
        let outcome = traverser
            .traverse(&Target::new("prog1"), "swap")
            .await
            .unwrap();

        assert_eq!(outcome.records.len(), 1);
        // two failures + one success
        assert_eq!(source.calls().len(), 3);
    }

    #[tokio::test]
    async fn keeps_partial_results_when_retries_run_out() {
        let source = MockSource::new()
            .with_page("swap", 1, PageBatch::new(vec![rec("a"), rec("b")], true))
            .with_page("swap", 2, PageBatch::new(vec![rec("c")], true))
            .failing_times("swap", 3, u32::MAX);

        let traverser = Traverser::new(&source, 5, fast_retry());
        let outcome = traverser
            .traverse(&Target::new("prog1"), "swap")
            .await
            .unwrap();

        let ids: Vec<&str> = outcome.records.iter().map(|r| r.id.as_str()).collect();
        assert_eq!(ids, ["a", "b", "c"]);
        assert!(outcome.is_partial());
        assert_eq!(outcome.stop, StopCause::RetriesExhausted { page: 3 });
    }

    #[tokio::test]
    async fn permanent_failure_propagates() {
        let source = MockSource::new().with_permanent_failure("swap", 1);

        let traverser = Traverser::new(&source, 5, fast_retry());
        let result = traverser.traverse(&Target::new("prog1"), "swap").await;

        assert!(matches!(result, Err(SourceError::InvalidTarget { .. })));
        // no retries for permanent failures
        assert_eq!(source.calls().len(), 1);
    }
}
