//! Rate-limited page source wrapper.
//!
//! Wraps any PageSource implementation with rate limiting using the
//! governor crate, so bursty traversals stay inside upstream limits.

use std::num::NonZeroU32;
use std::sync::Arc;

use async_trait::async_trait;
use governor::{Quota, RateLimiter};

use crate::error::SourceResult;
use crate::traits::PageSource;
use crate::types::{PageBatch, Target};

type DefaultRateLimiter = RateLimiter<
    governor::state::NotKeyed,
    governor::state::InMemoryState,
    governor::clock::DefaultClock,
>;

/// A page source wrapper that enforces rate limits.
pub struct RateLimitedSource<S: PageSource> {
    inner: S,
    limiter: Arc<DefaultRateLimiter>,
}

impl<S: PageSource> RateLimitedSource<S> {
    /// Create a new rate-limited source.
    ///
    /// # Arguments
    /// * `source` - The underlying source to wrap
    /// * `requests_per_second` - Maximum requests per second
    pub fn new(source: S, requests_per_second: u32) -> Self {
        let quota = Quota::per_second(
            NonZeroU32::new(requests_per_second).expect("requests_per_second must be > 0"),
        );
        Self {
            inner: source,
            limiter: Arc::new(RateLimiter::direct(quota)),
        }
    }

    /// Create with a custom quota.
    pub fn with_quota(source: S, quota: Quota) -> Self {
        Self {
            inner: source,
            limiter: Arc::new(RateLimiter::direct(quota)),
        }
    }
}

#[async_trait]
impl<S: PageSource> PageSource for RateLimitedSource<S> {
    async fn fetch_page(
        &self,
        target: &Target,
        filter: &str,
        page: u32,
    ) -> SourceResult<PageBatch> {
        // Wait for a permit before each page fetch.
        self.limiter.until_ready().await;
        self.inner.fetch_page(target, filter, page).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::MockSource;
    use crate::types::Record;

    #[tokio::test]
    async fn delegates_to_the_inner_source() {
        let inner = MockSource::new().with_page(
            "swap",
            1,
            PageBatch::new(vec![Record::new("tx1", "https://example.org/tx/tx1")], false),
        );
        let limited = RateLimitedSource::new(inner, 100);

        let batch = limited
            .fetch_page(&Target::new("prog1"), "swap", 1)
            .await
            .unwrap();

        assert_eq!(batch.records.len(), 1);
    }
}
