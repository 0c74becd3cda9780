//! Testing utilities including mock implementations.
//!
//! These are useful for testing the pipeline without a live source
//! or delivery channel.

use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex, RwLock};

use async_trait::async_trait;

use crate::error::{SinkError, SinkResult, SourceError, SourceResult};
use crate::traits::{Notification, NotificationSink, PageSource};
use crate::types::{PageBatch, Target};

/// Record of a call made to a [`MockSource`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceCall {
    pub filter: String,
    pub page: u32,
}

/// A scripted page source for tests.
///
/// Pages are keyed by (filter, page index). Unscripted pages resolve
/// to a final empty batch. Transient failures can be injected per
/// page with a countdown, permanent failures unconditionally.
#[derive(Default)]
pub struct MockSource {
    pages: RwLock<HashMap<(String, u32), PageBatch>>,
    transient_failures: Mutex<HashMap<(String, u32), u32>>,
    permanent_failures: RwLock<HashSet<(String, u32)>>,
    latency: Option<std::time::Duration>,
    calls: Mutex<Vec<SourceCall>>,
}

impl MockSource {
    pub fn new() -> Self {
        Self::default()
    }

    /// Script the batch returned for (filter, page).
    pub fn with_page(self, filter: impl Into<String>, page: u32, batch: PageBatch) -> Self {
        self.pages
            .write()
            .unwrap()
            .insert((filter.into(), page), batch);
        self
    }

    /// Inject `count` transient failures for (filter, page) before
    /// the scripted batch is served. Use `u32::MAX` to fail forever.
    pub fn failing_times(self, filter: impl Into<String>, page: u32, count: u32) -> Self {
        self.transient_failures
            .lock()
            .unwrap()
            .insert((filter.into(), page), count);
        self
    }

    /// Make (filter, page) fail permanently.
    pub fn with_permanent_failure(self, filter: impl Into<String>, page: u32) -> Self {
        self.permanent_failures
            .write()
            .unwrap()
            .insert((filter.into(), page));
        self
    }

    /// Delay every fetch, to simulate a slow upstream.
    pub fn with_latency(mut self, latency: std::time::Duration) -> Self {
        self.latency = Some(latency);
        self
    }

    /// All calls made to this mock, in order.
    pub fn calls(&self) -> Vec<SourceCall> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl PageSource for MockSource {
    async fn fetch_page(
        &self,
        _target: &Target,
        filter: &str,
        page: u32,
    ) -> SourceResult<PageBatch> {
        self.calls.lock().unwrap().push(SourceCall {
            filter: filter.to_string(),
            page,
        });

        if let Some(latency) = self.latency {
            tokio::time::sleep(latency).await;
        }

        let key = (filter.to_string(), page);

        if self.permanent_failures.read().unwrap().contains(&key) {
            return Err(SourceError::InvalidTarget {
                target: "scripted permanent failure".into(),
            });
        }

        {
            let mut failures = self.transient_failures.lock().unwrap();
            if let Some(remaining) = failures.get_mut(&key) {
                if *remaining > 0 {
                    if *remaining != u32::MAX {
                        *remaining -= 1;
                    }
                    return Err(SourceError::Timeout {
                        filter: filter.to_string(),
                        page,
                    });
                }
            }
        }

        Ok(self
            .pages
            .read()
            .unwrap()
            .get(&key)
            .cloned()
            .unwrap_or_else(PageBatch::empty))
    }
}

/// A notification sink that records what it was asked to deliver.
#[derive(Default)]
pub struct MockSink {
    sent: Arc<Mutex<Vec<Notification>>>,
    fail: bool,
}

impl MockSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every delivery fail.
    pub fn failing(mut self) -> Self {
        self.fail = true;
        self
    }

    /// Notifications delivered so far, in order.
    pub fn sent(&self) -> Vec<Notification> {
        self.sent.lock().unwrap().clone()
    }
}

#[async_trait]
impl NotificationSink for MockSink {
    async fn send(&self, notification: &Notification) -> SinkResult<()> {
        if self.fail {
            return Err(SinkError::Rejected {
                reason: "scripted failure".into(),
            });
        }
        self.sent.lock().unwrap().push(notification.clone());
        Ok(())
    }
}
