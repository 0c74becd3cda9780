//! Configuration for the monitoring pipeline.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use super::record::Target;

/// Policy for re-observed ids when the seen-set is updated.
///
/// Source variants disagreed on this; it is configurable rather than
/// load-bearing.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RecencyPolicy {
    /// An id already in the seen-set keeps its original position.
    #[default]
    KeepOriginal,

    /// A re-observed id moves to the front of the seen-set.
    Refresh,
}

/// Configuration for the monitor pipeline.
#[derive(Debug, Clone)]
pub struct MonitorConfig {
    /// The resource being monitored
    pub target: Target,

    /// Named sub-streams tracked independently, each with its own
    /// seen-set partition
    pub filters: Vec<String>,

    /// How often a run is triggered
    pub poll_interval: Duration,

    /// Upper bound on pages walked per filter per run
    pub max_pages: u32,

    /// Retries per page on transient source failures
    pub retry_attempts: u32,

    /// Base delay for exponential backoff between page retries
    pub retry_backoff: Duration,

    /// Maximum ids retained per filter partition
    pub retention_cap: usize,

    /// Pause between filters within a run, to respect upstream
    /// rate limits
    pub inter_filter_delay: Duration,

    /// Overall deadline for one run
    pub run_deadline: Duration,

    /// Where notifications are delivered
    pub destination: String,

    /// How re-observed ids are ordered in the updated seen-set
    pub recency_policy: RecencyPolicy,
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            target: Target::new(""),
            filters: vec![],
            poll_interval: Duration::from_secs(300),
            max_pages: 5,
            retry_attempts: 2,
            retry_backoff: Duration::from_secs(1),
            retention_cap: 50,
            inter_filter_delay: Duration::from_secs(3),
            run_deadline: Duration::from_secs(120),
            destination: String::new(),
            recency_policy: RecencyPolicy::KeepOriginal,
        }
    }
}

impl MonitorConfig {
    /// Create a config for a target with one or more filters.
    pub fn new(target: Target, filters: impl IntoIterator<Item = impl Into<String>>) -> Self {
        Self {
            target,
            filters: filters.into_iter().map(|f| f.into()).collect(),
            ..Default::default()
        }
    }

    /// Set the poll interval.
    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }

    /// Set the page bound per traversal.
    pub fn with_max_pages(mut self, max_pages: u32) -> Self {
        self.max_pages = max_pages;
        self
    }

    /// Set the per-page retry policy.
    pub fn with_retries(mut self, attempts: u32, backoff: Duration) -> Self {
        self.retry_attempts = attempts;
        self.retry_backoff = backoff;
        self
    }

    /// Set the seen-set retention cap.
    pub fn with_retention_cap(mut self, cap: usize) -> Self {
        self.retention_cap = cap;
        self
    }

    /// Set the pause between filters within a run.
    pub fn with_inter_filter_delay(mut self, delay: Duration) -> Self {
        self.inter_filter_delay = delay;
        self
    }

    /// Set the overall run deadline.
    pub fn with_run_deadline(mut self, deadline: Duration) -> Self {
        self.run_deadline = deadline;
        self
    }

    /// Set the notification destination.
    pub fn with_destination(mut self, destination: impl Into<String>) -> Self {
        self.destination = destination.into();
        self
    }

    /// Set the recency policy for re-observed ids.
    pub fn with_recency_policy(mut self, policy: RecencyPolicy) -> Self {
        self.recency_policy = policy;
        self
    }
}
