//! Run scheduling and supervision.
//!
//! The `Supervisor` is a background service that:
//! - Triggers a run at startup and then on a fixed interval
//! - Serializes runs (a tick arriving mid-run is dropped, not queued)
//! - Contains per-run failures so a bad tick never kills the process
//!
//! # Architecture
//!
//! ```text
//! Supervisor
//!     │
//!     ├─► Traverse (PageSource, per filter)
//!     ├─► Detect (diff against SeenStore partition)
//!     ├─► Persist updated seen-set
//!     └─► Notify (NotificationSink, only when something is new)
//! ```
//!
//! # Example
//!
//! ```ignore
//! let supervisor = Supervisor::new(source, store, sink, config);
//!
//! // Runs until Ctrl+C
//! supervisor.run_until_shutdown().await?;
//! ```

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use tracing::{error, info, warn};

use crate::detector::detect;
use crate::error::RunError;
use crate::notifier::Notifier;
use crate::traits::{NotificationSink, PageSource, SeenStore};
use crate::traversal::{RetryPolicy, Traverser};
use crate::types::{MonitorConfig, SeenSet};

/// Scheduler state. One run at a time; mutual exclusion comes from
/// this state, not a lock primitive, since there is one scheduler
/// instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunState {
    Idle,
    Running,
    Faulted,
}

/// Summary of one run, for logging and tests.
#[derive(Debug, Clone, Default)]
pub struct RunReport {
    /// Filters processed to completion (possibly with partial pages)
    pub filters_ok: Vec<String>,

    /// Filters abandoned on a permanent failure
    pub filters_failed: Vec<String>,

    /// Notifications successfully delivered
    pub notifications_sent: usize,

    /// Non-fatal problems encountered, with filter context
    pub problems: Vec<String>,
}

impl RunReport {
    /// Whether anything in the run degraded.
    pub fn is_partial(&self) -> bool {
        !self.filters_failed.is_empty() || !self.problems.is_empty()
    }

    /// Collapse a degraded report into the run-level error taxonomy.
    ///
    /// Returns `RunError::Partial` carrying every recorded problem,
    /// or `None` for a clean run. Partial errors are surfaced for
    /// logging and callers; they never stop the scheduler.
    pub fn to_run_error(&self) -> Option<RunError> {
        if !self.is_partial() {
            return None;
        }
        Some(RunError::Partial {
            detail: self.problems.join("; "),
        })
    }
}

/// Outcome of asking the supervisor for a run.
#[derive(Debug)]
pub enum RunOutcome {
    /// The run executed; see the report for details
    Completed(RunReport),

    /// A run was already in flight; this trigger was dropped
    Skipped,
}

/// Drives the pipeline: traversal, detection, persistence, and
/// notification for every configured filter, on a fixed schedule.
pub struct Supervisor {
    source: Arc<dyn PageSource>,
    store: Arc<dyn SeenStore>,
    sink: Arc<dyn NotificationSink>,
    config: MonitorConfig,
    state: Mutex<RunState>,
    shutdown: Arc<AtomicBool>,
}

impl Supervisor {
    pub fn new(
        source: Arc<dyn PageSource>,
        store: Arc<dyn SeenStore>,
        sink: Arc<dyn NotificationSink>,
        config: MonitorConfig,
    ) -> Self {
        Self {
            source,
            store,
            sink,
            config,
            state: Mutex::new(RunState::Idle),
            shutdown: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Get a shutdown handle for graceful shutdown.
    pub fn shutdown_handle(&self) -> Arc<AtomicBool> {
        self.shutdown.clone()
    }

    /// Request shutdown of the scheduler loop.
    pub fn request_shutdown(&self) {
        self.shutdown.store(true, Ordering::SeqCst);
    }

    fn is_shutdown_requested(&self) -> bool {
        self.shutdown.load(Ordering::SeqCst)
    }

    /// Current scheduler state.
    pub fn state(&self) -> RunState {
        *self.state.lock().unwrap_or_else(|p| p.into_inner())
    }

    /// Trigger one run now, unless a run is already in flight.
    ///
    /// Errors only on [`RunError::Fatal`]; every other failure is
    /// contained in the report.
    pub async fn run_once(&self) -> Result<RunOutcome, RunError> {
        // A poisoned state lock means a run panicked mid-flight; the
        // in-memory state machine can no longer be trusted.
        {
            let mut state = self.state.lock().map_err(|_| RunError::Fatal {
                detail: "scheduler state lock poisoned".into(),
            })?;
            if *state == RunState::Running {
                warn!("run already in flight, dropping this tick");
                return Ok(RunOutcome::Skipped);
            }
            *state = RunState::Running;
        }

        let report = match tokio::time::timeout(self.config.run_deadline, self.execute_run()).await
        {
            Ok(report) => report,
            Err(_) => {
                let mut report = RunReport::default();
                report
                    .problems
                    .push(format!("run deadline {:?} elapsed", self.config.run_deadline));
                report
            }
        };

        let next_state = if report.is_partial() {
            RunState::Faulted
        } else {
            RunState::Idle
        };
        {
            let mut state = self.state.lock().map_err(|_| RunError::Fatal {
                detail: "scheduler state lock poisoned".into(),
            })?;
            *state = next_state;
        }

        if let Some(partial) = report.to_run_error() {
            warn!(
                filters_failed = report.filters_failed.len(),
                error = %partial,
                "run completed with degraded results"
            );
        } else {
            info!(
                filters = report.filters_ok.len(),
                notifications = report.notifications_sent,
                "run completed"
            );
        }

        Ok(RunOutcome::Completed(report))
    }

    /// Process every configured filter, isolating failures per filter.
    async fn execute_run(&self) -> RunReport {
        let mut report = RunReport::default();
        let retry = RetryPolicy {
            attempts: self.config.retry_attempts,
            backoff: self.config.retry_backoff,
        };
        let traverser = Traverser::new(self.source.as_ref(), self.config.max_pages, retry);
        let notifier = Notifier::new(self.sink.as_ref(), self.config.destination.clone());

        for (index, filter) in self.config.filters.iter().enumerate() {
            if index > 0 && !self.config.inter_filter_delay.is_zero() {
                tokio::time::sleep(self.config.inter_filter_delay).await;
            }

            // Absent or unreadable state degrades to empty: the run
            // proceeds and re-detects, per the at-least-once guarantee.
            let seen = match self.store.load(filter).await {
                Ok(seen) => seen,
                Err(err) => {
                    warn!(filter = %filter, error = %err, "seen state unavailable, starting empty");
                    report
                        .problems
                        .push(format!("{filter}: seen state unavailable ({err})"));
                    SeenSet::new()
                }
            };

            let outcome = match traverser.traverse(&self.config.target, filter).await {
                Ok(outcome) => outcome,
                Err(err) => {
                    // Permanent failure: abandon this filter only.
                    error!(filter = %filter, error = %err, "traversal aborted for filter");
                    report.filters_failed.push(filter.clone());
                    report.problems.push(format!("{filter}: {err}"));
                    continue;
                }
            };
            if outcome.is_partial() {
                report
                    .problems
                    .push(format!("{filter}: traversal truncated ({:?})", outcome.stop));
            }

            let detection = detect(
                &outcome.records,
                &seen,
                self.config.retention_cap,
                self.config.recency_policy,
            );

            info!(
                filter = %filter,
                pages = outcome.pages_fetched,
                records = outcome.records.len(),
                new = detection.new_records.len(),
                "filter processed"
            );

            // Persist before notifying: a record marked seen without
            // a delivered notification beats notifying it twice.
            if let Err(err) = self.store.save(filter, &detection.updated).await {
                error!(filter = %filter, error = %err, "failed to persist seen state");
                report
                    .problems
                    .push(format!("{filter}: seen state not persisted ({err})"));
            }

            if !detection.new_records.is_empty() {
                match notifier.notify(filter, &detection.new_records).await {
                    Ok(()) => report.notifications_sent += 1,
                    Err(err) => {
                        // Never rolls back the seen-set update.
                        error!(filter = %filter, error = %err, "notification failed");
                        report
                            .problems
                            .push(format!("{filter}: notification failed ({err})"));
                    }
                }
            }

            report.filters_ok.push(filter.clone());
        }

        report
    }

    /// Run at startup and then on the configured interval, until
    /// shutdown is requested.
    ///
    /// Faulted runs are logged and scheduling continues; only a
    /// [`RunError::Fatal`] stops the loop.
    pub async fn run(&self) -> Result<(), RunError> {
        info!(
            target = %self.config.target.locator,
            filters = self.config.filters.len(),
            interval_secs = self.config.poll_interval.as_secs(),
            "monitor starting"
        );

        let mut interval = tokio::time::interval(self.config.poll_interval);
        interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);

        loop {
            // First tick fires immediately: the run-at-startup.
            interval.tick().await;

            if self.is_shutdown_requested() {
                break;
            }

            if let Err(fatal) = self.run_once().await {
                error!(error = %fatal, "fatal failure, stopping scheduler");
                return Err(fatal);
            }
        }

        info!("monitor stopped");
        Ok(())
    }

    /// Run until a shutdown signal is received.
    ///
    /// Convenience method that listens for Ctrl+C.
    pub async fn run_until_shutdown(&self) -> Result<(), RunError> {
        let shutdown = self.shutdown_handle();

        tokio::spawn(async move {
            let _ = tokio::signal::ctrl_c().await;
            info!("received shutdown signal");
            shutdown.store(true, Ordering::SeqCst);
        });

        self.run().await
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;
    use crate::stores::MemoryStore;
    use crate::testing::{MockSink, MockSource};
    use crate::types::{PageBatch, Record, Target};

    fn rec(id: &str) -> Record {
        Record::new(id, format!("https://example.org/tx/{id}"))
    }

    fn config(filters: &[&str]) -> MonitorConfig {
        MonitorConfig::new(Target::new("prog1"), filters.iter().copied())
            .with_retries(1, Duration::from_millis(1))
            .with_inter_filter_delay(Duration::ZERO)
            .with_destination("ops@example.org")
    }

    fn supervisor(
        source: MockSource,
        store: Arc<MemoryStore>,
        sink: Arc<MockSink>,
        config: MonitorConfig,
    ) -> Supervisor {
        Supervisor::new(Arc::new(source), store, sink, config)
    }

    fn report(outcome: RunOutcome) -> RunReport {
        match outcome {
            RunOutcome::Completed(report) => report,
            RunOutcome::Skipped => panic!("expected a completed run"),
        }
    }

    #[tokio::test]
    async fn first_run_notifies_everything() {
        let source =
            MockSource::new().with_page("swap", 1, PageBatch::new(vec![rec("a"), rec("b")], false));
        let sink = Arc::new(MockSink::new());
        let sup = supervisor(source, Arc::new(MemoryStore::new()), sink.clone(), config(&["swap"]));

        let r = report(sup.run_once().await.unwrap());

        assert_eq!(r.notifications_sent, 1);
        assert!(!r.is_partial());
        assert_eq!(sink.sent()[0].records.len(), 2);
        assert_eq!(sup.state(), RunState::Idle);
    }

    #[tokio::test]
    async fn second_run_with_no_changes_stays_quiet() {
        let source =
            MockSource::new().with_page("swap", 1, PageBatch::new(vec![rec("a")], false));
        let sink = Arc::new(MockSink::new());
        let store = Arc::new(MemoryStore::new());
        let sup = supervisor(source, store, sink.clone(), config(&["swap"]));

        report(sup.run_once().await.unwrap());
        let r = report(sup.run_once().await.unwrap());

        assert_eq!(r.notifications_sent, 0);
        assert_eq!(sink.sent().len(), 1);
    }

    #[tokio::test]
    async fn empty_listing_never_touches_the_sink() {
        let source = MockSource::new().with_page("swap", 1, PageBatch::empty());
        let sink = Arc::new(MockSink::new());
        let sup = supervisor(source, Arc::new(MemoryStore::new()), sink.clone(), config(&["swap"]));

        report(sup.run_once().await.unwrap());

        assert!(sink.sent().is_empty());
    }

    #[tokio::test]
    async fn permanent_failure_is_isolated_per_filter() {
        let source = MockSource::new()
            .with_permanent_failure("swap", 1)
            .with_page("addLiquidity", 1, PageBatch::new(vec![rec("x")], false));
        let sink = Arc::new(MockSink::new());
        let sup = supervisor(
            source,
            Arc::new(MemoryStore::new()),
            sink.clone(),
            config(&["swap", "addLiquidity"]),
        );

        let r = report(sup.run_once().await.unwrap());

        assert_eq!(r.filters_failed, ["swap"]);
        assert_eq!(r.filters_ok, ["addLiquidity"]);
        assert_eq!(sink.sent().len(), 1);
        assert!(r.is_partial());
        assert_eq!(sup.state(), RunState::Faulted);
    }

    #[tokio::test]
    async fn degraded_run_surfaces_a_partial_error() {
        let source = MockSource::new()
            .with_permanent_failure("swap", 1)
            .with_page("addLiquidity", 1, PageBatch::new(vec![rec("x")], false));
        let sup = supervisor(
            source,
            Arc::new(MemoryStore::new()),
            Arc::new(MockSink::new()),
            config(&["swap", "addLiquidity"]),
        );

        let r = report(sup.run_once().await.unwrap());

        let err = r.to_run_error().expect("degraded run yields an error");
        assert!(matches!(err, RunError::Partial { .. }));
        assert!(err.to_string().contains("swap"));
    }

    #[tokio::test]
    async fn clean_run_yields_no_run_error() {
        let source =
            MockSource::new().with_page("swap", 1, PageBatch::new(vec![rec("a")], false));
        let sup = supervisor(
            source,
            Arc::new(MemoryStore::new()),
            Arc::new(MockSink::new()),
            config(&["swap"]),
        );

        let r = report(sup.run_once().await.unwrap());
        assert!(r.to_run_error().is_none());
    }

    #[tokio::test]
    async fn faulted_state_does_not_block_the_next_run() {
        let source = MockSource::new()
            .with_permanent_failure("swap", 1)
            .with_page("addLiquidity", 1, PageBatch::new(vec![rec("x")], false));
        let sup = supervisor(
            source,
            Arc::new(MemoryStore::new()),
            Arc::new(MockSink::new()),
            config(&["swap", "addLiquidity"]),
        );

        report(sup.run_once().await.unwrap());
        assert_eq!(sup.state(), RunState::Faulted);

        // Scheduling continues after a faulted run.
        let outcome = sup.run_once().await.unwrap();
        assert!(matches!(outcome, RunOutcome::Completed(_)));
    }

    #[tokio::test]
    async fn unreadable_state_degrades_to_empty() {
        let source =
            MockSource::new().with_page("swap", 1, PageBatch::new(vec![rec("a")], false));
        let store = Arc::new(MemoryStore::new());
        store.fail_reads(true);
        let sink = Arc::new(MockSink::new());
        let sup = supervisor(source, store, sink.clone(), config(&["swap"]));

        let r = report(sup.run_once().await.unwrap());

        // Everything looks new against the empty fallback state.
        assert_eq!(sink.sent().len(), 1);
        assert!(r.is_partial());
    }

    #[tokio::test]
    async fn write_failure_is_partial_but_notification_still_goes_out() {
        let source =
            MockSource::new().with_page("swap", 1, PageBatch::new(vec![rec("a")], false));
        let store = Arc::new(MemoryStore::new());
        store.fail_writes(true);
        let sink = Arc::new(MockSink::new());
        let sup = supervisor(source, store, sink.clone(), config(&["swap"]));

        let r = report(sup.run_once().await.unwrap());

        assert!(r.is_partial());
        assert_eq!(sink.sent().len(), 1);
    }

    #[tokio::test]
    async fn sink_failure_never_rolls_back_the_seen_set() {
        let source =
            MockSource::new().with_page("swap", 1, PageBatch::new(vec![rec("a")], false));
        let store = Arc::new(MemoryStore::new());
        let failing_sink = Arc::new(MockSink::new().failing());
        let sup = supervisor(source, store.clone(), failing_sink, config(&["swap"]));

        let r = report(sup.run_once().await.unwrap());
        assert!(r.is_partial());

        // The record was marked seen despite the failed delivery.
        let seen = store.load("swap").await.unwrap();
        assert!(seen.contains("a"));
    }

    #[tokio::test]
    async fn concurrent_trigger_is_skipped() {
        let source = MockSource::new()
            .with_page("swap", 1, PageBatch::new(vec![rec("a")], false))
            .with_latency(Duration::from_millis(100));
        let sup = Arc::new(supervisor(
            source,
            Arc::new(MemoryStore::new()),
            Arc::new(MockSink::new()),
            config(&["swap"]),
        ));

        let background = {
            let sup = sup.clone();
            tokio::spawn(async move { sup.run_once().await })
        };
        tokio::time::sleep(Duration::from_millis(20)).await;

        let second = sup.run_once().await.unwrap();
        assert!(matches!(second, RunOutcome::Skipped));

        let first = background.await.unwrap().unwrap();
        assert!(matches!(first, RunOutcome::Completed(_)));
    }

    #[tokio::test]
    async fn run_deadline_turns_a_hang_into_a_partial_run() {
        let source = MockSource::new()
            .with_page("swap", 1, PageBatch::new(vec![rec("a")], false))
            .with_latency(Duration::from_secs(5));
        let cfg = config(&["swap"]).with_run_deadline(Duration::from_millis(50));
        let sup = supervisor(source, Arc::new(MemoryStore::new()), Arc::new(MockSink::new()), cfg);

        let r = report(sup.run_once().await.unwrap());

        assert!(r.is_partial());
        assert_eq!(sup.state(), RunState::Faulted);
    }
}
