//! Incremental Change Detection over Paginated Sources
//!
//! Periodically polls an external paginated listing for records
//! matching a set of filters, diffs them against persisted per-filter
//! history, and dispatches a summary of whatever is new.
//!
//! # Design
//!
//! - At-least-once detection: a record is never silently lost, but a
//!   failed run may re-detect it next time.
//! - "Never notify twice" beats "never miss a notification": the
//!   seen-set is persisted before delivery is attempted.
//! - Failures are contained per run and per filter; one bad filter or
//!   one bad tick never kills the scheduler.
//!
//! # Usage
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use monitor::{
//!     HttpSource, JsonFileStore, MonitorConfig, Supervisor, Target, WebhookSink,
//! };
//!
//! let config = MonitorConfig::new(Target::new("9xQeWvG8..."), ["addLiquidity", "swap"])
//!     .with_destination("https://hooks.example.org/alerts");
//!
//! let supervisor = Supervisor::new(
//!     Arc::new(HttpSource::new()?),
//!     Arc::new(JsonFileStore::new("seen-state.json")),
//!     Arc::new(WebhookSink::new()?),
//!     config,
//! );
//! supervisor.run_until_shutdown().await?;
//! ```
//!
//! # Modules
//!
//! - [`traits`] - Core trait abstractions (PageSource, SeenStore, NotificationSink)
//! - [`types`] - Records, seen-sets, configuration
//! - [`traversal`] - Bounded pagination with per-page retry
//! - [`detector`] - Pure diff of a run against the seen-set
//! - [`notifier`] - Summary formatting and dispatch
//! - [`scheduler`] - Interval scheduling with per-run containment
//! - [`sources`] / [`stores`] / [`sinks`] - Concrete implementations
//! - [`testing`] - Mock implementations for testing

pub mod detector;
pub mod error;
pub mod notifier;
pub mod scheduler;
pub mod sinks;
pub mod sources;
pub mod stores;
pub mod testing;
pub mod traits;
pub mod traversal;
pub mod types;

// Re-export core types at crate root
pub use error::{RunError, SinkError, SourceError, StoreError};
pub use traits::{Notification, NotificationSink, PageSource, SeenStore};
pub use types::{MonitorConfig, PageBatch, RecencyPolicy, Record, SeenSet, Target};

// Re-export pipeline components
pub use detector::{detect, Detection};
pub use notifier::{build_notification, Notifier};
pub use scheduler::{RunOutcome, RunReport, RunState, Supervisor};
pub use traversal::{RetryPolicy, StopCause, TraversalOutcome, Traverser};

// Re-export concrete implementations
pub use sinks::WebhookSink;
pub use sources::{HttpSource, RateLimitedSource};
pub use stores::{JsonFileStore, MemoryStore};

// Re-export testing utilities
pub use testing::{MockSink, MockSource};
