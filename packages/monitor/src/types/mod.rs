//! Data types for the monitoring pipeline.

pub mod config;
pub mod record;
pub mod seen;

pub use config::{MonitorConfig, RecencyPolicy};
pub use record::{PageBatch, Record, Target};
pub use seen::SeenSet;
