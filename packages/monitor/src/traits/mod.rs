//! Core trait abstractions at the pipeline's seams.

pub mod sink;
pub mod source;
pub mod store;

pub use sink::{Notification, NotificationSink};
pub use source::PageSource;
pub use store::SeenStore;
