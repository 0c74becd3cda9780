//! Notification formatting and dispatch.

use tracing::info;

use crate::error::SinkResult;
use crate::traits::{Notification, NotificationSink};
use crate::types::Record;

/// Builds human-readable summaries of new records and hands them to
/// a [`NotificationSink`].
pub struct Notifier<'a, K: NotificationSink + ?Sized> {
    sink: &'a K,
    destination: String,
}

impl<'a, K: NotificationSink + ?Sized> Notifier<'a, K> {
    pub fn new(sink: &'a K, destination: impl Into<String>) -> Self {
        Self {
            sink,
            destination: destination.into(),
        }
    }

    /// Format and deliver a summary of `new_records` for `filter`.
    ///
    /// Callers must not invoke this with an empty record list; the
    /// run loop only notifies when there is something new.
    pub async fn notify(&self, filter: &str, new_records: &[Record]) -> SinkResult<()> {
        let notification = build_notification(&self.destination, filter, new_records);

        info!(
            filter = %filter,
            count = new_records.len(),
            destination = %self.destination,
            "dispatching notification"
        );

        self.sink.send(&notification).await
    }
}

/// Assemble the subject and one-line-per-record body.
pub fn build_notification(
    destination: &str,
    filter: &str,
    new_records: &[Record],
) -> Notification {
    let subject = format!(
        "[{filter}] {} new record{}",
        new_records.len(),
        if new_records.len() == 1 { "" } else { "s" }
    );

    let mut body = format!("New records for {filter}:\n\n");
    for record in new_records {
        let timestamp = record.timestamp.as_deref().unwrap_or("Unknown");
        body.push_str(&format!("- {} ({timestamp})\n  {}\n", record.id, record.url));
    }

    Notification {
        destination: destination.to_string(),
        subject,
        body,
        records: new_records.to_vec(),
    }
}
