//! Notification sink trait: the delivery boundary.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::SinkResult;
use crate::types::Record;

/// A notification ready for delivery.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notification {
    /// Where to deliver (email address, webhook URL, channel id)
    pub destination: String,

    /// Machine-addressable subject line naming the filter
    pub subject: String,

    /// Human-readable summary, one line per new record
    pub body: String,

    /// The new records themselves, for structured transports
    pub records: Vec<Record>,
}

/// Delivers notifications through an external channel.
///
/// Delivery may fail independently of the detection pipeline; a
/// failure is reported to the run outcome but never rolls back the
/// seen-set update.
#[async_trait]
pub trait NotificationSink: Send + Sync {
    /// Deliver one notification.
    async fn send(&self, notification: &Notification) -> SinkResult<()>;
}
