//! Webhook notification sink.

use std::time::Duration;

use async_trait::async_trait;

use crate::error::{SinkError, SinkResult};
use crate::traits::{Notification, NotificationSink};

const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

/// Delivers notifications by POSTing them as JSON to a webhook.
///
/// The notification's `destination` field is the webhook URL.
pub struct WebhookSink {
    client: reqwest::Client,
}

impl WebhookSink {
    pub fn new() -> SinkResult<Self> {
        let client = reqwest::Client::builder()
            .timeout(DEFAULT_TIMEOUT)
            .build()
            .map_err(|err| SinkError::Delivery(Box::new(err)))?;
        Ok(Self { client })
    }
}

#[async_trait]
impl NotificationSink for WebhookSink {
    async fn send(&self, notification: &Notification) -> SinkResult<()> {
        if notification.destination.trim().is_empty() {
            return Err(SinkError::Rejected {
                reason: "empty destination URL".into(),
            });
        }

        let response = self
            .client
            .post(&notification.destination)
            .json(notification)
            .send()
            .await
            .map_err(|err| SinkError::Delivery(Box::new(err)))?;

        let status = response.status();
        if !status.is_success() {
            return Err(SinkError::Rejected {
                reason: format!("webhook returned {status}"),
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Record;

    #[tokio::test]
    async fn empty_destination_is_rejected() {
        let sink = WebhookSink::new().unwrap();
        let notification = Notification {
            destination: "".into(),
            subject: "[swap] 1 new record".into(),
            body: "- tx1\n".into(),
            records: vec![Record::new("tx1", "https://example.org/tx/tx1")],
        };

        let result = sink.send(&notification).await;
        assert!(matches!(result, Err(SinkError::Rejected { .. })));
    }
}
