//! Notification sink implementations.

mod webhook;

pub use webhook::WebhookSink;
