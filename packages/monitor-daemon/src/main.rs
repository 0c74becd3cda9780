//! Long-running monitor daemon.
//!
//! Wires the HTTP page source, file-backed seen-set store, and
//! webhook sink into a supervisor and runs it until Ctrl+C.

mod config;

use std::sync::Arc;

use anyhow::{Context, Result};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use monitor::{HttpSource, JsonFileStore, RateLimitedSource, Supervisor, WebhookSink};

use crate::config::Config;

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,monitor=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_target(true))
        .init();

    let config = Config::from_env()?;

    tracing::info!(
        target = %config.target,
        filters = ?config.filters,
        interval_secs = config.poll_interval_secs,
        state_path = %config.state_path,
        "starting monitor daemon"
    );

    let http_source = match &config.api_base_url {
        Some(base) => HttpSource::with_base_url(base),
        None => HttpSource::new(),
    }
    .context("failed to build HTTP source")?;
    let source = RateLimitedSource::new(http_source, config.requests_per_second);

    let store = JsonFileStore::new(&config.state_path);
    let sink = WebhookSink::new().context("failed to build webhook sink")?;

    let supervisor = Supervisor::new(
        Arc::new(source),
        Arc::new(store),
        Arc::new(sink),
        config.monitor_config(),
    );

    supervisor
        .run_until_shutdown()
        .await
        .context("monitor stopped on a fatal failure")?;

    Ok(())
}
