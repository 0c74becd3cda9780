use std::env;
use std::time::Duration;

use anyhow::{Context, Result};
use dotenvy::dotenv;
use monitor::{MonitorConfig, RecencyPolicy, Target};

/// Daemon configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct Config {
    pub target: String,
    pub filters: Vec<String>,
    pub poll_interval_secs: u64,
    pub webhook_url: String,
    pub state_path: String,
    pub api_base_url: Option<String>,
    pub requests_per_second: u32,
    pub max_pages: u32,
    pub retention_cap: usize,
    pub refresh_recency: bool,
}

impl Config {
    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self> {
        // Load .env file if present (development)
        let _ = dotenv();

        let filters: Vec<String> = env::var("MONITOR_FILTERS")
            .context("MONITOR_FILTERS must be set (comma-separated filter names)")?
            .split(',')
            .map(|f| f.trim().to_string())
            .filter(|f| !f.is_empty())
            .collect();
        anyhow::ensure!(!filters.is_empty(), "MONITOR_FILTERS must name at least one filter");

        let requests_per_second: u32 = env::var("MONITOR_RPS")
            .unwrap_or_else(|_| "2".to_string())
            .parse()
            .context("MONITOR_RPS must be a valid number")?;
        anyhow::ensure!(requests_per_second > 0, "MONITOR_RPS must be at least 1");

        Ok(Self {
            target: env::var("MONITOR_TARGET")
                .context("MONITOR_TARGET must be set")?,
            filters,
            poll_interval_secs: env::var("MONITOR_INTERVAL_SECS")
                .unwrap_or_else(|_| "300".to_string())
                .parse()
                .context("MONITOR_INTERVAL_SECS must be a valid number")?,
            webhook_url: env::var("MONITOR_WEBHOOK_URL")
                .context("MONITOR_WEBHOOK_URL must be set")?,
            state_path: env::var("MONITOR_STATE_PATH")
                .unwrap_or_else(|_| "seen-state.json".to_string()),
            api_base_url: env::var("MONITOR_API_BASE_URL").ok(),
            requests_per_second,
            max_pages: env::var("MONITOR_MAX_PAGES")
                .unwrap_or_else(|_| "5".to_string())
                .parse()
                .context("MONITOR_MAX_PAGES must be a valid number")?,
            retention_cap: env::var("MONITOR_RETENTION_CAP")
                .unwrap_or_else(|_| "50".to_string())
                .parse()
                .context("MONITOR_RETENTION_CAP must be a valid number")?,
            refresh_recency: env::var("MONITOR_REFRESH_RECENCY")
                .map(|v| v == "1" || v.eq_ignore_ascii_case("true"))
                .unwrap_or(false),
        })
    }

    /// Build the pipeline configuration.
    pub fn monitor_config(&self) -> MonitorConfig {
        let policy = if self.refresh_recency {
            RecencyPolicy::Refresh
        } else {
            RecencyPolicy::KeepOriginal
        };

        MonitorConfig::new(Target::new(&self.target), self.filters.clone())
            .with_poll_interval(Duration::from_secs(self.poll_interval_secs))
            .with_max_pages(self.max_pages)
            .with_retention_cap(self.retention_cap)
            .with_destination(&self.webhook_url)
            .with_recency_policy(policy)
    }
}
