//! HTTP page source for transaction-listing APIs.
//!
//! Polls a JSON endpoint shaped like the Solscan public API
//! (`/account/transactions?account=...&offset=...&limit=...`) and
//! maps each entry to a [`Record`]. The parser is deliberately
//! forgiving: entries without an id are skipped and a well-formed
//! but unexpected payload yields an empty page with a warning,
//! since upstream occasionally serves odd shapes under load.

use std::time::Duration;

use chrono::DateTime;
use serde::Deserialize;
use tracing::warn;

use crate::error::{SourceError, SourceResult};
use crate::traits::PageSource;
use crate::types::{PageBatch, Record, Target};

const DEFAULT_BASE_URL: &str = "https://public-api.solscan.io";
const DEFAULT_EXPLORER_URL: &str = "https://solscan.io/tx";
const DEFAULT_PAGE_SIZE: u32 = 20;
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(15);
const USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) \
    AppleWebKit/537.36 (KHTML, like Gecko) Chrome/91.0.4472.124 Safari/537.36";

#[derive(Debug, Deserialize)]
struct ApiTransaction {
    #[serde(rename = "txHash")]
    tx_hash: Option<String>,

    #[serde(rename = "blockTime")]
    block_time: Option<i64>,
}

/// Page source backed by a paginated JSON listing API.
pub struct HttpSource {
    client: reqwest::Client,
    base_url: String,
    explorer_url: String,
    page_size: u32,
}

impl HttpSource {
    /// Create a source against the default API endpoint.
    pub fn new() -> SourceResult<Self> {
        Self::with_base_url(DEFAULT_BASE_URL)
    }

    /// Create a source against a specific API endpoint.
    pub fn with_base_url(base_url: impl Into<String>) -> SourceResult<Self> {
        let client = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .timeout(DEFAULT_TIMEOUT)
            .build()
            .map_err(|err| SourceError::Http(Box::new(err)))?;

        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            explorer_url: DEFAULT_EXPLORER_URL.to_string(),
            page_size: DEFAULT_PAGE_SIZE,
        })
    }

    /// Set the explorer URL prefix used to build record links.
    pub fn with_explorer_url(mut self, url: impl Into<String>) -> Self {
        self.explorer_url = url.into().trim_end_matches('/').to_string();
        self
    }

    /// Set how many entries are requested per page.
    pub fn with_page_size(mut self, page_size: u32) -> Self {
        self.page_size = page_size.max(1);
        self
    }

    fn parse_body(&self, body: &str, filter: &str, page: u32) -> SourceResult<PageBatch> {
        // Upstream sometimes answers an empty body instead of `[]`.
        if body.trim().is_empty() {
            return Ok(PageBatch::empty());
        }

        let entries: Vec<ApiTransaction> = match serde_json::from_str(body) {
            Ok(entries) => entries,
            Err(_) => {
                // Valid JSON of the wrong shape is an upstream quirk
                // worth logging; anything else may be a rate-limit
                // interstitial and is worth a retry.
                return match serde_json::from_str::<serde_json::Value>(body) {
                    Ok(other) => {
                        warn!(
                            filter = %filter,
                            page = page,
                            shape = %value_shape(&other),
                            "unexpected API response shape, treating as empty page"
                        );
                        Ok(PageBatch::empty())
                    }
                    Err(err) => Err(SourceError::UnexpectedPayload {
                        reason: err.to_string(),
                    }),
                };
            }
        };

        let full_page = entries.len() as u32 >= self.page_size;
        let records: Vec<Record> = entries
            .into_iter()
            .filter_map(|entry| {
                let id = entry.tx_hash?;
                let url = format!("{}/{}", self.explorer_url, id);
                let mut record = Record::new(id, url);
                if let Some(ts) = entry.block_time.and_then(format_block_time) {
                    record = record.with_timestamp(ts);
                }
                Some(record)
            })
            .collect();

        Ok(PageBatch::new(records, full_page))
    }
}

#[async_trait::async_trait]
impl PageSource for HttpSource {
    async fn fetch_page(
        &self,
        target: &Target,
        filter: &str,
        page: u32,
    ) -> SourceResult<PageBatch> {
        if target.locator.trim().is_empty() {
            return Err(SourceError::InvalidTarget {
                target: target.locator.clone(),
            });
        }

        let offset = (page.saturating_sub(1)) * self.page_size;
        let url = format!(
            "{}/account/transactions?account={}&instruction={}&offset={}&limit={}",
            self.base_url, target.locator, filter, offset, self.page_size
        );

        let response = self.client.get(&url).send().await.map_err(|err| {
            if err.is_timeout() {
                SourceError::Timeout {
                    filter: filter.to_string(),
                    page,
                }
            } else {
                SourceError::Http(Box::new(err))
            }
        })?;

        let status = response.status();
        if status.is_server_error() || status.as_u16() == 429 {
            // Worth a retry; the traversal engine decides.
            return Err(SourceError::Http(
                format!("upstream returned {status}").into(),
            ));
        }
        if !status.is_success() {
            return Err(SourceError::Rejected {
                status: status.as_u16(),
            });
        }

        let body = response
            .text()
            .await
            .map_err(|err| SourceError::Http(Box::new(err)))?;

        self.parse_body(&body, filter, page)
    }
}

fn format_block_time(block_time: i64) -> Option<String> {
    DateTime::from_timestamp(block_time, 0).map(|dt| dt.format("%Y-%m-%d %H:%M:%S UTC").to_string())
}

fn value_shape(value: &serde_json::Value) -> &'static str {
    match value {
        serde_json::Value::Null => "null",
        serde_json::Value::Bool(_) => "bool",
        serde_json::Value::Number(_) => "number",
        serde_json::Value::String(_) => "string",
        serde_json::Value::Array(_) => "array",
        serde_json::Value::Object(_) => "object",
    }
}
