//! Yahoo Finance API client
//!
//! Fetches the most recent one-minute close for a symbol. Every failure mode
//! (transport, HTTP status, payload shape, empty history) is reported as a
//! [`YahooError`]; callers treat any error as "no seed available".

use reqwest::Client;
use std::time::Duration;
use tracing::{debug, instrument};
use url::Url;

use crate::types::ChartResponse;

/// Base URL for the Yahoo Finance query API
pub const YAHOO_API_BASE: &str = "https://query1.finance.yahoo.com";

/// Yahoo rejects requests without a browser-like user agent
const USER_AGENT: &str = "Mozilla/5.0 (X11; Linux x86_64) live-metrics-dashboard/0.1";

/// Errors from the Yahoo client
#[derive(Debug, thiserror::Error)]
pub enum YahooError {
    #[error("Request timed out")]
    Timeout,

    #[error("HTTP error: {0}")]
    Http(#[source] reqwest::Error),

    #[error("Yahoo API error ({status}): {body}")]
    Status { status: u16, body: String },

    #[error("Parse error: {0}")]
    Parse(String),

    #[error("No price data for {0}")]
    Empty(String),
}

impl From<reqwest::Error> for YahooError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            YahooError::Timeout
        } else {
            YahooError::Http(e)
        }
    }
}

/// Client for the Yahoo Finance chart API
#[derive(Debug, Clone)]
pub struct YahooClient {
    client: Client,
    base_url: Url,
}

impl YahooClient {
    /// Create a new client with a per-request timeout
    pub fn new(timeout: Duration) -> Result<Self, YahooError> {
        Self::with_base_url(YAHOO_API_BASE, timeout)
    }

    /// Create a client against a different host (proxies, tests)
    pub fn with_base_url(base_url: &str, timeout: Duration) -> Result<Self, YahooError> {
        let client = Client::builder()
            .timeout(timeout)
            .user_agent(USER_AGENT)
            .build()
            .map_err(YahooError::Http)?;

        let base_url = Url::parse(base_url)
            .map_err(|e| YahooError::Parse(format!("Invalid base URL {}: {}", base_url, e)))?;

        Ok(Self { client, base_url })
    }

    /// Get the base URL
    pub fn base_url(&self) -> &str {
        self.base_url.as_str()
    }

    /// Build the one-day, one-minute chart URL for a symbol
    pub fn chart_url(&self, symbol: &str) -> Result<Url, YahooError> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| YahooError::Parse(format!("Base URL cannot be a base: {}", self.base_url)))?
            .pop_if_empty()
            .extend(["v8", "finance", "chart", symbol]);
        url.query_pairs_mut()
            .append_pair("range", "1d")
            .append_pair("interval", "1m");
        Ok(url)
    }

    /// Most recent close for `symbol`
    #[instrument(skip(self))]
    pub async fn latest_close(&self, symbol: &str) -> Result<f64, YahooError> {
        let url = self.chart_url(symbol)?;
        debug!("Fetching Yahoo chart from: {}", url);

        let response = self.client.get(url).send().await?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response.text().await.unwrap_or_default();
            return Err(YahooError::Status { status, body });
        }

        let chart: ChartResponse = response
            .json()
            .await
            .map_err(|e| YahooError::Parse(format!("Failed to parse chart response: {}", e)))?;

        chart
            .latest_close()
            .ok_or_else(|| YahooError::Empty(symbol.to_string()))
    }
}
