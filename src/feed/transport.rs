//! HTTP transport for the telemetry feed.
//!
//! The [`FeedTransport`] trait is the seam between the feed client and the
//! network; [`HttpTransport`] is the reqwest implementation.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::{ACCEPT, CACHE_CONTROL, PRAGMA};
use reqwest::Client;
use tracing::debug;

use crate::error::TransportError;
use crate::Config;

// ---

/// Status and body of a feed response, whatever the status.
#[derive(Debug, Clone)]
pub struct FeedResponse {
    // ---
    pub status: u16,
    pub body: String,
}

impl FeedResponse {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// Issues one feed request for `results` samples.
///
/// Returns `Err` only when no HTTP response was obtained at all; non-2xx
/// statuses come back as a normal [`FeedResponse`].
#[async_trait]
pub trait FeedTransport: Send + Sync {
    async fn get_feed(&self, results: u32) -> Result<FeedResponse, TransportError>;
}

/// `GET {base}/channels/{channel}/feeds.json?api_key=..&results=..`
#[derive(Debug, Clone)]
pub struct HttpTransport {
    client: Client,
    base_url: String,
    channel_id: String,
    api_key: String,
}

impl HttpTransport {
    // ---
    pub fn new(
        base_url: &str,
        channel_id: &str,
        api_key: &str,
        timeout: Duration,
    ) -> Result<Self, TransportError> {
        // ---
        let client = Client::builder().timeout(timeout).build()?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            channel_id: channel_id.to_string(),
            api_key: api_key.to_string(),
        })
    }

    pub fn from_config(cfg: &Config) -> Result<Self, TransportError> {
        Self::new(
            &cfg.feed_url,
            &cfg.channel_id,
            &cfg.api_key,
            Duration::from_secs(cfg.http_timeout_secs),
        )
    }

    fn feeds_url(&self) -> String {
        format!("{}/channels/{}/feeds.json", self.base_url, self.channel_id)
    }
}

#[async_trait]
impl FeedTransport for HttpTransport {
    // ---
    async fn get_feed(&self, results: u32) -> Result<FeedResponse, TransportError> {
        // ---
        let url = self.feeds_url();
        debug!("Fetching {} results from: {}?api_key=****", results, url);

        let response = self
            .client
            .get(&url)
            .query(&[("api_key", self.api_key.as_str())])
            .query(&[("results", results)])
            .header(ACCEPT, "application/json")
            .header(CACHE_CONTROL, "no-cache, no-store")
            .header(PRAGMA, "no-cache")
            .send()
            .await?;

        let status = response.status().as_u16();
        let body = response.text().await?;

        Ok(FeedResponse { status, body })
    }
}
