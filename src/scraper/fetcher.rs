//! HTTP page fetcher using reqwest.

use std::future::Future;
use std::time::Duration;

use anyhow::{Context, Result};
use reqwest::header::{HeaderMap, HeaderValue, USER_AGENT};
use tracing::info;

use crate::config::CollectorConfig;
use crate::retry::{retry, RetryPolicy};

/// Source of page HTML by URL
pub trait PageSource {
    fn fetch_page(&self, url: &str) -> impl Future<Output = Result<String>>;
}

/// Fetches page HTML with a static browser `User-Agent`
pub struct Fetcher {
    client: reqwest::Client,
    retry: RetryPolicy,
}

impl Fetcher {
    /// Build a client from the collector settings
    pub fn new(config: &CollectorConfig, retry: RetryPolicy) -> Result<Self> {
        let mut headers = HeaderMap::new();
        headers.insert(
            USER_AGENT,
            HeaderValue::from_str(&config.user_agent).context("invalid user agent")?,
        );

        let client = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .build()
            .context("Failed to build HTTP client")?;

        Ok(Self { client, retry })
    }

    async fn fetch_once(&self, url: &str) -> Result<String> {
        let response = self
            .client
            .get(url)
            .send()
            .await
            .with_context(|| format!("GET {}", url))?;

        let status = response.status();
        info!("status code: {} {}", status.as_u16(), url);

        let response = response
            .error_for_status()
            .with_context(|| format!("GET {}", url))?;

        response
            .text()
            .await
            .with_context(|| format!("Failed to read body of {}", url))
    }
}

impl PageSource for Fetcher {
    /// GET a page and return its body as text.
    ///
    /// Non-success statuses are errors.
    async fn fetch_page(&self, url: &str) -> Result<String> {
        retry(&self.retry, url, || self.fetch_once(url)).await
    }
}
