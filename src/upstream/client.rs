//! Upstream Client
//!
//! Thin reqwest wrapper used as the fetch function on cache misses.

use std::time::Duration;

use serde_json::Value;
use tracing::{debug, warn};

use crate::config::Config;
use crate::error::UpstreamError;

/// HTTP client bound to a single upstream base URL.
#[derive(Debug, Clone)]
pub struct UpstreamClient {
    http: reqwest::Client,
    base_url: String,
}

impl UpstreamClient {
    /// Creates a client for `base_url` whose requests give up after `timeout`.
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self, UpstreamError> {
        let http = reqwest::Client::builder().timeout(timeout).build()?;
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Ok(Self { http, base_url })
    }

    pub fn from_config(config: &Config) -> Result<Self, UpstreamError> {
        Self::new(config.upstream_base_url.clone(), config.upstream_timeout())
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    // == Fetch JSON ==
    /// GETs `path_and_query` from the upstream and decodes the body as JSON.
    pub async fn fetch_json(&self, path_and_query: &str) -> Result<Value, UpstreamError> {
        let url = format!(
            "{}/{}",
            self.base_url,
            path_and_query.trim_start_matches('/')
        );
        debug!("Fetching {}", url);

        let response = self.http.get(&url).send().await?;
        let status = response.status();
        if !status.is_success() {
            warn!("Upstream {} answered {}", url, status);
            return Err(UpstreamError::Status(status.as_u16()));
        }

        Ok(response.json::<Value>().await?)
    }
}
