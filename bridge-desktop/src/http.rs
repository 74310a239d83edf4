//! Page Text Fetcher Implementation using Reqwest

use async_trait::async_trait;
use bridge_traits::{
    error::{BridgeError, Result},
    http::{join_lines, HttpTextFetcher},
};
use reqwest::Client;
use std::time::Duration;
use tracing::{debug, warn};

/// Reqwest-based page text fetcher
///
/// Issues a plain `GET`, follows redirects (reqwest default) and returns the
/// body, decoded as lossy UTF-8, with its lines joined by `"\n"`. Any non-2xx status is a
/// failure, matching a connection that refuses to hand out an input stream.
pub struct ReqwestTextFetcher {
    client: Client,
}

impl ReqwestTextFetcher {
    /// Create a fetcher without a request timeout
    pub fn new() -> Result<Self> {
        let client = Self::base_builder()
            .build()
            .map_err(|e| BridgeError::NotAvailable(format!("HTTP client: {}", e)))?;

        Ok(Self { client })
    }

    /// Create a fetcher that gives up after `timeout`
    pub fn with_timeout(timeout: Duration) -> Result<Self> {
        let client = Self::base_builder()
            .timeout(timeout)
            .build()
            .map_err(|e| BridgeError::NotAvailable(format!("HTTP client: {}", e)))?;

        Ok(Self { client })
    }

    /// Create a fetcher around an existing client
    pub fn with_client(client: Client) -> Self {
        Self { client }
    }

    fn base_builder() -> reqwest::ClientBuilder {
        Client::builder()
            .connect_timeout(Duration::from_secs(10))
            .pool_max_idle_per_host(4)
            .user_agent(concat!("openwith-bridge/", env!("CARGO_PKG_VERSION")))
    }
}

#[async_trait]
impl HttpTextFetcher for ReqwestTextFetcher {
    async fn fetch_text(&self, url: &str) -> Result<String> {
        debug!(url = %url, "Fetching page text");

        let response = self.client.get(url).send().await.map_err(|e| {
            warn!(error = %e, url = %url, "Page fetch failed");
            if e.is_timeout() {
                BridgeError::OperationFailed("Request timed out".to_string())
            } else if e.is_connect() {
                BridgeError::OperationFailed(format!("Connection failed: {}", e))
            } else {
                BridgeError::OperationFailed(e.to_string())
            }
        })?;

        let status = response.status();
        if !status.is_success() {
            return Err(BridgeError::OperationFailed(format!(
                "HTTP error: {}",
                status
            )));
        }

        let body = response
            .bytes()
            .await
            .map_err(|e| BridgeError::OperationFailed(e.to_string()))?;

        let text = join_lines(&body);
        debug!(url = %url, chars = text.len(), "Fetched page text");
        Ok(text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_fetcher_creation() {
        assert!(ReqwestTextFetcher::new().is_ok());
        assert!(ReqwestTextFetcher::with_timeout(Duration::from_secs(5)).is_ok());
    }

    #[tokio::test]
    async fn test_malformed_url_is_an_error() {
        let fetcher = ReqwestTextFetcher::new().unwrap();
        assert!(fetcher.fetch_text("not a url").await.is_err());
    }
}
