//! HTTP access to the caption endpoints.

use crate::error::Result;
use async_trait::async_trait;
use tracing::debug;

/// Fetches caption-related resources.
///
/// Non-OK responses are `Ok(None)`; only transport failures are errors, and
/// callers treat both as "try the next candidate".
#[async_trait]
pub trait CaptionTransport: Send + Sync {
    async fn get_text(&self, url: &str) -> Result<Option<String>>;
}

/// reqwest-backed transport.
pub struct HttpTransport {
    client: reqwest::Client,
}

impl HttpTransport {
    /// Create a transport with a browser-like user agent.
    pub fn new() -> Result<Self> {
        let client = reqwest::Client::builder()
            .user_agent("Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0 Safari/537.36")
            .build()?;
        Ok(Self { client })
    }

    /// Wrap an existing client.
    pub fn with_client(client: reqwest::Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl CaptionTransport for HttpTransport {
    async fn get_text(&self, url: &str) -> Result<Option<String>> {
        let response = self.client.get(url).send().await?;
        let status = response.status();
        if !status.is_success() {
            debug!("GET {} -> {}", url, status);
            return Ok(None);
        }
        Ok(Some(response.text().await?))
    }
}
