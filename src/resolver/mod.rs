//! Media link resolution.
//!
//! Turns a hosting page URL into a direct media address. The lookup is a
//! best-effort scrape: every failure collapses to `None`.

mod extract;

use std::future::Future;
use std::time::Duration;

use tracing::{debug, warn};

pub use extract::{MEDIA_EXTENSIONS, extract_media_url};

/// Browser-like identification sent with every page fetch.
pub const USER_AGENT: &str = "Mozilla/5.0";

/// Something that can find a playable media address for a page.
pub trait MediaResolver: Send + Sync {
    /// Returns the media address for `url`, or `None` if none was found.
    fn resolve(&self, url: &str) -> impl Future<Output = Option<String>> + Send;
}

/// Resolver that fetches the page over HTTP and scrapes the markup.
#[derive(Debug, Clone)]
pub struct HttpResolver {
    client: reqwest::Client,
}

impl HttpResolver {
    /// Creates a resolver whose fetches give up after `timeout`.
    pub fn new(timeout: Duration) -> Result<Self, reqwest::Error> {
        let client = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .timeout(timeout)
            .build()?;
        Ok(Self { client })
    }

    /// Creates a resolver with a timeout in seconds.
    pub fn from_secs(secs: u64) -> Result<Self, reqwest::Error> {
        Self::new(Duration::from_secs(secs))
    }

    async fn fetch(&self, url: &str) -> Result<Option<String>, reqwest::Error> {
        let response = self.client.get(url).send().await?;

        let status = response.status();
        if !status.is_success() {
            warn!("Non-success status from {}: {}", url, status);
            return Ok(None);
        }

        response.text().await.map(Some)
    }
}

impl MediaResolver for HttpResolver {
    async fn resolve(&self, url: &str) -> Option<String> {
        let body = match self.fetch(url).await {
            Ok(body) => body?,
            Err(e) => {
                warn!("Failed to fetch {}: {}", url, e);
                return None;
            }
        };

        let found = extract_media_url(&body);
        match &found {
            Some(media) => debug!("Resolved {} to {}", url, media),
            None => debug!("No media address found in {} ({} bytes)", url, body.len()),
        }
        found
    }
}
