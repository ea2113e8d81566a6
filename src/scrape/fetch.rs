//! Page fetching behind a trait so lookups can run against canned HTML.

use async_trait::async_trait;
use std::time::Duration;
use tracing::debug;
use url::Url;

use crate::scrape::errors::ScrapeError;

/// Retrieves the HTML body of a page.
#[async_trait]
pub trait PageFetcher: Send + Sync {
    async fn fetch(&self, url: &Url) -> Result<String, ScrapeError>;
}

/// [`PageFetcher`] backed by a shared `reqwest` client.
///
/// The client keeps a cookie store, so every fetch made through one
/// `HttpFetcher` shares a single browsing session.
pub struct HttpFetcher {
    http: reqwest::Client,
}

impl HttpFetcher {
    pub fn new(timeout: Duration) -> anyhow::Result<Self> {
        let http = reqwest::Client::builder()
            .user_agent(concat!("rateprof/", env!("CARGO_PKG_VERSION")))
            .cookie_store(true)
            .timeout(timeout)
            .build()?;
        Ok(Self { http })
    }
}

#[async_trait]
impl PageFetcher for HttpFetcher {
    async fn fetch(&self, url: &Url) -> Result<String, ScrapeError> {
        debug!(url = %url, "Visiting");

        let resp = self
            .http
            .get(url.clone())
            .send()
            .await
            .map_err(|source| ScrapeError::Request {
                url: url.to_string(),
                source,
            })?;

        let status = resp.status();
        if !status.is_success() {
            return Err(ScrapeError::Status {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }

        resp.text().await.map_err(|source| ScrapeError::Request {
            url: url.to_string(),
            source,
        })
    }
}
