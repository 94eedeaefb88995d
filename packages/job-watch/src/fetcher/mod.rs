//! Fetching the current snapshot from the listing page.
//!
//! The coordinator only depends on the [`Fetcher`] trait. [`HttpFetcher`] is
//! the production implementation: one GET of the listing page followed by
//! row-wise extraction.

pub mod date;
pub mod extract;

use std::time::Duration;

use async_trait::async_trait;
use tracing::{debug, info, warn};
use url::Url;

use crate::error::{FetchError, FetchResult};
use crate::record::Snapshot;

pub use date::{normalize_date, parse_canonical, CANONICAL_FORMAT};
pub use extract::extract_records;

/// Listing page watched when nothing else is configured.
pub const DEFAULT_LISTING_URL: &str =
    "https://careers-redhat.icims.com/jobs/search?ss=1&in_iframe=1&searchLocation=12873--Melbourne";

/// User agent the listing site serves the plain HTML table to.
pub const DEFAULT_USER_AGENT: &str = "Mozilla/4.0 (compatible; MSIE 7.0; Windows NT 5.1)";

/// Produces the current snapshot of job listings.
#[async_trait]
pub trait Fetcher: Send + Sync {
    /// Fetch and extract every job currently listed.
    async fn fetch(&self) -> FetchResult<Snapshot>;

    /// Fetcher name (for logging/debugging).
    fn name(&self) -> &str {
        "unknown"
    }
}

/// Settings for [`HttpFetcher`].
#[derive(Debug, Clone)]
pub struct FetcherConfig {
    pub url: String,
    pub user_agent: String,
    pub timeout: Duration,
}

impl Default for FetcherConfig {
    fn default() -> Self {
        Self::new(DEFAULT_LISTING_URL)
    }
}

impl FetcherConfig {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            user_agent: DEFAULT_USER_AGENT.to_string(),
            timeout: Duration::from_secs(30),
        }
    }

    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = user_agent.into();
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

/// Fetches the listing page over HTTP and extracts its job rows.
pub struct HttpFetcher {
    client: reqwest::Client,
    url: Url,
}

impl HttpFetcher {
    pub fn new(config: FetcherConfig) -> FetchResult<Self> {
        let url = Url::parse(&config.url).map_err(|_| FetchError::InvalidUrl {
            url: config.url.clone(),
        })?;

        let client = reqwest::Client::builder()
            .timeout(config.timeout)
            .user_agent(config.user_agent)
            .redirect(reqwest::redirect::Policy::limited(5))
            .build()
            .map_err(|e| FetchError::Http(Box::new(e)))?;

        Ok(Self { client, url })
    }

    pub fn url(&self) -> &Url {
        &self.url
    }

    async fn fetch_html(&self) -> FetchResult<(String, Url)> {
        debug!(url = %self.url, "HTTP fetch starting");
        let response = self
            .client
            .get(self.url.clone())
            .send()
            .await
            .map_err(|e| {
                warn!(url = %self.url, error = %e, "HTTP request failed");
                FetchError::Http(Box::new(e))
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status {
                status: status.as_u16(),
                url: self.url.to_string(),
            });
        }

        // Links on the page are relative to where we ended up after redirects.
        let final_url = response.url().clone();
        let html = response
            .text()
            .await
            .map_err(|e| FetchError::Http(Box::new(e)))?;

        Ok((html, final_url))
    }
}

#[async_trait]
impl Fetcher for HttpFetcher {
    async fn fetch(&self) -> FetchResult<Snapshot> {
        let (html, final_url) = self.fetch_html().await?;
        let snapshot = extract_records(&html, &final_url)?;

        info!(url = %self.url, jobs = snapshot.len(), "Fetched job listings");
        Ok(snapshot)
    }

    fn name(&self) -> &str {
        "http"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_builder() {
        let config = FetcherConfig::new("https://example.com/jobs")
            .with_user_agent("job-watch-test")
            .with_timeout(Duration::from_secs(5));

        assert_eq!(config.url, "https://example.com/jobs");
        assert_eq!(config.user_agent, "job-watch-test");
        assert_eq!(config.timeout, Duration::from_secs(5));
    }

    #[test]
    fn test_default_config_watches_listing_page() {
        let config = FetcherConfig::default();
        assert_eq!(config.url, DEFAULT_LISTING_URL);
        assert_eq!(config.user_agent, DEFAULT_USER_AGENT);
    }

    #[test]
    fn test_invalid_url_rejected() {
        let err = HttpFetcher::new(FetcherConfig::new("not a url")).err().unwrap();
        assert!(matches!(err, FetchError::InvalidUrl { .. }));
    }

    #[tokio::test]
    async fn test_unreachable_host_is_fetch_error() {
        // Port 9 on localhost refuses connections on any sane test machine.
        let fetcher = HttpFetcher::new(
            FetcherConfig::new("http://127.0.0.1:9/jobs").with_timeout(Duration::from_secs(2)),
        )
        .unwrap();

        let err = fetcher.fetch().await.unwrap_err();
        assert!(matches!(err, FetchError::Http(_)));
    }
}
