use crate::error::{Result, ScanError};
use reqwest::header::RANGE;
use reqwest::{Client, StatusCode};
use std::time::{Duration, Instant};
use tracing::debug;

pub const DEFAULT_USER_AGENT: &str = "SiteScout/0.1 (+https://github.com/sitescout/sitescout)";
pub const DEFAULT_PROBE_TIMEOUT: Duration = Duration::from_secs(5);
pub const DEFAULT_FETCH_TIMEOUT: Duration = Duration::from_secs(15);

/// Bytes requested by the ranged GET fallback of an existence check
const PROBE_RANGE: &str = "bytes=0-1023";

/// Shared HTTP client with separate budgets for existence probes and full fetches.
///
/// Cloning is cheap; clones share the underlying connection pool.
#[derive(Clone)]
pub struct Fetcher {
    client: Client,
    probe_timeout: Duration,
    fetch_timeout: Duration,
}

impl Fetcher {
    pub fn new() -> Result<Self> {
        Self::with_timeouts(DEFAULT_PROBE_TIMEOUT, DEFAULT_FETCH_TIMEOUT)
    }

    pub fn with_timeouts(probe_timeout: Duration, fetch_timeout: Duration) -> Result<Self> {
        Self::with_user_agent(DEFAULT_USER_AGENT, probe_timeout, fetch_timeout)
    }

    pub fn with_user_agent(
        user_agent: &str,
        probe_timeout: Duration,
        fetch_timeout: Duration,
    ) -> Result<Self> {
        let client = Client::builder()
            .user_agent(user_agent)
            .connect_timeout(probe_timeout)
            .pool_max_idle_per_host(16)
            .pool_idle_timeout(Duration::from_secs(90))
            .tcp_keepalive(Duration::from_secs(60))
            .redirect(reqwest::redirect::Policy::limited(5))
            .build()?;

        Ok(Self {
            client,
            probe_timeout,
            fetch_timeout,
        })
    }

    pub fn probe_timeout(&self) -> Duration {
        self.probe_timeout
    }

    pub fn fetch_timeout(&self) -> Duration {
        self.fetch_timeout
    }

    /// Lightweight existence check: `HEAD`, falling back to a ranged `GET`
    /// when the server refuses `HEAD`.
    pub async fn exists(&self, url: &str) -> Result<bool> {
        let start = Instant::now();
        let response = self
            .client
            .head(url)
            .timeout(self.probe_timeout)
            .send()
            .await?;
        let status = response.status();
        debug!("HEAD {} -> {} in {:?}", url, status.as_u16(), start.elapsed());

        if status.is_success() {
            return Ok(true);
        }
        if status != StatusCode::METHOD_NOT_ALLOWED && status != StatusCode::NOT_IMPLEMENTED {
            return Ok(false);
        }

        let response = self
            .client
            .get(url)
            .header(RANGE, PROBE_RANGE)
            .timeout(self.probe_timeout)
            .send()
            .await?;
        let status = response.status();
        debug!("ranged GET {} -> {}", url, status.as_u16());
        Ok(status.is_success())
    }

    /// Fetch a small text document (robots.txt) within the probe budget
    pub async fn fetch_short(&self, url: &str) -> Result<String> {
        self.fetch_with_timeout(url, self.probe_timeout).await
    }

    /// Fetch a full document (sitemap body) within the fetch budget
    pub async fn fetch_text(&self, url: &str) -> Result<String> {
        self.fetch_with_timeout(url, self.fetch_timeout).await
    }

    async fn fetch_with_timeout(&self, url: &str, timeout: Duration) -> Result<String> {
        debug!("Fetching {}", url);
        let start = Instant::now();
        let response = self.client.get(url).timeout(timeout).send().await?;

        let status = response.status();
        if !status.is_success() {
            return Err(ScanError::Status(status.as_u16()));
        }

        let body = response.text().await?;
        debug!("Fetched {} ({} bytes) in {:?}", url, body.len(), start.elapsed());
        Ok(body)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::{
        Mock, MockServer, ResponseTemplate,
        matchers::{header, method, path},
    };

    #[tokio::test]
    async fn test_exists_with_head() {
        let mock_server = MockServer::start().await;
        Mock::given(method("HEAD"))
            .and(path("/sitemap.xml"))
            .respond_with(ResponseTemplate::new(200))
            .mount(&mock_server)
            .await;

        let fetcher = Fetcher::new().unwrap();
        let url = format!("{}/sitemap.xml", mock_server.uri());
        assert!(fetcher.exists(&url).await.unwrap());
    }

    #[tokio::test]
    async fn test_exists_missing_document() {
        let mock_server = MockServer::start().await;

        let fetcher = Fetcher::new().unwrap();
        let url = format!("{}/sitemap.xml", mock_server.uri());
        assert!(!fetcher.exists(&url).await.unwrap());
    }

    #[tokio::test]
    async fn test_exists_falls_back_to_ranged_get() {
        let mock_server = MockServer::start().await;
        Mock::given(method("HEAD"))
            .and(path("/sitemap.xml"))
            .respond_with(ResponseTemplate::new(405))
            .mount(&mock_server)
            .await;
        Mock::given(method("GET"))
            .and(path("/sitemap.xml"))
            .and(header("range", PROBE_RANGE))
            .respond_with(ResponseTemplate::new(206).set_body_string("<urlset>"))
            .expect(1)
            .mount(&mock_server)
            .await;

        let fetcher = Fetcher::new().unwrap();
        let url = format!("{}/sitemap.xml", mock_server.uri());
        assert!(fetcher.exists(&url).await.unwrap());
    }

    #[tokio::test]
    async fn test_fetch_text_rejects_error_status() {
        let mock_server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/sitemap.xml"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&mock_server)
            .await;

        let fetcher = Fetcher::new().unwrap();
        let url = format!("{}/sitemap.xml", mock_server.uri());
        let err = fetcher.fetch_text(&url).await.unwrap_err();
        assert!(matches!(err, ScanError::Status(500)));
    }

    #[tokio::test]
    async fn test_fetch_short_times_out() {
        let mock_server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/robots.txt"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_string("Sitemap: /x.xml")
                    .set_delay(Duration::from_millis(500)),
            )
            .mount(&mock_server)
            .await;

        let fetcher =
            Fetcher::with_timeouts(Duration::from_millis(100), Duration::from_secs(1)).unwrap();
        let url = format!("{}/robots.txt", mock_server.uri());
        assert!(fetcher.fetch_short(&url).await.is_err());
    }
}
