//! HTTP client with rate limiting for the championship archive

use std::time::{Duration, Instant};
use tokio::sync::Mutex;

use super::{archive_url, ArchiveSource};
use crate::config::ScraperConfig;
use crate::error::ResolverError;

/// Archive page client with rate limiting and retry
pub struct ArchiveClient {
    client: reqwest::Client,
    config: ScraperConfig,
    last_request: Mutex<Instant>,
}

impl ArchiveClient {
    pub fn new(config: ScraperConfig) -> Result<Self, reqwest::Error> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.step_timeout_secs))
            .user_agent(&config.user_agent)
            .build()?;

        Ok(Self {
            client,
            config,
            last_request: Mutex::new(Instant::now() - Duration::from_secs(10)),
        })
    }

    /// Wait for rate limit
    async fn wait_for_rate_limit(&self) {
        let mut last = self.last_request.lock().await;
        let elapsed = last.elapsed();
        let delay = Duration::from_millis(self.config.delay_ms);

        if elapsed < delay {
            tokio::time::sleep(delay - elapsed).await;
        }

        *last = Instant::now();
    }

    /// One GET of a season's archive page
    async fn request(&self, year: u16, url: &str) -> Result<String, ResolverError> {
        self.wait_for_rate_limit().await;

        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|source| ResolverError::Http { year, source })?;

        let status = response.status();
        if !status.is_success() {
            return Err(ResolverError::Status {
                year,
                status: status.as_u16(),
            });
        }

        response
            .text()
            .await
            .map_err(|source| ResolverError::Http { year, source })
    }

    /// Fetch a season's archive page with rate limiting and retry
    async fn fetch_page(&self, year: u16, url: &str) -> Result<String, ResolverError> {
        let attempts = self.config.max_attempts.max(1);
        let mut attempt = 0;

        loop {
            attempt += 1;
            match self.request(year, url).await {
                Ok(html) => return Ok(html),
                Err(e) if attempt >= attempts => return Err(e),
                Err(e) => {
                    tracing::warn!("Request failed (attempt {}/{}): {}", attempt, attempts, e);
                    let backoff = Duration::from_millis(self.config.delay_ms * attempt as u64);
                    tokio::time::sleep(backoff).await;
                }
            }
        }
    }
}

impl ArchiveSource for ArchiveClient {
    async fn fetch_archive(&self, year: u16) -> Result<String, ResolverError> {
        let url = archive_url(year);
        tracing::info!("Fetching playoff archive: {}", url);

        self.fetch_page(year, &url).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_rate_limit_waits() {
        let client = ArchiveClient::new(ScraperConfig {
            delay_ms: 50,
            ..Default::default()
        })
        .unwrap();

        // First call passes immediately, second waits for the delay
        client.wait_for_rate_limit().await;
        let start = Instant::now();
        client.wait_for_rate_limit().await;
        assert!(start.elapsed() >= Duration::from_millis(40));
    }

    #[tokio::test]
    async fn test_unreachable_archive_is_http_error() {
        let client = ArchiveClient::new(ScraperConfig {
            delay_ms: 0,
            max_attempts: 2,
            step_timeout_secs: 2,
            ..Default::default()
        })
        .unwrap();

        // Nothing listens on port 1
        let result = client
            .fetch_page(2012, "http://127.0.0.1:1/2012/d1/html/confstat.htm")
            .await;

        match result {
            Err(ResolverError::Http { year, source }) => {
                assert_eq!(year, 2012);
                assert!(source.is_connect());
            }
            other => panic!("expected Http error, got {:?}", other.map(|_| ())),
        }
    }
}
