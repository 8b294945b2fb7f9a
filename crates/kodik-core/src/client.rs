//! HTTP client with rate limiting and retry logic for the player service
//!
//! Control-plane requests (player page, companion script, catalogs, media
//! endpoint, manifest) are rate limited and retried on transient errors.
//! Segment fetches bypass the limiter; the downloader bounds them by
//! in-flight count instead.

use std::time::{Duration, Instant};

use reqwest::header::HeaderMap;
use tokio::sync::Mutex;
use tokio::time::sleep;
use tracing::{debug, error};

use crate::error::{KodikError, Result};

const USER_AGENT: &str = "Mozilla/5.0 (Linux; Android 6.0; Nexus 5 Build/MRA58N) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/141.0.0.0 Mobile Safari/537.36";
const REFERER: &str = "https://jut-su.net";

/// Configuration for the HTTP client
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Browser-like User-Agent sent with every request
    pub user_agent: String,
    /// Referer sent with player page and catalog requests
    pub referer: String,
    /// Maximum control-plane requests per second (default: 2.0)
    pub requests_per_second: f64,
    /// Request timeout in seconds (default: 30)
    pub timeout_secs: u64,
    /// Maximum retry attempts for transient errors (default: 3)
    pub max_retries: u32,
    /// Maximum in-flight segment fetches (default: 8)
    pub segment_concurrency: usize,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            user_agent: USER_AGENT.to_string(),
            referer: REFERER.to_string(),
            requests_per_second: 2.0,
            timeout_secs: 30,
            max_retries: 3,
            segment_concurrency: 8,
        }
    }
}

/// Rate limiter to control request frequency
///
/// Ensures requests are spaced at least `min_interval` apart.
pub struct RateLimiter {
    min_interval: Duration,
    last_request: Mutex<Instant>,
}

impl RateLimiter {
    /// Create a new rate limiter with the specified requests per second
    pub fn new(requests_per_second: f64) -> Self {
        let min_interval = Duration::from_secs_f64(1.0 / requests_per_second);
        Self {
            min_interval,
            last_request: Mutex::new(Instant::now() - min_interval),
        }
    }

    /// Acquire permission to make a request
    ///
    /// Sleeps until the minimum interval since the previous request has
    /// elapsed.
    pub async fn acquire(&self) {
        let mut last = self.last_request.lock().await;
        let elapsed = last.elapsed();

        if elapsed < self.min_interval {
            sleep(self.min_interval - elapsed).await;
        }

        *last = Instant::now();
    }

    /// Get the minimum interval between requests
    pub fn min_interval(&self) -> Duration {
        self.min_interval
    }
}

/// HTTP client wrapper for the player service
///
/// Owns the cookie-bearing `reqwest` client shared by every pipeline
/// stage, and adds:
/// - rate limiting for control-plane requests
/// - automatic retries with exponential backoff for transient errors
/// - uniform non-200 status handling
pub struct KodikClient {
    client: reqwest::Client,
    rate_limiter: RateLimiter,
    config: ClientConfig,
}

impl KodikClient {
    /// Create a new client with default configuration
    pub fn new() -> Result<Self> {
        Self::with_config(ClientConfig::default())
    }

    /// Create a new client with custom configuration
    pub fn with_config(config: ClientConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .user_agent(&config.user_agent)
            .cookie_store(true)
            .build()
            .map_err(KodikError::Http)?;

        Ok(Self {
            client,
            rate_limiter: RateLimiter::new(config.requests_per_second),
            config,
        })
    }

    /// Get the active configuration
    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// Rate-limited GET returning the response body as text
    ///
    /// Retried on transient errors (timeout, connection failure, 5xx).
    ///
    /// # Errors
    /// - `Http` on transport failure
    /// - `Fetch` on any non-200 status
    pub async fn get_text(
        &self,
        url: &str,
        query: &[(&str, String)],
        headers: &HeaderMap,
    ) -> Result<String> {
        self.request_with_retry(|| self.client.get(url).query(query).headers(headers.clone()))
            .await
    }

    /// Rate-limited form-urlencoded POST returning the response body
    ///
    /// Same retry and status handling as [`KodikClient::get_text`].
    pub async fn post_form(
        &self,
        url: &str,
        form: &[(&str, String)],
        headers: &HeaderMap,
    ) -> Result<String> {
        self.request_with_retry(|| self.client.post(url).form(form).headers(headers.clone()))
            .await
    }

    /// Single-attempt GET returning the raw response bytes
    ///
    /// Used for segment fetches: bypasses the rate limiter and is never
    /// retried.
    pub async fn get_bytes(&self, url: &str, headers: &HeaderMap) -> Result<Vec<u8>> {
        let response = self
            .client
            .get(url)
            .headers(headers.clone())
            .send()
            .await
            .map_err(KodikError::Http)?;

        let status = response.status();
        if status != reqwest::StatusCode::OK {
            return Err(KodikError::Fetch {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }

        Ok(response.bytes().await.map_err(KodikError::Http)?.to_vec())
    }

    async fn request_with_retry(
        &self,
        build: impl Fn() -> reqwest::RequestBuilder,
    ) -> Result<String> {
        let mut attempt = 0;
        loop {
            self.rate_limiter.acquire().await;

            match Self::execute(build()).await {
                Ok(body) => return Ok(body),
                Err(e) if Self::is_retryable(&e) && attempt < self.config.max_retries => {
                    // Exponential backoff: 1s, 2s, 4s
                    let backoff = Duration::from_secs(1 << attempt);
                    debug!(attempt, error = %e, "transient error, backing off");
                    sleep(backoff).await;
                    attempt += 1;
                }
                Err(e) => return Err(e),
            }
        }
    }

    async fn execute(request: reqwest::RequestBuilder) -> Result<String> {
        let response = request.send().await.map_err(KodikError::Http)?;

        let status = response.status();
        let url = response.url().to_string();
        if status != reqwest::StatusCode::OK {
            error!(status = status.as_u16(), %url, "unexpected status");
            return Err(KodikError::Fetch {
                url,
                status: status.as_u16(),
            });
        }

        response.text().await.map_err(KodikError::Http)
    }

    fn is_retryable(error: &KodikError) -> bool {
        match error {
            KodikError::Http(e) => e.is_timeout() || e.is_connect(),
            KodikError::Fetch { status, .. } => *status >= 500,
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rate_limiter_creation() {
        let limiter = RateLimiter::new(2.0);
        assert_eq!(limiter.min_interval(), Duration::from_millis(500));
    }

    #[test]
    fn test_rate_limiter_interval_calculation() {
        let limiter = RateLimiter::new(4.0);
        assert_eq!(limiter.min_interval(), Duration::from_millis(250));
    }

    #[test]
    fn test_client_config_default() {
        let config = ClientConfig::default();
        assert_eq!(config.requests_per_second, 2.0);
        assert_eq!(config.timeout_secs, 30);
        assert_eq!(config.max_retries, 3);
        assert_eq!(config.segment_concurrency, 8);
        assert!(config.user_agent.starts_with("Mozilla/5.0"));
    }

    #[test]
    fn test_client_creation() {
        let client = KodikClient::new();
        assert!(client.is_ok());
    }

    #[test]
    fn test_client_with_custom_config() {
        let config = ClientConfig {
            requests_per_second: 1.0,
            timeout_secs: 60,
            max_retries: 5,
            segment_concurrency: 2,
            ..ClientConfig::default()
        };
        let client = KodikClient::with_config(config);
        assert!(client.is_ok());
    }

    #[test]
    fn test_fetch_error_is_retryable_only_for_server_errors() {
        let server_error = KodikError::Fetch {
            url: "https://p.example/serial/1/a/720p".to_string(),
            status: 502,
        };
        let client_error = KodikError::Fetch {
            url: "https://p.example/serial/1/a/720p".to_string(),
            status: 404,
        };
        assert!(KodikClient::is_retryable(&server_error));
        assert!(!KodikClient::is_retryable(&client_error));
    }

    #[tokio::test]
    async fn test_rate_limiter_acquire() {
        let limiter = RateLimiter::new(10.0); // 100ms interval

        let start = Instant::now();
        limiter.acquire().await;
        limiter.acquire().await;
        let elapsed = start.elapsed();

        // Second acquire should wait at least 100ms
        assert!(elapsed >= Duration::from_millis(90)); // Allow small tolerance
    }
}
