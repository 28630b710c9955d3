//! HTTP client with connection retry
//!
//! Provides the single request path shared by the paged and lookup fetchers:
//! - Fixed-delay retry of connection-level failures (refused, reset, timed out
//!   before any response arrived)
//! - No retry of HTTP status errors; they surface as `Error::RemoteApi`
//! - JSON body parsing
//! - A minimum gap between paged requests, shared by every clone of the client

use crate::error::{error_chain, Error, Result};
use crate::types::JsonValue;
use reqwest::Client;
use std::collections::HashMap;
use std::io::ErrorKind;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use tokio::time::Instant;
use tracing::{debug, warn};

/// Default Overgrad API root
pub const DEFAULT_BASE_URL: &str = "https://api.overgrad.com/api/v1";

/// Header carrying the API key
pub const API_KEY_HEADER: &str = "ApiKey";

/// Configuration for the HTTP client
#[derive(Debug, Clone)]
pub struct HttpClientConfig {
    /// Base URL for all requests
    pub base_url: String,
    /// Read timeout, applied to each read of a response
    pub timeout: Duration,
    /// Timeout for establishing a connection
    pub connect_timeout: Duration,
    /// Wait between attempts after a connection failure
    pub connect_retry_delay: Duration,
    /// Cap on connection retries; `None` retries forever
    pub max_connect_retries: Option<u32>,
    /// Default headers for all requests
    pub default_headers: HashMap<String, String>,
    /// User agent string
    pub user_agent: String,
}

impl Default for HttpClientConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            timeout: Duration::from_secs(10),
            connect_timeout: Duration::from_secs(10),
            connect_retry_delay: Duration::from_secs(60),
            max_connect_retries: None,
            default_headers: HashMap::new(),
            user_agent: format!("overgrad-sync/{}", env!("CARGO_PKG_VERSION")),
        }
    }
}

impl HttpClientConfig {
    /// Create a new config builder
    pub fn builder() -> HttpClientConfigBuilder {
        HttpClientConfigBuilder::default()
    }
}

/// Builder for HTTP client config
#[derive(Default)]
pub struct HttpClientConfigBuilder {
    config: HttpClientConfig,
}

impl HttpClientConfigBuilder {
    /// Set the base URL
    pub fn base_url(mut self, url: impl Into<String>) -> Self {
        self.config.base_url = url.into();
        self
    }

    /// Set the request timeout
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.config.timeout = timeout;
        self
    }

    /// Set the connect timeout
    pub fn connect_timeout(mut self, timeout: Duration) -> Self {
        self.config.connect_timeout = timeout;
        self
    }

    /// Set the wait between connection retries
    pub fn connect_retry_delay(mut self, delay: Duration) -> Self {
        self.config.connect_retry_delay = delay;
        self
    }

    /// Cap connection retries
    pub fn max_connect_retries(mut self, retries: u32) -> Self {
        self.config.max_connect_retries = Some(retries);
        self
    }

    /// Authenticate with an Overgrad API key
    pub fn api_key(self, key: impl Into<String>) -> Self {
        self.header(API_KEY_HEADER, key)
    }

    /// Add a default header
    pub fn header(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.config.default_headers.insert(key.into(), value.into());
        self
    }

    /// Set user agent
    pub fn user_agent(mut self, agent: impl Into<String>) -> Self {
        self.config.user_agent = agent.into();
        self
    }

    /// Build the config
    pub fn build(self) -> HttpClientConfig {
        self.config
    }
}

/// HTTP client shared by the paged and lookup fetchers
#[derive(Clone)]
pub struct HttpClient {
    client: Client,
    config: HttpClientConfig,
    /// Earliest instant the next paced request may start
    next_paced: Arc<Mutex<Option<Instant>>>,
}

impl HttpClient {
    /// Create a new HTTP client with custom configuration
    pub fn with_config(config: HttpClientConfig) -> Result<Self> {
        let client = Client::builder()
            .read_timeout(config.timeout)
            .connect_timeout(config.connect_timeout)
            .user_agent(&config.user_agent)
            .build()?;

        Ok(Self {
            client,
            config,
            next_paced: Arc::new(Mutex::new(None)),
        })
    }

    /// Get the client configuration
    pub fn config(&self) -> &HttpClientConfig {
        &self.config
    }

    /// Issue one GET and parse the JSON body, retrying connection failures.
    ///
    /// `path` is joined onto the base URL unless it is already absolute.
    pub async fn get_json(&self, path: &str) -> Result<JsonValue> {
        let url = self.build_url(path);
        let mut attempt: u32 = 0;

        loop {
            let mut req = self.client.get(&url);
            for (key, value) in &self.config.default_headers {
                req = req.header(key.as_str(), value.as_str());
            }

            match req.send().await {
                Ok(response) => {
                    let status = response.status();
                    if !status.is_success() {
                        let body = response.text().await.unwrap_or_default();
                        return Err(Error::remote_api(&url, status.as_u16(), body));
                    }

                    debug!("GET {} -> {}", url, status.as_u16());
                    return response
                        .json::<JsonValue>()
                        .await
                        .map_err(|e| Error::decode(format!("Invalid JSON from {url}: {e}")));
                }
                Err(e) if is_connectivity_error(&e) => {
                    attempt += 1;
                    if self
                        .config
                        .max_connect_retries
                        .is_some_and(|max| attempt > max)
                    {
                        return Err(Error::transient(&url, error_chain(&e)));
                    }
                    warn!(
                        "Connection error on {}, attempt {}, retrying in {:?}: {}",
                        url,
                        attempt,
                        self.config.connect_retry_delay,
                        error_chain(&e)
                    );
                    tokio::time::sleep(self.config.connect_retry_delay).await;
                }
                Err(e) => return Err(Error::Http(e)),
            }
        }
    }

    /// Wait until at least `gap` has passed since the previous paced request.
    ///
    /// Slots are reserved under the lock, so clones of this client used one
    /// after another (or concurrently) never issue paced requests closer
    /// together than `gap`.
    pub async fn pace(&self, gap: Duration) {
        let wait_until = {
            let mut next = self.next_paced.lock().await;
            let now = Instant::now();
            let start = next.map_or(now, |at| at.max(now));
            *next = Some(start + gap);
            start
        };

        let wait = wait_until.saturating_duration_since(Instant::now());
        if !wait.is_zero() {
            debug!("Pacing: waiting {:?}", wait);
            tokio::time::sleep(wait).await;
        }
    }

    /// Build full URL from path
    pub fn build_url(&self, path: &str) -> String {
        if path.starts_with("http://") || path.starts_with("https://") {
            return path.to_string();
        }

        let base = self.config.base_url.trim_end_matches('/');
        let path = path.trim_start_matches('/');
        format!("{base}/{path}")
    }
}

impl std::fmt::Debug for HttpClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpClient")
            .field("base_url", &self.config.base_url)
            .field("timeout", &self.config.timeout)
            .field("connect_timeout", &self.config.connect_timeout)
            .field("connect_retry_delay", &self.config.connect_retry_delay)
            .finish_non_exhaustive()
    }
}

/// Connection refused, reset, or timed out. Only called for errors from
/// `send()`, so a timeout here means no response was received.
fn is_connectivity_error(err: &reqwest::Error) -> bool {
    if err.is_connect() || err.is_timeout() {
        return true;
    }
    if !err.is_request() {
        return false;
    }

    let mut source = std::error::Error::source(err);
    while let Some(inner) = source {
        if let Some(io) = inner.downcast_ref::<std::io::Error>() {
            return matches!(
                io.kind(),
                ErrorKind::ConnectionReset | ErrorKind::ConnectionAborted | ErrorKind::BrokenPipe
            );
        }
        source = inner.source();
    }
    false
}
