//! Process settings
//!
//! Secrets and destinations come from the environment:
//!
//! | Variable | Meaning |
//! |---|---|
//! | `OVERGRAD_API_KEY` | API key, sent as the `ApiKey` header (required) |
//! | `OVERGRAD_BASE_URL` | API root, default `https://api.overgrad.com/api/v1` |
//! | `BUCKET` | Data lake destination: `gs://`, `s3://`, `r2://`, `az://` or a local path |
//! | `WAREHOUSE_PATH` | DuckDB database file; in-memory when unset |
//! | `WAREHOUSE_PROJECT` / `WAREHOUSE_DATASET` | Staging table qualifiers |
//! | `NOTIFY_WEBHOOK_URL` | Where run notifications are POSTed |
//!
//! Tunables (`OVERGRAD_TIMEOUT_SECS`, `OVERGRAD_PAGE_SIZE`,
//! `OVERGRAD_PAGE_DELAY_MS`, `OVERGRAD_CONNECT_RETRY_SECS`) fall back to the
//! defaults the API is known to tolerate.

use crate::error::{Error, Result};
use crate::http::{HttpClientConfig, DEFAULT_BASE_URL};
use crate::pagination::{PageConfig, DEFAULT_PAGE_DELAY, DEFAULT_PAGE_SIZE};
use crate::warehouse::WarehouseTables;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

// ============================================================================
// Environment Variable Names
// ============================================================================

pub const ENV_API_KEY: &str = "OVERGRAD_API_KEY";
pub const ENV_BASE_URL: &str = "OVERGRAD_BASE_URL";
pub const ENV_BUCKET: &str = "BUCKET";
pub const ENV_WAREHOUSE_PATH: &str = "WAREHOUSE_PATH";
pub const ENV_WAREHOUSE_PROJECT: &str = "WAREHOUSE_PROJECT";
pub const ENV_WAREHOUSE_DATASET: &str = "WAREHOUSE_DATASET";
pub const ENV_NOTIFY_WEBHOOK_URL: &str = "NOTIFY_WEBHOOK_URL";
pub const ENV_TIMEOUT_SECS: &str = "OVERGRAD_TIMEOUT_SECS";
pub const ENV_PAGE_SIZE: &str = "OVERGRAD_PAGE_SIZE";
pub const ENV_PAGE_DELAY_MS: &str = "OVERGRAD_PAGE_DELAY_MS";
pub const ENV_CONNECT_RETRY_SECS: &str = "OVERGRAD_CONNECT_RETRY_SECS";

/// Default request timeout
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

/// Default wait before retrying a failed connection
pub const DEFAULT_CONNECT_RETRY_DELAY: Duration = Duration::from_secs(60);

/// Settings for one process run
#[derive(Clone)]
pub struct Settings {
    pub api_key: String,
    pub base_url: String,
    pub bucket: Option<String>,
    pub warehouse_path: Option<PathBuf>,
    pub warehouse_project: Option<String>,
    pub warehouse_dataset: Option<String>,
    pub notify_webhook_url: Option<String>,
    pub timeout: Duration,
    pub page_size: u32,
    pub page_delay: Duration,
    pub connect_retry_delay: Duration,
}

impl Settings {
    /// Read settings from the process environment
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Read settings through a lookup function; empty values count as unset
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let api_key = get(ENV_API_KEY).ok_or_else(|| Error::missing_field(ENV_API_KEY))?;
        let base_url = get(ENV_BASE_URL).unwrap_or_else(|| DEFAULT_BASE_URL.to_string());
        url::Url::parse(&base_url)?;

        Ok(Self {
            api_key,
            base_url,
            bucket: get(ENV_BUCKET),
            warehouse_path: get(ENV_WAREHOUSE_PATH).map(PathBuf::from),
            warehouse_project: get(ENV_WAREHOUSE_PROJECT),
            warehouse_dataset: get(ENV_WAREHOUSE_DATASET),
            notify_webhook_url: get(ENV_NOTIFY_WEBHOOK_URL),
            timeout: parse_or(ENV_TIMEOUT_SECS, get(ENV_TIMEOUT_SECS), DEFAULT_TIMEOUT.as_secs())
                .map(Duration::from_secs)?,
            page_size: parse_or(ENV_PAGE_SIZE, get(ENV_PAGE_SIZE), DEFAULT_PAGE_SIZE)
                .and_then(|size| match size {
                    0 => Err(Error::config(format!("{ENV_PAGE_SIZE} must be at least 1"))),
                    size => Ok(size),
                })?,
            page_delay: parse_or(
                ENV_PAGE_DELAY_MS,
                get(ENV_PAGE_DELAY_MS),
                DEFAULT_PAGE_DELAY.as_millis() as u64,
            )
            .map(Duration::from_millis)?,
            connect_retry_delay: parse_or(
                ENV_CONNECT_RETRY_SECS,
                get(ENV_CONNECT_RETRY_SECS),
                DEFAULT_CONNECT_RETRY_DELAY.as_secs(),
            )
            .map(Duration::from_secs)?,
        })
    }

    /// Destination bucket, required by commands that touch storage
    pub fn require_bucket(&self) -> Result<&str> {
        self.bucket
            .as_deref()
            .ok_or_else(|| Error::missing_field(ENV_BUCKET))
    }

    /// HTTP client configuration
    pub fn http_config(&self) -> HttpClientConfig {
        HttpClientConfig::builder()
            .base_url(&self.base_url)
            .api_key(&self.api_key)
            .timeout(self.timeout)
            .connect_timeout(self.timeout)
            .connect_retry_delay(self.connect_retry_delay)
            .build()
    }

    /// Paged fetch configuration
    pub fn page_config(&self) -> PageConfig {
        PageConfig::default()
            .with_page_size(self.page_size)
            .with_page_delay(self.page_delay)
    }

    /// Warehouse table naming
    pub fn warehouse_tables(&self) -> WarehouseTables {
        WarehouseTables::new(
            self.warehouse_project.clone(),
            self.warehouse_dataset.clone(),
        )
    }
}

impl std::fmt::Debug for Settings {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Settings")
            .field("api_key", &"<redacted>")
            .field("base_url", &self.base_url)
            .field("bucket", &self.bucket)
            .field("warehouse_path", &self.warehouse_path)
            .field("warehouse_project", &self.warehouse_project)
            .field("warehouse_dataset", &self.warehouse_dataset)
            .field("notify_webhook_url", &self.notify_webhook_url)
            .field("timeout", &self.timeout)
            .field("page_size", &self.page_size)
            .field("page_delay", &self.page_delay)
            .field("connect_retry_delay", &self.connect_retry_delay)
            .finish()
    }
}

fn parse_or<T: FromStr>(key: &str, value: Option<String>, default: T) -> Result<T> {
    match value {
        None => Ok(default),
        Some(raw) => raw
            .trim()
            .parse()
            .map_err(|_| Error::config(format!("{key} has an invalid value: '{raw}'"))),
    }
}
