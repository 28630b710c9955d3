//! Single-record lookup
//!
//! Fetches `{endpoint}/{id}` for a list of ids. A missing record is logged and
//! skipped so one vanished entity cannot block the rest of the batch.

use crate::error::{Error, Result};
use crate::http::{HttpClient, RateLimiter, RateLimiterConfig};
use crate::types::{JsonValue, Record};
use tracing::{debug, warn};

/// Records fetched by id, plus the ids the server refused
#[derive(Debug, Clone, Default)]
pub struct LookupResult {
    /// Fetched records, in request order
    pub records: Vec<Record>,
    /// Ids answered with a non-success status
    pub skipped: Vec<String>,
}

/// Fetches individual records by id
#[derive(Debug, Clone)]
pub struct RecordFetcher {
    client: HttpClient,
    endpoint: String,
    limiter: RateLimiter,
}

impl RecordFetcher {
    /// Create a lookup fetcher paced by the default rate limit
    pub fn new(client: HttpClient, endpoint: impl Into<String>) -> Self {
        Self::with_rate_limit(client, endpoint, &RateLimiterConfig::default())
    }

    /// Create a lookup fetcher with a custom rate limit
    pub fn with_rate_limit(
        client: HttpClient,
        endpoint: impl Into<String>,
        rate_limit: &RateLimiterConfig,
    ) -> Self {
        Self {
            client,
            endpoint: endpoint.into(),
            limiter: RateLimiter::new(rate_limit),
        }
    }

    /// URL of one record, relative to the API root
    pub fn record_url(&self, id: &str) -> String {
        format!("{}/{id}", self.endpoint)
    }

    /// Fetch one record
    pub async fn fetch(&self, id: &str) -> Result<Record> {
        self.limiter.wait().await;
        let body = self.client.get_json(&self.record_url(id)).await?;
        unwrap_record(body)
    }

    /// Fetch each id in order, skipping ids the server answers with an error status
    pub async fn fetch_all<I, S>(&self, ids: I) -> Result<LookupResult>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut result = LookupResult::default();
        for id in ids {
            let id = id.as_ref();
            match self.fetch(id).await {
                Ok(record) => {
                    debug!("Fetched {} {}", self.endpoint, id);
                    result.records.push(record);
                }
                Err(Error::RemoteApi { status, .. }) => {
                    warn!(
                        "Skipping {} {}: server returned {}",
                        self.endpoint, id, status
                    );
                    result.skipped.push(id.to_string());
                }
                Err(e) => return Err(e),
            }
        }
        Ok(result)
    }
}

/// Accept either a bare record or one wrapped in `{"data": {...}}`
fn unwrap_record(body: JsonValue) -> Result<Record> {
    match body {
        JsonValue::Object(mut map) => match map.remove("data") {
            Some(JsonValue::Object(record)) => Ok(record),
            Some(other) => {
                map.insert("data".to_string(), other);
                Ok(map)
            }
            None => Ok(map),
        },
        other => Err(Error::decode(format!(
            "expected record object, got {other}"
        ))),
    }
}
