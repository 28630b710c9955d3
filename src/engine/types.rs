//! Engine types
//!
//! Run configuration and the per-endpoint statistics reported at the end.

use crate::error::{Error, Result};
use crate::http::RateLimiterConfig;
use crate::pagination::PageConfig;
use crate::types::ErrorStrategy;
use chrono::{DateTime, NaiveDate, Utc};
use serde::Serialize;

/// Configuration for a run
#[derive(Debug, Clone, Default)]
pub struct SyncConfig {
    /// Graduation years to run grad-year scoped endpoints for
    pub grad_years: Vec<u16>,
    /// Explicit `updated_after` filter; wins over stored state
    pub updated_after: Option<NaiveDate>,
    /// Use each endpoint's last successful sync as `updated_after`
    pub incremental: bool,
    /// What to do when an endpoint fails
    pub error_strategy: ErrorStrategy,
    /// Paged fetch tuning
    pub page_config: PageConfig,
    /// Pacing for the university lookups
    pub lookup_rate_limit: RateLimiterConfig,
}

impl SyncConfig {
    /// Create a new sync config
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set graduation years
    #[must_use]
    pub fn with_grad_years(mut self, years: impl IntoIterator<Item = u16>) -> Self {
        self.grad_years = years.into_iter().collect();
        self
    }

    /// Set an explicit `updated_after` date
    #[must_use]
    pub fn with_updated_after(mut self, date: Option<NaiveDate>) -> Self {
        self.updated_after = date;
        self
    }

    /// Enable incremental mode
    #[must_use]
    pub fn with_incremental(mut self, incremental: bool) -> Self {
        self.incremental = incremental;
        self
    }

    /// Set error strategy
    #[must_use]
    pub fn with_error_strategy(mut self, strategy: ErrorStrategy) -> Self {
        self.error_strategy = strategy;
        self
    }

    /// Set page configuration
    #[must_use]
    pub fn with_page_config(mut self, config: PageConfig) -> Self {
        self.page_config = config;
        self
    }

    /// Set lookup pacing
    #[must_use]
    pub fn with_lookup_rate_limit(mut self, config: RateLimiterConfig) -> Self {
        self.lookup_rate_limit = config;
        self
    }

    /// Graduation years, or an error when a scoped endpoint has none to run
    pub fn require_grad_years(&self, endpoint: &str) -> Result<&[u16]> {
        if self.grad_years.is_empty() {
            return Err(Error::config(format!(
                "endpoint '{endpoint}' is scoped by graduation year but no years were given"
            )));
        }
        Ok(&self.grad_years)
    }
}

/// What a run did
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RunKind {
    Sync,
    Reconcile,
}

/// Counts for one endpoint (and grad year, when scoped)
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct EndpointStats {
    pub endpoint: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub grad_year: Option<u16>,
    /// Records loaded
    pub records: u64,
    /// Custom field rows loaded
    pub custom_field_rows: u64,
    /// Records found missing during reconciliation
    pub missing: u64,
    /// Objects deleted
    pub deleted: u64,
    /// Lookups the API refused
    pub skipped: u64,
    /// Failure message, when the endpoint was skipped
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl EndpointStats {
    /// Empty stats for an endpoint
    pub fn new(endpoint: impl Into<String>, grad_year: Option<u16>) -> Self {
        Self {
            endpoint: endpoint.into(),
            grad_year,
            ..Self::default()
        }
    }

    /// Whether this endpoint failed
    pub fn failed(&self) -> bool {
        self.error.is_some()
    }
}

/// Summary of a whole run, printed as JSON and sent to the notifier
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RunSummary {
    pub kind: RunKind,
    pub started_at: DateTime<Utc>,
    pub finished_at: Option<DateTime<Utc>>,
    pub endpoints: Vec<EndpointStats>,
}

impl RunSummary {
    /// Start a summary now
    pub fn start(kind: RunKind) -> Self {
        Self {
            kind,
            started_at: Utc::now(),
            finished_at: None,
            endpoints: Vec::new(),
        }
    }

    /// Add one endpoint's stats
    pub fn push(&mut self, stats: EndpointStats) {
        self.endpoints.push(stats);
    }

    /// Stamp the finish time
    pub fn finish(&mut self) {
        self.finished_at = Some(Utc::now());
    }

    /// Total records loaded
    pub fn total_records(&self) -> u64 {
        self.endpoints.iter().map(|s| s.records).sum()
    }

    /// Total objects deleted
    pub fn total_deleted(&self) -> u64 {
        self.endpoints.iter().map(|s| s.deleted).sum()
    }

    /// Endpoints that failed and were skipped
    pub fn failures(&self) -> impl Iterator<Item = &EndpointStats> {
        self.endpoints.iter().filter(|s| s.failed())
    }

    /// Stats for one endpoint and grad year
    pub fn get(&self, endpoint: &str, grad_year: Option<u16>) -> Option<&EndpointStats> {
        self.endpoints
            .iter()
            .find(|s| s.endpoint == endpoint && s.grad_year == grad_year)
    }

    /// Serialize as pretty JSON
    pub fn to_json_pretty(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}
