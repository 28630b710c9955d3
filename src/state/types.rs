//! State types for tracking sync progress
//!
//! These types are serialized to JSON and persisted between runs.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Sync state for every endpoint
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct State {
    /// Per-endpoint state
    #[serde(default)]
    pub endpoints: BTreeMap<String, EndpointState>,
}

impl State {
    /// Create a new empty state
    pub fn new() -> Self {
        Self::default()
    }

    /// Get state for an endpoint
    pub fn get_endpoint(&self, endpoint: &str) -> Option<&EndpointState> {
        self.endpoints.get(endpoint)
    }

    /// Get mutable state for an endpoint, creating if needed
    pub fn get_endpoint_mut(&mut self, endpoint: &str) -> &mut EndpointState {
        self.endpoints.entry(endpoint.to_string()).or_default()
    }

    /// When the endpoint last synced successfully
    pub fn last_synced_at(&self, endpoint: &str) -> Option<DateTime<Utc>> {
        self.endpoints.get(endpoint)?.last_synced_at
    }

    /// Record a successful sync
    pub fn mark_synced(&mut self, endpoint: &str, at: DateTime<Utc>, records: u64) {
        let state = self.get_endpoint_mut(endpoint);
        state.last_synced_at = Some(at);
        state.last_record_count = records;
    }
}

/// State for a single endpoint
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EndpointState {
    /// Start time of the last successful sync
    #[serde(default)]
    pub last_synced_at: Option<DateTime<Utc>>,

    /// Records loaded by that sync
    #[serde(default)]
    pub last_record_count: u64,
}

impl EndpointState {
    /// Date to pass as `updated_after` on the next incremental run
    pub fn updated_after(&self) -> Option<NaiveDate> {
        self.last_synced_at.map(|at| at.date_naive())
    }
}
