//! Common types used throughout overgrad-sync
//!
//! This module contains shared type definitions, type aliases,
//! and utility types used across multiple modules.

use serde::{Deserialize, Serialize};

// ============================================================================
// Type Aliases
// ============================================================================

/// JSON value type (re-exported from serde_json)
pub type JsonValue = serde_json::Value;

/// JSON object type
pub type JsonObject = serde_json::Map<String, JsonValue>;

/// One API entity as delivered on the wire
pub type Record = JsonObject;

// ============================================================================
// Record Identity
// ============================================================================

/// Render an id value the way it appears in object paths and warehouse
/// id sets. Strings pass through; integers are printed in decimal.
pub fn id_to_string(value: &JsonValue) -> Option<String> {
    match value {
        JsonValue::String(s) if !s.is_empty() => Some(s.clone()),
        JsonValue::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

/// Extract a record's `id` as a string
pub fn record_id(record: &Record) -> Option<String> {
    record.get("id").and_then(id_to_string)
}

// ============================================================================
// Error Handling Strategy
// ============================================================================

/// What the orchestrator does when one endpoint fails
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "snake_case")]
pub enum ErrorStrategy {
    /// Abort the run on the first endpoint failure
    #[default]
    Fail,
    /// Log the failure and continue with the next endpoint
    Skip,
}
