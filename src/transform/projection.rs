//! Field projection

use crate::types::{JsonValue, Record};
use std::collections::BTreeSet;

/// Project `record` onto exactly `fields`: missing fields become null and
/// fields outside the set are dropped.
pub fn project_fields(mut record: Record, fields: &BTreeSet<String>) -> Record {
    fields
        .iter()
        .map(|field| {
            let value = record.remove(field).unwrap_or(JsonValue::Null);
            (field.clone(), value)
        })
        .collect()
}
