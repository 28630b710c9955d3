//! Nested sub-object flattening

use crate::types::{JsonValue, Record};

/// Replace each configured sub-object with `{key}_{inner}` top-level keys.
///
/// The sub-object key is always removed. Only a non-empty object puts
/// anything back, so an empty or null sub-object leaves no keys behind.
pub fn flatten_nested(record: &mut Record, nested_fields: &[String]) {
    for key in nested_fields {
        let Some(JsonValue::Object(inner)) = record.remove(key) else {
            continue;
        };
        for (inner_key, value) in inner {
            record.insert(format!("{key}_{inner_key}"), value);
        }
    }
}
