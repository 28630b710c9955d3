//! Custom field extraction
//!
//! A record carries its custom field values as an array of entries such as
//! `{"custom_field_id": 5, "number": 3}` or `{"custom_field_id": 6,
//! "multiselect": ["a", "b"]}`. Each entry becomes one row per value:
//! `{<join key>: parent_id, custom_field_id, value_type, value}`.

use crate::endpoint::CustomFieldDescriptor;
use crate::types::{JsonValue, Record};
use tracing::debug;

/// Key identifying which custom field an entry belongs to
pub const CUSTOM_FIELD_ID: &str = "custom_field_id";

/// Value type whose value is a list exploded into one row per element
pub const MULTISELECT: &str = "multiselect";

/// Pop the custom field array off `record` and explode it into rows.
///
/// Rows keep only the descriptor's allowed fields. An absent or null array
/// yields no rows.
pub fn extract_custom_fields(
    record: &mut Record,
    descriptor: &CustomFieldDescriptor,
    parent_id: &JsonValue,
) -> Vec<Record> {
    let entries = match record.remove(&descriptor.field_name) {
        Some(JsonValue::Array(entries)) => entries,
        Some(JsonValue::Null) | None => return Vec::new(),
        Some(other) => {
            debug!(
                "Ignoring non-array '{}' value: {}",
                descriptor.field_name, other
            );
            return Vec::new();
        }
    };

    let mut rows = Vec::new();
    for entry in entries {
        let JsonValue::Object(mut entry) = entry else {
            continue;
        };
        let field_id = entry.remove(CUSTOM_FIELD_ID).unwrap_or(JsonValue::Null);

        for (value_type, value) in entry {
            let values = if value_type == MULTISELECT {
                match value {
                    JsonValue::Array(items) => items,
                    JsonValue::Null => Vec::new(),
                    single => vec![single],
                }
            } else {
                vec![value]
            };

            for value in values {
                let mut row = Record::new();
                row.insert(descriptor.join_key.clone(), parent_id.clone());
                row.insert(CUSTOM_FIELD_ID.to_string(), field_id.clone());
                row.insert("value_type".to_string(), JsonValue::String(value_type.clone()));
                row.insert("value".to_string(), value);
                row.retain(|key, _| descriptor.fields.contains(key));
                rows.push(row);
            }
        }
    }
    rows
}
