//! Record transform
//!
//! Turns one raw API record into the stored record plus its custom field rows:
//!
//! 1. Flatten configured sub-objects into `{key}_{inner}` keys
//! 2. Pop the custom field array and explode it into rows
//! 3. Project the record onto the endpoint's allowed field set

mod custom_fields;
mod flatten;
mod projection;

pub use custom_fields::{extract_custom_fields, CUSTOM_FIELD_ID, MULTISELECT};
pub use flatten::flatten_nested;
pub use projection::project_fields;

use crate::endpoint::EndpointDescriptor;
use crate::error::{Error, Result};
use crate::types::{record_id, JsonValue, Record};

/// Output of transforming one record
#[derive(Debug, Clone, PartialEq)]
pub struct TransformedRecord {
    /// Record id as used in object paths
    pub id: String,
    /// Projected record
    pub record: Record,
    /// Custom field rows keyed by the parent id; empty when there are none
    pub custom_field_rows: Vec<Record>,
}

/// Flatten, split off custom fields, and project one record
pub fn transform_record(endpoint: &EndpointDescriptor, mut record: Record) -> Result<TransformedRecord> {
    let id = record_id(&record).ok_or_else(|| Error::MissingRecordId {
        endpoint: endpoint.name.clone(),
    })?;
    let parent_id = record.get("id").cloned().unwrap_or(JsonValue::Null);

    flatten_nested(&mut record, &endpoint.nested_fields);

    let custom_field_rows = match &endpoint.custom_field {
        Some(descriptor) => extract_custom_fields(&mut record, descriptor, &parent_id),
        None => Vec::new(),
    };

    Ok(TransformedRecord {
        id,
        record: project_fields(record, &endpoint.fields),
        custom_field_rows,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::endpoint::{EndpointCatalog, STUDENTS};
    use pretty_assertions::assert_eq;
    use serde_json::json;
    use std::collections::BTreeSet;

    fn students() -> EndpointDescriptor {
        EndpointCatalog::builtin()
            .unwrap()
            .require(STUDENTS)
            .unwrap()
            .clone()
    }

    #[test]
    fn test_student_record_end_to_end() {
        let raw = json!({
            "id": 101,
            "object": "student",
            "first_name": "Ada",
            "school": {"id": 3, "name": "North"},
            "assigned_counselor": null,
            "academics": {"weighted_gpa": 4.1, "unknown_metric": 1},
            "custom_field_values": [
                {"custom_field_id": 1, "multiselect": ["x", "y"]},
                {"custom_field_id": 2, "date": "2024-01-01"}
            ],
            "brand_new_api_field": "ignored"
        });
        let out = transform_record(&students(), raw.as_object().cloned().unwrap()).unwrap();

        assert_eq!(out.id, "101");
        assert_eq!(out.record["school_name"], "North");
        assert_eq!(out.record["academics_weighted_gpa"], 4.1);
        assert_eq!(out.record["assigned_counselor_email"], JsonValue::Null);
        assert!(!out.record.contains_key("brand_new_api_field"));
        assert!(!out.record.contains_key("academics_unknown_metric"));
        assert!(!out.record.contains_key("custom_field_values"));

        let keys: BTreeSet<String> = out.record.keys().cloned().collect();
        assert_eq!(keys, students().fields);

        assert_eq!(out.custom_field_rows.len(), 3);
        assert!(out.custom_field_rows.iter().all(|row| row["id"] == 101));
    }

    #[test]
    fn test_record_without_id_is_rejected() {
        let raw = json!({"first_name": "NoId"});
        let err = transform_record(&students(), raw.as_object().cloned().unwrap()).unwrap_err();
        assert!(matches!(err, Error::MissingRecordId { .. }));
    }

    #[test]
    fn test_every_builtin_endpoint_projects_exactly() {
        let catalog = EndpointCatalog::builtin().unwrap();
        for endpoint in catalog.endpoints() {
            let raw = json!({"id": "abc", "extra": 1, "object": "thing"});
            let out = transform_record(endpoint, raw.as_object().cloned().unwrap()).unwrap();
            let keys: BTreeSet<String> = out.record.keys().cloned().collect();
            assert_eq!(keys, endpoint.fields, "endpoint {}", endpoint.name);
            assert!(out.custom_field_rows.is_empty());
        }
    }
}
