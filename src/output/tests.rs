//! Tests for output module

use super::*;
use bytes::Bytes;
use pretty_assertions::assert_eq;
use serde_json::json;
use test_case::test_case;

fn record(value: serde_json::Value) -> crate::types::Record {
    value.as_object().cloned().unwrap()
}

// ============================================================================
// Path / Encoding Tests
// ============================================================================

#[test_case("students", Some(2025), "student_", "42", "overgrad/students/2025/student__42.ndjson" ; "grad year scoped")]
#[test_case("schools", None, "school_", "7", "overgrad/schools/school__7.ndjson" ; "unscoped")]
#[test_case("custom_field_options", None, "custom_field_", "3", "overgrad/custom_field_options/custom_field__3.ndjson" ; "custom field options")]
fn test_object_path(folder: &str, year: Option<u16>, prefix: &str, id: &str, expected: &str) {
    assert_eq!(object_path(folder, year, prefix, id), expected);
}

#[test]
fn test_encode_ndjson() {
    let records = vec![
        record(json!({"id": 1, "value": "a"})),
        record(json!({"id": 1, "value": null})),
    ];
    let bytes = encode_ndjson(&records).unwrap();
    let text = std::str::from_utf8(&bytes).unwrap();

    let lines: Vec<_> = text.split('\n').collect();
    assert_eq!(lines.len(), 2);
    assert!(!text.ends_with('\n'));
    let first: serde_json::Value = serde_json::from_str(lines[0]).unwrap();
    assert_eq!(first, json!({"id": 1, "value": "a"}));
}

#[test]
fn test_encode_single_record_is_one_line() {
    let bytes = encode_ndjson(&[record(json!({"id": "x"}))]).unwrap();
    assert_eq!(&bytes[..], br#"{"id":"x"}"#);
}

// ============================================================================
// ObjectStoreSink Tests
// ============================================================================

#[tokio::test]
async fn test_in_memory_write_and_read() {
    let sink = ObjectStoreSink::in_memory();
    assert_eq!(sink.scheme(), "memory");
    assert!(!sink.is_cloud());

    sink.write("overgrad/a/b.ndjson", Bytes::from_static(b"{}"))
        .await
        .unwrap();
    let data = sink.read("overgrad/a/b.ndjson").await.unwrap().unwrap();
    assert_eq!(&data[..], b"{}");
    assert!(sink.read("overgrad/a/missing.ndjson").await.unwrap().is_none());
}

#[tokio::test]
async fn test_write_records() {
    let sink = ObjectStoreSink::in_memory();
    sink.write_records("overgrad/x.ndjson", &[record(json!({"id": 1}))])
        .await
        .unwrap();
    let data = sink.read("overgrad/x.ndjson").await.unwrap().unwrap();
    assert_eq!(&data[..], br#"{"id":1}"#);
}

#[tokio::test]
async fn test_delete_missing_object_is_benign() {
    let sink = ObjectStoreSink::in_memory();
    let outcome = sink.delete("overgrad/students/2025/student__9.ndjson").await.unwrap();
    assert_eq!(outcome, DeleteOutcome::NotFound);
    assert!(!outcome.is_deleted());
}

#[tokio::test]
async fn test_delete_existing_object() {
    let sink = ObjectStoreSink::in_memory();
    let path = "overgrad/students/2025/student__9.ndjson";
    sink.write(path, Bytes::from_static(b"{}")).await.unwrap();

    assert_eq!(sink.delete(path).await.unwrap(), DeleteOutcome::Deleted);
    assert_eq!(sink.delete(path).await.unwrap(), DeleteOutcome::NotFound);
}

#[tokio::test]
async fn test_local_filesystem_sink() {
    let temp_dir = tempfile::tempdir().unwrap();
    let root = temp_dir.path().to_str().unwrap();
    let sink = ObjectStoreSink::parse(root).unwrap();
    assert_eq!(sink.scheme(), "file");

    let path = "overgrad/schools/school__1.ndjson";
    sink.write(path, Bytes::from_static(b"{\"id\":1}"))
        .await
        .unwrap();
    assert!(temp_dir.path().join(path).exists());

    assert_eq!(sink.delete(path).await.unwrap(), DeleteOutcome::Deleted);
    assert!(!temp_dir.path().join(path).exists());
    assert_eq!(sink.delete(path).await.unwrap(), DeleteOutcome::NotFound);
}
