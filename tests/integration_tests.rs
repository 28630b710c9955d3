//! Integration tests using a mock HTTP server
//!
//! Tests the full flow: catalog → paged HTTP requests → transform → ndjson
//! objects on disk, and warehouse diff → cascading delete.

use overgrad_sync::endpoint::{EndpointCatalog, STUDENTS};
use overgrad_sync::engine::{SyncConfig, SyncEngine};
use overgrad_sync::http::{HttpClient, HttpClientConfig, RateLimiterConfig};
use overgrad_sync::output::{ObjectStoreSink, StorageSink};
use overgrad_sync::pagination::PageConfig;
use overgrad_sync::state::StateManager;
use overgrad_sync::warehouse::{DuckDbWarehouse, WarehouseTables};
use serde_json::{json, Value};
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use tempfile::TempDir;
use wiremock::matchers::{header, method, path, query_param, query_param_is_missing};
use wiremock::{Mock, MockServer, ResponseTemplate};

const API_KEY: &str = "test-key";

fn client_for(server: &MockServer) -> HttpClient {
    let config = HttpClientConfig::builder()
        .base_url(server.uri())
        .api_key(API_KEY)
        .connect_retry_delay(Duration::from_millis(5))
        .build();
    HttpClient::with_config(config).unwrap()
}

fn config(page_size: u32) -> SyncConfig {
    SyncConfig::new()
        .with_grad_years([2025])
        .with_page_config(
            PageConfig::default()
                .with_page_size(page_size)
                .with_page_delay(Duration::ZERO),
        )
        .with_lookup_rate_limit(RateLimiterConfig::unlimited())
}

fn local_sink(dir: &TempDir) -> Arc<dyn StorageSink> {
    Arc::new(ObjectStoreSink::parse(dir.path().to_str().unwrap()).unwrap())
}

fn engine(server: &MockServer, dir: &TempDir, catalog: EndpointCatalog, config: SyncConfig) -> SyncEngine {
    SyncEngine::new(
        client_for(server),
        catalog,
        local_sink(dir),
        StateManager::in_memory(),
    )
    .with_config(config)
}

fn read_lines(path: &Path) -> Vec<Value> {
    std::fs::read_to_string(path)
        .unwrap()
        .split('\n')
        .map(|line| serde_json::from_str(line).unwrap())
        .collect()
}

fn count_files(dir: &Path) -> usize {
    if !dir.exists() {
        return 0;
    }
    std::fs::read_dir(dir)
        .unwrap()
        .map(|entry| {
            let path = entry.unwrap().path();
            if path.is_dir() {
                count_files(&path)
            } else {
                1
            }
        })
        .sum()
}

// ============================================================================
// Sync Flow Tests
// ============================================================================

#[tokio::test]
async fn test_single_student_end_to_end() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/students"))
        .and(header("ApiKey", API_KEY))
        .and(query_param("graduation_year", "2025"))
        .and(query_param("limit", "100"))
        .and(query_param_is_missing("page"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": [{
                "id": 42,
                "object": "student",
                "first_name": "Grace",
                "graduation_year": 2025,
                "school": {"id": 9, "name": "West"},
                "academics": {"weighted_gpa": 3.7},
                "unexpected": "dropped"
            }],
            "total_count": 1,
            "total_pages": 1
        })))
        .expect(1)
        .mount(&server)
        .await;

    let dir = TempDir::new().unwrap();
    let catalog = EndpointCatalog::builtin().unwrap();
    let students = catalog.require(STUDENTS).unwrap().clone();
    let mut engine = engine(&server, &dir, catalog, config(100));

    let summary = engine.sync(&[STUDENTS.to_string()]).await.unwrap();
    assert_eq!(summary.total_records(), 1);

    let object = dir.path().join("overgrad/students/2025/student__42.ndjson");
    assert!(object.exists());
    assert_eq!(count_files(dir.path()), 1);
    assert!(!dir.path().join("overgrad/student_custom_fields").exists());

    let lines = read_lines(&object);
    assert_eq!(lines.len(), 1);
    let record = lines[0].as_object().unwrap();
    assert_eq!(record.len(), students.fields.len());
    assert_eq!(record["school_name"], "West");
    assert_eq!(record["academics_weighted_gpa"], 3.7);
    assert_eq!(record["email"], Value::Null);
    assert!(!record.contains_key("unexpected"));
}

#[tokio::test]
async fn test_multi_page_sync_writes_every_record() {
    let server = MockServer::start().await;
    let pages: [(Option<u32>, Vec<u64>); 3] = [(None, vec![1, 2]), (Some(2), vec![3, 4]), (Some(3), vec![5])];
    for (page, ids) in pages {
        let data: Vec<Value> = ids.iter().map(|id| json!({"id": id, "name": "S"})).collect();
        let mock = Mock::given(method("GET"))
            .and(path("/schools"))
            .and(query_param("limit", "2"));
        let mock = match page {
            None => mock.and(query_param_is_missing("page")),
            Some(n) => mock.and(query_param("page", n.to_string())),
        };
        mock.respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": data,
            "total_count": 5,
            "total_pages": 3
        })))
        .expect(1)
        .mount(&server)
        .await;
    }

    let dir = TempDir::new().unwrap();
    let mut engine = engine(&server, &dir, EndpointCatalog::builtin().unwrap(), config(2));
    let summary = engine.sync(&["schools".to_string()]).await.unwrap();

    assert_eq!(summary.total_records(), 5);
    assert_eq!(count_files(&dir.path().join("overgrad/schools")), 5);
    assert!(dir.path().join("overgrad/schools/school__5.ndjson").exists());
}

#[tokio::test]
async fn test_custom_catalog_with_custom_fields() {
    let catalog = EndpointCatalog::from_yaml_str(
        r"
endpoints:
  - name: students
    folder: kids
    file_name_prefix: kid_
    has_grad_year: true
    date_filter: true
    fields: [id, first_name]
    custom_field:
      field_name: custom_field_values
      folder: kid_fields
      file_name_prefix: kid_field_
      fields: [id, custom_field_id, value]
",
    )
    .unwrap();

    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/students"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": [{
                "id": "s-1",
                "first_name": "Lin",
                "custom_field_values": [
                    {"custom_field_id": 8, "multiselect": ["x", "y"]}
                ]
            }],
            "total_count": 1,
            "total_pages": 1
        })))
        .mount(&server)
        .await;

    let dir = TempDir::new().unwrap();
    let mut engine = engine(&server, &dir, catalog, config(100));
    let summary = engine.sync(&[]).await.unwrap();

    let stats = &summary.endpoints[0];
    assert_eq!(stats.records, 1);
    assert_eq!(stats.custom_field_rows, 2);

    let rows = read_lines(&dir.path().join("overgrad/kid_fields/2025/kid_field__s-1.ndjson"));
    assert_eq!(
        rows,
        vec![
            json!({"id": "s-1", "custom_field_id": 8, "value": "x"}),
            json!({"id": "s-1", "custom_field_id": 8, "value": "y"}),
        ]
    );
    let record = read_lines(&dir.path().join("overgrad/kids/2025/kid__s-1.ndjson"));
    assert_eq!(record, vec![json!({"id": "s-1", "first_name": "Lin"})]);
}

// ============================================================================
// Reconciliation Flow Tests
// ============================================================================

#[tokio::test]
async fn test_reconcile_deletes_only_missing_student() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/students"))
        .and(query_param("graduation_year", "2025"))
        .and(query_param_is_missing("updated_after"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": [{"id": 1}, {"id": 3}],
            "total_count": 2,
            "total_pages": 1
        })))
        .expect(1)
        .mount(&server)
        .await;

    let dir = TempDir::new().unwrap();
    let stored = [
        "overgrad/students/2025/student__1.ndjson",
        "overgrad/students/2025/student__2.ndjson",
        "overgrad/students/2025/student__3.ndjson",
        "overgrad/student_custom_fields/2025/student_custom_field__2.ndjson",
        "overgrad/admissions/2025/admission__20.ndjson",
        "overgrad/admissions/2025/admission__21.ndjson",
        "overgrad/admissions/2025/admission__30.ndjson",
        "overgrad/followings/2025/following__40.ndjson",
    ];
    for object in stored {
        let path = dir.path().join(object);
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(path, "{}").unwrap();
    }

    let warehouse = DuckDbWarehouse::open(None, WarehouseTables::default()).unwrap();
    warehouse
        .execute_batch(
            "CREATE TABLE stg_og__students (overgrad_student_id BIGINT, graduation_year INTEGER);
             CREATE TABLE stg_og__admissions (overgrad_application_id BIGINT, overgrad_student_id BIGINT);
             CREATE TABLE stg_og__followings (overgrad_following_id BIGINT, overgrad_student_id BIGINT);
             INSERT INTO stg_og__students VALUES (1, 2025), (2, 2025), (3, 2025);
             INSERT INTO stg_og__admissions VALUES (20, 2), (21, 2), (30, 3);
             INSERT INTO stg_og__followings VALUES (40, 2);",
        )
        .unwrap();

    let mut engine = engine(&server, &dir, EndpointCatalog::builtin().unwrap(), config(100));
    let summary = engine
        .reconcile(Arc::new(warehouse), &[STUDENTS.to_string()])
        .await
        .unwrap();

    let stats = &summary.endpoints[0];
    assert_eq!(stats.missing, 1);
    assert_eq!(stats.deleted, 5);

    let remaining = [
        "overgrad/students/2025/student__1.ndjson",
        "overgrad/students/2025/student__3.ndjson",
        "overgrad/admissions/2025/admission__30.ndjson",
    ];
    for object in remaining {
        assert!(dir.path().join(object).exists(), "{object} should remain");
    }
    assert_eq!(count_files(dir.path()), remaining.len());
}
