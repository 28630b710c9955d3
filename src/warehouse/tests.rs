//! Tests for the DuckDB warehouse

use super::*;
use crate::endpoint::{ADMISSIONS, FOLLOWINGS, STUDENTS};
use crate::error::Error;
use pretty_assertions::assert_eq;

const SEED: &str = r"
CREATE TABLE stg_og__students (overgrad_student_id BIGINT, graduation_year INTEGER);
CREATE TABLE stg_og__admissions (overgrad_application_id BIGINT, overgrad_student_id BIGINT);
CREATE TABLE stg_og__followings (overgrad_following_id BIGINT, overgrad_student_id BIGINT);

INSERT INTO stg_og__students VALUES (1, 2025), (2, 2025), (3, 2025), (4, 2026), (NULL, 2025);
INSERT INTO stg_og__admissions VALUES (10, 2), (11, 2), (12, 1), (13, 4);
INSERT INTO stg_og__followings VALUES (20, 2), (21, 3);
";

fn seeded(tables: WarehouseTables) -> DuckDbWarehouse {
    let warehouse = DuckDbWarehouse::open(None, tables).unwrap();
    warehouse.execute_batch(SEED).unwrap();
    warehouse
}

fn set(ids: &[&str]) -> HashSet<String> {
    ids.iter().map(ToString::to_string).collect()
}

#[tokio::test]
async fn test_student_scope_ids() {
    let warehouse = seeded(WarehouseTables::default());
    warehouse.check_connection().unwrap();

    let ids = warehouse.scope_ids(STUDENTS, 2025).await.unwrap();
    assert_eq!(ids, set(&["1", "2", "3"]));

    let ids = warehouse.scope_ids(STUDENTS, 2030).await.unwrap();
    assert!(ids.is_empty());
}

#[tokio::test]
async fn test_child_scope_joins_on_student_grad_year() {
    let warehouse = seeded(WarehouseTables::default());

    let admissions = warehouse.scope_ids(ADMISSIONS, 2025).await.unwrap();
    assert_eq!(admissions, set(&["10", "11", "12"]));

    let followings = warehouse.scope_ids(FOLLOWINGS, 2026).await.unwrap();
    assert!(followings.is_empty());
}

#[tokio::test]
async fn test_student_children() {
    let warehouse = seeded(WarehouseTables::default());

    assert_eq!(warehouse.admission_ids("2").await.unwrap(), vec!["10", "11"]);
    assert_eq!(warehouse.following_ids("2").await.unwrap(), vec!["20"]);
    assert!(warehouse.following_ids("1").await.unwrap().is_empty());
}

#[tokio::test]
async fn test_dataset_qualified_tables() {
    let warehouse =
        DuckDbWarehouse::open(None, WarehouseTables::new(None, Some("raw".to_string()))).unwrap();
    warehouse
        .execute_batch(
            "CREATE SCHEMA raw;
             CREATE TABLE raw.stg_og__students (overgrad_student_id VARCHAR, graduation_year INTEGER);
             INSERT INTO raw.stg_og__students VALUES ('abc', 2025);",
        )
        .unwrap();

    let ids = warehouse.scope_ids(STUDENTS, 2025).await.unwrap();
    assert_eq!(ids, set(&["abc"]));
}

#[tokio::test]
async fn test_missing_table_is_warehouse_error() {
    let warehouse = DuckDbWarehouse::open(None, WarehouseTables::default()).unwrap();
    let err = warehouse.scope_ids(STUDENTS, 2025).await.unwrap_err();
    assert!(matches!(err, Error::Warehouse { .. }));
}

#[tokio::test]
async fn test_file_backed_warehouse() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("warehouse.duckdb");
    {
        let warehouse = DuckDbWarehouse::open(Some(&path), WarehouseTables::default()).unwrap();
        warehouse.execute_batch(SEED).unwrap();
    }

    let warehouse = DuckDbWarehouse::open(Some(&path), WarehouseTables::default()).unwrap();
    let ids = warehouse.scope_ids(STUDENTS, 2026).await.unwrap();
    assert_eq!(ids, set(&["4"]));
}
