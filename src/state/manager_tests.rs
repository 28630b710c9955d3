//! Tests for StateManager

use super::*;
use chrono::{NaiveDate, TimeZone, Utc};
use tempfile::tempdir;

fn at(day: u32) -> chrono::DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 5, day, 8, 30, 0).unwrap()
}

// ============================================================================
// Construction Tests
// ============================================================================

#[test]
fn test_state_manager_new() {
    let manager = StateManager::new("/tmp/overgrad-state.json");
    assert!(!manager.is_in_memory());
    assert_eq!(manager.path().to_str().unwrap(), "/tmp/overgrad-state.json");
}

#[test]
fn test_state_manager_in_memory() {
    let manager = StateManager::in_memory();
    assert!(manager.is_in_memory());
}

#[test]
fn test_from_missing_file_is_empty() {
    let dir = tempdir().unwrap();
    let manager = StateManager::from_file(dir.path().join("nope.json")).unwrap();
    assert!(!manager.is_in_memory());
}

#[test]
fn test_from_corrupt_file_fails() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("state.json");
    std::fs::write(&path, "not json").unwrap();

    let err = StateManager::from_file(&path).unwrap_err();
    assert!(err.to_string().contains("Failed to parse state file"));
}

// ============================================================================
// Sync Timestamp Tests
// ============================================================================

#[tokio::test]
async fn test_mark_synced() {
    let manager = StateManager::in_memory();
    assert!(manager.last_synced_at("students").await.is_none());
    assert!(manager.updated_after("students").await.is_none());

    manager.mark_synced("students", at(2), 40).await.unwrap();

    assert_eq!(manager.last_synced_at("students").await, Some(at(2)));
    assert_eq!(
        manager.updated_after("students").await,
        NaiveDate::from_ymd_opt(2024, 5, 2)
    );
    assert!(manager.last_synced_at("admissions").await.is_none());
}

#[tokio::test]
async fn test_mark_synced_overwrites() {
    let manager = StateManager::in_memory();
    manager.mark_synced("students", at(1), 1).await.unwrap();
    manager.mark_synced("students", at(9), 2).await.unwrap();

    let snapshot = manager.snapshot().await;
    let endpoint = snapshot.get_endpoint("students").unwrap();
    assert_eq!(endpoint.last_synced_at, Some(at(9)));
    assert_eq!(endpoint.last_record_count, 2);
}

#[tokio::test]
async fn test_clear_endpoint() {
    let manager = StateManager::in_memory();
    manager.mark_synced("students", at(1), 1).await.unwrap();
    manager.mark_synced("schools", at(1), 1).await.unwrap();

    manager.clear_endpoint("students").await.unwrap();

    assert!(manager.last_synced_at("students").await.is_none());
    assert!(manager.last_synced_at("schools").await.is_some());
}

// ============================================================================
// Persistence Tests
// ============================================================================

#[tokio::test]
async fn test_auto_save_and_reload() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("state.json");

    let manager = StateManager::new(&path);
    manager.mark_synced("admissions", at(3), 7).await.unwrap();
    assert!(path.exists());
    assert!(!path.with_extension("tmp").exists());

    let reloaded = StateManager::from_file(&path).unwrap();
    assert_eq!(reloaded.last_synced_at("admissions").await, Some(at(3)));
}

#[tokio::test]
async fn test_in_memory_save_is_noop() {
    let manager = StateManager::in_memory();
    manager.mark_synced("students", at(1), 1).await.unwrap();
    manager.save().await.unwrap();
}

#[tokio::test]
async fn test_clone_shares_state() {
    let manager = StateManager::in_memory();
    let clone = manager.clone();
    clone.mark_synced("students", at(4), 1).await.unwrap();
    assert_eq!(manager.last_synced_at("students").await, Some(at(4)));
}

#[tokio::test]
async fn test_to_json_pretty() {
    let manager = StateManager::in_memory();
    manager.mark_synced("students", at(1), 5).await.unwrap();

    let json = manager.to_json_pretty().await.unwrap();
    let value: serde_json::Value = serde_json::from_str(&json).unwrap();
    assert_eq!(value["endpoints"]["students"]["last_record_count"], 5);
}
