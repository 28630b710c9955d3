//! Reconciliation types

use serde::Serialize;
use std::collections::HashSet;
use std::fmt;

/// A student missing from the API, with the dependents to remove alongside it
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DeleteRecord {
    pub student_id: String,
    pub admission_ids: Vec<String>,
    pub following_ids: Vec<String>,
}

/// Where a reconciliation run currently is
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ReconcilePhase {
    #[default]
    Idle,
    FetchingWarehouseIds,
    EnumeratingApi,
    Diffing,
    DeletingCascade,
    Done,
}

impl fmt::Display for ReconcilePhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Idle => "idle",
            Self::FetchingWarehouseIds => "fetching_warehouse_ids",
            Self::EnumeratingApi => "enumerating_api",
            Self::Diffing => "diffing",
            Self::DeletingCascade => "deleting_cascade",
            Self::Done => "done",
        };
        f.write_str(name)
    }
}

/// Outcome of reconciling one endpoint for one graduation year
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ReconcileReport {
    pub endpoint: String,
    pub grad_year: u16,
    /// Ids the warehouse knows for the scope
    pub warehouse_count: usize,
    /// Ids the API returned for the scope
    pub api_count: usize,
    /// Warehouse ids absent from the API, sorted
    pub missing: Vec<String>,
    /// Objects removed from storage
    pub deleted: u64,
    /// Deletes that found nothing stored
    pub not_found: u64,
}

/// Ids present in the warehouse but not in the API, sorted
pub fn diff_ids(warehouse: &HashSet<String>, api: &HashSet<String>) -> Vec<String> {
    let mut missing: Vec<String> = warehouse.difference(api).cloned().collect();
    missing.sort();
    missing
}
