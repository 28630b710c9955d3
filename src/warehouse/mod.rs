//! Warehouse queries used by reconciliation
//!
//! The warehouse holds the downstream view of what has been loaded. Only
//! read-only id lookups are needed:
//!
//! - ids of an endpoint within a graduation year
//! - admission and following ids that belong to one student

mod engine;
mod queries;

#[cfg(test)]
mod tests;

pub use engine::DuckDbWarehouse;
pub use queries::{id_column, WarehouseTables, STAGING_PREFIX, STUDENT_ID_COLUMN};

use crate::error::Result;
use async_trait::async_trait;
use std::collections::HashSet;

/// Read-only id queries against the warehouse
#[async_trait]
pub trait WarehouseQuery: Send + Sync {
    /// Ids of `endpoint` records whose student graduates in `grad_year`
    async fn scope_ids(&self, endpoint: &str, grad_year: u16) -> Result<HashSet<String>>;

    /// Admission ids belonging to a student
    async fn admission_ids(&self, student_id: &str) -> Result<Vec<String>>;

    /// Following ids belonging to a student
    async fn following_ids(&self, student_id: &str) -> Result<Vec<String>>;
}
