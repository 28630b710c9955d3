//! Incremental sync state
//!
//! Remembers when each endpoint last synced successfully, so the next
//! incremental run can ask the API only for records updated since then.
//!
//! # Overview
//!
//! The state module provides:
//! - `State` - per-endpoint sync timestamps, persisted as JSON
//! - `StateManager` - file-based persistence with atomic writes

mod manager;
mod types;

pub use manager::StateManager;
pub use types::{EndpointState, State};

#[cfg(test)]
mod manager_tests;
