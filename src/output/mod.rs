//! Output module
//!
//! Handles writing records to the data lake and deleting them again.
//!
//! # Overview
//!
//! This module provides:
//! - The `StorageSink` interface used by sync and reconciliation
//! - ndjson encoding and the object path convention
//! - Cloud storage output (S3, R2, GCS, Azure, local)

mod cloud;
mod sink;

pub use cloud::ObjectStoreSink;
pub use sink::{encode_ndjson, object_path, DeleteOutcome, StorageSink, STORAGE_ROOT};

#[cfg(test)]
pub(crate) mod testing;

#[cfg(test)]
mod tests;
