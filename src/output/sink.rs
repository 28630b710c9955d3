//! Storage sink interface and ndjson encoding

use crate::error::Result;
use crate::types::Record;
use async_trait::async_trait;
use bytes::Bytes;

/// Top-level folder of every object written by the sync
pub const STORAGE_ROOT: &str = "overgrad";

/// Build an object path: `overgrad/{folder}/{year?}/{prefix}_{id}.ndjson`
pub fn object_path(folder: &str, grad_year: Option<u16>, prefix: &str, id: &str) -> String {
    match grad_year {
        Some(year) => format!("{STORAGE_ROOT}/{folder}/{year}/{prefix}_{id}.ndjson"),
        None => format!("{STORAGE_ROOT}/{folder}/{prefix}_{id}.ndjson"),
    }
}

/// Serialize records as newline-delimited JSON, one object per line
pub fn encode_ndjson(records: &[Record]) -> Result<Bytes> {
    let lines = records
        .iter()
        .map(serde_json::to_string)
        .collect::<std::result::Result<Vec<_>, _>>()?;
    Ok(Bytes::from(lines.join("\n")))
}

/// What happened when an object was deleted
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeleteOutcome {
    /// The object existed and was removed
    Deleted,
    /// Nothing was stored at that path
    NotFound,
}

impl DeleteOutcome {
    /// Whether an object was actually removed
    pub fn is_deleted(&self) -> bool {
        matches!(self, Self::Deleted)
    }
}

/// Object storage used as the data lake
#[async_trait]
pub trait StorageSink: Send + Sync {
    /// Write (or overwrite) one object
    async fn write(&self, path: &str, data: Bytes) -> Result<()>;

    /// Delete one object. An absent object is reported, not raised.
    async fn delete(&self, path: &str) -> Result<DeleteOutcome>;

    /// Write records as one ndjson object
    async fn write_records(&self, path: &str, records: &[Record]) -> Result<()> {
        let data = encode_ndjson(records)?;
        self.write(path, data).await
    }
}
