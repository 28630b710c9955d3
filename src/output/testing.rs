//! Recording sink for unit tests

use super::{DeleteOutcome, StorageSink};
use crate::error::Result;
use async_trait::async_trait;
use bytes::Bytes;
use std::collections::BTreeMap;
use std::sync::Mutex;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SinkOp {
    Write(String),
    Delete(String),
}

/// In-memory sink that remembers every call in order
#[derive(Debug, Default)]
pub struct RecordingSink {
    objects: Mutex<BTreeMap<String, Bytes>>,
    ops: Mutex<Vec<SinkOp>>,
}

impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Pre-populate objects without recording the writes
    pub fn with_objects<I, S>(paths: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let objects = paths
            .into_iter()
            .map(|path| (path.into(), Bytes::from_static(b"{}")))
            .collect();
        Self {
            objects: Mutex::new(objects),
            ops: Mutex::default(),
        }
    }

    pub fn ops(&self) -> Vec<SinkOp> {
        self.ops.lock().unwrap().clone()
    }

    pub fn writes(&self) -> Vec<String> {
        self.ops()
            .into_iter()
            .filter_map(|op| match op {
                SinkOp::Write(path) => Some(path),
                SinkOp::Delete(_) => None,
            })
            .collect()
    }

    pub fn deletes(&self) -> Vec<String> {
        self.ops()
            .into_iter()
            .filter_map(|op| match op {
                SinkOp::Delete(path) => Some(path),
                SinkOp::Write(_) => None,
            })
            .collect()
    }

    pub fn object(&self, path: &str) -> Option<Bytes> {
        self.objects.lock().unwrap().get(path).cloned()
    }

    /// Decode a stored ndjson object into its lines
    pub fn lines(&self, path: &str) -> Vec<serde_json::Value> {
        let Some(data) = self.object(path) else {
            return Vec::new();
        };
        std::str::from_utf8(&data)
            .unwrap()
            .split('\n')
            .map(|line| serde_json::from_str(line).unwrap())
            .collect()
    }
}

#[async_trait]
impl StorageSink for RecordingSink {
    async fn write(&self, path: &str, data: Bytes) -> Result<()> {
        self.ops.lock().unwrap().push(SinkOp::Write(path.to_string()));
        self.objects.lock().unwrap().insert(path.to_string(), data);
        Ok(())
    }

    async fn delete(&self, path: &str) -> Result<DeleteOutcome> {
        self.ops.lock().unwrap().push(SinkOp::Delete(path.to_string()));
        let removed = self.objects.lock().unwrap().remove(path);
        Ok(if removed.is_some() {
            DeleteOutcome::Deleted
        } else {
            DeleteOutcome::NotFound
        })
    }
}
