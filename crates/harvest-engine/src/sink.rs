//! Record persistence.
//!
//! Sinks upsert: handing the same record twice leaves one copy, keyed by
//! [`Record::storage_key`].

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard, PoisonError};

use async_trait::async_trait;
use harvest_core::Record;

use crate::error::EngineError;

#[async_trait]
pub trait RecordSink: Send + Sync {
    /// # Errors
    ///
    /// Returns [`EngineError`] if the record cannot be stored.
    async fn upsert(&self, record: &Record) -> Result<(), EngineError>;
}

/// In-memory sink.
#[derive(Debug, Default)]
pub struct MemorySink {
    records: Mutex<BTreeMap<String, Record>>,
}

impl MemorySink {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, BTreeMap<String, Record>> {
        self.records.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Stored records ordered by storage key.
    #[must_use]
    pub fn records(&self) -> Vec<Record> {
        self.lock().values().cloned().collect()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.lock().len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait]
impl RecordSink for MemorySink {
    async fn upsert(&self, record: &Record) -> Result<(), EngineError> {
        self.lock().insert(record.storage_key(), record.clone());
        Ok(())
    }
}

/// JSON object of `storage_key → record`, rewritten on every upsert through
/// a temporary file and a rename.
pub struct JsonFileSink {
    path: PathBuf,
    records: tokio::sync::Mutex<BTreeMap<String, Record>>,
}

impl JsonFileSink {
    /// Opens the sink, loading records already stored at `path`.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::SinkIo`] if an existing file cannot be read and
    /// [`EngineError::SinkSerialize`] if it is not a record map.
    pub async fn open(path: impl Into<PathBuf>) -> Result<Self, EngineError> {
        let path = path.into();
        let records = match tokio::fs::read(&path).await {
            Ok(bytes) if bytes.iter().all(u8::is_ascii_whitespace) => BTreeMap::new(),
            Ok(bytes) => serde_json::from_slice(&bytes)?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => BTreeMap::new(),
            Err(e) => return Err(sink_io(&path, e)),
        };
        Ok(Self {
            path,
            records: tokio::sync::Mutex::new(records),
        })
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    pub async fn len(&self) -> usize {
        self.records.lock().await.len()
    }

    async fn write(&self, records: &BTreeMap<String, Record>) -> Result<(), EngineError> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| sink_io(parent, e))?;
        }
        let body = serde_json::to_vec_pretty(records)?;
        let tmp = self.path.with_extension("json.tmp");
        tokio::fs::write(&tmp, body)
            .await
            .map_err(|e| sink_io(&tmp, e))?;
        tokio::fs::rename(&tmp, &self.path)
            .await
            .map_err(|e| sink_io(&self.path, e))
    }
}

#[async_trait]
impl RecordSink for JsonFileSink {
    async fn upsert(&self, record: &Record) -> Result<(), EngineError> {
        let mut records = self.records.lock().await;
        records.insert(record.storage_key(), record.clone());
        self.write(&records).await
    }
}

fn sink_io(path: &Path, source: std::io::Error) -> EngineError {
    EngineError::SinkIo {
        path: path.display().to_string(),
        source,
    }
}
