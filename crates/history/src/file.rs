//! Directory-backed history store
//!
//! One JSON file per task, named after a hash of the task identity so that
//! arbitrary identities map to safe file names. Files are replaced with a
//! write-to-temp-then-rename, so readers never see a partial record.

use crate::{ExecutionHistoryStore, PreviousExecutionRecord};
use serde::{Deserialize, Serialize};
use stamp_core::{Error, HashAlgorithm, Result, TaskIdentity, HISTORY_FILE_EXTENSION};
use stamp_utils::write_atomic;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tracing::{debug, instrument, warn};

#[derive(Serialize, Deserialize)]
struct HistoryEnvelope {
    task: TaskIdentity,
    record: PreviousExecutionRecord,
}

#[derive(Debug, Clone)]
pub struct FileHistoryStore {
    dir: PathBuf,
}

impl FileHistoryStore {
    /// Store rooted at `dir`; the directory is created on first write
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// File holding the record of `task`
    pub fn record_path(&self, task: &TaskIdentity) -> PathBuf {
        let name = HashAlgorithm::Sha256
            .hash_bytes(task.as_str().as_bytes())
            .to_hex();
        self.dir.join(format!("{name}.{HISTORY_FILE_EXTENSION}"))
    }

    fn read_record(&self, task: &TaskIdentity) -> Result<Option<PreviousExecutionRecord>> {
        let path = self.record_path(task);
        let content = match fs::read(&path) {
            Ok(content) => content,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(Error::file_system(&path, "read history record", e)),
        };

        let envelope: HistoryEnvelope = serde_json::from_slice(&content)
            .map_err(|e| Error::history_corruption(task.as_str(), e.to_string()))?;

        if envelope.task != *task {
            return Err(Error::history_corruption(
                task.as_str(),
                format!("record belongs to '{}'", envelope.task),
            ));
        }
        Ok(Some(envelope.record))
    }
}

impl ExecutionHistoryStore for FileHistoryStore {
    #[instrument(skip(self), fields(task = %task))]
    fn load(&self, task: &TaskIdentity) -> Option<PreviousExecutionRecord> {
        match self.read_record(task) {
            Ok(record) => record,
            Err(e) => {
                warn!(error = %e, "ignoring unreadable execution history");
                None
            }
        }
    }

    #[instrument(skip(self, record), fields(task = %task))]
    fn store(&self, task: &TaskIdentity, record: PreviousExecutionRecord) -> Result<()> {
        let envelope = HistoryEnvelope {
            task: task.clone(),
            record,
        };
        let content = serde_json::to_vec_pretty(&envelope)
            .map_err(|e| Error::json("failed to serialize execution history", e))?;
        let path = self.record_path(task);
        write_atomic(&path, &content)?;
        debug!(path = %path.display(), "stored execution history");
        Ok(())
    }

    fn remove(&self, task: &TaskIdentity) -> Result<()> {
        let path = self.record_path(task);
        match fs::remove_file(&path) {
            Ok(()) => {
                debug!(task = %task, "removed execution history");
                Ok(())
            }
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(Error::file_system(&path, "remove history record", e)),
        }
    }
}
