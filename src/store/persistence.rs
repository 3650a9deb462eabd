//! Durable sled-backed thread store.

use crate::error::StorageError;
use crate::store::{sort_newest_first, ThreadStore};
use crate::types::ThreadId;
use crate::workflow::WorkflowState;
use sled::{Db, Tree};
use std::path::Path;

const TREE_THREADS: &str = "workflow_threads";

/// Snapshots are stored as JSON so the layout stays readable and tolerant of
/// added fields across versions.
#[derive(Clone)]
pub struct SledThreadStore {
    db: Db,
    threads: Tree,
}

impl SledThreadStore {
    /// Open (or create) a sled database at `path`.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, StorageError> {
        let db = sled::open(path)
            .map_err(|e| StorageError::Io(format!("Failed to open sled database: {}", e)))?;
        Self::new(db)
    }

    pub fn new(db: Db) -> Result<Self, StorageError> {
        let threads = db.open_tree(TREE_THREADS)?;
        Ok(Self { db, threads })
    }

    /// Get the underlying sled database (shared with the session router)
    pub fn db(&self) -> &Db {
        &self.db
    }
}

impl ThreadStore for SledThreadStore {
    fn get(&self, thread_id: &ThreadId) -> Result<Option<WorkflowState>, StorageError> {
        let Some(raw) = self.threads.get(thread_id.as_bytes())? else {
            return Ok(None);
        };
        Ok(Some(serde_json::from_slice(&raw)?))
    }

    fn put(&self, state: &WorkflowState) -> Result<(), StorageError> {
        let value = serde_json::to_vec(state)?;
        self.threads.insert(state.thread_id.as_bytes(), value)?;
        self.threads.flush()?;
        Ok(())
    }

    fn remove(&self, thread_id: &ThreadId) -> Result<Option<WorkflowState>, StorageError> {
        let Some(raw) = self.threads.remove(thread_id.as_bytes())? else {
            return Ok(None);
        };
        self.threads.flush()?;
        Ok(Some(serde_json::from_slice(&raw)?))
    }

    fn list(&self) -> Result<Vec<WorkflowState>, StorageError> {
        let mut out = Vec::new();
        for result in self.threads.iter() {
            let (_, value) = result?;
            out.push(serde_json::from_slice(&value)?);
        }
        sort_newest_first(&mut out);
        Ok(out)
    }
}
