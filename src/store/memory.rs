//! Process-lifetime thread store.

use crate::error::StorageError;
use crate::store::{sort_newest_first, ThreadStore};
use crate::types::ThreadId;
use crate::workflow::WorkflowState;
use parking_lot::RwLock;
use std::collections::HashMap;

#[derive(Debug, Default)]
pub struct InMemoryThreadStore {
    threads: RwLock<HashMap<ThreadId, WorkflowState>>,
}

impl InMemoryThreadStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.threads.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.threads.read().is_empty()
    }
}

impl ThreadStore for InMemoryThreadStore {
    fn get(&self, thread_id: &ThreadId) -> Result<Option<WorkflowState>, StorageError> {
        Ok(self.threads.read().get(thread_id).cloned())
    }

    fn put(&self, state: &WorkflowState) -> Result<(), StorageError> {
        self.threads.write().insert(state.thread_id, state.clone());
        Ok(())
    }

    fn remove(&self, thread_id: &ThreadId) -> Result<Option<WorkflowState>, StorageError> {
        Ok(self.threads.write().remove(thread_id))
    }

    fn list(&self) -> Result<Vec<WorkflowState>, StorageError> {
        let mut states: Vec<WorkflowState> = self.threads.read().values().cloned().collect();
        sort_newest_first(&mut states);
        Ok(states)
    }
}
