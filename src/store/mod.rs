//! Thread Store
//!
//! Persists one [`WorkflowState`] snapshot per thread. Implementations must
//! give read-your-writes consistency per thread; durability is up to the
//! backend ([`InMemoryThreadStore`] lives for the process, [`SledThreadStore`]
//! survives restarts).

pub mod memory;
pub mod persistence;

pub use memory::InMemoryThreadStore;
pub use persistence::SledThreadStore;

use crate::error::StorageError;
use crate::types::ThreadId;
use crate::workflow::WorkflowState;

/// Thread Store interface
pub trait ThreadStore: Send + Sync {
    fn get(&self, thread_id: &ThreadId) -> Result<Option<WorkflowState>, StorageError>;

    /// Replace the snapshot stored under `state.thread_id`.
    fn put(&self, state: &WorkflowState) -> Result<(), StorageError>;

    fn remove(&self, thread_id: &ThreadId) -> Result<Option<WorkflowState>, StorageError>;

    /// All stored snapshots, most recently created first.
    fn list(&self) -> Result<Vec<WorkflowState>, StorageError>;

    /// Partial update: apply `f` to the current snapshot and store the result.
    ///
    /// Returns `None` without writing when the thread does not exist. Not
    /// atomic against other writers of the same thread; callers serialize
    /// per-thread writes themselves.
    fn update(
        &self,
        thread_id: &ThreadId,
        f: &mut dyn FnMut(&mut WorkflowState),
    ) -> Result<Option<WorkflowState>, StorageError> {
        let Some(mut state) = self.get(thread_id)? else {
            return Ok(None);
        };
        f(&mut state);
        self.put(&state)?;
        Ok(Some(state))
    }
}

impl<S: ThreadStore + ?Sized> ThreadStore for std::sync::Arc<S> {
    fn get(&self, thread_id: &ThreadId) -> Result<Option<WorkflowState>, StorageError> {
        (**self).get(thread_id)
    }

    fn put(&self, state: &WorkflowState) -> Result<(), StorageError> {
        (**self).put(state)
    }

    fn remove(&self, thread_id: &ThreadId) -> Result<Option<WorkflowState>, StorageError> {
        (**self).remove(thread_id)
    }

    fn list(&self) -> Result<Vec<WorkflowState>, StorageError> {
        (**self).list()
    }
}

pub(crate) fn sort_newest_first(states: &mut [WorkflowState]) {
    states.sort_by(|a, b| b.created_at.cmp(&a.created_at));
}
