//! Per-thread single-writer guard.

use crate::types::ThreadId;
use parking_lot::Mutex;
use std::collections::HashSet;
use std::sync::Arc;

/// Threads with a step currently running. Claims are only visible to
/// holders of this value and its clones, not across processes or
/// separately constructed sets.
#[derive(Debug, Default, Clone)]
pub struct InFlight {
    threads: Arc<Mutex<HashSet<ThreadId>>>,
}

impl InFlight {
    pub fn new() -> Self {
        Self::default()
    }

    /// Claim `thread_id`; `None` when another step already holds it.
    pub fn try_acquire(&self, thread_id: ThreadId) -> Option<InFlightGuard> {
        if self.threads.lock().insert(thread_id) {
            Some(InFlightGuard {
                threads: self.threads.clone(),
                thread_id,
            })
        } else {
            None
        }
    }

}

/// Releases the claim on drop, including when the step future is dropped.
#[derive(Debug)]
pub struct InFlightGuard {
    threads: Arc<Mutex<HashSet<ThreadId>>>,
    thread_id: ThreadId,
}

impl Drop for InFlightGuard {
    fn drop(&mut self) {
        self.threads.lock().remove(&self.thread_id);
    }
}
