//! Session Router
//!
//! Maps a caller session to its active thread so a caller can resume a
//! workflow without carrying the thread id around. Keyed per session; there
//! is no process-global "current" thread.

use crate::error::StorageError;
use crate::types::{SessionKey, ThreadId};
use parking_lot::RwLock;
use sled::{Db, Tree};
use std::collections::HashMap;

const TREE_SESSIONS: &str = "active_sessions";

pub trait SessionRouter: Send + Sync {
    fn set_active(&self, session: &SessionKey, thread_id: ThreadId) -> Result<(), StorageError>;

    fn get_active(&self, session: &SessionKey) -> Result<Option<ThreadId>, StorageError>;

    /// Forget the session's thread; returns the thread it pointed at.
    fn clear_active(&self, session: &SessionKey) -> Result<Option<ThreadId>, StorageError>;
}

impl<R: SessionRouter + ?Sized> SessionRouter for std::sync::Arc<R> {
    fn set_active(&self, session: &SessionKey, thread_id: ThreadId) -> Result<(), StorageError> {
        (**self).set_active(session, thread_id)
    }

    fn get_active(&self, session: &SessionKey) -> Result<Option<ThreadId>, StorageError> {
        (**self).get_active(session)
    }

    fn clear_active(&self, session: &SessionKey) -> Result<Option<ThreadId>, StorageError> {
        (**self).clear_active(session)
    }
}

#[derive(Debug, Default)]
pub struct InMemorySessionRouter {
    active: RwLock<HashMap<SessionKey, ThreadId>>,
}

impl InMemorySessionRouter {
    pub fn new() -> Self {
        Self::default()
    }
}

impl SessionRouter for InMemorySessionRouter {
    fn set_active(&self, session: &SessionKey, thread_id: ThreadId) -> Result<(), StorageError> {
        self.active.write().insert(session.clone(), thread_id);
        Ok(())
    }

    fn get_active(&self, session: &SessionKey) -> Result<Option<ThreadId>, StorageError> {
        Ok(self.active.read().get(session).copied())
    }

    fn clear_active(&self, session: &SessionKey) -> Result<Option<ThreadId>, StorageError> {
        Ok(self.active.write().remove(session))
    }
}

/// Session router persisted next to the thread store, so a later process
/// resumes the same thread.
#[derive(Clone)]
pub struct SledSessionRouter {
    sessions: Tree,
}

impl SledSessionRouter {
    pub fn new(db: &Db) -> Result<Self, StorageError> {
        Ok(Self {
            sessions: db.open_tree(TREE_SESSIONS)?,
        })
    }
}

impl SessionRouter for SledSessionRouter {
    fn set_active(&self, session: &SessionKey, thread_id: ThreadId) -> Result<(), StorageError> {
        self.sessions
            .insert(session.as_str().as_bytes(), thread_id.as_bytes().to_vec())?;
        self.sessions.flush()?;
        Ok(())
    }

    fn get_active(&self, session: &SessionKey) -> Result<Option<ThreadId>, StorageError> {
        let Some(raw) = self.sessions.get(session.as_str().as_bytes())? else {
            return Ok(None);
        };
        decode_thread_id(&raw).map(Some)
    }

    fn clear_active(&self, session: &SessionKey) -> Result<Option<ThreadId>, StorageError> {
        let Some(raw) = self.sessions.remove(session.as_str().as_bytes())? else {
            return Ok(None);
        };
        self.sessions.flush()?;
        decode_thread_id(&raw).map(Some)
    }
}

fn decode_thread_id(raw: &[u8]) -> Result<ThreadId, StorageError> {
    ThreadId::from_slice(raw)
        .ok_or_else(|| StorageError::Data(format!("invalid thread id ({} bytes)", raw.len())))
}
