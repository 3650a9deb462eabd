//! Error types for the postflow workflow system.
//!
//! Each layer owns its error enum. The orchestrator boundary translates
//! storage and engine failures into [`WorkflowError`] so callers only ever
//! handle one taxonomy.

use crate::types::ThreadId;
use std::time::Duration;
use thiserror::Error;

/// Storage-related errors
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Storage I/O error: {0}")]
    Io(String),

    #[error("Corrupt snapshot data: {0}")]
    Data(String),
}

impl From<sled::Error> for StorageError {
    fn from(err: sled::Error) -> Self {
        StorageError::Io(err.to_string())
    }
}

impl From<serde_json::Error> for StorageError {
    fn from(err: serde_json::Error) -> Self {
        StorageError::Data(err.to_string())
    }
}

/// Errors raised by a generation engine invocation
#[derive(Debug, Error)]
pub enum EngineError {
    #[error("Engine request failed: {0}")]
    Request(String),

    #[error("Engine timed out after {0:?}")]
    Timeout(Duration),

    #[error("Engine returned an invalid response: {0}")]
    InvalidResponse(String),

    #[error("Engine not configured: {0}")]
    NotConfigured(String),
}

/// Errors surfaced by the workflow orchestrator
#[derive(Debug, Error)]
pub enum WorkflowError {
    #[error("Invalid input: {0}")]
    Validation(String),

    #[error("Thread not found: {0}")]
    NotFound(ThreadId),

    #[error("Decision rejected: {0}")]
    Precondition(String),

    #[error("Generation failed for thread {thread_id}: {message}")]
    Engine { thread_id: ThreadId, message: String },

    #[error("Engine produced no content for thread {thread_id}")]
    GenerationIncomplete { thread_id: ThreadId },

    #[error("Thread {0} already has an operation in flight")]
    Conflict(ThreadId),

    #[error("Storage error: {0}")]
    Storage(String),
}

impl WorkflowError {
    /// Whether repeating the same call may succeed without caller changes.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            WorkflowError::Engine { .. }
                | WorkflowError::GenerationIncomplete { .. }
                | WorkflowError::Conflict(_)
                | WorkflowError::Storage(_)
        )
    }

    /// Thread the failure refers to, when there is one.
    pub fn thread_id(&self) -> Option<ThreadId> {
        match self {
            WorkflowError::NotFound(id) | WorkflowError::Conflict(id) => Some(*id),
            WorkflowError::Engine { thread_id, .. }
            | WorkflowError::GenerationIncomplete { thread_id } => Some(*thread_id),
            _ => None,
        }
    }
}

impl From<StorageError> for WorkflowError {
    fn from(err: StorageError) -> Self {
        WorkflowError::Storage(err.to_string())
    }
}

/// Configuration errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to load configuration: {0}")]
    Load(String),

    #[error("Configuration validation failed:\n{0}")]
    Invalid(String),

    #[error("Logging setup failed: {0}")]
    Logging(String),
}

impl From<config::ConfigError> for ConfigError {
    fn from(err: config::ConfigError) -> Self {
        ConfigError::Load(err.to_string())
    }
}
