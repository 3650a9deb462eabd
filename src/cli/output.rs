//! CLI output: error mapping from domain errors to stable CLI surface.

use crate::error::{ConfigError, StorageError, WorkflowError};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum CliError {
    #[error("No active post for session '{0}'")]
    NoActiveThread(String),

    #[error("Invalid thread id '{0}'")]
    InvalidThreadId(String),

    #[error(transparent)]
    Workflow(#[from] WorkflowError),

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("Runtime error: {0}")]
    Runtime(String),
}

impl From<StorageError> for CliError {
    fn from(err: StorageError) -> Self {
        CliError::Workflow(err.into())
    }
}

/// Map errors to a human-readable message for CLI output.
pub fn map_error(e: &CliError) -> String {
    match e {
        CliError::NoActiveThread(_) | CliError::Workflow(WorkflowError::NotFound(_)) => {
            "No active post found. Start a new one with `postflow start <topic>`.".to_string()
        }
        CliError::Workflow(WorkflowError::Validation(msg)) => msg.clone(),
        CliError::Workflow(WorkflowError::Precondition(msg)) => {
            format!("Cannot do that now: {}.", msg)
        }
        CliError::Workflow(WorkflowError::Engine { message, .. }) => {
            format!("Error generating post. Please try again. ({})", message)
        }
        CliError::Workflow(WorkflowError::GenerationIncomplete { .. }) => {
            "The generator did not produce any content. Please try again.".to_string()
        }
        CliError::Workflow(WorkflowError::Conflict(_)) => {
            "Another operation is already running for this post. Try again shortly.".to_string()
        }
        other => other.to_string(),
    }
}
