//! Workflow state record: the persisted snapshot of one generation attempt.

use crate::engine::StateDelta;
use crate::types::ThreadId;
use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};

/// Position of a thread in the workflow state machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    Generating,
    AwaitingReview,
    Publishing,
    Done,
    /// Only reported by [`ThreadStatus`]; a failed step never persists it.
    Failed,
}

impl Phase {
    pub fn as_str(self) -> &'static str {
        match self {
            Phase::Generating => "generating",
            Phase::AwaitingReview => "awaiting_review",
            Phase::Publishing => "publishing",
            Phase::Done => "done",
            Phase::Failed => "failed",
        }
    }

    pub fn is_terminal(self) -> bool {
        self == Phase::Done
    }
}

/// A human decision that resumes a paused thread.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Decision {
    Approve,
    Revise { feedback: String },
}

impl Decision {
    pub fn revise(feedback: impl Into<String>) -> Self {
        Decision::Revise {
            feedback: feedback.into(),
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Decision::Approve => "approve",
            Decision::Revise { .. } => "revise",
        }
    }
}

/// Full snapshot of one thread.
///
/// `approved` and `feedback` double as instructions to the generation
/// engine: `approved == Some(true)` asks it to publish, a present
/// `feedback` asks it to revise, neither asks for a first draft.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkflowState {
    pub thread_id: ThreadId,
    pub topic: String,
    pub iterations: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub generated_content: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_prompt: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub approved: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub feedback: Option<String>,
    pub phase: Phase,
    pub version: u64,
    pub created_at: String,
    pub updated_at: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub published_at: Option<String>,
}

impl WorkflowState {
    /// Initial snapshot for a freshly started thread.
    pub fn new(thread_id: ThreadId, topic: impl Into<String>) -> Self {
        let now = timestamp(Utc::now());
        Self {
            thread_id,
            topic: topic.into(),
            iterations: 0,
            generated_content: None,
            image_prompt: None,
            image_url: None,
            approved: None,
            feedback: None,
            phase: Phase::Generating,
            version: 0,
            created_at: now.clone(),
            updated_at: now,
            published_at: None,
        }
    }

    pub fn has_content(&self) -> bool {
        self.generated_content
            .as_deref()
            .is_some_and(|c| !c.trim().is_empty())
    }

    /// Merge an engine delta; absent fields keep their current value.
    pub fn apply(&mut self, delta: StateDelta) {
        if let Some(content) = delta.generated_content {
            self.generated_content = Some(content);
        }
        if let Some(prompt) = delta.image_prompt {
            self.image_prompt = Some(prompt);
        }
        if let Some(url) = delta.image_url {
            self.image_url = Some(url);
        }
    }

    /// Stamp the snapshot as the next persisted version.
    pub(crate) fn advance_version(&mut self) {
        self.version += 1;
        self.updated_at = timestamp(Utc::now());
    }

    pub(crate) fn mark_published(&mut self) {
        self.published_at = Some(timestamp(Utc::now()));
    }
}

/// Snapshot plus the orchestrator's view of the last step's outcome.
#[derive(Debug, Clone)]
pub struct ThreadStatus {
    pub snapshot: WorkflowState,
    pub phase: Phase,
    pub last_error: Option<String>,
}

fn timestamp(at: DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Millis, true)
}
