//! Generation Engine
//!
//! The external capability that drafts, revises, and publishes content. The
//! orchestrator hands an engine the full current snapshot; the engine reads
//! `approved` and `feedback` to decide which step to run and answers with a
//! [`StateDelta`] that the orchestrator merges and persists.

use crate::error::EngineError;
use crate::workflow::WorkflowState;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

pub mod llm;

pub use llm::{LlmEngine, Publisher, WebhookPublisher};

/// Fields an engine step may fill in. Absent fields are left untouched.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StateDelta {
    #[serde(default)]
    pub generated_content: Option<String>,
    #[serde(default)]
    pub image_prompt: Option<String>,
    #[serde(default)]
    pub image_url: Option<String>,
}

impl StateDelta {
    pub fn content(content: impl Into<String>) -> Self {
        Self {
            generated_content: Some(content.into()),
            ..Self::default()
        }
    }

    pub fn has_content(&self) -> bool {
        self.generated_content
            .as_deref()
            .is_some_and(|c| !c.trim().is_empty())
    }
}

/// Which step a snapshot asks the engine to run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EngineStep {
    Draft,
    Revise,
    Publish,
}

impl EngineStep {
    pub fn for_state(state: &WorkflowState) -> Self {
        if state.approved == Some(true) {
            EngineStep::Publish
        } else if state.feedback.is_some() {
            EngineStep::Revise
        } else {
            EngineStep::Draft
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            EngineStep::Draft => "draft",
            EngineStep::Revise => "revise",
            EngineStep::Publish => "publish",
        }
    }
}

/// Generation engine trait
#[async_trait]
pub trait GenerationEngine: Send + Sync {
    /// Run the step the snapshot asks for.
    async fn invoke(&self, state: &WorkflowState) -> Result<StateDelta, EngineError>;

    /// Engine name for logs.
    fn name(&self) -> &str;
}

#[async_trait]
impl<E: GenerationEngine + ?Sized> GenerationEngine for std::sync::Arc<E> {
    async fn invoke(&self, state: &WorkflowState) -> Result<StateDelta, EngineError> {
        (**self).invoke(state).await
    }

    fn name(&self) -> &str {
        (**self).name()
    }
}
