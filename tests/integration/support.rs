//! Stub generation engines for integration tests

use async_trait::async_trait;
use postflow::engine::{EngineStep, GenerationEngine, StateDelta};
use postflow::error::EngineError;
use postflow::workflow::WorkflowState;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

/// Drafts "<topic> #<iterations>" and publishes with a fixed image url.
pub struct StubEngine;

#[async_trait]
impl GenerationEngine for StubEngine {
    async fn invoke(&self, state: &WorkflowState) -> Result<StateDelta, EngineError> {
        Ok(match EngineStep::for_state(state) {
            EngineStep::Draft | EngineStep::Revise => StateDelta {
                generated_content: Some(format!("{} #{}", state.topic, state.iterations)),
                image_prompt: Some(format!("picture of {}", state.topic)),
                image_url: None,
            },
            EngineStep::Publish => StateDelta {
                generated_content: state.generated_content.clone(),
                image_prompt: None,
                image_url: Some("https://img.example/1.png".to_string()),
            },
        })
    }

    fn name(&self) -> &str {
        "stub"
    }
}

/// Returns an empty delta for every step.
pub struct EmptyEngine;

#[async_trait]
impl GenerationEngine for EmptyEngine {
    async fn invoke(&self, _state: &WorkflowState) -> Result<StateDelta, EngineError> {
        Ok(StateDelta::default())
    }

    fn name(&self) -> &str {
        "empty"
    }
}

/// Fails every step with a request error.
pub struct FailingEngine;

#[async_trait]
impl GenerationEngine for FailingEngine {
    async fn invoke(&self, _state: &WorkflowState) -> Result<StateDelta, EngineError> {
        Err(EngineError::Request("model unavailable".to_string()))
    }

    fn name(&self) -> &str {
        "failing"
    }
}

/// Sleeps before delegating to [`StubEngine`].
pub struct SlowEngine {
    pub delay: Duration,
}

#[async_trait]
impl GenerationEngine for SlowEngine {
    async fn invoke(&self, state: &WorkflowState) -> Result<StateDelta, EngineError> {
        tokio::time::sleep(self.delay).await;
        StubEngine.invoke(state).await
    }

    fn name(&self) -> &str {
        "slow"
    }
}

/// Fails the first `failures` calls, then behaves like [`StubEngine`].
pub struct FlakyEngine {
    failures: usize,
    calls: AtomicUsize,
}

impl FlakyEngine {
    pub fn new(failures: usize) -> Self {
        Self {
            failures,
            calls: AtomicUsize::new(0),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl GenerationEngine for FlakyEngine {
    async fn invoke(&self, state: &WorkflowState) -> Result<StateDelta, EngineError> {
        let call = self.calls.fetch_add(1, Ordering::SeqCst);
        if call < self.failures {
            return Err(EngineError::Request(format!("attempt {} failed", call + 1)));
        }
        StubEngine.invoke(state).await
    }

    fn name(&self) -> &str {
        "flaky"
    }
}

/// Drafts like [`StubEngine`] but returns `reply` for one step.
pub struct StepOverrideEngine {
    pub step: EngineStep,
    pub reply: StateDelta,
}

#[async_trait]
impl GenerationEngine for StepOverrideEngine {
    async fn invoke(&self, state: &WorkflowState) -> Result<StateDelta, EngineError> {
        if EngineStep::for_state(state) == self.step {
            return Ok(self.reply.clone());
        }
        StubEngine.invoke(state).await
    }

    fn name(&self) -> &str {
        "step-override"
    }
}
