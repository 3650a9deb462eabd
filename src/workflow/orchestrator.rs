//! Workflow orchestrator: the thread state machine.
//!
//! Every step follows the same shape: claim the thread, load its snapshot,
//! build the candidate state the engine should see, invoke the engine, and
//! write the merged result. The store write is the last operation of a
//! successful step, so a failed step leaves the previous snapshot in place.

use crate::engine::{EngineStep, GenerationEngine, StateDelta};
use crate::error::{EngineError, WorkflowError};
use crate::store::ThreadStore;
use crate::types::ThreadId;
use crate::workflow::guard::{InFlight, InFlightGuard};
use crate::workflow::state::{Decision, Phase, ThreadStatus, WorkflowState};
use parking_lot::Mutex;
use std::collections::HashMap;
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

/// Upper bound on remembered step failures; an arbitrary entry is evicted
/// when a new thread fails at the limit.
const MAX_RECORDED_FAILURES: usize = 1024;

/// Drives threads through the generation engine.
///
/// The per-thread in-flight guard lives in this value, so all steps for a
/// given store must go through one `Orchestrator` (share it behind an `Arc`).
/// Two orchestrators over the same store do not see each other's claims.
pub struct Orchestrator<S, E> {
    store: S,
    engine: E,
    in_flight: InFlight,
    failures: Mutex<HashMap<ThreadId, String>>,
    engine_timeout: Option<Duration>,
}

impl<S: ThreadStore, E: GenerationEngine> Orchestrator<S, E> {
    pub const DEFAULT_ENGINE_TIMEOUT: Duration = Duration::from_secs(120);

    pub fn new(store: S, engine: E) -> Self {
        Self::with_engine_timeout(store, engine, Some(Self::DEFAULT_ENGINE_TIMEOUT))
    }

    pub fn with_engine_timeout(store: S, engine: E, engine_timeout: Option<Duration>) -> Self {
        Self {
            store,
            engine,
            in_flight: InFlight::new(),
            failures: Mutex::new(HashMap::new()),
            engine_timeout,
        }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn engine(&self) -> &E {
        &self.engine
    }

    /// Create a thread for `topic` in the `Generating` phase.
    pub fn start(&self, topic: &str) -> Result<ThreadId, WorkflowError> {
        let topic = topic.trim();
        if topic.is_empty() {
            return Err(WorkflowError::Validation(
                "Please provide a topic.".to_string(),
            ));
        }

        let thread_id = ThreadId::new();
        let state = WorkflowState::new(thread_id, topic);
        self.store.put(&state)?;
        info!(thread_id = %thread_id, topic = %topic, "thread started");
        Ok(thread_id)
    }

    /// Run the draft step of a thread that is still `Generating`.
    pub async fn generate(&self, thread_id: ThreadId) -> Result<WorkflowState, WorkflowError> {
        let _guard = self.claim(thread_id)?;
        let state = self.load(thread_id)?;
        if state.phase != Phase::Generating {
            return Err(WorkflowError::Precondition(format!(
                "thread is {}, not generating",
                state.phase.as_str()
            )));
        }

        let delta = self.invoke(&state).await?;
        let mut next = state;
        self.require_content(thread_id, &delta)?;
        next.apply(delta);
        next.phase = Phase::AwaitingReview;
        self.commit(next, "draft ready for review")
    }

    /// `start` followed by `generate`.
    pub async fn start_and_generate(&self, topic: &str) -> Result<WorkflowState, WorkflowError> {
        let thread_id = self.start(topic)?;
        self.generate(thread_id).await
    }

    pub fn get_snapshot(&self, thread_id: ThreadId) -> Result<WorkflowState, WorkflowError> {
        self.load(thread_id)
    }

    /// Snapshot plus the outcome of the thread's last step.
    pub fn status(&self, thread_id: ThreadId) -> Result<ThreadStatus, WorkflowError> {
        let snapshot = self.load(thread_id)?;
        let last_error = self.failures.lock().get(&thread_id).cloned();
        let phase = if last_error.is_some() {
            Phase::Failed
        } else {
            snapshot.phase
        };
        Ok(ThreadStatus {
            snapshot,
            phase,
            last_error,
        })
    }

    /// All persisted threads, newest first.
    /// Failures of threads missing from the listing are dropped.
    pub fn threads(&self) -> Result<Vec<WorkflowState>, WorkflowError> {
        let threads = self.store.list()?;
        self.failures
            .lock()
            .retain(|id, _| threads.iter().any(|s| s.thread_id == *id));
        Ok(threads)
    }

    /// Apply a human decision to a thread awaiting review.
    pub async fn decide(
        &self,
        thread_id: ThreadId,
        decision: Decision,
    ) -> Result<WorkflowState, WorkflowError> {
        if let Decision::Revise { ref feedback } = decision {
            if feedback.trim().is_empty() {
                return Err(WorkflowError::Validation(
                    "Revision feedback must not be empty.".to_string(),
                ));
            }
        }

        let _guard = self.claim(thread_id)?;
        let state = self.load(thread_id)?;
        check_reviewable(&state)?;
        info!(thread_id = %thread_id, decision = decision.name(), "decision received");

        match decision {
            Decision::Approve => {
                let mut candidate = state;
                candidate.approved = Some(true);
                candidate.feedback = None;
                candidate.phase = Phase::Publishing;

                let delta = self.invoke(&candidate).await?;
                let mut next = candidate;
                next.apply(delta);
                if !next.has_content() {
                    return Err(self.incomplete(thread_id));
                }
                next.phase = Phase::Done;
                next.mark_published();
                self.commit(next, "post published")
            }
            Decision::Revise { feedback } => {
                let mut candidate = state;
                candidate.approved = Some(false);
                candidate.feedback = Some(feedback.trim().to_string());
                candidate.iterations += 1;
                candidate.phase = Phase::Generating;

                let delta = self.invoke(&candidate).await?;
                self.require_content(thread_id, &delta)?;
                let mut next = candidate;
                next.apply(delta);
                next.approved = None;
                next.feedback = None;
                next.phase = Phase::AwaitingReview;
                self.commit(next, "revised draft ready for review")
            }
        }
    }

    fn claim(&self, thread_id: ThreadId) -> Result<InFlightGuard, WorkflowError> {
        self.in_flight.try_acquire(thread_id).ok_or_else(|| {
            warn!(thread_id = %thread_id, "rejected concurrent operation");
            WorkflowError::Conflict(thread_id)
        })
    }

    fn load(&self, thread_id: ThreadId) -> Result<WorkflowState, WorkflowError> {
        match self.store.get(&thread_id)? {
            Some(state) => Ok(state),
            None => {
                self.failures.lock().remove(&thread_id);
                Err(WorkflowError::NotFound(thread_id))
            }
        }
    }

    async fn invoke(&self, candidate: &WorkflowState) -> Result<StateDelta, WorkflowError> {
        let thread_id = candidate.thread_id;
        let step = EngineStep::for_state(candidate);
        let started = Instant::now();
        debug!(
            thread_id = %thread_id,
            step = step.as_str(),
            engine = self.engine.name(),
            "invoking generation engine"
        );

        let result = match self.engine_timeout {
            Some(limit) => match tokio::time::timeout(limit, self.engine.invoke(candidate)).await {
                Ok(result) => result,
                Err(_) => Err(EngineError::Timeout(limit)),
            },
            None => self.engine.invoke(candidate).await,
        };

        match result {
            Ok(delta) => {
                debug!(
                    thread_id = %thread_id,
                    step = step.as_str(),
                    duration_ms = started.elapsed().as_millis() as u64,
                    "engine step completed"
                );
                Ok(delta)
            }
            Err(err) => {
                let err = WorkflowError::Engine {
                    thread_id,
                    message: err.to_string(),
                };
                self.record_failure(thread_id, &err);
                Err(err)
            }
        }
    }

    fn require_content(&self, thread_id: ThreadId, delta: &StateDelta) -> Result<(), WorkflowError> {
        if delta.has_content() {
            return Ok(());
        }
        Err(self.incomplete(thread_id))
    }

    fn incomplete(&self, thread_id: ThreadId) -> WorkflowError {
        let err = WorkflowError::GenerationIncomplete { thread_id };
        self.record_failure(thread_id, &err);
        err
    }

    fn commit(&self, mut next: WorkflowState, message: &str) -> Result<WorkflowState, WorkflowError> {
        let thread_id = next.thread_id;
        next.advance_version();
        if let Err(err) = self.store.put(&next) {
            let err = WorkflowError::from(err);
            self.record_failure(thread_id, &err);
            return Err(err);
        }
        self.failures.lock().remove(&thread_id);
        info!(
            thread_id = %thread_id,
            phase = next.phase.as_str(),
            iterations = next.iterations,
            version = next.version,
            "{}",
            message
        );
        Ok(next)
    }

    fn record_failure(&self, thread_id: ThreadId, err: &WorkflowError) {
        warn!(thread_id = %thread_id, error = %err, "workflow step failed");
        let mut failures = self.failures.lock();
        if failures.len() >= MAX_RECORDED_FAILURES && !failures.contains_key(&thread_id) {
            if let Some(evicted) = failures.keys().next().copied() {
                failures.remove(&evicted);
            }
        }
        failures.insert(thread_id, err.to_string());
    }
}

fn check_reviewable(state: &WorkflowState) -> Result<(), WorkflowError> {
    if state.phase.is_terminal() {
        return Err(WorkflowError::Precondition(
            "thread is already published".to_string(),
        ));
    }
    if state.phase != Phase::AwaitingReview {
        return Err(WorkflowError::Precondition(format!(
            "thread is {}, not awaiting review",
            state.phase.as_str()
        )));
    }
    if !state.has_content() {
        return Err(WorkflowError::Precondition(
            "no generated content to review".to_string(),
        ));
    }
    Ok(())
}
