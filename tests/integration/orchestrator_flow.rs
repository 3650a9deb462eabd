//! End-to-end orchestrator behavior with stub engines

use crate::integration::support::{
    EmptyEngine, FailingEngine, FlakyEngine, SlowEngine, StepOverrideEngine, StubEngine,
};
use postflow::engine::{EngineStep, StateDelta};
use postflow::error::WorkflowError;
use postflow::store::{InMemoryThreadStore, ThreadStore};
use postflow::types::ThreadId;
use postflow::workflow::{Decision, Orchestrator, Phase};
use std::sync::Arc;
use std::time::Duration;

fn orchestrator<E: postflow::engine::GenerationEngine>(
    engine: E,
) -> Orchestrator<InMemoryThreadStore, E> {
    Orchestrator::new(InMemoryThreadStore::new(), engine)
}

#[tokio::test]
async fn start_persists_initial_state() {
    let orch = orchestrator(StubEngine);
    let id = orch.start("  rust tips  ").unwrap();

    let state = orch.get_snapshot(id).unwrap();
    assert_eq!(state.topic, "rust tips");
    assert_eq!(state.iterations, 0);
    assert_eq!(state.phase, Phase::Generating);
    assert!(state.generated_content.is_none());
    assert!(state.approved.is_none());
    assert!(state.feedback.is_none());
}

#[tokio::test]
async fn blank_topic_is_rejected_and_nothing_is_stored() {
    let orch = orchestrator(StubEngine);
    let err = orch.start("   ").unwrap_err();
    assert!(matches!(err, WorkflowError::Validation(_)));
    assert!(orch.store().is_empty());
}

#[tokio::test]
async fn generate_pauses_for_review() {
    let orch = orchestrator(StubEngine);
    let state = orch.start_and_generate("crabs").await.unwrap();

    assert_eq!(state.phase, Phase::AwaitingReview);
    assert_eq!(state.generated_content.as_deref(), Some("crabs #0"));
    assert_eq!(state.image_prompt.as_deref(), Some("picture of crabs"));
    assert_eq!(orch.get_snapshot(state.thread_id).unwrap(), state);
}

#[tokio::test]
async fn approve_publishes_and_finishes_the_thread() {
    let orch = orchestrator(StubEngine);
    let draft = orch.start_and_generate("crabs").await.unwrap();

    let done = orch.decide(draft.thread_id, Decision::Approve).await.unwrap();
    assert_eq!(done.phase, Phase::Done);
    assert_eq!(done.approved, Some(true));
    assert_eq!(done.image_url.as_deref(), Some("https://img.example/1.png"));
    assert!(done.published_at.is_some());

    let again = orch.decide(draft.thread_id, Decision::Approve).await.unwrap_err();
    assert!(matches!(again, WorkflowError::Precondition(_)));
    let revise = orch
        .decide(draft.thread_id, Decision::revise("more"))
        .await
        .unwrap_err();
    assert!(matches!(revise, WorkflowError::Precondition(_)));
    assert_eq!(orch.get_snapshot(draft.thread_id).unwrap(), done);
}

#[tokio::test]
async fn revise_regenerates_with_one_more_iteration() {
    let orch = orchestrator(StubEngine);
    let draft = orch.start_and_generate("crabs").await.unwrap();

    let revised = orch
        .decide(draft.thread_id, Decision::revise("shorter please"))
        .await
        .unwrap();
    assert_eq!(revised.iterations, 1);
    assert_eq!(revised.phase, Phase::AwaitingReview);
    assert_eq!(revised.generated_content.as_deref(), Some("crabs #1"));
    assert!(revised.feedback.is_none());
    assert!(revised.approved.is_none());

    let revised = orch
        .decide(draft.thread_id, Decision::revise("and funnier"))
        .await
        .unwrap();
    assert_eq!(revised.iterations, 2);

    let done = orch.decide(draft.thread_id, Decision::Approve).await.unwrap();
    assert_eq!(done.iterations, 2);
    assert_eq!(done.generated_content.as_deref(), Some("crabs #2"));
}

#[tokio::test]
async fn decision_before_draft_is_a_precondition_error() {
    let orch = orchestrator(StubEngine);
    let id = orch.start("crabs").unwrap();
    let err = orch.decide(id, Decision::Approve).await.unwrap_err();
    assert!(matches!(err, WorkflowError::Precondition(_)));
}

#[tokio::test]
async fn empty_generation_leaves_the_snapshot_unchanged() {
    let orch = orchestrator(EmptyEngine);
    let id = orch.start("crabs").unwrap();
    let before = orch.get_snapshot(id).unwrap();

    let err = orch.generate(id).await.unwrap_err();
    assert!(matches!(err, WorkflowError::GenerationIncomplete { .. }));
    assert!(err.is_retryable());
    assert_eq!(orch.get_snapshot(id).unwrap(), before);
}

#[tokio::test]
async fn empty_revision_leaves_the_reviewed_draft() {
    let orch = orchestrator(StepOverrideEngine {
        step: EngineStep::Revise,
        reply: StateDelta::default(),
    });
    let draft = orch.start_and_generate("crabs").await.unwrap();

    let err = orch
        .decide(draft.thread_id, Decision::revise("shorter"))
        .await
        .unwrap_err();
    assert!(matches!(err, WorkflowError::GenerationIncomplete { .. }));

    let kept = orch.get_snapshot(draft.thread_id).unwrap();
    assert_eq!(kept, draft);
    assert_eq!(kept.iterations, 0);
    assert!(kept.feedback.is_none());
    assert_eq!(orch.status(draft.thread_id).unwrap().phase, Phase::Failed);
}

#[tokio::test]
async fn blank_publish_output_does_not_finish_the_thread() {
    let orch = orchestrator(StepOverrideEngine {
        step: EngineStep::Publish,
        reply: StateDelta::content("   "),
    });
    let draft = orch.start_and_generate("crabs").await.unwrap();

    let err = orch
        .decide(draft.thread_id, Decision::Approve)
        .await
        .unwrap_err();
    assert!(matches!(err, WorkflowError::GenerationIncomplete { .. }));

    let kept = orch.get_snapshot(draft.thread_id).unwrap();
    assert_eq!(kept, draft);
    assert_eq!(kept.phase, Phase::AwaitingReview);
    assert_eq!(kept.generated_content.as_deref(), Some("crabs #0"));
}

#[tokio::test]
async fn engine_failure_is_reported_and_snapshot_kept() {
    let orch = orchestrator(FailingEngine);
    let id = orch.start("crabs").unwrap();
    let before = orch.get_snapshot(id).unwrap();

    let err = orch.generate(id).await.unwrap_err();
    assert!(matches!(err, WorkflowError::Engine { .. }));
    assert_eq!(err.thread_id(), Some(id));
    assert_eq!(orch.get_snapshot(id).unwrap(), before);

    let status = orch.status(id).unwrap();
    assert_eq!(status.phase, Phase::Failed);
    assert_eq!(status.snapshot.phase, Phase::Generating);
    assert!(status.last_error.unwrap().contains("model unavailable"));
}

#[tokio::test]
async fn failed_revision_keeps_the_reviewed_draft() {
    let store = Arc::new(InMemoryThreadStore::new());
    let engine = Arc::new(FlakyEngine::new(0));
    let orch = Orchestrator::new(store.clone(), engine.clone());
    let draft = orch.start_and_generate("crabs").await.unwrap();

    let failing = Orchestrator::new(store.clone(), FailingEngine);
    let err = failing
        .decide(draft.thread_id, Decision::revise("shorter"))
        .await
        .unwrap_err();
    assert!(matches!(err, WorkflowError::Engine { .. }));

    let kept = store.get(&draft.thread_id).unwrap().unwrap();
    assert_eq!(kept, draft);
    assert_eq!(kept.iterations, 0);
    assert!(kept.feedback.is_none());
    assert_eq!(engine.calls(), 1);
}

#[tokio::test]
async fn retry_after_failure_clears_the_failed_status() {
    let orch = orchestrator(FlakyEngine::new(1));
    let id = orch.start("crabs").unwrap();

    assert!(orch.generate(id).await.is_err());
    assert_eq!(orch.status(id).unwrap().phase, Phase::Failed);

    let state = orch.generate(id).await.unwrap();
    assert_eq!(state.phase, Phase::AwaitingReview);
    let status = orch.status(id).unwrap();
    assert_eq!(status.phase, Phase::AwaitingReview);
    assert!(status.last_error.is_none());
}

#[tokio::test]
async fn unknown_thread_is_not_found() {
    let orch = orchestrator(StubEngine);
    let id = ThreadId::new();
    assert!(matches!(orch.get_snapshot(id), Err(WorkflowError::NotFound(_))));
    assert!(matches!(orch.status(id), Err(WorkflowError::NotFound(_))));
    assert!(matches!(orch.generate(id).await, Err(WorkflowError::NotFound(_))));
    assert!(matches!(
        orch.decide(id, Decision::Approve).await,
        Err(WorkflowError::NotFound(_))
    ));
}

#[tokio::test(start_paused = true)]
async fn slow_engine_times_out() {
    let orch = Orchestrator::with_engine_timeout(
        InMemoryThreadStore::new(),
        SlowEngine {
            delay: Duration::from_secs(30),
        },
        Some(Duration::from_secs(5)),
    );
    let id = orch.start("crabs").unwrap();
    let before = orch.get_snapshot(id).unwrap();

    let err = orch.generate(id).await.unwrap_err();
    match err {
        WorkflowError::Engine { ref message, .. } => assert!(message.contains("timed out")),
        other => panic!("expected engine error, got {:?}", other),
    }
    assert_eq!(orch.get_snapshot(id).unwrap(), before);
}

#[tokio::test]
async fn threads_are_independent() {
    let orch = orchestrator(StubEngine);
    let a = orch.start_and_generate("first").await.unwrap();
    let b = orch.start_and_generate("second").await.unwrap();

    orch.decide(a.thread_id, Decision::Approve).await.unwrap();
    assert_eq!(orch.get_snapshot(b.thread_id).unwrap(), b);
    assert_eq!(orch.threads().unwrap().len(), 2);
}
