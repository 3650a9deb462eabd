//! Concurrent operations on one thread are serialized by rejection

use crate::integration::support::SlowEngine;
use postflow::error::WorkflowError;
use postflow::store::InMemoryThreadStore;
use postflow::workflow::{Decision, Orchestrator, Phase};
use std::sync::Arc;
use std::time::Duration;

fn slow_orchestrator() -> Arc<Orchestrator<InMemoryThreadStore, SlowEngine>> {
    Arc::new(Orchestrator::new(
        InMemoryThreadStore::new(),
        SlowEngine {
            delay: Duration::from_millis(200),
        },
    ))
}

#[tokio::test(start_paused = true)]
async fn concurrent_decisions_on_one_thread_conflict() {
    let orch = slow_orchestrator();
    let draft = orch.start_and_generate("crabs").await.unwrap();
    let id = draft.thread_id;

    let (first, second) = futures::join!(
        orch.decide(id, Decision::Approve),
        orch.decide(id, Decision::revise("shorter")),
    );

    let results = [first, second];
    let ok = results.iter().filter(|r| r.is_ok()).count();
    let conflicts = results
        .iter()
        .filter(|r| matches!(r, Err(WorkflowError::Conflict(_))))
        .count();
    assert_eq!(ok, 1);
    assert_eq!(conflicts, 1);

    let state = orch.get_snapshot(id).unwrap();
    assert_eq!(state.version, draft.version + 1);
    assert_eq!(state.phase, Phase::Done);
}

#[tokio::test(start_paused = true)]
async fn different_threads_proceed_in_parallel() {
    let orch = slow_orchestrator();
    let a = orch.start_and_generate("first").await.unwrap();
    let b = orch.start_and_generate("second").await.unwrap();

    let handles: Vec<_> = [a.thread_id, b.thread_id]
        .into_iter()
        .map(|id| {
            let orch = orch.clone();
            tokio::spawn(async move { orch.decide(id, Decision::Approve).await })
        })
        .collect();

    for result in futures::future::join_all(handles).await {
        let state = result.unwrap().unwrap();
        assert_eq!(state.phase, Phase::Done);
    }
}

#[tokio::test(start_paused = true)]
async fn conflict_is_released_after_the_step_finishes() {
    let orch = slow_orchestrator();
    let draft = orch.start_and_generate("crabs").await.unwrap();

    let revised = orch
        .decide(draft.thread_id, Decision::revise("shorter"))
        .await
        .unwrap();
    assert_eq!(revised.iterations, 1);
    let done = orch.decide(draft.thread_id, Decision::Approve).await.unwrap();
    assert_eq!(done.phase, Phase::Done);
}
