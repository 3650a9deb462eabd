//! Durability of workflow snapshots across store reopen

use crate::integration::support::{FailingEngine, StubEngine};
use postflow::session::{SessionRouter, SledSessionRouter};
use postflow::store::{SledThreadStore, ThreadStore};
use postflow::types::SessionKey;
use postflow::workflow::{Decision, Orchestrator, Phase};
use tempfile::TempDir;

#[tokio::test]
async fn workflow_resumes_after_reopen() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("store");

    let (thread_id, draft) = {
        let orch = Orchestrator::new(SledThreadStore::open(&path).unwrap(), StubEngine);
        let draft = orch.start_and_generate("crabs").await.unwrap();
        (draft.thread_id, draft)
    };

    let orch = Orchestrator::new(SledThreadStore::open(&path).unwrap(), StubEngine);
    assert_eq!(orch.get_snapshot(thread_id).unwrap(), draft);

    let done = orch.decide(thread_id, Decision::Approve).await.unwrap();
    assert_eq!(done.phase, Phase::Done);
    assert_eq!(done.version, draft.version + 1);
}

#[tokio::test]
async fn failed_step_is_not_persisted() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("store");

    let draft = {
        let orch = Orchestrator::new(SledThreadStore::open(&path).unwrap(), StubEngine);
        orch.start_and_generate("crabs").await.unwrap()
    };

    {
        let orch = Orchestrator::new(SledThreadStore::open(&path).unwrap(), FailingEngine);
        assert!(orch.decide(draft.thread_id, Decision::Approve).await.is_err());
    }

    let store = SledThreadStore::open(&path).unwrap();
    assert_eq!(store.get(&draft.thread_id).unwrap(), Some(draft));
}

#[test]
fn active_session_and_threads_share_one_database() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("store");
    let session = SessionKey::new("alice").unwrap();

    let thread_id = {
        let store = SledThreadStore::open(&path).unwrap();
        let router = SledSessionRouter::new(store.db()).unwrap();
        let state = postflow::workflow::WorkflowState::new(Default::default(), "crabs");
        store.put(&state).unwrap();
        router.set_active(&session, state.thread_id).unwrap();
        state.thread_id
    };

    let store = SledThreadStore::open(&path).unwrap();
    let router = SledSessionRouter::new(store.db()).unwrap();
    assert_eq!(router.get_active(&session).unwrap(), Some(thread_id));
    assert_eq!(store.list().unwrap().len(), 1);
}
