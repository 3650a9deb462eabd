//! Session routing: each session resumes its own thread

use crate::integration::support::StubEngine;
use postflow::session::{InMemorySessionRouter, SessionRouter};
use postflow::store::InMemoryThreadStore;
use postflow::types::SessionKey;
use postflow::workflow::{Decision, Orchestrator, Phase};

#[tokio::test]
async fn sessions_resume_their_own_threads() {
    let orch = Orchestrator::new(InMemoryThreadStore::new(), StubEngine);
    let router = InMemorySessionRouter::new();
    let alice = SessionKey::new("alice").unwrap();
    let bob = SessionKey::new("bob").unwrap();

    let a = orch.start_and_generate("gardening").await.unwrap();
    router.set_active(&alice, a.thread_id).unwrap();
    let b = orch.start_and_generate("cycling").await.unwrap();
    router.set_active(&bob, b.thread_id).unwrap();

    let alice_thread = router.get_active(&alice).unwrap().unwrap();
    orch.decide(alice_thread, Decision::Approve).await.unwrap();

    let bob_thread = router.get_active(&bob).unwrap().unwrap();
    assert_eq!(bob_thread, b.thread_id);
    assert_eq!(orch.get_snapshot(bob_thread).unwrap().phase, Phase::AwaitingReview);
    assert_eq!(orch.get_snapshot(alice_thread).unwrap().phase, Phase::Done);
}

#[test]
fn unknown_session_has_no_active_thread() {
    let router = InMemorySessionRouter::new();
    let session = SessionKey::new("nobody").unwrap();
    assert!(router.get_active(&session).unwrap().is_none());
    assert!(router.clear_active(&session).unwrap().is_none());
}
