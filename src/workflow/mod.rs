//! Workflow domain: the state record, the per-thread guard, and the
//! orchestrator that drives threads through the generation engine.

pub mod guard;
pub mod orchestrator;
pub mod state;

pub use guard::{InFlight, InFlightGuard};
pub use orchestrator::Orchestrator;
pub use state::{Decision, Phase, ThreadStatus, WorkflowState};
