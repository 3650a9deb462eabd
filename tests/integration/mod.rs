//! Integration tests for the postflow workflow orchestrator

mod concurrency;
mod orchestrator_flow;
mod session_routing;
mod sled_store;
mod support;
