//! Postflow: resumable, human-in-the-loop post generation.
//!
//! A thread drafts a post for a topic, pauses for review, and either
//! publishes or revises on the reviewer's decision. Each thread's state is
//! persisted after every completed step, so a workflow survives process
//! restarts and can be resumed from any later invocation.

pub mod cli;
pub mod config;
pub mod engine;
pub mod error;
pub mod logging;
pub mod provider;
pub mod session;
pub mod store;
pub mod types;
pub mod workflow;
