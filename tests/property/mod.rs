//! Property-based tests for workflow invariants
