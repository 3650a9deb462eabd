//! Presentation: text views of workflow snapshots.

use crate::workflow::{Phase, ThreadStatus, WorkflowState};

/// Review screen for a thread awaiting a decision.
pub fn format_review(state: &WorkflowState) -> String {
    let mut out = format!(
        "Post {} ({}, revision {})\nTopic: {}\n",
        state.thread_id,
        state.phase.as_str(),
        state.iterations,
        state.topic
    );
    match state.generated_content.as_deref() {
        Some(content) => out.push_str(&format!("\nCaption:\n{}\n", content)),
        None => out.push_str("\nNo draft yet. Run `postflow retry` to generate one.\n"),
    }
    if let Some(ref prompt) = state.image_prompt {
        out.push_str(&format!("\nImage prompt: {}\n", prompt));
    }
    if let Some(ref url) = state.image_url {
        out.push_str(&format!("Image: {}\n", url));
    }
    if state.phase == Phase::AwaitingReview {
        out.push_str("\nNext: `postflow approve` or `postflow revise \"<feedback>\"`");
    }
    out
}

/// Success screen for a published thread.
pub fn format_published(state: &WorkflowState) -> String {
    let mut out = format!("Published post {}\n", state.thread_id);
    if let Some(ref content) = state.generated_content {
        out.push_str(&format!("\n{}\n", content));
    }
    if let Some(ref url) = state.image_url {
        out.push_str(&format!("\nImage: {}\n", url));
    }
    if let Some(ref at) = state.published_at {
        out.push_str(&format!("Published at: {}", at));
    }
    out.trim_end().to_string()
}

pub fn format_snapshot(state: &WorkflowState) -> String {
    if state.phase == Phase::Done {
        format_published(state)
    } else {
        format_review(state)
    }
}

/// Snapshot view with the last step's failure, if any.
pub fn format_status(status: &ThreadStatus) -> String {
    let mut out = format_snapshot(&status.snapshot);
    if let Some(ref err) = status.last_error {
        out.push_str(&format!("\n\nLast attempt failed: {}", err));
    }
    out
}

pub fn format_thread_list(threads: &[WorkflowState], active: Option<&WorkflowState>) -> String {
    if threads.is_empty() {
        return "No posts yet. Start one with `postflow start <topic>`.".to_string();
    }
    let active_id = active.map(|s| s.thread_id);
    let mut lines = vec!["Posts:".to_string()];
    for state in threads {
        let marker = if Some(state.thread_id) == active_id { "*" } else { " " };
        lines.push(format!(
            "{} {}  {:<15}  rev {}  {}",
            marker,
            state.thread_id,
            state.phase.as_str(),
            state.iterations,
            state.topic
        ));
    }
    lines.join("\n")
}
