//! CLI domain: parse, route, output, and presentation only.
//! No workflow semantics; the route table dispatches to the orchestrator.

mod output;
mod parse;
mod presentation;
mod route;

pub use output::{map_error, CliError};
pub use parse::{Cli, Commands};
pub use presentation::{format_published, format_review, format_status, format_thread_list};
pub use route::{RunContext, SharedEngine, SharedStore};
