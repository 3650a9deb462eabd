//! CLI parse: clap types for postflow. No behavior; definitions only.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Postflow CLI - draft, review, and publish posts across separate invocations
#[derive(Parser)]
#[command(name = "postflow")]
#[command(about = "Generate posts that wait for human approval before publishing")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Workspace root directory (store and config/ live here)
    #[arg(long, default_value = ".")]
    pub workspace: PathBuf,

    /// Configuration file path (overrides default config loading)
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Session key; each session tracks its own active post
    #[arg(long, env = "POSTFLOW_SESSION", default_value = "current")]
    pub session: String,

    /// Enable debug logging
    #[arg(long)]
    pub verbose: bool,

    /// Disable logging entirely
    #[arg(long, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Log level (trace, debug, info, warn, error, off)
    #[arg(long)]
    pub log_level: Option<String>,

    /// Log format (json, text)
    #[arg(long)]
    pub log_format: Option<String>,

    /// Log output (stdout, stderr, file)
    #[arg(long)]
    pub log_output: Option<String>,

    /// Log file path (output = file)
    #[arg(long)]
    pub log_file: Option<PathBuf>,
}

#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Commands {
    /// Start a new post for a topic and generate the first draft
    Start {
        /// What the post is about
        topic: String,
    },
    /// Show the active post
    Show,
    /// Approve the active draft and publish it
    Approve,
    /// Ask for a revised draft
    Revise {
        /// What to change
        feedback: String,
    },
    /// Retry generating a draft that failed
    Retry,
    /// List all posts
    List,
    /// Make an existing post the active one for this session
    Use {
        /// Thread id as printed by `list`
        thread_id: String,
    },
    /// Print the effective configuration as TOML
    Config,
}
