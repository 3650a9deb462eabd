//! Postflow CLI Binary
//!
//! Command-line interface for drafting, reviewing, and publishing posts.

use anyhow::Context;
use clap::Parser;
use postflow::cli::{map_error, Cli, RunContext};
use postflow::config::ConfigLoader;
use postflow::logging::{init_logging, LoggingConfig};
use std::process;
use tracing::{error, info};

fn main() {
    let cli = Cli::parse();

    let logging_config = build_logging_config(&cli);
    if let Err(e) = init_logging(Some(&logging_config)) {
        eprintln!("Failed to initialize logging: {}", e);
        process::exit(1);
    }

    info!("postflow starting");

    let context = match RunContext::new(cli.workspace.clone(), cli.config.clone(), &cli.session)
    {
        Ok(ctx) => ctx,
        Err(e) => {
            error!("Error initializing workspace: {}", e);
            eprintln!("{}", map_error(&e));
            process::exit(1);
        }
    };

    match context.execute(&cli.command) {
        Ok(output) => {
            info!("command completed");
            println!("{}", output);
        }
        Err(e) => {
            error!("command failed: {}", e);
            eprintln!("{}", map_error(&e));
            if let Some(view) = context.recovery_view() {
                eprintln!("\nLast saved state:\n{}", view);
            }
            process::exit(1);
        }
    }
}

/// Build logging configuration from CLI args and the config file.
/// Precedence: CLI flags override config file override defaults.
fn build_logging_config(cli: &Cli) -> LoggingConfig {
    let mut config = load_file_logging(cli).unwrap_or_else(|e| {
        eprintln!("Warning: {:#}; using default logging", e);
        LoggingConfig::default()
    });

    if cli.quiet {
        config.enabled = false;
    }
    if cli.verbose {
        config.level = "debug".to_string();
    }
    if let Some(ref level) = cli.log_level {
        config.level = level.clone();
    }
    if let Some(ref format) = cli.log_format {
        config.format = format.clone();
    }
    if let Some(ref output) = cli.log_output {
        config.output = output.clone();
    }
    if let Some(ref file) = cli.log_file {
        config.file = Some(file.clone());
    } else if config.output == "file" {
        config.file = config.file.map(|f| {
            if f.is_relative() {
                cli.workspace.join(f)
            } else {
                f
            }
        });
    }

    config
}

fn load_file_logging(cli: &Cli) -> anyhow::Result<LoggingConfig> {
    let config = match cli.config {
        Some(ref path) => ConfigLoader::load_from_file(path)
            .with_context(|| format!("failed to read config {}", path.display()))?,
        None => ConfigLoader::load(&cli.workspace).context("failed to load workspace config")?,
    };
    Ok(config.logging)
}
