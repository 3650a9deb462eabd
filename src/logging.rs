//! Logging System
//!
//! Structured logging using `tracing`. Level, format, and destination come
//! from [`LoggingConfig`], with environment overrides:
//!
//! 1. `POSTFLOW_LOG` (full `EnvFilter` directive string)
//! 2. `POSTFLOW_LOG_FORMAT`, `POSTFLOW_LOG_OUTPUT`
//! 3. Configuration file / CLI flags
//! 4. Defaults

use crate::error::ConfigError;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::PathBuf;
use tracing_subscriber::fmt::time::ChronoUtc;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Registry};

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Master switch; `--quiet` turns it off
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// Log level: trace, debug, info, warn, error, off
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Output format: json, text
    #[serde(default = "default_format")]
    pub format: String,

    /// Output destination: stdout, stderr, file
    #[serde(default = "default_output")]
    pub output: String,

    /// Log file path (output = "file")
    #[serde(default)]
    pub file: Option<PathBuf>,

    /// Enable colored output (text format, terminal outputs only)
    #[serde(default = "default_true")]
    pub color: bool,

    /// Module-specific log levels
    #[serde(default)]
    pub modules: HashMap<String, String>,
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_format() -> String {
    "text".to_string()
}

fn default_output() -> String {
    "stderr".to_string()
}

fn default_true() -> bool {
    true
}

fn default_log_file() -> PathBuf {
    PathBuf::from(".postflow/postflow.log")
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            level: default_log_level(),
            format: default_format(),
            output: default_output(),
            file: None,
            color: true,
            modules: HashMap::new(),
        }
    }
}

impl LoggingConfig {
    pub fn validate(&self) -> Result<(), String> {
        parse_format(&self.format)?;
        parse_output(&self.output)?;
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Format {
    Text,
    Json,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Output {
    Stdout,
    Stderr,
    File,
}

/// Initialize the global subscriber. Call once, early in `main`.
pub fn init_logging(config: Option<&LoggingConfig>) -> Result<(), ConfigError> {
    if config.is_some_and(|c| !c.enabled) {
        return Ok(());
    }

    let filter = build_env_filter(config)?;
    let format = determine_format(config)?;
    let output = determine_output(config)?;
    let use_color = config.map(|c| c.color).unwrap_or(true);
    let base_subscriber = Registry::default().with(filter);

    let layer = fmt::layer()
        .with_target(true)
        .with_timer(ChronoUtc::rfc_3339());

    let result = match (format, output) {
        (Format::Json, Output::Stdout) => base_subscriber
            .with(layer.json().with_writer(std::io::stdout))
            .try_init(),
        (Format::Json, Output::Stderr) => base_subscriber
            .with(layer.json().with_writer(std::io::stderr))
            .try_init(),
        (Format::Json, Output::File) => {
            let file = open_log_file(config)?;
            base_subscriber
                .with(layer.json().with_writer(file))
                .try_init()
        }
        (Format::Text, Output::Stdout) => base_subscriber
            .with(layer.with_ansi(use_color).with_writer(std::io::stdout))
            .try_init(),
        (Format::Text, Output::Stderr) => base_subscriber
            .with(layer.with_ansi(use_color).with_writer(std::io::stderr))
            .try_init(),
        (Format::Text, Output::File) => {
            let file = open_log_file(config)?;
            base_subscriber
                .with(layer.with_ansi(false).with_writer(file))
                .try_init()
        }
    };

    result.map_err(|e| ConfigError::Logging(e.to_string()))
}

fn open_log_file(config: Option<&LoggingConfig>) -> Result<std::sync::Mutex<std::fs::File>, ConfigError> {
    let log_file = config
        .and_then(|c| c.file.clone())
        .unwrap_or_else(default_log_file);

    if let Some(parent) = log_file.parent() {
        std::fs::create_dir_all(parent).map_err(|e| {
            ConfigError::Logging(format!("Failed to create log directory: {}", e))
        })?;
    }
    let file = std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(&log_file)
        .map_err(|e| {
            ConfigError::Logging(format!("Failed to open log file {:?}: {}", log_file, e))
        })?;
    Ok(std::sync::Mutex::new(file))
}

/// Build environment filter from config or environment variables
fn build_env_filter(config: Option<&LoggingConfig>) -> Result<EnvFilter, ConfigError> {
    if let Ok(filter) = EnvFilter::try_from_env("POSTFLOW_LOG") {
        return Ok(filter);
    }

    let level = config.map(|c| c.level.as_str()).unwrap_or("info");
    if level == "off" {
        return Ok(EnvFilter::new("off"));
    }

    let mut filter = EnvFilter::new(level);
    if let Some(config) = config {
        for (module, module_level) in &config.modules {
            let directive = format!("{}={}", module, module_level);
            filter = filter.add_directive(
                directive
                    .parse()
                    .map_err(|e| ConfigError::Logging(format!("Invalid log directive: {}", e)))?,
            );
        }
    }

    Ok(filter)
}

fn determine_format(config: Option<&LoggingConfig>) -> Result<Format, ConfigError> {
    if let Ok(format) = std::env::var("POSTFLOW_LOG_FORMAT") {
        return parse_format(&format).map_err(ConfigError::Logging);
    }
    parse_format(config.map(|c| c.format.as_str()).unwrap_or("text")).map_err(ConfigError::Logging)
}

fn determine_output(config: Option<&LoggingConfig>) -> Result<Output, ConfigError> {
    if let Ok(output) = std::env::var("POSTFLOW_LOG_OUTPUT") {
        return parse_output(&output).map_err(ConfigError::Logging);
    }
    parse_output(config.map(|c| c.output.as_str()).unwrap_or("stderr")).map_err(ConfigError::Logging)
}

fn parse_format(format: &str) -> Result<Format, String> {
    match format {
        "text" => Ok(Format::Text),
        "json" => Ok(Format::Json),
        other => Err(format!(
            "Invalid log format: {} (must be 'json' or 'text')",
            other
        )),
    }
}

fn parse_output(output: &str) -> Result<Output, String> {
    match output {
        "stdout" => Ok(Output::Stdout),
        "stderr" => Ok(Output::Stderr),
        "file" => Ok(Output::File),
        other => Err(format!(
            "Invalid log output: {} (must be 'stdout', 'stderr', or 'file')",
            other
        )),
    }
}
