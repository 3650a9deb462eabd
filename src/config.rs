//! Configuration System
//!
//! Layered configuration built on the `config` crate. Sources, lowest to
//! highest precedence: built-in defaults, the global config file, the
//! workspace `config/config.toml`, `config/{POSTFLOW_ENV}.toml`, and
//! `POSTFLOW__SECTION__KEY` environment variables.

use crate::error::ConfigError;
use crate::logging::LoggingConfig;
use crate::provider::ProviderType;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

mod merge;
mod sources;

/// Root configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PostflowConfig {
    /// Thread store settings
    #[serde(default)]
    pub storage: StorageConfig,

    /// Generation engine settings
    #[serde(default)]
    pub engine: EngineConfig,

    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StorageBackend {
    Sled,
    Memory,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    #[serde(default = "default_backend")]
    pub backend: StorageBackend,

    /// Database directory; relative paths resolve against the workspace root
    #[serde(default = "default_store_path")]
    pub path: PathBuf,
}

fn default_backend() -> StorageBackend {
    StorageBackend::Sled
}

fn default_store_path() -> PathBuf {
    PathBuf::from(".postflow/store")
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            backend: default_backend(),
            path: default_store_path(),
        }
    }
}

impl StorageConfig {
    pub fn resolve_path(&self, workspace_root: &Path) -> PathBuf {
        if self.path.is_absolute() {
            self.path.clone()
        } else {
            workspace_root.join(&self.path)
        }
    }
}

/// Generation engine configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineConfig {
    #[serde(default = "default_provider_type")]
    pub provider_type: ProviderType,

    #[serde(default = "default_model")]
    pub model: String,

    /// Base URL of an OpenAI-compatible API (e.g. http://localhost:8080/v1)
    #[serde(default)]
    pub endpoint: Option<String>,

    #[serde(default)]
    pub api_key: Option<String>,

    /// Environment variable holding the API key when `api_key` is unset
    #[serde(default)]
    pub api_key_env: Option<String>,

    /// Upper bound for one engine invocation; 0 disables the limit
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    #[serde(default)]
    pub temperature: Option<f32>,

    #[serde(default)]
    pub max_tokens: Option<u32>,

    /// Webhook that receives approved posts
    #[serde(default)]
    pub publish_url: Option<String>,
}

fn default_provider_type() -> ProviderType {
    ProviderType::Ollama
}

fn default_model() -> String {
    "llama3.1".to_string()
}

fn default_timeout_secs() -> u64 {
    120
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            provider_type: default_provider_type(),
            model: default_model(),
            endpoint: None,
            api_key: None,
            api_key_env: None,
            timeout_secs: default_timeout_secs(),
            temperature: None,
            max_tokens: None,
            publish_url: None,
        }
    }
}

impl EngineConfig {
    pub fn validate(&self) -> Result<(), String> {
        if self.model.trim().is_empty() {
            return Err("Model name cannot be empty".to_string());
        }
        for (name, url) in [("endpoint", &self.endpoint), ("publish_url", &self.publish_url)] {
            if let Some(url) = url {
                if !url.starts_with("http://") && !url.starts_with("https://") {
                    return Err(format!("{} must be an http(s) URL, got '{}'", name, url));
                }
            }
        }
        if let Some(t) = self.temperature {
            if !(0.0..=2.0).contains(&t) {
                return Err(format!("temperature must be within 0.0-2.0, got {}", t));
            }
        }
        Ok(())
    }

    /// `api_key`, else the variable named by `api_key_env`, else
    /// `OPENAI_API_KEY` for the OpenAI provider.
    pub fn resolve_api_key(&self) -> Option<String> {
        if let Some(ref key) = self.api_key {
            return Some(key.clone());
        }
        let var = match (&self.api_key_env, self.provider_type) {
            (Some(var), _) => var.as_str(),
            (None, ProviderType::OpenAI) => "OPENAI_API_KEY",
            (None, ProviderType::Ollama) => return None,
        };
        std::env::var(var).ok().filter(|k| !k.trim().is_empty())
    }

    pub fn timeout(&self) -> Option<std::time::Duration> {
        (self.timeout_secs > 0).then(|| std::time::Duration::from_secs(self.timeout_secs))
    }
}

/// Configuration validation errors
#[derive(Debug, Clone)]
pub enum ValidationError {
    Engine(String),
    Logging(String),
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ValidationError::Engine(msg) => write!(f, "Engine: {}", msg),
            ValidationError::Logging(msg) => write!(f, "Logging: {}", msg),
        }
    }
}

impl std::error::Error for ValidationError {}

impl PostflowConfig {
    /// Validate the entire configuration, collecting every problem.
    pub fn validate(&self) -> Result<(), Vec<ValidationError>> {
        let mut errors = Vec::new();

        if let Err(e) = self.engine.validate() {
            errors.push(ValidationError::Engine(e));
        }
        if let Err(e) = self.logging.validate() {
            errors.push(ValidationError::Logging(e));
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }

    /// Validate and fold all problems into one [`ConfigError`].
    pub fn validated(self) -> Result<Self, ConfigError> {
        self.validate().map_err(|errors| {
            let msgs: Vec<String> = errors.iter().map(|e| e.to_string()).collect();
            ConfigError::Invalid(msgs.join("\n"))
        })?;
        Ok(self)
    }
}

/// Loads [`PostflowConfig`] from the layered sources.
pub struct ConfigLoader;

impl ConfigLoader {
    /// Load configuration for a workspace.
    pub fn load(workspace_root: &Path) -> Result<PostflowConfig, ConfigError> {
        let builder = merge::builder_with_defaults()?;
        let builder = sources::global_file::add_to_builder(builder)?;
        let builder = sources::workspace_file::add_to_builder(builder, workspace_root)?;
        let builder = sources::environment::add_to_builder(builder);
        let config: PostflowConfig = builder.build()?.try_deserialize()?;
        Ok(config)
    }

    /// Load a single explicit file over the defaults.
    pub fn load_from_file(path: &Path) -> Result<PostflowConfig, ConfigError> {
        let path_str = path
            .to_str()
            .ok_or_else(|| ConfigError::Load(format!("Non UTF-8 config path: {:?}", path)))?;
        let config: PostflowConfig = merge::builder_with_defaults()?
            .add_source(config::File::with_name(path_str).required(true))
            .build()?
            .try_deserialize()?;
        Ok(config)
    }

    /// Path of the user-level config file, if a config directory is known.
    pub fn global_config_path() -> Option<PathBuf> {
        sources::global_file::global_config_path()
    }
}
