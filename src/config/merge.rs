//! Merge rules: built-in defaults underneath every other source.

use config::builder::DefaultState;
use config::Config;
use config::ConfigBuilder;
use config::ConfigError;

/// Create a Config builder with merge policy defaults applied.
pub fn builder_with_defaults() -> Result<ConfigBuilder<DefaultState>, ConfigError> {
    Config::builder()
        .set_default("storage.backend", "sled")?
        .set_default("storage.path", ".postflow/store")?
        .set_default("engine.provider_type", "ollama")?
        .set_default("engine.model", "llama3.1")?
        .set_default("engine.timeout_secs", 120)
}
