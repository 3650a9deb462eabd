//! Global config file source: $XDG_CONFIG_HOME/postflow/config.toml
//! (or the platform equivalent).

use config::builder::DefaultState;
use config::ConfigBuilder;
use config::ConfigError;
use config::File;
use directories::BaseDirs;
use std::path::PathBuf;
use tracing::debug;

/// Path to global config file.
pub fn global_config_path() -> Option<PathBuf> {
    BaseDirs::new().map(|dirs| dirs.config_dir().join("postflow").join("config.toml"))
}

/// Add global config file source to builder if it exists.
pub fn add_to_builder(
    mut builder: ConfigBuilder<DefaultState>,
) -> Result<ConfigBuilder<DefaultState>, ConfigError> {
    let Some(path) = global_config_path() else {
        return Ok(builder);
    };
    if path.exists() {
        builder = builder.add_source(File::from(path).required(false));
    } else {
        debug!(config_path = %path.display(), "no global configuration file");
    }
    Ok(builder)
}
