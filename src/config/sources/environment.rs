//! Environment source: POSTFLOW__ENGINE__MODEL=... overrides engine.model.

use config::builder::DefaultState;
use config::ConfigBuilder;
use config::Environment;

pub fn add_to_builder(builder: ConfigBuilder<DefaultState>) -> ConfigBuilder<DefaultState> {
    builder.add_source(
        Environment::with_prefix("POSTFLOW")
            .prefix_separator("__")
            .separator("__")
            .try_parsing(true),
    )
}
