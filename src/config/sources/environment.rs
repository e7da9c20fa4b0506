//! Environment variable source: ZTREE__* prefix with __ separator

use config::builder::DefaultState;
use config::ConfigBuilder;
use config::ConfigError;
use config::Environment;

/// Add environment variable overlay to builder.
/// Uses ZTREE prefix and __ as separator for nested keys, e.g. `ZTREE__STORE__BACKEND`.
pub fn add_to_builder(
    builder: ConfigBuilder<DefaultState>,
) -> Result<ConfigBuilder<DefaultState>, ConfigError> {
    let builder = builder.add_source(
        Environment::with_prefix("ZTREE")
            .separator("__")
            .try_parsing(true),
    );
    Ok(builder)
}
