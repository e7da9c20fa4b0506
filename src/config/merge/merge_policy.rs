//! Defaults applied before any source is layered on.

use config::builder::DefaultState;
use config::{Config, ConfigBuilder, ConfigError};

/// Builder seeded with the built-in defaults (lowest precedence).
pub fn builder_with_defaults() -> Result<ConfigBuilder<DefaultState>, ConfigError> {
    Config::builder()
        .set_default("store.backend", "sled")?
        .set_default("session.connect_string", "hadoop100:2181")?
        .set_default("session.session_timeout_ms", 10_000i64)?
        .set_default("logging.level", "info")
}
