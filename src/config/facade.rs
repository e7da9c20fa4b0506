//! ConfigLoader facade delegating to merge service.

use super::merge::service::MergeService;
use super::ZtreeConfig;
use config::ConfigError;
use std::path::Path;

/// Configuration loader facade.
pub struct ConfigLoader;

impl ConfigLoader {
    /// Load configuration from the global file and environment.
    pub fn load() -> Result<ZtreeConfig, ConfigError> {
        MergeService::load(None)
    }

    /// Load configuration with an explicit file layered over the global one.
    pub fn load_with_file(path: &Path) -> Result<ZtreeConfig, ConfigError> {
        MergeService::load(Some(path))
    }

    /// Create default configuration.
    pub fn default() -> ZtreeConfig {
        ZtreeConfig::default()
    }
}
