//! Configuration
//!
//! Layered configuration for ztree: built-in defaults, the global config file,
//! an optional explicit file, and `ZTREE__*` environment variables.

mod facade;
pub mod merge;
pub mod paths;
pub mod sources;
mod store;

pub use facade::ConfigLoader;
pub use paths::xdg_root as xdg;
pub use store::{StoreBackend, StoreConfig};

use crate::logging::LoggingConfig;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Root configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ZtreeConfig {
    #[serde(default)]
    pub store: StoreConfig,

    #[serde(default)]
    pub session: SessionConfig,

    #[serde(default)]
    pub logging: LoggingConfig,
}

fn default_connect_string() -> String {
    "hadoop100:2181".to_string()
}

fn default_session_timeout_ms() -> u64 {
    10_000
}

/// Client session settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionConfig {
    /// Label of the ensemble this client talks to; shown in the `rmr` report heading
    #[serde(default = "default_connect_string")]
    pub connect_string: String,

    /// Session timeout in milliseconds; informational for the in-process backends
    #[serde(default = "default_session_timeout_ms")]
    pub session_timeout_ms: u64,

    /// Upper bound for a whole recursive delete; `None` means no deadline
    #[serde(default)]
    pub delete_timeout_ms: Option<u64>,
}

impl SessionConfig {
    pub fn session_timeout(&self) -> Duration {
        Duration::from_millis(self.session_timeout_ms)
    }

    pub fn delete_timeout(&self) -> Option<Duration> {
        self.delete_timeout_ms.map(Duration::from_millis)
    }
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            connect_string: default_connect_string(),
            session_timeout_ms: default_session_timeout_ms(),
            delete_timeout_ms: None,
        }
    }
}
