//! StoreConfig and path resolution for the persistent backend.

use crate::config::xdg;
use crate::error::ApiError;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Which store implementation backs a session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StoreBackend {
    /// Process-local, discarded on exit
    Memory,
    /// Persistent sled database
    #[default]
    Sled,
}

/// Store configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StoreConfig {
    #[serde(default)]
    pub backend: StoreBackend,

    /// Sled database directory; None means `$XDG_DATA_HOME/ztree/store`
    #[serde(default)]
    pub path: Option<PathBuf>,
}

impl StoreConfig {
    /// Resolve the sled database directory.
    pub fn resolve_path(&self) -> Result<PathBuf, ApiError> {
        match &self.path {
            Some(path) if !path.as_os_str().is_empty() => Ok(path.clone()),
            _ => Ok(xdg::store_dir()?),
        }
    }
}
