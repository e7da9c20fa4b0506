//! Hierarchical Node Store
//!
//! The client-facing contract of a versioned, tree-shaped key-value namespace
//! plus the two backends shipped with ztree: an in-memory store and a
//! persistent sled-backed store.

pub mod memory;
pub mod persistence;

pub use memory::MemoryStore;
pub use persistence::SledStore;

use crate::config::{StoreBackend, StoreConfig};
use crate::error::{ApiError, StoreError};
use crate::path::NodePath;
use crate::types::{Millis, Version, SEQUENTIAL_SUFFIX_WIDTH};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::sync::Arc;
use tracing::info;

/// How a node name is chosen on create
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum CreateMode {
    /// Use the requested name as-is
    #[default]
    Persistent,
    /// Append the parent's monotonically increasing child counter to the name
    PersistentSequential,
}

/// Node metadata returned by stat-like calls
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Stat {
    /// Data version, bumped by every successful `set_data`
    pub version: Version,
    /// Child version, bumped whenever a child is created or deleted
    pub child_version: Version,
    pub num_children: usize,
    pub data_length: usize,
    pub created_ms: Millis,
    pub modified_ms: Millis,
}

/// NodeRecord: the stored form of a node
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NodeRecord {
    pub data: Vec<u8>,
    pub version: Version,
    pub child_version: Version,
    pub children: BTreeSet<String>,
    pub created_ms: Millis,
    pub modified_ms: Millis,
}

impl NodeRecord {
    pub fn new(data: Vec<u8>) -> Self {
        let now = now_ms();
        Self {
            data,
            version: 0,
            child_version: 0,
            children: BTreeSet::new(),
            created_ms: now,
            modified_ms: now,
        }
    }

    pub fn stat(&self) -> Stat {
        Stat {
            version: self.version,
            child_version: self.child_version,
            num_children: self.children.len(),
            data_length: self.data.len(),
            created_ms: self.created_ms,
            modified_ms: self.modified_ms,
        }
    }

    /// Replace the data and bump the version
    pub(crate) fn update_data(&mut self, data: Vec<u8>) {
        self.data = data;
        self.version += 1;
        self.modified_ms = now_ms();
    }

    pub(crate) fn add_child(&mut self, name: &str) {
        self.children.insert(name.to_string());
        self.child_version += 1;
    }

    pub(crate) fn remove_child(&mut self, name: &str) {
        if self.children.remove(name) {
            self.child_version += 1;
        }
    }
}

/// HierarchicalStore: operations a client performs against the namespace
///
/// Every mutation is atomic with respect to other callers of the same store.
/// Versions are checked at the moment of mutation.
pub trait HierarchicalStore: Send + Sync {
    /// Create a node under an existing parent; returns the actual path created
    fn create(&self, path: &NodePath, data: &[u8], mode: CreateMode)
        -> Result<NodePath, StoreError>;

    /// Metadata of a node, `None` if it does not exist
    fn stat(&self, path: &NodePath) -> Result<Option<Stat>, StoreError>;

    /// Current version of a node, `None` if it does not exist
    fn exists(&self, path: &NodePath) -> Result<Option<Version>, StoreError> {
        Ok(self.stat(path)?.map(|stat| stat.version))
    }

    fn get_data(&self, path: &NodePath) -> Result<(Vec<u8>, Stat), StoreError>;

    /// Replace the data of a node. `expected = None` writes unconditionally.
    fn set_data(
        &self,
        path: &NodePath,
        data: &[u8],
        expected: Option<Version>,
    ) -> Result<Stat, StoreError>;

    /// Immediate child names, sorted
    fn list_children(&self, path: &NodePath) -> Result<Vec<String>, StoreError>;

    /// Delete a childless node whose version equals `expected` (any version if `None`)
    fn delete(&self, path: &NodePath, expected: Option<Version>) -> Result<(), StoreError>;
}

/// Open the store backend selected by configuration
pub fn open(config: &StoreConfig) -> Result<Arc<dyn HierarchicalStore>, ApiError> {
    match config.backend {
        StoreBackend::Memory => {
            info!("Opening in-memory store");
            Ok(Arc::new(MemoryStore::new()))
        }
        StoreBackend::Sled => {
            let path = config.resolve_path()?;
            if let Some(parent) = path.parent() {
                std::fs::create_dir_all(parent).map_err(|e| {
                    ApiError::ConfigError(format!("Failed to create store directory: {}", e))
                })?;
            }
            info!(path = %path.display(), "Opening sled store");
            Ok(Arc::new(SledStore::open(&path)?))
        }
    }
}

/// Name of the node actually created for `requested` under `mode`
pub(crate) fn created_name(requested: &str, mode: CreateMode, counter: Version) -> String {
    match mode {
        CreateMode::Persistent => requested.to_string(),
        CreateMode::PersistentSequential => format!(
            "{}{:0width$}",
            requested,
            counter,
            width = SEQUENTIAL_SUFFIX_WIDTH
        ),
    }
}

pub(crate) fn check_version(
    path: &NodePath,
    expected: Option<Version>,
    actual: Version,
) -> Result<(), StoreError> {
    match expected {
        Some(expected) if expected != actual => Err(StoreError::BadVersion {
            path: path.to_string(),
            expected,
            actual,
        }),
        _ => Ok(()),
    }
}

pub(crate) fn now_ms() -> Millis {
    chrono::Utc::now().timestamp_millis()
}
