//! In-memory hierarchical store.

use super::{check_version, created_name, CreateMode, HierarchicalStore, NodeRecord, Stat};
use crate::error::StoreError;
use crate::path::NodePath;
use crate::types::Version;
use parking_lot::RwLock;
use std::collections::BTreeMap;
use tracing::debug;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Connection {
    Open,
    Closed,
    Expired,
}

/// Process-local store backed by an ordered map of path to record
///
/// The connection state can be flipped to simulate a lost server or an
/// expired session; every call then fails with a fatal error.
pub struct MemoryStore {
    nodes: RwLock<BTreeMap<NodePath, NodeRecord>>,
    connection: RwLock<Connection>,
}

impl MemoryStore {
    /// Create a store holding only the root node
    pub fn new() -> Self {
        let mut nodes = BTreeMap::new();
        nodes.insert(NodePath::root(), NodeRecord::new(Vec::new()));
        Self {
            nodes: RwLock::new(nodes),
            connection: RwLock::new(Connection::Open),
        }
    }

    /// Make every following call fail with `Unavailable`
    pub fn close(&self) {
        *self.connection.write() = Connection::Closed;
    }

    /// Make every following call fail with `SessionExpired`
    pub fn expire_session(&self) {
        *self.connection.write() = Connection::Expired;
    }

    pub fn reopen(&self) {
        *self.connection.write() = Connection::Open;
    }

    /// Number of nodes including the root
    pub fn node_count(&self) -> usize {
        self.nodes.read().len()
    }

    fn ensure_connected(&self) -> Result<(), StoreError> {
        match *self.connection.read() {
            Connection::Open => Ok(()),
            Connection::Closed => Err(StoreError::Unavailable("connection closed".to_string())),
            Connection::Expired => Err(StoreError::SessionExpired),
        }
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl HierarchicalStore for MemoryStore {
    fn create(
        &self,
        path: &NodePath,
        data: &[u8],
        mode: CreateMode,
    ) -> Result<NodePath, StoreError> {
        self.ensure_connected()?;
        let parent_path = path
            .parent()
            .ok_or_else(|| StoreError::NodeExists(path.to_string()))?;

        let mut nodes = self.nodes.write();
        let counter = nodes
            .get(&parent_path)
            .ok_or_else(|| StoreError::NoParent(path.to_string()))?
            .child_version;
        let name = created_name(path.name(), mode, counter);
        let target = parent_path.join(&name)?;
        if nodes.contains_key(&target) {
            return Err(StoreError::NodeExists(target.to_string()));
        }

        if let Some(parent) = nodes.get_mut(&parent_path) {
            parent.add_child(&name);
        }
        nodes.insert(target.clone(), NodeRecord::new(data.to_vec()));
        debug!(path = %target, "Created node");
        Ok(target)
    }

    fn stat(&self, path: &NodePath) -> Result<Option<Stat>, StoreError> {
        self.ensure_connected()?;
        Ok(self.nodes.read().get(path).map(NodeRecord::stat))
    }

    fn get_data(&self, path: &NodePath) -> Result<(Vec<u8>, Stat), StoreError> {
        self.ensure_connected()?;
        let nodes = self.nodes.read();
        let record = nodes
            .get(path)
            .ok_or_else(|| StoreError::NoNode(path.to_string()))?;
        Ok((record.data.clone(), record.stat()))
    }

    fn set_data(
        &self,
        path: &NodePath,
        data: &[u8],
        expected: Option<Version>,
    ) -> Result<Stat, StoreError> {
        self.ensure_connected()?;
        let mut nodes = self.nodes.write();
        let record = nodes
            .get_mut(path)
            .ok_or_else(|| StoreError::NoNode(path.to_string()))?;
        check_version(path, expected, record.version)?;
        record.update_data(data.to_vec());
        debug!(path = %path, version = record.version, "Updated node data");
        Ok(record.stat())
    }

    fn list_children(&self, path: &NodePath) -> Result<Vec<String>, StoreError> {
        self.ensure_connected()?;
        let nodes = self.nodes.read();
        let record = nodes
            .get(path)
            .ok_or_else(|| StoreError::NoNode(path.to_string()))?;
        Ok(record.children.iter().cloned().collect())
    }

    fn delete(&self, path: &NodePath, expected: Option<Version>) -> Result<(), StoreError> {
        self.ensure_connected()?;
        let parent_path = path.parent().ok_or(StoreError::RootImmutable)?;

        let mut nodes = self.nodes.write();
        let record = nodes
            .get(path)
            .ok_or_else(|| StoreError::NoNode(path.to_string()))?;
        check_version(path, expected, record.version)?;
        if !record.children.is_empty() {
            return Err(StoreError::NotEmpty(path.to_string()));
        }

        nodes.remove(path);
        if let Some(parent) = nodes.get_mut(&parent_path) {
            parent.remove_child(path.name());
        }
        debug!(path = %path, "Deleted node");
        Ok(())
    }
}
