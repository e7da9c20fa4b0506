//! Shared fixtures: tree builders and a store wrapper that injects races.

use parking_lot::Mutex;
use std::collections::HashSet;
use ztree::{CreateMode, HierarchicalStore, NodePath, Stat, StoreError};

pub fn p(raw: &str) -> NodePath {
    NodePath::parse(raw).unwrap()
}

/// Create every path in order; parents must come first
pub fn build_tree(store: &dyn HierarchicalStore, paths: &[&str]) {
    for path in paths {
        store
            .create(&p(path), path.as_bytes(), CreateMode::Persistent)
            .unwrap();
    }
}

/// The tree used by the documented scenarios: /a{b, c{d}}
pub const SCENARIO_TREE: &[&str] = &["/a", "/a/b", "/a/c", "/a/c/d"];

/// Action a `ChaosStore` performs just before forwarding a call
pub enum Chaos {
    /// Another writer bumps the node's version before it is deleted
    BumpBeforeDelete(NodePath),
    /// Another writer adds a child to the node before it is deleted
    AddChildBeforeDelete(NodePath, String),
    /// Another client removes the node between exists and list_children
    RemoveBeforeList(NodePath),
    /// The connection drops just before this node is deleted
    DisconnectBeforeDelete(NodePath),
}

/// Forwards to an inner store, injecting concurrent-client behaviour
pub struct ChaosStore<'a> {
    pub inner: &'a dyn HierarchicalStore,
    pub chaos: Vec<Chaos>,
    disconnected: Mutex<bool>,
    pub deletes: Mutex<Vec<NodePath>>,
    fired: Mutex<HashSet<usize>>,
}

impl<'a> ChaosStore<'a> {
    pub fn new(inner: &'a dyn HierarchicalStore, chaos: Vec<Chaos>) -> Self {
        Self {
            inner,
            chaos,
            disconnected: Mutex::new(false),
            deletes: Mutex::new(Vec::new()),
            fired: Mutex::new(HashSet::new()),
        }
    }

    fn check_connected(&self) -> Result<(), StoreError> {
        if *self.disconnected.lock() {
            return Err(StoreError::Unavailable("connection reset".to_string()));
        }
        Ok(())
    }

    fn first_time(&self, idx: usize) -> bool {
        self.fired.lock().insert(idx)
    }
}

impl HierarchicalStore for ChaosStore<'_> {
    fn create(&self, path: &NodePath, data: &[u8], mode: CreateMode) -> Result<NodePath, StoreError> {
        self.check_connected()?;
        self.inner.create(path, data, mode)
    }

    fn stat(&self, path: &NodePath) -> Result<Option<Stat>, StoreError> {
        self.check_connected()?;
        self.inner.stat(path)
    }

    fn get_data(&self, path: &NodePath) -> Result<(Vec<u8>, Stat), StoreError> {
        self.check_connected()?;
        self.inner.get_data(path)
    }

    fn set_data(&self, path: &NodePath, data: &[u8], expected: Option<u64>) -> Result<Stat, StoreError> {
        self.check_connected()?;
        self.inner.set_data(path, data, expected)
    }

    fn list_children(&self, path: &NodePath) -> Result<Vec<String>, StoreError> {
        self.check_connected()?;
        for (idx, chaos) in self.chaos.iter().enumerate() {
            if let Chaos::RemoveBeforeList(target) = chaos {
                if target == path && self.first_time(idx) {
                    self.inner.delete(path, None)?;
                }
            }
        }
        self.inner.list_children(path)
    }

    fn delete(&self, path: &NodePath, expected: Option<u64>) -> Result<(), StoreError> {
        self.check_connected()?;
        for (idx, chaos) in self.chaos.iter().enumerate() {
            match chaos {
                Chaos::BumpBeforeDelete(target) if target == path && self.first_time(idx) => {
                    self.inner.set_data(path, b"concurrent", None)?;
                }
                Chaos::AddChildBeforeDelete(target, child) if target == path && self.first_time(idx) => {
                    self.inner
                        .create(&path.join(child).unwrap(), b"", CreateMode::Persistent)?;
                }
                Chaos::DisconnectBeforeDelete(target) if target == path => {
                    *self.disconnected.lock() = true;
                    return Err(StoreError::Unavailable("connection reset".to_string()));
                }
                _ => {}
            }
        }
        self.deletes.lock().push(path.clone());
        self.inner.delete(path, expected)
    }
}
