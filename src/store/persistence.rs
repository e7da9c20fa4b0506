//! Sled-backed persistent store.
//!
//! Nodes live in a single sled tree keyed by their absolute path. Values are
//! bincode-encoded `NodeRecord`s. Mutations that touch both a node and its
//! parent's child set run inside one sled transaction.

use super::{check_version, created_name, CreateMode, HierarchicalStore, NodeRecord, Stat};
use crate::error::StoreError;
use crate::path::NodePath;
use crate::types::Version;
use sled::transaction::{
    ConflictableTransactionError, ConflictableTransactionResult, TransactionError,
    TransactionalTree,
};
use std::io::ErrorKind;
use std::path::Path;
use std::thread;
use std::time::Duration;
use tracing::debug;

const NODES_TREE: &str = "nodes";
/// sled releases its file lock from background threads shortly after drop
const LOCK_RETRY_ATTEMPTS: u32 = 50;
const LOCK_RETRY_DELAY: Duration = Duration::from_millis(10);

/// Persistent hierarchical store
pub struct SledStore {
    db: sled::Db,
    nodes: sled::Tree,
}

impl SledStore {
    /// Open (or create) a store at `path`
    ///
    /// Waits briefly for a previous handle on the same directory to release
    /// its lock before giving up.
    pub fn open(path: &Path) -> Result<Self, StoreError> {
        let mut attempt = 1;
        let db = loop {
            match sled::open(path) {
                Ok(db) => break db,
                Err(sled::Error::Io(err))
                    if err.kind() == ErrorKind::WouldBlock && attempt < LOCK_RETRY_ATTEMPTS =>
                {
                    debug!(path = %path.display(), attempt, "Store locked, retrying open");
                    attempt += 1;
                    thread::sleep(LOCK_RETRY_DELAY);
                }
                Err(err) => return Err(err.into()),
            }
        };
        Self::from_db(db)
    }

    /// Open a throwaway store that is removed when dropped
    pub fn temporary() -> Result<Self, StoreError> {
        let db = sled::Config::new().temporary(true).open()?;
        Self::from_db(db)
    }

    fn from_db(db: sled::Db) -> Result<Self, StoreError> {
        let nodes = db.open_tree(NODES_TREE)?;
        let root = encode(&NodeRecord::new(Vec::new()))?;
        // Leaves an existing root untouched.
        let _ = nodes.compare_and_swap("/", None as Option<&[u8]>, Some(root))?;
        Ok(Self { db, nodes })
    }

    /// Force pending writes to disk
    pub fn flush(&self) -> Result<(), StoreError> {
        self.db.flush()?;
        Ok(())
    }

    fn load(&self, path: &NodePath) -> Result<Option<NodeRecord>, StoreError> {
        match self.nodes.get(path.as_str())? {
            Some(bytes) => Ok(Some(decode(&bytes)?)),
            None => Ok(None),
        }
    }
}

fn encode(record: &NodeRecord) -> Result<Vec<u8>, StoreError> {
    Ok(bincode::serialize(record)?)
}

fn decode(bytes: &[u8]) -> Result<NodeRecord, StoreError> {
    Ok(bincode::deserialize(bytes)?)
}

fn abort<T>(err: StoreError) -> ConflictableTransactionResult<T, StoreError> {
    Err(ConflictableTransactionError::Abort(err))
}

fn load_tx(
    tx: &TransactionalTree,
    path: &NodePath,
) -> ConflictableTransactionResult<Option<NodeRecord>, StoreError> {
    match tx.get(path.as_str())? {
        Some(bytes) => decode(&bytes)
            .map(Some)
            .map_err(ConflictableTransactionError::Abort),
        None => Ok(None),
    }
}

fn save_tx(
    tx: &TransactionalTree,
    path: &NodePath,
    record: &NodeRecord,
) -> ConflictableTransactionResult<(), StoreError> {
    let bytes = encode(record).map_err(ConflictableTransactionError::Abort)?;
    tx.insert(path.as_str(), bytes)?;
    Ok(())
}

fn flatten<T>(result: Result<T, TransactionError<StoreError>>) -> Result<T, StoreError> {
    match result {
        Ok(value) => Ok(value),
        Err(TransactionError::Abort(err)) => Err(err),
        Err(TransactionError::Storage(err)) => Err(err.into()),
    }
}

impl HierarchicalStore for SledStore {
    fn create(
        &self,
        path: &NodePath,
        data: &[u8],
        mode: CreateMode,
    ) -> Result<NodePath, StoreError> {
        let parent_path = path
            .parent()
            .ok_or_else(|| StoreError::NodeExists(path.to_string()))?;

        let created = flatten(self.nodes.transaction(|tx| {
            let mut parent = match load_tx(tx, &parent_path)? {
                Some(record) => record,
                None => return abort(StoreError::NoParent(path.to_string())),
            };
            let name = created_name(path.name(), mode, parent.child_version);
            let target = parent_path
                .join(&name)
                .map_err(|e| ConflictableTransactionError::Abort(StoreError::from(e)))?;
            if tx.get(target.as_str())?.is_some() {
                return abort(StoreError::NodeExists(target.to_string()));
            }
            parent.add_child(&name);
            save_tx(tx, &parent_path, &parent)?;
            save_tx(tx, &target, &NodeRecord::new(data.to_vec()))?;
            Ok(target)
        }))?;

        self.flush()?;
        debug!(path = %created, "Created node");
        Ok(created)
    }

    fn stat(&self, path: &NodePath) -> Result<Option<Stat>, StoreError> {
        Ok(self.load(path)?.map(|record| record.stat()))
    }

    fn get_data(&self, path: &NodePath) -> Result<(Vec<u8>, Stat), StoreError> {
        let record = self
            .load(path)?
            .ok_or_else(|| StoreError::NoNode(path.to_string()))?;
        let stat = record.stat();
        Ok((record.data, stat))
    }

    fn set_data(
        &self,
        path: &NodePath,
        data: &[u8],
        expected: Option<Version>,
    ) -> Result<Stat, StoreError> {
        let stat = flatten(self.nodes.transaction(|tx| {
            let mut record = match load_tx(tx, path)? {
                Some(record) => record,
                None => return abort(StoreError::NoNode(path.to_string())),
            };
            check_version(path, expected, record.version)
                .map_err(ConflictableTransactionError::Abort)?;
            record.update_data(data.to_vec());
            save_tx(tx, path, &record)?;
            Ok(record.stat())
        }))?;

        self.flush()?;
        debug!(path = %path, version = stat.version, "Updated node data");
        Ok(stat)
    }

    fn list_children(&self, path: &NodePath) -> Result<Vec<String>, StoreError> {
        let record = self
            .load(path)?
            .ok_or_else(|| StoreError::NoNode(path.to_string()))?;
        Ok(record.children.into_iter().collect())
    }

    fn delete(&self, path: &NodePath, expected: Option<Version>) -> Result<(), StoreError> {
        let parent_path = path.parent().ok_or(StoreError::RootImmutable)?;

        flatten(self.nodes.transaction(|tx| {
            let record = match load_tx(tx, path)? {
                Some(record) => record,
                None => return abort(StoreError::NoNode(path.to_string())),
            };
            check_version(path, expected, record.version)
                .map_err(ConflictableTransactionError::Abort)?;
            if !record.children.is_empty() {
                return abort(StoreError::NotEmpty(path.to_string()));
            }
            tx.remove(path.as_str())?;
            if let Some(mut parent) = load_tx(tx, &parent_path)? {
                parent.remove_child(path.name());
                save_tx(tx, &parent_path, &parent)?;
            }
            Ok(())
        }))?;

        self.flush()?;
        debug!(path = %path, "Deleted node");
        Ok(())
    }
}
