//! ztree: Versioned Hierarchical Node Store
//!
//! A ZooKeeper-style namespace of versioned nodes with a recursive subtree
//! delete that checks every node's version at the moment it is removed and
//! reports a per-node outcome instead of failing silently.

pub mod config;
pub mod delete;
pub mod error;
pub mod logging;
pub mod path;
pub mod store;
pub mod tooling;
pub mod types;

pub use delete::{DeletionOutcome, DeletionReport, DeletionStatus, TreeDeleter};
pub use error::{ApiError, PathError, StoreError};
pub use path::NodePath;
pub use store::{CreateMode, HierarchicalStore, MemoryStore, SledStore, Stat};
