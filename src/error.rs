//! Error types for the path, store, and API layers.

use crate::types::Version;
use thiserror::Error;

/// Rejected node path syntax
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PathError {
    #[error("path is empty")]
    Empty,

    #[error("path must start with '/': {0}")]
    NotAbsolute(String),

    #[error("path must not end with '/': {0}")]
    TrailingSlash(String),

    #[error("path contains an empty segment: {0}")]
    EmptySegment(String),

    #[error("path segment '{segment}' is not allowed in {path}")]
    ReservedSegment { path: String, segment: String },

    #[error("path contains a NUL character: {0:?}")]
    NulCharacter(String),

    #[error("invalid child name: {0:?}")]
    InvalidChildName(String),
}

/// Failures reported by a hierarchical store
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StoreError {
    #[error("node does not exist: {0}")]
    NoNode(String),

    #[error("node already exists: {0}")]
    NodeExists(String),

    #[error("parent node does not exist: {0}")]
    NoParent(String),

    #[error("node not empty: {0}")]
    NotEmpty(String),

    #[error("version conflict on {path}: expected {expected}, found {actual}")]
    BadVersion {
        path: String,
        expected: Version,
        actual: Version,
    },

    #[error("the root node cannot be deleted")]
    RootImmutable,

    #[error("store unavailable: {0}")]
    Unavailable(String),

    #[error("session expired")]
    SessionExpired,

    #[error("invalid path: {0}")]
    InvalidPath(#[from] PathError),

    #[error("storage error: {0}")]
    Storage(String),

    #[error("codec error: {0}")]
    Codec(String),
}

impl StoreError {
    /// Connection-level faults after which no further call can be trusted
    pub fn is_fatal(&self) -> bool {
        matches!(self, StoreError::Unavailable(_) | StoreError::SessionExpired)
    }
}

impl From<sled::Error> for StoreError {
    fn from(err: sled::Error) -> Self {
        match err {
            sled::Error::Io(e) => StoreError::Unavailable(e.to_string()),
            other => StoreError::Storage(other.to_string()),
        }
    }
}

impl From<bincode::Error> for StoreError {
    fn from(err: bincode::Error) -> Self {
        StoreError::Codec(err.to_string())
    }
}

/// Top-level error surfaced to CLI and library callers
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Invalid path: {0}")]
    InvalidPath(#[from] PathError),

    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),
}

impl From<config::ConfigError> for ApiError {
    fn from(err: config::ConfigError) -> Self {
        ApiError::ConfigError(err.to_string())
    }
}
