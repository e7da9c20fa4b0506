//! Deletion outcomes and reports.

use crate::path::NodePath;
use serde::ser::SerializeStruct;
use serde::{Serialize, Serializer};

/// Reason attached to a parent whose subtree could not be fully removed
pub const REASON_CHILD_INCOMPLETE: &str = "child deletion incomplete";
/// Reason attached to the node being processed when the store went away
pub const REASON_STORE_UNAVAILABLE: &str = "store unavailable";
/// Reason attached to the node being processed when the caller cancelled
pub const REASON_CANCELLED: &str = "cancelled";
/// Reason attached when a child appeared between listing and deleting
pub const REASON_NOT_EMPTY: &str = "node not empty";

/// What happened to a single node
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeletionStatus {
    Deleted,
    NotFound,
    /// The node changed after its version was read; left in place
    VersionConflict,
    Failed(String),
}

impl DeletionStatus {
    /// Whether the parent may still be deleted after this child outcome
    pub fn permits_parent_delete(&self) -> bool {
        matches!(self, DeletionStatus::Deleted | DeletionStatus::NotFound)
    }

    pub fn label(&self) -> &'static str {
        match self {
            DeletionStatus::Deleted => "deleted",
            DeletionStatus::NotFound => "not_found",
            DeletionStatus::VersionConflict => "version_conflict",
            DeletionStatus::Failed(_) => "failed",
        }
    }

    pub fn reason(&self) -> Option<&str> {
        match self {
            DeletionStatus::Failed(reason) => Some(reason),
            _ => None,
        }
    }
}

/// Outcome for one visited path
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeletionOutcome {
    pub path: NodePath,
    pub status: DeletionStatus,
}

impl DeletionOutcome {
    pub fn new(path: NodePath, status: DeletionStatus) -> Self {
        Self { path, status }
    }

    pub fn deleted(path: NodePath) -> Self {
        Self::new(path, DeletionStatus::Deleted)
    }

    pub fn not_found(path: NodePath) -> Self {
        Self::new(path, DeletionStatus::NotFound)
    }

    pub fn version_conflict(path: NodePath) -> Self {
        Self::new(path, DeletionStatus::VersionConflict)
    }

    pub fn failed(path: NodePath, reason: impl Into<String>) -> Self {
        Self::new(path, DeletionStatus::Failed(reason.into()))
    }
}

impl Serialize for DeletionOutcome {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let reason = self.status.reason();
        let fields = if reason.is_some() { 3 } else { 2 };
        let mut state = serializer.serialize_struct("DeletionOutcome", fields)?;
        state.serialize_field("path", &self.path)?;
        state.serialize_field("status", self.status.label())?;
        if let Some(reason) = reason {
            state.serialize_field("reason", reason)?;
        }
        state.end()
    }
}

/// Why a traversal stopped before visiting the whole subtree
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum AbortReason {
    /// The store became unreachable or the session expired
    StoreUnavailable { path: NodePath, error: String },
    /// The caller's cancellation token fired
    Cancelled { path: NodePath },
}

/// Counts per status
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct DeletionSummary {
    pub deleted: usize,
    pub not_found: usize,
    pub version_conflicts: usize,
    pub failed: usize,
}

/// Result of one recursive delete
#[derive(Debug, Clone, Serialize)]
pub struct DeletionReport {
    pub root: NodePath,
    /// Post-order: every child precedes its parent
    pub outcomes: Vec<DeletionOutcome>,
    pub aborted: Option<AbortReason>,
    pub duration_ms: u64,
}

impl DeletionReport {
    pub fn outcomes(&self) -> &[DeletionOutcome] {
        &self.outcomes
    }

    pub fn into_outcomes(self) -> Vec<DeletionOutcome> {
        self.outcomes
    }

    /// The root's own outcome, absent when the traversal aborted below it
    pub fn root_outcome(&self) -> Option<&DeletionOutcome> {
        self.outcomes.last().filter(|outcome| outcome.path == self.root)
    }

    /// True when the subtree is gone, whether removed now or already absent
    pub fn is_complete(&self) -> bool {
        self.aborted.is_none()
            && self
                .root_outcome()
                .map(|outcome| outcome.status.permits_parent_delete())
                .unwrap_or(false)
    }

    pub fn summary(&self) -> DeletionSummary {
        let mut summary = DeletionSummary::default();
        for outcome in &self.outcomes {
            match outcome.status {
                DeletionStatus::Deleted => summary.deleted += 1,
                DeletionStatus::NotFound => summary.not_found += 1,
                DeletionStatus::VersionConflict => summary.version_conflicts += 1,
                DeletionStatus::Failed(_) => summary.failed += 1,
            }
        }
        summary
    }
}
