//! Recursive Tree Deletion
//!
//! Removes a node and its whole subtree from a hierarchical store. The store
//! refuses to delete non-empty nodes, so children go first (post-order). Every
//! delete carries the version read when the node was visited; a node changed
//! in between is reported as a conflict and its ancestors are left in place.
//!
//! Traversal uses an explicit stack, so depth is bounded by memory only.

pub mod cancel;
pub mod outcome;

pub use cancel::CancellationToken;
pub use outcome::{
    AbortReason, DeletionOutcome, DeletionReport, DeletionStatus, DeletionSummary,
    REASON_CANCELLED, REASON_CHILD_INCOMPLETE, REASON_NOT_EMPTY, REASON_STORE_UNAVAILABLE,
};

use crate::error::StoreError;
use crate::path::NodePath;
use crate::store::HierarchicalStore;
use crate::types::Version;
use std::time::Instant;
use tracing::{debug, info, warn};

/// A visited node whose children are still being processed
struct PendingNode {
    path: NodePath,
    version: Version,
    children: std::vec::IntoIter<String>,
    /// Set once any child ends in something other than Deleted/NotFound
    blocked: bool,
}

enum Visit {
    Descend(PendingNode),
    Settled(DeletionOutcome),
    Fatal(StoreError),
}

/// Deletes subtrees with per-node optimistic version checks
pub struct TreeDeleter<'a, S: HierarchicalStore + ?Sized> {
    store: &'a S,
    cancel: CancellationToken,
}

impl<'a, S: HierarchicalStore + ?Sized> TreeDeleter<'a, S> {
    pub fn new(store: &'a S) -> Self {
        Self {
            store,
            cancel: CancellationToken::new(),
        }
    }

    /// Checked before descending into each child
    pub fn with_cancellation(mut self, cancel: CancellationToken) -> Self {
        self.cancel = cancel;
        self
    }

    /// Delete `root` and everything below it.
    ///
    /// Outcomes are in post-order. An absent root yields exactly one
    /// `NotFound`. A fatal store error or cancellation stops the walk; the
    /// report then ends with a `Failed` entry for the node being processed.
    pub fn delete_tree(&self, root: &NodePath) -> DeletionReport {
        let started = Instant::now();
        let mut outcomes = Vec::new();
        let aborted = self.traverse(root, &mut outcomes).err();

        let report = DeletionReport {
            root: root.clone(),
            outcomes,
            aborted,
            duration_ms: started.elapsed().as_millis() as u64,
        };
        let summary = report.summary();
        info!(
            root = %root,
            deleted = summary.deleted,
            not_found = summary.not_found,
            version_conflicts = summary.version_conflicts,
            failed = summary.failed,
            duration_ms = report.duration_ms,
            "Recursive delete finished"
        );
        report
    }

    /// Delete a single childless node, using `expected` or the version read now
    pub fn delete_node(&self, path: &NodePath, expected: Option<Version>) -> DeletionOutcome {
        let version = match self.store.exists(path) {
            Ok(Some(version)) => expected.unwrap_or(version),
            Ok(None) => return DeletionOutcome::not_found(path.clone()),
            Err(err) => return failure_outcome(path, &err),
        };
        let outcome = match self.store.delete(path, Some(version)) {
            Ok(()) => DeletionOutcome::deleted(path.clone()),
            Err(err) => classify_delete_error(path, &err),
        };
        debug!(path = %path, status = outcome.status.label(), "Single node delete");
        outcome
    }

    fn traverse(
        &self,
        root: &NodePath,
        outcomes: &mut Vec<DeletionOutcome>,
    ) -> Result<(), AbortReason> {
        let mut stack = match self.visit(root) {
            Visit::Descend(node) => vec![node],
            Visit::Settled(outcome) => {
                record(outcomes, outcome);
                return Ok(());
            }
            Visit::Fatal(err) => return Err(abort_fatal(root, &err, outcomes)),
        };

        while let Some(top) = stack.last_mut() {
            if let Some(child) = top.children.next() {
                if self.cancel.is_cancelled() {
                    let path = top.path.clone();
                    warn!(path = %path, "Recursive delete cancelled");
                    outcomes.push(DeletionOutcome::failed(path.clone(), REASON_CANCELLED));
                    return Err(AbortReason::Cancelled { path });
                }

                let child_path = match top.path.join(&child) {
                    Ok(path) => path,
                    Err(err) => {
                        warn!(parent = %top.path, child = %child, error = %err, "Skipping unaddressable child");
                        top.blocked = true;
                        continue;
                    }
                };

                match self.visit(&child_path) {
                    Visit::Descend(node) => stack.push(node),
                    Visit::Settled(outcome) => {
                        if !outcome.status.permits_parent_delete() {
                            top.blocked = true;
                        }
                        record(outcomes, outcome);
                    }
                    Visit::Fatal(err) => return Err(abort_fatal(&child_path, &err, outcomes)),
                }
            } else {
                let Some(node) = stack.pop() else { break };
                let outcome = if node.blocked {
                    DeletionOutcome::failed(node.path, REASON_CHILD_INCOMPLETE)
                } else {
                    match self.store.delete(&node.path, Some(node.version)) {
                        Ok(()) => DeletionOutcome::deleted(node.path),
                        Err(err) if err.is_fatal() => {
                            return Err(abort_fatal(&node.path, &err, outcomes))
                        }
                        Err(err) => classify_delete_error(&node.path, &err),
                    }
                };

                if let Some(parent) = stack.last_mut() {
                    if !outcome.status.permits_parent_delete() {
                        parent.blocked = true;
                    }
                }
                record(outcomes, outcome);
            }
        }

        Ok(())
    }

    /// Read version and children of `path`
    fn visit(&self, path: &NodePath) -> Visit {
        let version = match self.store.exists(path) {
            Ok(Some(version)) => version,
            Ok(None) => return Visit::Settled(DeletionOutcome::not_found(path.clone())),
            Err(err) if err.is_fatal() => return Visit::Fatal(err),
            Err(err) => return Visit::Settled(failure_outcome(path, &err)),
        };

        match self.store.list_children(path) {
            Ok(children) => Visit::Descend(PendingNode {
                path: path.clone(),
                version,
                children: children.into_iter(),
                blocked: false,
            }),
            // Removed by someone else after the existence check.
            Err(StoreError::NoNode(_)) => Visit::Settled(DeletionOutcome::not_found(path.clone())),
            Err(err) if err.is_fatal() => Visit::Fatal(err),
            Err(err) => Visit::Settled(failure_outcome(path, &err)),
        }
    }
}

fn record(outcomes: &mut Vec<DeletionOutcome>, outcome: DeletionOutcome) {
    debug!(path = %outcome.path, status = outcome.status.label(), "Node outcome");
    outcomes.push(outcome);
}

fn abort_fatal(
    path: &NodePath,
    err: &StoreError,
    outcomes: &mut Vec<DeletionOutcome>,
) -> AbortReason {
    warn!(path = %path, error = %err, "Store lost during recursive delete");
    outcomes.push(DeletionOutcome::failed(path.clone(), REASON_STORE_UNAVAILABLE));
    AbortReason::StoreUnavailable {
        path: path.clone(),
        error: err.to_string(),
    }
}

fn failure_outcome(path: &NodePath, err: &StoreError) -> DeletionOutcome {
    if err.is_fatal() {
        DeletionOutcome::failed(path.clone(), REASON_STORE_UNAVAILABLE)
    } else {
        DeletionOutcome::failed(path.clone(), err.to_string())
    }
}

fn classify_delete_error(path: &NodePath, err: &StoreError) -> DeletionOutcome {
    match err {
        StoreError::NoNode(_) => DeletionOutcome::not_found(path.clone()),
        StoreError::BadVersion { .. } => DeletionOutcome::version_conflict(path.clone()),
        StoreError::NotEmpty(_) => DeletionOutcome::failed(path.clone(), REASON_NOT_EMPTY),
        other => failure_outcome(path, other),
    }
}
