//! Graph-specific error types.

use cg_core::{CgError, CommitHash};
use thiserror::Error;

/// Batch validation and structural consistency errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GraphError {
    /// A build or append was given no commits.
    #[error("Empty commit batch")]
    EmptyBatch,

    /// A commit appears twice, either inside the batch or already in the graph.
    #[error("Commit {hash} is already part of the graph")]
    DuplicateCommit { hash: CommitHash },

    /// A parent was seen before its child (batch is not in log order, or the history has a cycle).
    #[error("Parent {parent} of commit {commit} precedes it in log order")]
    ParentBeforeChild {
        commit: CommitHash,
        parent: CommitHash,
    },

    /// A commit lists the same parent more than once.
    #[error("Commit {commit} lists parent {parent} more than once")]
    DuplicateParent {
        commit: CommitHash,
        parent: CommitHash,
    },

    /// The last row of the graph has a shape append cannot continue from.
    #[error(
        "Trailing row {row} is malformed ({commits} commit, {end_commits} end-commit, {edges} edge nodes)"
    )]
    MalformedTrailingRow {
        row: usize,
        commits: usize,
        end_commits: usize,
        edges: usize,
    },

    /// The structural graph breaks one of its invariants.
    #[error("Inconsistent graph structure: {what}")]
    Inconsistent { what: String },
}

impl GraphError {
    /// Structural violations are internal faults; everything else is bad input.
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            GraphError::MalformedTrailingRow { .. } | GraphError::Inconsistent { .. }
        )
    }
}

impl From<GraphError> for CgError {
    fn from(err: GraphError) -> Self {
        if err.is_fatal() {
            CgError::invariant(err.to_string())
        } else {
            CgError::invalid_arg(err.to_string())
        }
    }
}
