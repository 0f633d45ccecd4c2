//! Graph validation logic.

use std::collections::HashSet;

use cg_core::{CgResult, CommitHash, CommitRecord, EdgeId, NodeId};

use crate::error::GraphError;
use crate::graph::{MutableGraph, NodeKind};

/// Shape of the graph's last row, as seen by append.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum TrailingRow {
    /// The graph has no rows yet.
    None,
    /// The graph ended cleanly on a commit row.
    Commit { row: usize },
    /// The graph ends with placeholders for parents not loaded yet.
    EndCommits { row: usize },
}

/// Check a batch against the graph before anything is laid out.
///
/// Rejects empty batches, commits already in the graph or repeated in the batch, repeated parents,
/// and parents that appear before their child (which also catches self-loops and cycles).
pub(crate) fn validate_batch(graph: &MutableGraph, commits: &[CommitRecord]) -> CgResult<()> {
    if commits.is_empty() {
        return Err(GraphError::EmptyBatch.into());
    }

    let mut seen: HashSet<&CommitHash> = HashSet::with_capacity(commits.len());
    for commit in commits {
        if graph.contains_commit(&commit.hash) || !seen.insert(&commit.hash) {
            return Err(GraphError::DuplicateCommit {
                hash: commit.hash.clone(),
            }
            .into());
        }

        let mut parents: HashSet<&CommitHash> = HashSet::with_capacity(commit.parents.len());
        for parent in &commit.parents {
            if !parents.insert(parent) {
                return Err(GraphError::DuplicateParent {
                    commit: commit.hash.clone(),
                    parent: parent.clone(),
                }
                .into());
            }
            if seen.contains(parent) || graph.contains_commit(parent) {
                return Err(GraphError::ParentBeforeChild {
                    commit: commit.hash.clone(),
                    parent: parent.clone(),
                }
                .into());
            }
        }
    }

    Ok(())
}

/// Classify the trailing row; any mix append cannot continue from is an invariant violation.
pub(crate) fn trailing_row(graph: &MutableGraph) -> CgResult<TrailingRow> {
    let Some(last) = graph.all_rows.last() else {
        return Ok(TrailingRow::None);
    };

    let count = |kind: NodeKind| {
        last.nodes
            .iter()
            .filter(|id| graph.nodes[id.slot()].kind == kind)
            .count()
    };
    let commits = count(NodeKind::Commit);
    let end_commits = count(NodeKind::EndCommit);
    let edges = count(NodeKind::Edge);

    // Lanes only pass through rows that hold a commit, so a finished batch ends on a lone commit
    // or on a row of placeholders.
    match (commits, end_commits, edges) {
        (1, 0, 0) => Ok(TrailingRow::Commit { row: last.index }),
        (0, n, 0) if n > 0 => Ok(TrailingRow::EndCommits { row: last.index }),
        _ => Err(GraphError::MalformedTrailingRow {
            row: last.index,
            commits,
            end_commits,
            edges,
        }
        .into()),
    }
}

/// Verify the structural invariants of a finished graph.
///
/// - every node sits in exactly one row, and that row is the one it records
/// - rows are numbered by position
/// - at most one commit node per hash, matching the commit index
/// - every edge is listed on both endpoints and links a row to the one right below it
/// - every edge node has exactly one continuation below it, for the same commit and lane
/// - end-commit nodes only appear in the trailing row
pub fn check_structure(graph: &MutableGraph) -> CgResult<()> {
    let fail = |what: String| -> CgResult<()> { Err(GraphError::Inconsistent { what }.into()) };

    let mut placed: HashSet<NodeId> = HashSet::with_capacity(graph.nodes.len());
    for (position, row) in graph.all_rows.iter().enumerate() {
        if row.index != position {
            return fail(format!("row at position {} is numbered {}", position, row.index));
        }
        for &id in &row.nodes {
            if !placed.insert(id) {
                return fail(format!("node {} is placed twice", id));
            }
            let recorded = graph.nodes[id.slot()].row;
            if recorded != Some(position) {
                return fail(format!(
                    "node {} is in row {} but records {:?}",
                    id, position, recorded
                ));
            }
        }
    }
    if placed.len() != graph.nodes.len() {
        return fail(format!(
            "{} of {} nodes are not placed in any row",
            graph.nodes.len() - placed.len(),
            graph.nodes.len()
        ));
    }

    let last_row = graph.all_rows.len().saturating_sub(1);
    let mut commit_hashes: HashSet<&CommitHash> = HashSet::new();
    for (slot, node) in graph.nodes.iter().enumerate() {
        let id = NodeId::from_len(slot);
        match node.kind {
            NodeKind::Commit => {
                if !commit_hashes.insert(&node.commit) {
                    return fail(format!("commit {} has more than one commit node", node.commit));
                }
                if graph.commits.get(&node.commit) != Some(&id) {
                    return fail(format!("commit index disagrees for {}", node.commit));
                }
            }
            NodeKind::Edge => {
                let [down] = node.down_edges.as_slice() else {
                    return fail(format!(
                        "edge node {} for {} has {} continuations",
                        id,
                        node.commit,
                        node.down_edges.len()
                    ));
                };
                let next = &graph.nodes[graph.edges[down.slot()].down.slot()];
                if next.commit != node.commit || next.branch != node.branch {
                    return fail(format!("edge node {} continues into another lane", id));
                }
            }
            NodeKind::EndCommit => {
                if node.row != Some(last_row) {
                    return fail(format!("end commit {} outside the trailing row", node.commit));
                }
            }
        }
    }
    if commit_hashes.len() != graph.commits.len() {
        return fail("commit index lists commits without a commit node".to_string());
    }

    for (slot, edge) in graph.edges.iter().enumerate() {
        let id = EdgeId::from_len(slot);
        let (up, down) = (&graph.nodes[edge.up.slot()], &graph.nodes[edge.down.slot()]);
        if !up.down_edges.contains(&id) || !down.up_edges.contains(&id) {
            return fail(format!("edge {} is not linked on both endpoints", id));
        }
        match (up.row, down.row) {
            (Some(u), Some(d)) if u + 1 == d => {}
            (u, d) => return fail(format!("edge {} runs from row {:?} to row {:?}", id, u, d)),
        }
    }

    Ok(())
}
