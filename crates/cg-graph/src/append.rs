//! Incremental append of later log batches.

use cg_core::{CgResult, CommitRecord, VcsRef};
use tracing::{debug, error};

use crate::builder::{Frontier, GraphBuilder};
use crate::graph::{MutableGraph, NodeRow};
use crate::validate::{self, TrailingRow};

/// Extends a `MutableGraph` with the next batch of the same log.
///
/// Rows before the graph's trailing row keep their indices. If the trailing row holds end-commit
/// placeholders it is rebuilt as the first row of the batch: the placeholders go back to being
/// pending lanes, so the batch's first commit is finished in place and every other lane passes
/// through that row as an edge node.
#[derive(Debug, Default, Clone)]
pub struct GraphAppendBuilder {
    builder: GraphBuilder,
}

impl GraphAppendBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_builder(builder: GraphBuilder) -> Self {
        Self { builder }
    }

    /// Append `commits` (log order, non-empty) to `graph`.
    ///
    /// On error the graph is left exactly as it was.
    pub fn append_to_graph(
        &self,
        graph: &mut MutableGraph,
        commits: &[CommitRecord],
        refs: impl IntoIterator<Item = VcsRef>,
    ) -> CgResult<()> {
        validate::validate_batch(graph, commits)?;
        let trailing = validate::trailing_row(graph).inspect_err(|err| {
            error!(error = %err, "cannot append to graph with malformed trailing row");
        })?;

        graph.refs.extend(refs);
        let (start, next_row, frontier) = match trailing {
            TrailingRow::None => (0, NodeRow::new(0), Frontier::new()),
            TrailingRow::Commit { row } => (row + 1, NodeRow::new(row + 1), Frontier::new()),
            TrailingRow::EndCommits { row } => {
                (row, NodeRow::new(row), reopen_frontier(graph, row))
            }
        };
        debug!(start_row = start, rows = graph.all_rows.len(), "appending to graph");

        let rows = self
            .builder
            .layout_commits(graph, commits, next_row, frontier);
        graph.splice_rows(start, rows);
        graph.update_visible_rows();
        Ok(())
    }
}

/// Take the end-commit placeholders of trailing row `row` back into a frontier.
///
/// The layout that follows rebuilds the row exactly as a single build over both batches would.
fn reopen_frontier(graph: &mut MutableGraph, row: usize) -> Frontier {
    let placed = graph.all_rows[row].nodes.clone();
    placed
        .into_iter()
        .map(|id| {
            let node = graph.node_mut(id);
            node.row = None;
            (node.commit.clone(), id)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::NodeKind;
    use cg_core::{CgError, CommitHash};

    fn build(commits: &[CommitRecord]) -> MutableGraph {
        GraphBuilder::new().build(commits, []).unwrap()
    }

    #[test]
    fn append_rejects_empty_batch() {
        let mut graph = build(&[CommitRecord::of("a", &[])]);
        let err = GraphAppendBuilder::new()
            .append_to_graph(&mut graph, &[], [])
            .unwrap_err();
        assert!(matches!(err, CgError::InvalidArg { .. }));
        assert_eq!(graph.row_count(), 1);
    }

    #[test]
    fn append_after_clean_end_starts_new_row() {
        let mut graph = build(&[CommitRecord::of("a", &[])]);
        GraphAppendBuilder::new()
            .append_to_graph(&mut graph, &[CommitRecord::of("b", &[])], [])
            .unwrap();

        assert_eq!(graph.row_count(), 2);
        assert_eq!(graph.commit_at_row(0).unwrap().as_str(), "a");
        assert_eq!(graph.commit_at_row(1).unwrap().as_str(), "b");
    }

    #[test]
    fn append_finishes_end_commit_in_place() {
        let mut graph = build(&[CommitRecord::of("x", &["y"])]);
        let end = graph.all_rows()[1].nodes()[0];

        GraphAppendBuilder::new()
            .append_to_graph(&mut graph, &[CommitRecord::of("y", &[])], [])
            .unwrap();

        let y = graph.commit_node(&"y".into()).unwrap();
        assert_eq!(y.id(), end);
        assert_eq!(y.kind(), NodeKind::Commit);
        assert_eq!(y.node().row(), Some(1));
        assert_eq!(graph.all_rows().len(), 2);
    }

    #[test]
    fn other_end_commits_become_edge_nodes() {
        let mut graph = build(&[CommitRecord::of("m", &["p", "q"])]);
        GraphAppendBuilder::new()
            .append_to_graph(
                &mut graph,
                &[CommitRecord::of("q", &[]), CommitRecord::of("p", &[])],
                [],
            )
            .unwrap();

        // Row 1 now holds q plus p's lane passing through.
        let row: Vec<(String, NodeKind)> = graph.all_rows()[1]
            .nodes()
            .iter()
            .map(|&id| {
                let n = graph.node(id).unwrap();
                (n.commit().to_string(), n.kind())
            })
            .collect();
        assert_eq!(
            row,
            vec![
                ("p".to_string(), NodeKind::Edge),
                ("q".to_string(), NodeKind::Commit)
            ]
        );
        assert_eq!(graph.commit_at_row(2).unwrap().as_str(), "p");
        assert!(validate::check_structure(&graph).is_ok());
    }

    #[test]
    fn reopened_lane_passes_through_appended_rows() {
        let mut graph = build(&[CommitRecord::of("a", &["c"])]);
        GraphAppendBuilder::new()
            .append_to_graph(
                &mut graph,
                &[CommitRecord::of("x", &[]), CommitRecord::of("c", &[])],
                [],
            )
            .unwrap();

        let row1: Vec<NodeKind> = graph.all_rows()[1]
            .nodes()
            .iter()
            .map(|&id| graph.node(id).unwrap().kind())
            .collect();
        assert_eq!(row1, vec![NodeKind::Edge, NodeKind::Commit]);
        let edge_node = graph.node(graph.all_rows()[1].nodes()[0]).unwrap();
        assert_eq!(edge_node.commit().as_str(), "c");
        assert_eq!(graph.commit_at_row(2).unwrap().as_str(), "c");
        assert!(validate::check_structure(&graph).is_ok());
    }

    #[test]
    fn failed_append_leaves_graph_untouched() {
        let mut graph = build(&[CommitRecord::of("x", &["y"])]);
        let rows_before = graph.all_rows().to_vec();
        let nodes_before = graph.nodes().len();

        // "x" is already placed.
        let err = GraphAppendBuilder::new()
            .append_to_graph(&mut graph, &[CommitRecord::of("x", &[])], [])
            .unwrap_err();
        assert!(err.is_invalid_arg());
        assert_eq!(graph.all_rows(), rows_before.as_slice());
        assert_eq!(graph.nodes().len(), nodes_before);
    }

    #[test]
    fn append_to_empty_graph_builds() {
        let mut graph = MutableGraph::new();
        GraphAppendBuilder::new()
            .append_to_graph(&mut graph, &[CommitRecord::of("a", &["b"])], [])
            .unwrap();

        assert_eq!(graph.row_count(), 2);
        assert_eq!(graph.commit_node_in_row(1).unwrap().kind(), NodeKind::EndCommit);
    }

    /// Squash every row of `graph` into a single trailing row.
    fn squash_rows(graph: &mut MutableGraph) {
        let mut merged = NodeRow::new(0);
        for row in graph.all_rows.drain(..) {
            merged.nodes.extend(row.nodes);
        }
        graph.all_rows.push(merged);
    }

    #[test]
    fn malformed_trailing_row_aborts_append() {
        // A commit mixed with an end-commit placeholder.
        let mut mixed = build(&[CommitRecord::of("x", &["y"])]);
        squash_rows(&mut mixed);
        // Two commits.
        let mut doubled = build(&[CommitRecord::of("a", &[]), CommitRecord::of("b", &[])]);
        squash_rows(&mut doubled);

        for (graph, next) in [(&mut mixed, "y"), (&mut doubled, "c")] {
            let rows_before = graph.all_rows().to_vec();
            let nodes_before = graph.nodes().to_vec();
            let edges_before = graph.edges().to_vec();

            let err = GraphAppendBuilder::new()
                .append_to_graph(
                    graph,
                    &[CommitRecord::of(next, &[])],
                    [VcsRef::new(next, "main", "/repo")],
                )
                .unwrap_err();

            assert!(matches!(err, CgError::Invariant { .. }));
            assert_eq!(graph.all_rows(), rows_before.as_slice());
            assert_eq!(graph.nodes(), nodes_before.as_slice());
            assert_eq!(graph.edges(), edges_before.as_slice());
            assert!(graph.refs().is_empty());
            assert!(!graph.contains_commit(&CommitHash::from(next)));
        }
    }
}
