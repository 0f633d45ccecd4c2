//! Non-destructive views over the structural graph.
//!
//! A decorator decides which nodes are visible and how edges are presented, without touching the
//! structure itself. Switching views only costs a visible-row recompute.

use std::collections::HashSet;
use std::fmt;

use cg_core::{CommitHash, NodeId};
use tracing::debug;

use crate::graph::{Edge, MutableGraph, NodeKind, NodeRef};

/// Visibility and edge rewriting policy applied on top of the structural graph.
///
/// Implementations must be pure functions of the node and its structural neighbourhood; any
/// configuration is fixed when the decorator is created.
pub trait GraphDecorator: fmt::Debug + Send + Sync {
    fn is_visible_node(&self, node: NodeRef<'_>) -> bool;

    /// Edges towards parents as shown for `node`, given its structural ones.
    fn down_edges(&self, node: NodeRef<'_>, structural: Vec<Edge>) -> Vec<Edge>;

    /// Edges towards children as shown for `node`, given its structural ones.
    fn up_edges(&self, node: NodeRef<'_>, structural: Vec<Edge>) -> Vec<Edge>;
}

/// Shows the structural graph as is.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct IdentityDecorator;

impl GraphDecorator for IdentityDecorator {
    fn is_visible_node(&self, _node: NodeRef<'_>) -> bool {
        true
    }

    fn down_edges(&self, _node: NodeRef<'_>, structural: Vec<Edge>) -> Vec<Edge> {
        structural
    }

    fn up_edges(&self, _node: NodeRef<'_>, structural: Vec<Edge>) -> Vec<Edge> {
        structural
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Direction {
    Up,
    Down,
}

/// Follow each structural edge past hidden nodes until a shown node is reached.
///
/// Produces one edge per distinct shown node, carrying the lane of the structural edge it started
/// from.
fn reroute(
    node: NodeRef<'_>,
    structural: Vec<Edge>,
    direction: Direction,
    hidden: impl Fn(NodeRef<'_>) -> bool,
) -> Vec<Edge> {
    let far_end = |edge: &Edge| match direction {
        Direction::Up => edge.up,
        Direction::Down => edge.down,
    };
    let step = |n: NodeRef<'_>| match direction {
        Direction::Up => n.structural_up_edges(),
        Direction::Down => n.structural_down_edges(),
    };

    let mut shown = Vec::with_capacity(structural.len());
    let mut seen: HashSet<NodeId> = HashSet::new();
    for edge in structural {
        let mut stack = vec![far_end(&edge)];
        while let Some(id) = stack.pop() {
            if !seen.insert(id) {
                continue;
            }
            let next = node.at(id);
            if hidden(next) {
                stack.extend(step(next).iter().rev().map(far_end));
                continue;
            }
            shown.push(match direction {
                Direction::Up => Edge {
                    up: id,
                    down: node.id(),
                    branch: edge.branch,
                },
                Direction::Down => Edge {
                    up: node.id(),
                    down: id,
                    branch: edge.branch,
                },
            });
        }
    }
    shown
}

/// Collapses linear runs: commits with a single child and a single parent, where neither
/// neighbour forks or joins, are hidden and the run is drawn as one edge.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LinearCollapseDecorator;

impl LinearCollapseDecorator {
    fn is_interior(node: NodeRef<'_>) -> bool {
        if node.kind() != NodeKind::Commit {
            return false;
        }
        let (up, down) = (node.node().up_edges(), node.node().down_edges());
        let ([up], [down]) = (up, down) else {
            return false;
        };
        let graph = node.graph();
        let (Some(up), Some(down)) = (graph.edge(*up), graph.edge(*down)) else {
            return false;
        };
        let child = node.at(up.up).node();
        let parent = node.at(down.down).node();
        child.down_edges().len() == 1 && parent.up_edges().len() == 1
    }
}

impl GraphDecorator for LinearCollapseDecorator {
    fn is_visible_node(&self, node: NodeRef<'_>) -> bool {
        !Self::is_interior(node)
    }

    fn down_edges(&self, node: NodeRef<'_>, structural: Vec<Edge>) -> Vec<Edge> {
        if Self::is_interior(node) {
            return structural;
        }
        reroute(node, structural, Direction::Down, Self::is_interior)
    }

    fn up_edges(&self, node: NodeRef<'_>, structural: Vec<Edge>) -> Vec<Edge> {
        if Self::is_interior(node) {
            return structural;
        }
        reroute(node, structural, Direction::Up, Self::is_interior)
    }
}

/// Shows only the history reachable from a chosen set of heads.
///
/// Reachability is computed against the graph at construction time; create a new filter after
/// appending history.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BranchFilterDecorator {
    reachable: HashSet<NodeId>,
}

impl BranchFilterDecorator {
    /// Filter to everything reachable from the given head commits. Unknown heads are skipped.
    pub fn new(graph: &MutableGraph, heads: impl IntoIterator<Item = CommitHash>) -> Self {
        let mut reachable = HashSet::new();
        let mut stack: Vec<NodeId> = Vec::new();
        for head in heads {
            match graph.commit_node(&head) {
                Some(node) => stack.push(node.id()),
                None => debug!(head = %head, "branch filter head is not in the graph"),
            }
        }
        while let Some(id) = stack.pop() {
            if !reachable.insert(id) {
                continue;
            }
            if let Some(node) = graph.node(id) {
                stack.extend(
                    node.down_edges()
                        .iter()
                        .filter_map(|e| graph.edge(*e))
                        .map(|e| e.down),
                );
            }
        }
        Self { reachable }
    }

    /// Filter to the commits carrying any of the given ref names.
    pub fn from_ref_names<'n>(
        graph: &MutableGraph,
        names: impl IntoIterator<Item = &'n str>,
    ) -> Self {
        let heads: Vec<CommitHash> = names
            .into_iter()
            .flat_map(|name| graph.refs().commits_named(name))
            .collect();
        Self::new(graph, heads)
    }

    pub fn reachable_count(&self) -> usize {
        self.reachable.len()
    }
}

impl GraphDecorator for BranchFilterDecorator {
    fn is_visible_node(&self, node: NodeRef<'_>) -> bool {
        self.reachable.contains(&node.id())
    }

    fn down_edges(&self, _node: NodeRef<'_>, structural: Vec<Edge>) -> Vec<Edge> {
        structural
            .into_iter()
            .filter(|e| self.reachable.contains(&e.down))
            .collect()
    }

    fn up_edges(&self, _node: NodeRef<'_>, structural: Vec<Edge>) -> Vec<Edge> {
        structural
            .into_iter()
            .filter(|e| self.reachable.contains(&e.up))
            .collect()
    }
}

/// Shows only matching commits; edges jump straight from one match to the next.
///
/// End-commit placeholders stay visible so the view still shows where history continues.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommitFilterDecorator {
    matching: HashSet<CommitHash>,
}

impl CommitFilterDecorator {
    pub fn new(matching: impl IntoIterator<Item = CommitHash>) -> Self {
        Self {
            matching: matching.into_iter().collect(),
        }
    }

    /// Match every loaded commit accepted by `predicate`.
    pub fn matching(graph: &MutableGraph, predicate: impl Fn(&CommitHash) -> bool) -> Self {
        Self::new(
            graph
                .all_commits()
                .into_iter()
                .filter(|hash| predicate(hash))
                .cloned(),
        )
    }

    fn is_hidden(&self, node: NodeRef<'_>) -> bool {
        match node.kind() {
            NodeKind::Commit => !self.matching.contains(node.commit()),
            NodeKind::Edge => true,
            NodeKind::EndCommit => false,
        }
    }
}

impl GraphDecorator for CommitFilterDecorator {
    fn is_visible_node(&self, node: NodeRef<'_>) -> bool {
        !self.is_hidden(node)
    }

    fn down_edges(&self, node: NodeRef<'_>, structural: Vec<Edge>) -> Vec<Edge> {
        reroute(node, structural, Direction::Down, |n| self.is_hidden(n))
    }

    fn up_edges(&self, node: NodeRef<'_>, structural: Vec<Edge>) -> Vec<Edge> {
        reroute(node, structural, Direction::Up, |n| self.is_hidden(n))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builder::GraphBuilder;
    use cg_core::{CommitRecord, VcsRef};

    /// Commits of every visible row; each visible row must show one.
    fn commits_of(graph: &MutableGraph) -> Vec<String> {
        (0..graph.row_count())
            .map(|i| match graph.commit_at_row(i) {
                Some(hash) => hash.to_string(),
                None => panic!("visible row {} shows no commit", i),
            })
            .collect()
    }

    fn down_targets(graph: &MutableGraph, hash: &str) -> Vec<String> {
        let node = graph.commit_node(&hash.into()).unwrap();
        graph
            .down_edges(node.id())
            .into_iter()
            .map(|e| graph.node(e.down).unwrap().commit().to_string())
            .collect()
    }

    fn chain() -> MutableGraph {
        let commits = [
            CommitRecord::of("a", &["b"]),
            CommitRecord::of("b", &["c"]),
            CommitRecord::of("c", &["d"]),
            CommitRecord::of("d", &[]),
        ];
        GraphBuilder::new().build(&commits, []).unwrap()
    }

    #[test]
    fn identity_shows_everything() {
        let graph = chain();
        assert_eq!(commits_of(&graph), vec!["a", "b", "c", "d"]);
        assert_eq!(down_targets(&graph, "a"), vec!["b"]);
    }

    #[test]
    fn linear_collapse_hides_run_interior() {
        let mut graph = chain();
        graph.set_graph_decorator(Box::new(LinearCollapseDecorator));

        assert_eq!(commits_of(&graph), vec!["a", "d"]);
        assert_eq!(down_targets(&graph, "a"), vec!["d"]);
        let d = graph.commit_node(&"d".into()).unwrap().id();
        let ups: Vec<NodeId> = graph.up_edges(d).into_iter().map(|e| e.up).collect();
        assert_eq!(ups, vec![graph.commit_node(&"a".into()).unwrap().id()]);

        // Structure is untouched.
        graph.reset_graph_decorator();
        assert_eq!(commits_of(&graph), vec!["a", "b", "c", "d"]);
    }

    #[test]
    fn linear_collapse_keeps_fork_and_join_points() {
        let commits = [
            CommitRecord::of("m", &["x", "y"]),
            CommitRecord::of("x", &["b"]),
            CommitRecord::of("y", &["b"]),
            CommitRecord::of("b", &["r"]),
            CommitRecord::of("r", &[]),
        ];
        let mut graph = GraphBuilder::new().build(&commits, []).unwrap();
        graph.set_graph_decorator(Box::new(LinearCollapseDecorator));

        // x and y sit next to the merge and the join, so nothing is collapsible.
        assert_eq!(commits_of(&graph), vec!["m", "x", "y", "b", "r"]);
    }

    #[test]
    fn branch_filter_by_ref_name() {
        let commits = [
            CommitRecord::of("f", &["base"]),
            CommitRecord::of("m", &["base"]),
            CommitRecord::of("base", &[]),
        ];
        let refs = [
            VcsRef::new("f", "feature", "/repo"),
            VcsRef::new("m", "main", "/repo"),
        ];
        let mut graph = GraphBuilder::new().build(&commits, refs).unwrap();
        let filter = BranchFilterDecorator::from_ref_names(&graph, ["main"]);
        graph.set_graph_decorator(Box::new(filter));

        assert_eq!(commits_of(&graph), vec!["m", "base"]);
        let base = graph.commit_node(&"base".into()).unwrap().id();
        let up_commits: Vec<String> = graph
            .up_edges(base)
            .into_iter()
            .map(|e| graph.node(e.up).unwrap().commit().to_string())
            .collect();
        assert_eq!(up_commits, vec!["m"]);
    }

    #[test]
    fn commit_filter_jumps_over_hidden_commits() {
        let mut graph = chain();
        let filter = CommitFilterDecorator::matching(&graph, |h| !["b", "c"].contains(&h.as_str()));
        graph.set_graph_decorator(Box::new(filter));

        assert_eq!(commits_of(&graph), vec!["a", "d"]);
        assert_eq!(down_targets(&graph, "a"), vec!["d"]);
    }

    #[test]
    fn commit_filter_keeps_end_commits() {
        let mut graph = GraphBuilder::new()
            .build(&[CommitRecord::of("a", &["b"])], [])
            .unwrap();
        graph.set_graph_decorator(Box::new(CommitFilterDecorator::new([])));

        assert_eq!(graph.row_count(), 1);
        assert_eq!(graph.commit_node_in_row(0).unwrap().kind(), NodeKind::EndCommit);
        assert_eq!(graph.visible_commit_count(), 0);
    }

    #[test]
    fn branch_filter_drops_rows_only_crossed_by_its_lanes() {
        let commits = [
            CommitRecord::of("A", &["P"]),
            CommitRecord::of("B", &["P"]),
            CommitRecord::of("C", &[]),
            CommitRecord::of("P", &[]),
        ];
        let mut graph = GraphBuilder::new()
            .build(&commits, [VcsRef::new("A", "main", "/repo")])
            .unwrap();
        let filter = BranchFilterDecorator::from_ref_names(&graph, ["main"]);
        graph.set_graph_decorator(Box::new(filter));

        // A's lane passes through the rows of B and C, but those commits are filtered out.
        assert_eq!(commits_of(&graph), vec!["A", "P"]);
        assert!(graph.commit_node_in_row(graph.row_count()).is_none());
    }

    #[test]
    fn linear_collapse_drops_rows_of_hidden_commits() {
        let commits = [
            CommitRecord::of("H", &["X"]),
            CommitRecord::of("A", &["P"]),
            CommitRecord::of("B", &["P"]),
            CommitRecord::of("X", &["Z"]),
            CommitRecord::of("Z", &[]),
            CommitRecord::of("P", &[]),
        ];
        let mut graph = GraphBuilder::new().build(&commits, []).unwrap();
        graph.set_graph_decorator(Box::new(LinearCollapseDecorator));

        // X's row also carries P's lane, yet it disappears with X.
        assert_eq!(commits_of(&graph), vec!["H", "A", "B", "Z", "P"]);
        let x = graph.commit_node(&"X".into()).unwrap().id();
        assert_eq!(graph.visible_row_of(x), None);
    }
}
