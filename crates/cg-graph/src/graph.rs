//! Core graph data structures.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use cg_core::{BranchId, CommitHash, EdgeId, Id, NodeId, RefsModel, VcsRef};

use crate::decorator::{GraphDecorator, IdentityDecorator};

/// What a node stands for in its row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NodeKind {
    /// The commit itself.
    Commit,
    /// A lane passing through a row that holds some other commit.
    Edge,
    /// A parent that has been referenced but not loaded yet.
    EndCommit,
}

/// Lane identity used for layout and color lookup.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Branch {
    /// A lane started by a head commit, named by the refs pointing at it.
    Full {
        head: CommitHash,
        refs: Vec<VcsRef>,
        repository_root: PathBuf,
    },
    /// A lane fragment created at a merge, from the merge commit to one of its parents.
    Fragment {
        child: CommitHash,
        parent: CommitHash,
        repository_root: PathBuf,
    },
}

impl Branch {
    /// Commit the lane starts at.
    pub fn head(&self) -> &CommitHash {
        match self {
            Branch::Full { head, .. } => head,
            Branch::Fragment { child, .. } => child,
        }
    }

    /// `(child, parent)` key for merge fragments.
    pub fn fragment_key(&self) -> Option<(&CommitHash, &CommitHash)> {
        match self {
            Branch::Full { .. } => None,
            Branch::Fragment { child, parent, .. } => Some((child, parent)),
        }
    }

    pub fn refs(&self) -> &[VcsRef] {
        match self {
            Branch::Full { refs, .. } => refs,
            Branch::Fragment { .. } => &[],
        }
    }

    pub fn repository_root(&self) -> &Path {
        match self {
            Branch::Full {
                repository_root, ..
            }
            | Branch::Fragment {
                repository_root, ..
            } => repository_root,
        }
    }

    pub fn is_fragment(&self) -> bool {
        matches!(self, Branch::Fragment { .. })
    }
}

/// A node in the commit graph: one commit (or one lane crossing) placed in one row.
///
/// `row` is `None` only while the node sits in a builder's frontier.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Node {
    pub(crate) commit: CommitHash,
    pub(crate) branch: BranchId,
    pub(crate) kind: NodeKind,
    pub(crate) row: Option<usize>,
    pub(crate) up_edges: Vec<EdgeId>,
    pub(crate) down_edges: Vec<EdgeId>,
}

impl Node {
    pub fn commit(&self) -> &CommitHash {
        &self.commit
    }

    pub fn branch(&self) -> BranchId {
        self.branch
    }

    pub fn kind(&self) -> NodeKind {
        self.kind
    }

    /// Structural row index (position in `all_rows`).
    pub fn row(&self) -> Option<usize> {
        self.row
    }

    /// Edges towards children (rows above).
    pub fn up_edges(&self) -> &[EdgeId] {
        &self.up_edges
    }

    /// Edges towards parents (rows below).
    pub fn down_edges(&self) -> &[EdgeId] {
        &self.down_edges
    }
}

/// Directed link from a child-side node (`up`) to a parent-side node (`down`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Edge {
    pub up: NodeId,
    pub down: NodeId,
    pub branch: BranchId,
}

/// One structural row: the nodes placed at the same vertical slot, in layout order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NodeRow {
    pub(crate) index: usize,
    pub(crate) nodes: Vec<NodeId>,
}

impl NodeRow {
    pub(crate) fn new(index: usize) -> Self {
        Self {
            index,
            nodes: Vec::new(),
        }
    }

    pub fn index(&self) -> usize {
        self.index
    }

    pub fn nodes(&self) -> &[NodeId] {
        &self.nodes
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }
}

/// Borrowed view of one node together with the graph it lives in.
///
/// Structural accessors ignore the active decorator; decorators use them to make their decisions.
#[derive(Debug, Clone, Copy)]
pub struct NodeRef<'a> {
    graph: &'a MutableGraph,
    id: NodeId,
}

impl<'a> NodeRef<'a> {
    pub(crate) fn new(graph: &'a MutableGraph, id: NodeId) -> Self {
        Self { graph, id }
    }

    pub fn id(&self) -> NodeId {
        self.id
    }

    pub fn graph(&self) -> &'a MutableGraph {
        self.graph
    }

    pub fn node(&self) -> &'a Node {
        &self.graph.nodes[self.id.slot()]
    }

    pub fn commit(&self) -> &'a CommitHash {
        &self.node().commit
    }

    pub fn kind(&self) -> NodeKind {
        self.node().kind
    }

    pub fn branch(&self) -> &'a Branch {
        &self.graph.branches[self.node().branch.slot()]
    }

    pub fn structural_up_edges(&self) -> Vec<Edge> {
        self.node()
            .up_edges
            .iter()
            .map(|e| self.graph.edges[e.slot()])
            .collect()
    }

    pub fn structural_down_edges(&self) -> Vec<Edge> {
        self.node()
            .down_edges
            .iter()
            .map(|e| self.graph.edges[e.slot()])
            .collect()
    }

    /// Another node of the same graph.
    pub fn at(&self, id: NodeId) -> NodeRef<'a> {
        NodeRef::new(self.graph, id)
    }
}

/// A row as seen through the active decorator.
#[derive(Debug, Clone, Copy)]
pub struct VisibleRow<'a> {
    graph: &'a MutableGraph,
    index: usize,
    row: &'a NodeRow,
}

impl<'a> VisibleRow<'a> {
    /// Dense visible index.
    pub fn index(&self) -> usize {
        self.index
    }

    /// Index of the underlying row in `all_rows`.
    pub fn structural_index(&self) -> usize {
        self.row.index
    }

    /// Visible nodes of the row, in layout order.
    pub fn nodes(&self) -> impl Iterator<Item = NodeRef<'a>> + 'a {
        let graph = self.graph;
        let row = self.row;
        row.nodes
            .iter()
            .filter(move |&&id| graph.is_visible(id))
            .map(move |&id| NodeRef::new(graph, id))
    }

    /// The commit (or end-commit placeholder) shown in this row.
    pub fn commit_node(&self) -> Option<NodeRef<'a>> {
        self.nodes()
            .find(|n| matches!(n.kind(), NodeKind::Commit | NodeKind::EndCommit))
    }
}

/// The commit graph of one log session.
///
/// Owns the node/edge/lane arenas, every structural row and the visible projection of those rows
/// under the active decorator. Extended only through `GraphBuilder` and `GraphAppendBuilder`.
#[derive(Debug)]
pub struct MutableGraph {
    pub(crate) nodes: Vec<Node>,
    pub(crate) edges: Vec<Edge>,
    pub(crate) branches: Vec<Branch>,
    pub(crate) all_rows: Vec<NodeRow>,

    /// Commit hash -> its `Commit` node.
    pub(crate) commits: HashMap<CommitHash, NodeId>,
    pub(crate) refs: RefsModel,

    /// Visible index -> structural row index.
    visible_rows: Vec<usize>,
    /// Structural row index -> visible index.
    visible_index: Vec<Option<usize>>,
    decorator: Box<dyn GraphDecorator>,
}

impl Default for MutableGraph {
    fn default() -> Self {
        Self::new()
    }
}

impl MutableGraph {
    /// An empty graph; the first append behaves like a fresh build.
    pub fn new() -> Self {
        Self {
            nodes: Vec::new(),
            edges: Vec::new(),
            branches: Vec::new(),
            all_rows: Vec::new(),
            commits: HashMap::new(),
            refs: RefsModel::default(),
            visible_rows: Vec::new(),
            visible_index: Vec::new(),
            decorator: Box::new(IdentityDecorator),
        }
    }

    // ---- arena mutation (builders only) ----

    pub(crate) fn add_branch(&mut self, branch: Branch) -> BranchId {
        let id = Id::from_len(self.branches.len());
        self.branches.push(branch);
        id
    }

    pub(crate) fn add_node(&mut self, commit: CommitHash, branch: BranchId) -> NodeId {
        let id = Id::from_len(self.nodes.len());
        self.nodes.push(Node {
            commit,
            branch,
            kind: NodeKind::EndCommit,
            row: None,
            up_edges: Vec::new(),
            down_edges: Vec::new(),
        });
        id
    }

    pub(crate) fn add_edge(&mut self, up: NodeId, down: NodeId, branch: BranchId) -> EdgeId {
        let id = Id::from_len(self.edges.len());
        self.edges.push(Edge { up, down, branch });
        self.nodes[up.slot()].down_edges.push(id);
        self.nodes[down.slot()].up_edges.push(id);
        id
    }

    pub(crate) fn node_mut(&mut self, id: NodeId) -> &mut Node {
        &mut self.nodes[id.slot()]
    }

    /// Replace every row from `from` on with `rows`.
    pub(crate) fn splice_rows(&mut self, from: usize, rows: Vec<NodeRow>) {
        self.all_rows.truncate(from);
        self.all_rows.extend(rows);
    }

    // ---- visible projection ----

    /// Recompute the visible rows: rows whose commit or end-commit placeholder is visible,
    /// densely renumbered. Lanes passing through a hidden row do not keep it on screen.
    pub fn update_visible_rows(&mut self) {
        let mut visible_rows = Vec::with_capacity(self.all_rows.len());
        let mut visible_index = vec![None; self.all_rows.len()];
        for row in &self.all_rows {
            let shown = row.nodes.iter().any(|&id| {
                self.nodes[id.slot()].kind != NodeKind::Edge && self.is_visible(id)
            });
            if shown {
                visible_index[row.index] = Some(visible_rows.len());
                visible_rows.push(row.index);
            }
        }
        self.visible_rows = visible_rows;
        self.visible_index = visible_index;
    }

    /// Swap the active view and refresh the visible rows.
    pub fn set_graph_decorator(&mut self, decorator: Box<dyn GraphDecorator>) {
        self.decorator = decorator;
        self.update_visible_rows();
    }

    /// Go back to the identity view.
    pub fn reset_graph_decorator(&mut self) {
        self.set_graph_decorator(Box::new(IdentityDecorator));
    }

    pub fn graph_decorator(&self) -> &dyn GraphDecorator {
        self.decorator.as_ref()
    }

    pub fn is_visible(&self, id: NodeId) -> bool {
        self.decorator.is_visible_node(NodeRef::new(self, id))
    }

    /// Current visible rows.
    pub fn node_rows(&self) -> impl Iterator<Item = VisibleRow<'_>> + '_ {
        self.visible_rows
            .iter()
            .enumerate()
            .map(move |(index, &row)| VisibleRow {
                graph: self,
                index,
                row: &self.all_rows[row],
            })
    }

    pub fn visible_row(&self, index: usize) -> Option<VisibleRow<'_>> {
        let &row = self.visible_rows.get(index)?;
        Some(VisibleRow {
            graph: self,
            index,
            row: &self.all_rows[row],
        })
    }

    /// Number of visible rows.
    pub fn row_count(&self) -> usize {
        self.visible_rows.len()
    }

    /// The commit or end-commit node at visible row `index`.
    pub fn commit_node_in_row(&self, index: usize) -> Option<NodeRef<'_>> {
        self.visible_row(index)?.commit_node()
    }

    /// Hash of the commit shown at visible row `index`.
    pub fn commit_at_row(&self, index: usize) -> Option<&CommitHash> {
        self.commit_node_in_row(index).map(|n| n.commit())
    }

    /// Number of loaded commits currently visible.
    pub fn visible_commit_count(&self) -> usize {
        self.node_rows()
            .filter(|row| {
                row.commit_node()
                    .is_some_and(|n| n.kind() == NodeKind::Commit)
            })
            .count()
    }

    /// Visible row index of a node, if its row is visible.
    pub fn visible_row_of(&self, id: NodeId) -> Option<usize> {
        let row = self.nodes.get(id.slot())?.row?;
        self.visible_index.get(row).copied().flatten()
    }

    // ---- structural queries ----

    /// Every loaded commit, in row order.
    pub fn all_commits(&self) -> Vec<&CommitHash> {
        self.all_rows
            .iter()
            .flat_map(|row| row.nodes.iter())
            .map(|id| &self.nodes[id.slot()])
            .filter(|n| n.kind == NodeKind::Commit)
            .map(|n| &n.commit)
            .collect()
    }

    pub fn all_rows(&self) -> &[NodeRow] {
        &self.all_rows
    }

    pub fn trailing_row(&self) -> Option<&NodeRow> {
        self.all_rows.last()
    }

    pub fn is_empty(&self) -> bool {
        self.all_rows.is_empty()
    }

    pub fn nodes(&self) -> &[Node] {
        &self.nodes
    }

    pub fn edges(&self) -> &[Edge] {
        &self.edges
    }

    pub fn branches(&self) -> &[Branch] {
        &self.branches
    }

    pub fn node(&self, id: NodeId) -> Option<&Node> {
        self.nodes.get(id.slot())
    }

    pub fn node_ref(&self, id: NodeId) -> Option<NodeRef<'_>> {
        self.nodes.get(id.slot()).map(|_| NodeRef::new(self, id))
    }

    pub fn edge(&self, id: EdgeId) -> Option<&Edge> {
        self.edges.get(id.slot())
    }

    pub fn branch(&self, id: BranchId) -> Option<&Branch> {
        self.branches.get(id.slot())
    }

    /// The `Commit` node of a loaded commit.
    pub fn commit_node(&self, hash: &CommitHash) -> Option<NodeRef<'_>> {
        self.commits.get(hash).map(|&id| NodeRef::new(self, id))
    }

    pub fn contains_commit(&self, hash: &CommitHash) -> bool {
        self.commits.contains_key(hash)
    }

    /// Refs of every batch seen so far.
    pub fn refs(&self) -> &RefsModel {
        &self.refs
    }

    /// Edges towards children, as the active decorator presents them.
    pub fn up_edges(&self, id: NodeId) -> Vec<Edge> {
        let Some(node) = self.node_ref(id) else {
            return Vec::new();
        };
        self.decorator.up_edges(node, node.structural_up_edges())
    }

    /// Edges towards parents, as the active decorator presents them.
    pub fn down_edges(&self, id: NodeId) -> Vec<Edge> {
        let Some(node) = self.node_ref(id) else {
            return Vec::new();
        };
        self.decorator.down_edges(node, node.structural_down_edges())
    }
}
