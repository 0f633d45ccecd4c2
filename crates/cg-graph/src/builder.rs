//! Row/lane layout of an ordered commit batch.

use std::collections::HashMap;
use std::mem;
use std::path::PathBuf;

use cg_core::{BranchId, CgResult, CommitHash, CommitRecord, NodeId, VcsRef};
use tracing::{debug, warn};

use crate::graph::{Branch, MutableGraph, NodeKind, NodeRow};
use crate::validate;

/// Root used for lanes whose head carries no ref.
pub const DEFAULT_FALLBACK_ROOT: &str = "<unknown root>";

/// Parents that have been referenced but not placed yet, keyed by commit.
///
/// Scoped to one build/append call; whatever is left at the end of a batch becomes the
/// end-commit row.
pub(crate) type Frontier = HashMap<CommitHash, NodeId>;

/// Builder configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GraphBuilderConfig {
    /// Repository root recorded on lanes when no ref resolves the head commit.
    pub fallback_root: PathBuf,
}

impl Default for GraphBuilderConfig {
    fn default() -> Self {
        Self {
            fallback_root: PathBuf::from(DEFAULT_FALLBACK_ROOT),
        }
    }
}

/// Builds a `MutableGraph` from the first batch of a log.
///
/// Later batches go through `GraphAppendBuilder`, which repairs the frontier and then runs the same
/// per-commit layout as `build`.
#[derive(Debug, Default, Clone)]
pub struct GraphBuilder {
    config: GraphBuilderConfig,
}

/// Working state of one layout pass.
struct Layout {
    /// Row the next commit will be placed in; lanes passing through are added first.
    next_row: NodeRow,
    frontier: Frontier,
    /// Finished rows, spliced into the graph by the caller.
    rows: Vec<NodeRow>,
}

impl GraphBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_config(config: GraphBuilderConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &GraphBuilderConfig {
        &self.config
    }

    /// Lay out `commits` (log order, non-empty) into a fresh graph.
    pub fn build(
        &self,
        commits: &[CommitRecord],
        refs: impl IntoIterator<Item = VcsRef>,
    ) -> CgResult<MutableGraph> {
        let mut graph = MutableGraph::new();
        validate::validate_batch(&graph, commits)?;
        graph.refs.extend(refs);

        let rows = self.layout_commits(&mut graph, commits, NodeRow::new(0), Frontier::new());
        graph.splice_rows(0, rows);
        graph.update_visible_rows();
        Ok(graph)
    }

    /// Per-commit layout shared by build and append.
    ///
    /// Starts at `next_row` with the given frontier and returns the rows produced, including the
    /// trailing end-commit row if any parent is still unresolved. The batch must already be
    /// validated against `graph`; rows are not written into `graph.all_rows` here.
    pub(crate) fn layout_commits(
        &self,
        graph: &mut MutableGraph,
        commits: &[CommitRecord],
        next_row: NodeRow,
        frontier: Frontier,
    ) -> Vec<NodeRow> {
        debug!(
            commits = commits.len(),
            start_row = next_row.index,
            frontier = frontier.len(),
            "laying out commit batch"
        );

        let mut layout = Layout {
            next_row,
            frontier,
            rows: Vec::with_capacity(commits.len() + 1),
        };

        for commit in commits {
            self.append_commit(graph, &mut layout, commit);
        }
        Self::finish_batch(graph, layout)
    }

    fn append_commit(&self, graph: &mut MutableGraph, layout: &mut Layout, commit: &CommitRecord) {
        Self::thread_lanes(graph, layout, &commit.hash);
        let node = self.finish_commit(graph, layout, &commit.hash);
        let lane = graph.nodes[node.slot()].branch;

        if let [parent] = commit.parents.as_slice() {
            Self::add_parent(graph, layout, node, parent, lane);
            return;
        }
        // Every parent of a merge gets its own lane fragment.
        let repository_root = graph.branches[lane.slot()].repository_root().to_path_buf();
        for parent in &commit.parents {
            let fragment = graph.add_branch(Branch::Fragment {
                child: commit.hash.clone(),
                parent: parent.clone(),
                repository_root: repository_root.clone(),
            });
            Self::add_parent(graph, layout, node, parent, fragment);
        }
    }

    /// Every pending lane except the one ending at `next` passes through the current row: it gets
    /// an edge node there and continues below it.
    fn thread_lanes(graph: &mut MutableGraph, layout: &mut Layout, next: &CommitHash) {
        let mut passing: Vec<(NodeId, CommitHash)> = layout
            .frontier
            .iter()
            .filter(|(hash, _)| *hash != next)
            .map(|(hash, &id)| (id, hash.clone()))
            .collect();
        // Lane order within a row follows the order the lanes were opened.
        passing.sort();
        for (pending, hash) in passing {
            let continuation = demote_to_edge(graph, &mut layout.next_row, pending);
            layout.frontier.insert(hash, continuation);
        }
    }

    /// Place the commit's node in the current row and open the next one.
    fn finish_commit(
        &self,
        graph: &mut MutableGraph,
        layout: &mut Layout,
        hash: &CommitHash,
    ) -> NodeId {
        let id = match layout.frontier.remove(hash) {
            Some(id) => id,
            None => {
                let lane = self.head_branch(graph, hash);
                graph.add_node(hash.clone(), lane)
            }
        };

        let row = layout.next_row.index;
        let node = graph.node_mut(id);
        node.kind = NodeKind::Commit;
        node.row = Some(row);
        layout.next_row.nodes.push(id);
        graph.commits.insert(hash.clone(), id);

        let finished = mem::replace(&mut layout.next_row, NodeRow::new(row + 1));
        layout.rows.push(finished);
        id
    }

    /// Lane for a commit no child has referenced: a full branch named by its refs.
    fn head_branch(&self, graph: &mut MutableGraph, hash: &CommitHash) -> BranchId {
        let refs = graph.refs.refs_of(hash).to_vec();
        let repository_root = match refs.first() {
            Some(r) => r.repository_root.clone(),
            None => {
                warn!(
                    commit = %hash,
                    root = %self.config.fallback_root.display(),
                    "no ref resolves lane head; using fallback repository root"
                );
                self.config.fallback_root.clone()
            }
        };
        graph.add_branch(Branch::Full {
            head: hash.clone(),
            refs,
            repository_root,
        })
    }

    /// Link `child` to `parent`; lanes heading for the same pending parent converge on one node.
    fn add_parent(
        graph: &mut MutableGraph,
        layout: &mut Layout,
        child: NodeId,
        parent: &CommitHash,
        lane: BranchId,
    ) {
        if let Some(&pending) = layout.frontier.get(parent) {
            graph.add_edge(child, pending, lane);
            return;
        }
        let id = graph.add_node(parent.clone(), lane);
        graph.add_edge(child, id, lane);
        layout.frontier.insert(parent.clone(), id);
    }

    /// Close the batch: unresolved parents become end-commit nodes in one trailing row.
    fn finish_batch(graph: &mut MutableGraph, layout: Layout) -> Vec<NodeRow> {
        let Layout {
            mut next_row,
            frontier,
            mut rows,
        } = layout;

        let mut pending: Vec<NodeId> = frontier.into_values().collect();
        pending.sort();
        for id in pending {
            let node = graph.node_mut(id);
            node.kind = NodeKind::EndCommit;
            node.row = Some(next_row.index);
            next_row.nodes.push(id);
        }
        if !next_row.is_empty() {
            rows.push(next_row);
        }
        rows
    }
}

/// Turn a pending node into an edge node in `row` and return its fresh continuation.
///
/// The continuation has the same commit and lane and is linked below the edge node; it is not
/// placed in any row yet.
fn demote_to_edge(
    graph: &mut MutableGraph,
    row: &mut NodeRow,
    pending: NodeId,
) -> NodeId {
    let node = graph.node_mut(pending);
    node.kind = NodeKind::Edge;
    node.row = Some(row.index);
    let commit = node.commit.clone();
    let lane = node.branch;
    row.nodes.push(pending);

    let continuation = graph.add_node(commit, lane);
    graph.add_edge(pending, continuation, lane);
    continuation
}
