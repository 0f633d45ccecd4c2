//! cg-graph: row-indexed commit graph for incremental log views.
//!
//! Provides:
//! - Arena-backed graph data structures (Node, Edge, NodeRow, Branch, MutableGraph)
//! - A builder laying out the first log batch into rows and lanes
//! - An append builder extending the graph with later batches without moving shown rows
//! - Decorators giving filtered or collapsed views over the same structure
//!
//! # Example
//!
//! ```
//! use cg_core::{CommitRecord, VcsRef};
//! use cg_graph::{GraphAppendBuilder, GraphBuilder, NodeKind};
//!
//! let refs = [VcsRef::new("c", "main", "/repo")];
//! let mut graph = GraphBuilder::new()
//!     .build(&[CommitRecord::of("c", &["b"])], refs)
//!     .unwrap();
//! assert_eq!(graph.commit_node_in_row(1).unwrap().kind(), NodeKind::EndCommit);
//!
//! GraphAppendBuilder::new()
//!     .append_to_graph(&mut graph, &[CommitRecord::of("b", &[])], [])
//!     .unwrap();
//! assert_eq!(graph.commit_at_row(1).unwrap().as_str(), "b");
//! assert_eq!(graph.visible_commit_count(), 2);
//! ```

pub mod append;
pub mod builder;
pub mod decorator;
pub mod error;
pub mod graph;
pub(crate) mod validate;

// Re-exports for ergonomics
pub use append::GraphAppendBuilder;
pub use builder::{DEFAULT_FALLBACK_ROOT, GraphBuilder, GraphBuilderConfig};
pub use decorator::{
    BranchFilterDecorator, CommitFilterDecorator, GraphDecorator, IdentityDecorator,
    LinearCollapseDecorator,
};
pub use error::GraphError;
pub use graph::{Branch, Edge, MutableGraph, Node, NodeKind, NodeRef, NodeRow, VisibleRow};
pub use validate::check_structure;
