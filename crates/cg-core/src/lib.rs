//! cg-core: stable foundation for the commit graph.
//!
//! Contains:
//! - ids (compact arena IDs for nodes, edges and lanes)
//! - commit (commit hashes, commit records and VCS refs as they arrive from a log provider)
//! - error (shared error types)

pub mod commit;
pub mod error;
pub mod ids;

// Re-exports: nice ergonomics for downstream crates
pub use commit::{CommitHash, CommitRecord, RefsModel, VcsRef};
pub use error::{CgError, CgResult};
pub use ids::*;
