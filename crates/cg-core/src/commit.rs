//! Commit and ref records as they arrive from a VCS log provider.

use core::fmt;
use std::collections::HashMap;
use std::path::{Path, PathBuf};

/// Opaque commit identifier; equality and hashing go by content.
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(transparent))]
pub struct CommitHash(String);

impl CommitHash {
    pub fn new(hash: impl Into<String>) -> Self {
        Self(hash.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Abbreviated form for display (first `len` characters).
    pub fn short(&self, len: usize) -> &str {
        match self.0.char_indices().nth(len) {
            Some((end, _)) => &self.0[..end],
            None => &self.0,
        }
    }
}

impl fmt::Debug for CommitHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "CommitHash({})", self.0)
    }
}

impl fmt::Display for CommitHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for CommitHash {
    fn from(hash: &str) -> Self {
        Self(hash.to_string())
    }
}

impl From<String> for CommitHash {
    fn from(hash: String) -> Self {
        Self(hash)
    }
}

/// One commit of a log batch: its hash and its parents in VCS order.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct CommitRecord {
    pub hash: CommitHash,
    #[cfg_attr(feature = "serde", serde(default))]
    pub parents: Vec<CommitHash>,
}

impl CommitRecord {
    pub fn new(hash: impl Into<CommitHash>, parents: impl IntoIterator<Item = CommitHash>) -> Self {
        Self {
            hash: hash.into(),
            parents: parents.into_iter().collect(),
        }
    }

    /// Shorthand used heavily by tests and fixtures: `CommitRecord::of("a", &["b", "c"])`.
    pub fn of(hash: &str, parents: &[&str]) -> Self {
        Self::new(hash, parents.iter().map(|p| CommitHash::from(*p)))
    }

    pub fn is_merge(&self) -> bool {
        self.parents.len() > 1
    }

    pub fn is_root(&self) -> bool {
        self.parents.is_empty()
    }
}

/// A named ref (branch, tag, HEAD) pointing at a commit inside one repository.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct VcsRef {
    pub commit_hash: CommitHash,
    pub name: String,
    pub repository_root: PathBuf,
}

impl VcsRef {
    pub fn new(
        commit_hash: impl Into<CommitHash>,
        name: impl Into<String>,
        repository_root: impl Into<PathBuf>,
    ) -> Self {
        Self {
            commit_hash: commit_hash.into(),
            name: name.into(),
            repository_root: repository_root.into(),
        }
    }

    pub fn repository_root(&self) -> &Path {
        &self.repository_root
    }
}

/// Refs indexed by the commit they point at.
///
/// Insertion order of refs for the same commit is preserved; duplicates are dropped.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RefsModel {
    by_commit: HashMap<CommitHash, Vec<VcsRef>>,
}

impl RefsModel {
    pub fn new(refs: impl IntoIterator<Item = VcsRef>) -> Self {
        let mut model = Self::default();
        model.extend(refs);
        model
    }

    pub fn extend(&mut self, refs: impl IntoIterator<Item = VcsRef>) {
        for vcs_ref in refs {
            let slot = self.by_commit.entry(vcs_ref.commit_hash.clone()).or_default();
            if !slot.contains(&vcs_ref) {
                slot.push(vcs_ref);
            }
        }
    }

    /// Refs pointing at `hash` (empty if none).
    pub fn refs_of(&self, hash: &CommitHash) -> &[VcsRef] {
        self.by_commit.get(hash).map_or(&[], Vec::as_slice)
    }

    /// Commits carrying a ref called `name` (one per repository at most).
    pub fn commits_named(&self, name: &str) -> Vec<CommitHash> {
        let mut hashes: Vec<CommitHash> = self
            .by_commit
            .values()
            .flatten()
            .filter(|r| r.name == name)
            .map(|r| r.commit_hash.clone())
            .collect();
        hashes.sort();
        hashes.dedup();
        hashes
    }

    pub fn len(&self) -> usize {
        self.by_commit.values().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.by_commit.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &VcsRef> {
        self.by_commit.values().flatten()
    }
}

impl FromIterator<VcsRef> for RefsModel {
    fn from_iter<I: IntoIterator<Item = VcsRef>>(iter: I) -> Self {
        Self::new(iter)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn commit_hash_equality_is_by_content() {
        let a = CommitHash::new(String::from("abc123"));
        let b = CommitHash::from("abc123");
        assert_eq!(a, b);
        assert_eq!(a.short(3), "abc");
        assert_eq!(a.short(40), "abc123");
    }

    #[test]
    fn record_shape_helpers() {
        let merge = CommitRecord::of("m", &["a", "b"]);
        assert!(merge.is_merge());
        assert!(!merge.is_root());
        assert!(CommitRecord::of("r", &[]).is_root());
    }

    #[test]
    fn refs_model_groups_by_commit() {
        let model = RefsModel::new([
            VcsRef::new("a", "main", "/repo"),
            VcsRef::new("a", "HEAD", "/repo"),
            VcsRef::new("a", "main", "/repo"),
            VcsRef::new("b", "feature", "/repo"),
        ]);

        assert_eq!(model.len(), 3);
        assert_eq!(model.refs_of(&"a".into()).len(), 2);
        assert!(model.refs_of(&"zzz".into()).is_empty());
        assert_eq!(model.commits_named("feature"), vec![CommitHash::from("b")]);
    }
}

#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;

    fn vcs_ref() -> impl Strategy<Value = VcsRef> {
        (0u8..4, prop::sample::select(vec!["main", "HEAD", "feature", "v1.0"]))
            .prop_map(|(commit, name)| VcsRef::new(format!("c{commit}"), name, "/repo"))
    }

    proptest! {
        #[test]
        fn refs_are_deduplicated_in_first_seen_order(
            refs in prop::collection::vec(vcs_ref(), 0..24)
        ) {
            let model = RefsModel::new(refs.clone());

            let mut expected: Vec<&VcsRef> = Vec::new();
            for r in &refs {
                if !expected.contains(&r) {
                    expected.push(r);
                }
            }
            prop_assert_eq!(model.len(), expected.len());
            for r in &refs {
                let per_commit: Vec<&VcsRef> = expected
                    .iter()
                    .copied()
                    .filter(|e| e.commit_hash == r.commit_hash)
                    .collect();
                let stored: Vec<&VcsRef> = model.refs_of(&r.commit_hash).iter().collect();
                prop_assert_eq!(stored, per_commit);
            }
        }

        #[test]
        fn extending_twice_changes_nothing(refs in prop::collection::vec(vcs_ref(), 0..24)) {
            let mut model = RefsModel::new(refs.clone());
            let once = model.clone();
            model.extend(refs);
            prop_assert_eq!(model, once);
        }
    }
}
