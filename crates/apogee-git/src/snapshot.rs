//! The read-only repository view the engine calculates from

use crate::types::{Branch, Commit, Tag};

/// An eagerly resolved, immutable view of a repository
///
/// The engine is a pure function of this view: implementations resolve
/// everything up front and answer queries without touching I/O.
pub trait RepositorySnapshot {
    /// The branch HEAD points at
    fn current_branch(&self) -> &Branch;

    /// All local branches, the current one included
    fn branches(&self) -> &[Branch];

    /// All tags
    fn tags(&self) -> &[Tag];

    /// Number of uncommitted changes in the working tree
    fn uncommitted_changes(&self) -> u64;

    /// Look up a commit by hash
    fn find_commit(&self, sha: &str) -> Option<&Commit>;

    /// The commit at the current branch tip
    fn head_commit(&self) -> Option<&Commit> {
        self.current_branch()
            .tip()
            .and_then(|sha| self.find_commit(sha))
    }

    /// Look up a branch by friendly name
    fn find_branch(&self, friendly: &str) -> Option<&Branch> {
        self.branches().iter().find(|b| b.name.friendly == friendly)
    }

    /// Tags pointing at a specific commit
    fn tags_at(&self, sha: &str) -> Vec<&Tag> {
        self.tags().iter().filter(|t| t.target_sha == sha).collect()
    }
}
