//! Git record types

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Information about a git commit
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Commit {
    /// Commit hash (full)
    pub sha: String,
    /// Short hash (first 7 characters)
    pub short_sha: String,
    /// Full commit message
    pub message: String,
    /// Commit timestamp
    pub when: DateTime<Utc>,
    /// Parent hashes, first parent first
    pub parents: Vec<String>,
}

impl Commit {
    /// Create a new commit record
    pub fn new(
        sha: impl Into<String>,
        message: impl Into<String>,
        when: DateTime<Utc>,
        parents: Vec<String>,
    ) -> Self {
        let sha = sha.into();
        let short_sha = sha.chars().take(7).collect();
        Self {
            sha,
            short_sha,
            message: message.into(),
            when,
            parents,
        }
    }

    /// Whether this commit joins more than one line of history
    pub fn is_merge(&self) -> bool {
        self.parents.len() > 1
    }
}

/// A tag and the commit it points at
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tag {
    /// Tag name without the `refs/tags/` prefix
    pub name: String,
    /// Hash of the commit the tag resolves to
    pub target_sha: String,
}

impl Tag {
    /// Create a new tag record
    pub fn new(name: impl Into<String>, target_sha: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            target_sha: target_sha.into(),
        }
    }
}

/// Friendly and canonical forms of a branch name
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BranchName {
    /// The name as shown to users, e.g. `feature/login`
    pub friendly: String,
    /// The full ref, e.g. `refs/heads/feature/login`
    pub canonical: String,
}

impl BranchName {
    /// Build both forms from the friendly name
    pub fn local(friendly: impl Into<String>) -> Self {
        let friendly = friendly.into();
        let canonical = format!("refs/heads/{friendly}");
        Self { friendly, canonical }
    }
}

/// A branch and its ancestor walk
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Branch {
    pub name: BranchName,
    /// Commit hashes reachable from the tip, tip first
    pub commits: Vec<String>,
}

impl Branch {
    /// Create a branch record
    pub fn new(name: BranchName, commits: Vec<String>) -> Self {
        Self { name, commits }
    }

    /// The tip commit hash, if the branch has any commits
    pub fn tip(&self) -> Option<&str> {
        self.commits.first().map(String::as_str)
    }

    /// Whether `sha` is reachable from this branch's tip
    pub fn contains(&self, sha: &str) -> bool {
        self.commits.iter().any(|c| c == sha)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_commit_short_sha() {
        let commit = Commit::new("a1b2c3d4e5f6a1b2c3d4", "feat: add", Utc::now(), vec![]);
        assert_eq!(commit.short_sha, "a1b2c3d");
    }

    #[test]
    fn test_merge_detection() {
        let plain = Commit::new("a", "one parent", Utc::now(), vec!["p".into()]);
        let merge = Commit::new("b", "two parents", Utc::now(), vec!["p".into(), "q".into()]);
        assert!(!plain.is_merge());
        assert!(merge.is_merge());
    }

    #[test]
    fn test_branch_name_forms() {
        let name = BranchName::local("feature/login");
        assert_eq!(name.friendly, "feature/login");
        assert_eq!(name.canonical, "refs/heads/feature/login");
    }
}
