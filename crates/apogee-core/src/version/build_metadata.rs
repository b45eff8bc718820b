//! Build metadata attached to a calculated version

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Build metadata for a semantic version
///
/// Records where a version came from: the commit it was calculated at, the
/// commit its base version was read from, and the distance between the
/// two. Metadata never participates in version ordering or equality.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BuildMetadata {
    /// Commits between the base version source (exclusive) and HEAD
    /// (inclusive); `None` when the version was read straight off a tag
    pub commits_since_source: Option<u64>,
    /// Sha of the commit the base version was anchored at
    pub version_source_sha: Option<String>,
    /// Friendly name of the branch the version was calculated on
    pub branch: Option<String>,
    /// Full sha of the commit the version describes
    pub sha: Option<String>,
    /// First seven characters of `sha`
    pub short_sha: Option<String>,
    /// Timestamp of the commit the version describes
    pub commit_date: Option<DateTime<Utc>>,
    /// Number of uncommitted changes in the working tree
    pub uncommitted_changes: u64,
}

impl BuildMetadata {
    /// Metadata for a version calculated at `sha`
    pub fn at_commit(sha: impl Into<String>, when: DateTime<Utc>) -> Self {
        let sha = sha.into();
        let short_sha = sha.chars().take(7).collect();
        Self {
            sha: Some(sha),
            short_sha: Some(short_sha),
            commit_date: Some(when),
            ..Self::default()
        }
    }

    /// Set the branch name
    pub fn with_branch(mut self, branch: impl Into<String>) -> Self {
        self.branch = Some(branch.into());
        self
    }

    /// Set the base version source and the distance to it
    pub fn with_source(mut self, sha: impl Into<String>, commits_since: u64) -> Self {
        self.version_source_sha = Some(sha.into());
        self.commits_since_source = Some(commits_since);
        self
    }

    /// Set the commits-since count without a source sha
    pub fn with_commits_since(mut self, commits_since: u64) -> Self {
        self.commits_since_source = Some(commits_since);
        self
    }

    /// Set the uncommitted-changes count
    pub fn with_uncommitted(mut self, count: u64) -> Self {
        self.uncommitted_changes = count;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_at_commit_derives_short_sha() {
        let meta = BuildMetadata::at_commit("a1b2c3d4e5f6a1b2c3d4", Utc::now());
        assert_eq!(meta.short_sha.as_deref(), Some("a1b2c3d"));
    }

    #[test]
    fn test_with_source() {
        let meta = BuildMetadata::default().with_source("abc", 3);
        assert_eq!(meta.version_source_sha.as_deref(), Some("abc"));
        assert_eq!(meta.commits_since_source, Some(3));
    }
}
