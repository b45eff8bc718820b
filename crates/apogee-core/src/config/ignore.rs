//! Ignore rules for excluding commits from version discovery

use std::collections::HashSet;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Commits excluded from base-version discovery
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct IgnoreConfiguration {
    /// Shas whose commits (and tags) are skipped
    pub shas: HashSet<String>,
    /// Cutoff: commits at or before this timestamp are skipped
    pub before: Option<DateTime<Utc>>,
}

impl IgnoreConfiguration {
    /// Whether any rule is configured
    pub fn is_empty(&self) -> bool {
        self.shas.is_empty() && self.before.is_none()
    }

    /// The configured rules as filter predicates
    pub fn filters(&self) -> Vec<VersionFilter> {
        let mut filters = Vec::new();
        if !self.shas.is_empty() {
            filters.push(VersionFilter::Shas(self.shas.clone()));
        }
        if let Some(before) = self.before {
            filters.push(VersionFilter::Before(before));
        }
        filters
    }

    /// Run every filter against a commit; `Some(reason)` when excluded
    pub fn exclusion_reason(&self, sha: &str, when: DateTime<Utc>) -> Option<String> {
        self.filters()
            .iter()
            .find_map(|filter| filter.exclude(sha, when))
    }
}

/// A single ignore predicate
#[derive(Debug, Clone)]
pub enum VersionFilter {
    /// Exclude commits by sha
    Shas(HashSet<String>),
    /// Exclude commits at or before a cutoff
    Before(DateTime<Utc>),
}

impl VersionFilter {
    /// `Some(reason)` when the commit is excluded by this predicate
    pub fn exclude(&self, sha: &str, when: DateTime<Utc>) -> Option<String> {
        match self {
            Self::Shas(shas) => shas
                .contains(sha)
                .then(|| format!("Commit '{sha}' is in the ignore list")),
            Self::Before(cutoff) => (when <= *cutoff)
                .then(|| format!("Commit '{sha}' predates the ignore cutoff {cutoff}")),
        }
    }
}
