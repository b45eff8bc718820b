//! In-memory repository fixture
//!
//! Simulates a commit graph without touching the filesystem, for fast and
//! deterministic engine tests. Shas and timestamps are synthesized from a
//! counter, so identical setups produce identical graphs.

use std::collections::HashMap;

use chrono::{DateTime, TimeZone, Utc};

use crate::snapshot::RepositorySnapshot;
use crate::types::{Branch, BranchName, Commit, Tag};

/// Baseline for synthesized commit timestamps
const EPOCH: i64 = 1_700_000_000;

/// An in-memory commit graph builder implementing [`RepositorySnapshot`]
pub struct FixtureRepository {
    commits: HashMap<String, Commit>,
    branches: Vec<Branch>,
    tags: Vec<Tag>,
    current: usize,
    uncommitted: u64,
    counter: u64,
}

impl FixtureRepository {
    /// Create an empty fixture with a single checked-out branch
    pub fn new(branch: &str) -> Self {
        Self {
            commits: HashMap::new(),
            branches: vec![Branch::new(BranchName::local(branch), Vec::new())],
            tags: Vec::new(),
            current: 0,
            uncommitted: 0,
            counter: 0,
        }
    }

    /// Append a commit to the current branch, returning its sha
    pub fn commit(&mut self, message: &str) -> String {
        let parents = self.branches[self.current]
            .tip()
            .map(|tip| vec![tip.to_string()])
            .unwrap_or_default();
        self.add_commit(message, parents)
    }

    /// Append a merge commit joining `second_parent` into the current branch
    pub fn merge(&mut self, message: &str, second_parent: &str) -> String {
        let mut parents = self.branches[self.current]
            .tip()
            .map(|tip| vec![tip.to_string()])
            .unwrap_or_default();
        parents.push(second_parent.to_string());
        self.add_commit(message, parents)
    }

    /// Create a branch at the current tip and check it out
    pub fn branch(&mut self, name: &str) {
        let commits = self.branches[self.current].commits.clone();
        self.branches.push(Branch::new(BranchName::local(name), commits));
        self.current = self.branches.len() - 1;
    }

    /// Check out an existing branch
    pub fn checkout(&mut self, name: &str) {
        self.current = self
            .branches
            .iter()
            .position(|b| b.name.friendly == name)
            .unwrap_or_else(|| panic!("fixture has no branch '{name}'"));
    }

    /// Tag a commit
    pub fn tag(&mut self, name: &str, sha: &str) {
        self.tags.push(Tag::new(name, sha));
    }

    /// Tag the current branch tip
    pub fn tag_head(&mut self, name: &str) {
        let tip = self.branches[self.current]
            .tip()
            .expect("fixture branch has no commits to tag")
            .to_string();
        self.tag(name, &tip);
    }

    /// Set the uncommitted-changes count
    pub fn set_uncommitted(&mut self, count: u64) {
        self.uncommitted = count;
    }

    /// The timestamp a given fixture commit was synthesized with
    pub fn when_of(&self, sha: &str) -> DateTime<Utc> {
        self.commits[sha].when
    }

    fn add_commit(&mut self, message: &str, parents: Vec<String>) -> String {
        self.counter += 1;
        let sha = format!(
            "{:040x}",
            (self.counter as u128).wrapping_mul(0x9e37_79b9_7f4a_7c15)
        );
        let when = Utc
            .timestamp_opt(EPOCH + self.counter as i64 * 3600, 0)
            .single()
            .expect("valid fixture timestamp");
        self.commits
            .insert(sha.clone(), Commit::new(sha.clone(), message, when, parents));
        self.branches[self.current].commits.insert(0, sha.clone());
        sha
    }
}

impl RepositorySnapshot for FixtureRepository {
    fn current_branch(&self) -> &Branch {
        &self.branches[self.current]
    }

    fn branches(&self) -> &[Branch] {
        &self.branches
    }

    fn tags(&self) -> &[Tag] {
        &self.tags
    }

    fn uncommitted_changes(&self) -> u64 {
        self.uncommitted
    }

    fn find_commit(&self, sha: &str) -> Option<&Commit> {
        self.commits.get(sha)
    }
}
