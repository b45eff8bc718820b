//! Branch classification over a repository snapshot

use apogee_core::config::Configuration;
use apogee_git::{Branch, RepositorySnapshot};

/// Looks up main and release branches per the configuration
pub struct BranchRepository<'a, R: RepositorySnapshot> {
    snapshot: &'a R,
    configuration: &'a Configuration,
}

impl<'a, R: RepositorySnapshot> BranchRepository<'a, R> {
    /// Create a repository over a snapshot
    pub fn new(snapshot: &'a R, configuration: &'a Configuration) -> Self {
        Self {
            snapshot,
            configuration,
        }
    }

    /// Branches classified as mainlines, minus the excluded names
    pub fn main_branches(&self, exclude: &[&str]) -> Vec<&'a Branch> {
        self.classified(exclude, |name| self.configuration.is_main_branch(name))
    }

    /// Branches classified as release branches, minus the excluded names
    pub fn release_branches(&self, exclude: &[&str]) -> Vec<&'a Branch> {
        self.classified(exclude, |name| self.configuration.is_release_branch(name))
    }

    /// Whether `sha` is reachable from any main branch
    pub fn is_on_main_branch(&self, sha: &str) -> bool {
        self.main_branches(&[]).iter().any(|b| b.contains(sha))
    }

    fn classified(&self, exclude: &[&str], classify: impl Fn(&str) -> bool) -> Vec<&'a Branch> {
        self.snapshot
            .branches()
            .iter()
            .filter(|branch| {
                let name = branch.name.friendly.as_str();
                classify(name) && !exclude.contains(&name)
            })
            .collect()
    }
}
