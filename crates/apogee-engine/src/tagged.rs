//! Tagged version lookups with per-calculation caches

use std::collections::HashMap;
use std::hash::Hash;
use std::sync::{Arc, Mutex};

use chrono::{DateTime, Utc};
use tracing::{debug, info};

use apogee_core::config::{EffectiveConfiguration, IgnoreConfiguration};
use apogee_core::version::{SemanticVersion, SemanticVersionFormat};
use apogee_git::{Branch, RepositorySnapshot};

use crate::branches::BranchRepository;

/// A version parsed from a tag, bound to the commit it was read from
#[derive(Debug, Clone)]
pub struct SemanticVersionWithTag {
    pub version: SemanticVersion,
    /// The tag the version was parsed from
    pub tag_name: String,
    /// The commit the version counts from
    pub commit_sha: String,
    /// Timestamp of that commit
    pub commit_when: DateTime<Utc>,
}

/// Versions grouped by the commit they are recorded against
pub type CommitVersions = HashMap<String, Vec<SemanticVersionWithTag>>;

type BranchKey = (String, String, SemanticVersionFormat);
type GlobalKey = (String, SemanticVersionFormat);

/// Cached, filtered lookups over the tag catalogue
///
/// Caches live for a single calculation. Reads are safe from parallel
/// test fixtures: each table is a locked map of immutable `Arc` values
/// and a producer runs at most once per key.
pub struct TaggedVersionRepository<'a, R: RepositorySnapshot> {
    snapshot: &'a R,
    branch_cache: Mutex<HashMap<BranchKey, Arc<CommitVersions>>>,
    merge_target_cache: Mutex<HashMap<BranchKey, Arc<CommitVersions>>>,
    global_cache: Mutex<HashMap<GlobalKey, Arc<CommitVersions>>>,
}

impl<'a, R: RepositorySnapshot> TaggedVersionRepository<'a, R> {
    /// Create a repository over a snapshot
    pub fn new(snapshot: &'a R) -> Self {
        Self {
            snapshot,
            branch_cache: Mutex::new(HashMap::new()),
            merge_target_cache: Mutex::new(HashMap::new()),
            global_cache: Mutex::new(HashMap::new()),
        }
    }

    /// Every source of versions relevant to `branch`, de-duplicated and
    /// grouped by commit
    ///
    /// Composes, in order: versions on the branch itself; merge-target
    /// versions when tracked; release-branch versions for tracking
    /// branches; and main-branch versions for branches that are neither
    /// main nor release. Only versions matching `label` and recorded
    /// against commits no newer than `not_older_than` survive.
    pub fn all_tagged_versions(
        &self,
        configuration: &EffectiveConfiguration,
        branch: &Branch,
        label: Option<&str>,
        not_older_than: DateTime<Utc>,
        branches: &BranchRepository<'a, R>,
    ) -> CommitVersions {
        let prefix = configuration.tag_prefix.as_str();
        let format = configuration.semantic_version_format;
        let ignore = &configuration.ignore;
        let current = branch.name.friendly.as_str();

        let mut sources: Vec<CommitVersions> = vec![self
            .tagged_versions_of_branch(branch, prefix, format, ignore)
            .as_ref()
            .clone()];
        if configuration.track_merge_target {
            sources.push(
                self.tagged_versions_of_merge_target(branch, prefix, format, ignore)
                    .as_ref()
                    .clone(),
            );
        }
        if configuration.tracks_release_branches {
            sources.push(self.tagged_versions_of_release_branches(
                prefix, format, ignore, branches, current,
            ));
        }
        if !configuration.is_main_branch && !configuration.is_release_branch {
            sources.push(self.tagged_versions_of_main_branches(
                prefix, format, ignore, branches, current,
            ));
        }

        let mut seen = std::collections::HashSet::new();
        let mut grouped: CommitVersions = HashMap::new();
        for source in sources {
            for entry in source.values().flatten() {
                if !entry.version.is_match_for_branch_specific_label(label) {
                    continue;
                }
                if entry.commit_when > not_older_than {
                    continue;
                }
                let key = (
                    entry.commit_sha.clone(),
                    entry.tag_name.clone(),
                    entry.version.to_string(),
                );
                if seen.insert(key) {
                    grouped
                        .entry(entry.commit_sha.clone())
                        .or_default()
                        .push(entry.clone());
                }
            }
        }
        grouped
    }

    /// Versions tagged on commits reachable from `branch`
    pub fn tagged_versions_of_branch(
        &self,
        branch: &Branch,
        tag_prefix: &str,
        format: SemanticVersionFormat,
        ignore: &IgnoreConfiguration,
    ) -> Arc<CommitVersions> {
        let key = (
            branch.name.friendly.clone(),
            tag_prefix.to_string(),
            format,
        );
        let branch = branch.clone();
        let all = self.tagged_versions(tag_prefix, format, ignore);
        let snapshot = self.snapshot;
        get_or_insert(&self.branch_cache, key, "branch tags", move || {
            let mut grouped: CommitVersions = HashMap::new();
            for sha in branch_commits_after_ignore(snapshot, &branch, ignore) {
                if let Some(versions) = all.get(&sha) {
                    grouped.insert(sha, versions.clone());
                }
            }
            grouped
        })
    }

    /// Versions whose tagged commit is a parent of a commit on `branch`,
    /// recorded against the child commit
    pub fn tagged_versions_of_merge_target(
        &self,
        branch: &Branch,
        tag_prefix: &str,
        format: SemanticVersionFormat,
        ignore: &IgnoreConfiguration,
    ) -> Arc<CommitVersions> {
        let key = (
            branch.name.friendly.clone(),
            tag_prefix.to_string(),
            format,
        );
        let branch = branch.clone();
        let all = self.tagged_versions(tag_prefix, format, ignore);
        let snapshot = self.snapshot;
        get_or_insert(&self.merge_target_cache, key, "merge target tags", move || {
            let mut grouped: CommitVersions = HashMap::new();
            for sha in branch_commits_after_ignore(snapshot, &branch, ignore) {
                let Some(commit) = snapshot.find_commit(&sha) else {
                    continue;
                };
                for parent in &commit.parents {
                    if let Some(versions) = all.get(parent) {
                        let entry = grouped.entry(sha.clone()).or_default();
                        entry.extend(versions.iter().cloned().map(|mut v| {
                            v.commit_sha = sha.clone();
                            v.commit_when = commit.when;
                            v
                        }));
                    }
                }
            }
            grouped
        })
    }

    /// Union of branch lookups across all main branches except `exclude`
    pub fn tagged_versions_of_main_branches(
        &self,
        tag_prefix: &str,
        format: SemanticVersionFormat,
        ignore: &IgnoreConfiguration,
        branches: &BranchRepository<'a, R>,
        exclude: &str,
    ) -> CommitVersions {
        self.union_of_branches(branches.main_branches(&[exclude]), tag_prefix, format, ignore)
    }

    /// Union of branch lookups across all release branches except `exclude`
    pub fn tagged_versions_of_release_branches(
        &self,
        tag_prefix: &str,
        format: SemanticVersionFormat,
        ignore: &IgnoreConfiguration,
        branches: &BranchRepository<'a, R>,
        exclude: &str,
    ) -> CommitVersions {
        self.union_of_branches(branches.release_branches(&[exclude]), tag_prefix, format, ignore)
    }

    /// The global commit-to-versions lookup
    ///
    /// Unparseable tags are dropped; ignored commits are skipped with the
    /// filter's reason surfaced.
    pub fn tagged_versions(
        &self,
        tag_prefix: &str,
        format: SemanticVersionFormat,
        ignore: &IgnoreConfiguration,
    ) -> Arc<CommitVersions> {
        let key = (tag_prefix.to_string(), format);
        let snapshot = self.snapshot;
        let prefix = tag_prefix.to_string();
        let ignore = ignore.clone();
        get_or_insert(&self.global_cache, key, "all tags", move || {
            let mut grouped: CommitVersions = HashMap::new();
            for tag in snapshot.tags() {
                let Some(commit) = snapshot.find_commit(&tag.target_sha) else {
                    continue;
                };
                let version = match SemanticVersion::parse(&tag.name, Some(&prefix), format) {
                    Ok(version) => version,
                    Err(e) => {
                        debug!(tag = %tag.name, error = %e, "skipping unparseable tag");
                        continue;
                    }
                };
                if let Some(reason) = ignore.exclusion_reason(&commit.sha, commit.when) {
                    info!(tag = %tag.name, %reason, "tag excluded by ignore filter");
                    continue;
                }
                grouped
                    .entry(commit.sha.clone())
                    .or_default()
                    .push(SemanticVersionWithTag {
                        version,
                        tag_name: tag.name.clone(),
                        commit_sha: commit.sha.clone(),
                        commit_when: commit.when,
                    });
            }
            grouped
        })
    }

    fn union_of_branches(
        &self,
        branches: Vec<&Branch>,
        tag_prefix: &str,
        format: SemanticVersionFormat,
        ignore: &IgnoreConfiguration,
    ) -> CommitVersions {
        let mut grouped: CommitVersions = HashMap::new();
        for branch in branches {
            let versions = self.tagged_versions_of_branch(branch, tag_prefix, format, ignore);
            for (sha, entries) in versions.iter() {
                grouped
                    .entry(sha.clone())
                    .or_default()
                    .extend(entries.iter().cloned());
            }
        }
        grouped
    }
}

/// Branch commits with ignored ones removed
pub(crate) fn branch_commits_after_ignore<R: RepositorySnapshot>(
    snapshot: &R,
    branch: &Branch,
    ignore: &IgnoreConfiguration,
) -> Vec<String> {
    branch
        .commits
        .iter()
        .filter(|sha| {
            let Some(commit) = snapshot.find_commit(sha) else {
                return false;
            };
            ignore.exclusion_reason(&commit.sha, commit.when).is_none()
        })
        .cloned()
        .collect()
}

/// Locked get-or-insert; the producer runs at most once per key
fn get_or_insert<K: Eq + Hash, V>(
    cache: &Mutex<HashMap<K, Arc<V>>>,
    key: K,
    table: &str,
    produce: impl FnOnce() -> V,
) -> Arc<V> {
    let mut guard = cache.lock().expect("tag cache lock poisoned");
    if let Some(hit) = guard.get(&key) {
        debug!(cache = table, "cache hit");
        return Arc::clone(hit);
    }
    let value = Arc::new(produce());
    guard.insert(key, Arc::clone(&value));
    value
}
