//! git2-backed snapshot

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use chrono::{TimeZone, Utc};
use git2::{BranchType, Repository, Sort, StatusOptions};
use tracing::{debug, info, instrument};

use apogee_core::error::GitError;

use crate::snapshot::RepositorySnapshot;
use crate::types::{Branch, BranchName, Commit, Tag};

/// Result type for git operations
pub type Result<T> = std::result::Result<T, GitError>;

/// An eager snapshot of a repository on disk
///
/// All branches, commits, and tags are resolved at construction; the
/// engine never touches libgit2 afterwards.
pub struct GitSnapshot {
    path: PathBuf,
    commits: HashMap<String, Commit>,
    branches: Vec<Branch>,
    tags: Vec<Tag>,
    current_branch: usize,
    uncommitted: u64,
}

impl GitSnapshot {
    /// Open a repository at the given path and snapshot it
    #[instrument(fields(path = %path.display()))]
    pub fn open(path: &Path) -> Result<Self> {
        let repo = Repository::open(path).map_err(|e| {
            if e.code() == git2::ErrorCode::NotFound {
                GitError::RepositoryNotFound(path.to_path_buf())
            } else {
                GitError::OpenFailed(e.to_string())
            }
        })?;
        Self::from_repository(&repo, path.to_path_buf())
    }

    /// Discover a repository by searching parent directories
    #[instrument(fields(start_path = %start_path.display()))]
    pub fn discover(start_path: &Path) -> Result<Self> {
        let repo = Repository::discover(start_path).map_err(|e| {
            if e.code() == git2::ErrorCode::NotFound {
                GitError::NotARepository(start_path.to_path_buf())
            } else {
                GitError::OpenFailed(e.to_string())
            }
        })?;
        let path = repo.workdir().unwrap_or_else(|| repo.path()).to_path_buf();
        Self::from_repository(&repo, path)
    }

    /// The repository path
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn from_repository(repo: &Repository, path: PathBuf) -> Result<Self> {
        let head = repo.head()?;
        let current_name = head.shorthand().ok_or(GitError::NoCurrentBranch)?.to_string();

        let mut commits = HashMap::new();
        let mut branches = Vec::new();
        let mut current_branch = None;

        for entry in repo.branches(Some(BranchType::Local))? {
            let (branch, _) = entry?;
            let Some(name) = branch.name()? else { continue };
            let name = name.to_string();
            let Some(tip) = branch.get().target() else { continue };

            let mut walk = repo.revwalk()?;
            walk.set_sorting(Sort::TOPOLOGICAL | Sort::TIME)?;
            walk.push(tip)?;

            let mut shas = Vec::new();
            for oid in walk {
                let oid = oid?;
                let sha = oid.to_string();
                if !commits.contains_key(&sha) {
                    let commit = repo.find_commit(oid)?;
                    commits.insert(sha.clone(), commit_to_record(&commit));
                }
                shas.push(sha);
            }

            if name == current_name {
                current_branch = Some(branches.len());
            }
            debug!(branch = %name, commits = shas.len(), "walked branch");
            branches.push(Branch::new(BranchName::local(name), shas));
        }

        let current_branch = current_branch.ok_or(GitError::NoCurrentBranch)?;

        let mut tags = Vec::new();
        repo.tag_foreach(|oid, name| {
            let name = String::from_utf8_lossy(name)
                .trim_start_matches("refs/tags/")
                .to_string();
            // Peel annotated tags down to the commit they describe
            let target = if let Ok(tag) = repo.find_tag(oid) {
                tag.target_id()
            } else {
                oid
            };
            if repo.find_commit(target).is_ok() {
                tags.push(Tag::new(name, target.to_string()));
            }
            true
        })?;

        let uncommitted = if repo.is_bare() {
            0
        } else {
            let mut options = StatusOptions::new();
            options.include_untracked(true);
            repo.statuses(Some(&mut options))?.len() as u64
        };

        info!(
            branches = branches.len(),
            commits = commits.len(),
            tags = tags.len(),
            "snapshot complete"
        );

        Ok(Self {
            path,
            commits,
            branches,
            tags,
            current_branch,
            uncommitted,
        })
    }
}

impl RepositorySnapshot for GitSnapshot {
    fn current_branch(&self) -> &Branch {
        &self.branches[self.current_branch]
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

fn commit_to_record(commit: &git2::Commit<'_>) -> Commit {
    let when = Utc
        .timestamp_opt(commit.time().seconds(), 0)
        .single()
        .unwrap_or_else(Utc::now);
    let parents = commit.parent_ids().map(|id| id.to_string()).collect();
    Commit::new(
        commit.id().to_string(),
        commit.message().unwrap_or("").to_string(),
        when,
        parents,
    )
}
