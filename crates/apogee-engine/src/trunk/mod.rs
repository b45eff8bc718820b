//! Trunk-based iteration over the linearised commit sequence

mod incrementers;

use std::collections::HashSet;

use tracing::debug;

use apogee_core::config::EffectiveConfiguration;
use apogee_core::version::{IncrementField, SemanticVersion};
use apogee_git::{Commit, RepositorySnapshot};

use crate::base_version::{BaseVersion, BaseVersionOperator};
use crate::branches::BranchRepository;
use crate::increment::{bump_directive, directives_allowed};
use crate::tagged::{branch_commits_after_ignore, TaggedVersionRepository};
use incrementers::ORDERED_INCREMENTERS;

/// One commit in the iteration sequence
pub struct TrunkBasedCommit<'a> {
    pub commit: &'a Commit,
    /// Whether the commit sits on a configured main branch
    pub on_main: bool,
    /// Commits merged in by this commit, oldest first
    pub child: Option<Vec<TrunkBasedCommit<'a>>>,
}

/// Mutable state threaded through the incrementers
///
/// Reset at the start of each iteration; `base_version_source` tracks the
/// commit whose tag last anchored the version, `semantic_version` the
/// in-progress value.
pub struct IterationContext {
    pub base_version_source: Option<String>,
    pub semantic_version: SemanticVersion,
    pub label: Option<String>,
    pub increment: IncrementField,
    pub force_increment: bool,
    pub has_increment: bool,
}

impl IterationContext {
    fn new(label: Option<String>) -> Self {
        Self {
            base_version_source: None,
            semantic_version: SemanticVersion::new(0, 0, 0),
            label,
            increment: IncrementField::None,
            force_increment: false,
            has_increment: false,
        }
    }

    /// Replace the in-progress version with a tagged one
    pub(crate) fn anchor(&mut self, version: SemanticVersion, sha: &str) {
        self.semantic_version = version;
        self.base_version_source = Some(sha.to_string());
        self.increment = IncrementField::None;
        self.force_increment = false;
        self.has_increment = false;
    }

    /// Advance the in-progress version by one increment record
    pub(crate) fn record_increment(&mut self, field: IncrementField, force: bool) {
        self.semantic_version = self
            .semantic_version
            .increment(field, self.label.as_deref());
        self.increment = self.increment.max(field);
        self.force_increment = self.force_increment || force;
        self.has_increment = true;
    }
}

/// Walk the current branch and emit the accumulated base version
pub fn find_base_version<R: RepositorySnapshot>(
    snapshot: &R,
    configuration: &EffectiveConfiguration,
    tagged: &TaggedVersionRepository<'_, R>,
    branches: &BranchRepository<'_, R>,
) -> Option<BaseVersion> {
    let branch = snapshot.current_branch();
    let shas = branch_commits_after_ignore(snapshot, branch, &configuration.ignore);
    if shas.is_empty() {
        return None;
    }

    let main_commits: HashSet<&str> = branches
        .main_branches(&[])
        .iter()
        .flat_map(|b| b.commits.iter().map(String::as_str))
        .collect();
    let tagged_on_branch = tagged.tagged_versions_of_branch(
        branch,
        &configuration.tag_prefix,
        configuration.semantic_version_format,
        &configuration.ignore,
    );

    let mut context = IterationContext::new(configuration.effective_label(None));

    // Oldest ancestor forward to HEAD
    for sha in shas.iter().rev() {
        let commit = snapshot.find_commit(sha)?;
        let child = commit
            .is_merge()
            .then(|| merged_commits(snapshot, commit, &main_commits))
            .filter(|children| !children.is_empty());
        let item = TrunkBasedCommit {
            commit,
            on_main: main_commits.contains(sha.as_str()),
            child,
        };

        let tags = tagged_on_branch.get(sha).cloned().unwrap_or_default();
        let bump = directives_allowed(commit, configuration.commit_message_incrementing)
            .then(|| bump_directive(&commit.message))
            .flatten();

        let incrementer = ORDERED_INCREMENTERS
            .iter()
            .find(|i| i.matches(&item, &tags, bump))
            .expect("the incrementer list always has a fallback");
        incrementer.apply(&item, &tags, bump, configuration, &mut context);

        if context.base_version_source.is_none() {
            context.base_version_source = Some(sha.clone());
        }
    }

    debug!(
        version = %context.semantic_version,
        source = ?context.base_version_source,
        "trunk iteration complete"
    );

    Some(
        BaseVersion::new(
            "Trunk based",
            false,
            context.semantic_version.clone(),
            context.base_version_source.clone(),
        )
        .with_operator(BaseVersionOperator {
            increment: context.increment,
            force_increment: context.force_increment,
            label: Some(context.label.clone()),
            alternative_semantic_version: None,
        }),
    )
}

/// Commits reachable from the merged parent but not from the first parent
fn merged_commits<'a, R: RepositorySnapshot>(
    snapshot: &'a R,
    merge: &Commit,
    main_commits: &HashSet<&str>,
) -> Vec<TrunkBasedCommit<'a>> {
    let Some(first_parent) = merge.parents.first() else {
        return Vec::new();
    };
    let mainline = reachable_from(snapshot, first_parent);

    let mut result = Vec::new();
    let mut queue: Vec<String> = merge.parents.iter().skip(1).cloned().collect();
    let mut seen: HashSet<String> = queue.iter().cloned().collect();
    while let Some(sha) = queue.pop() {
        if mainline.contains(&sha) {
            continue;
        }
        let Some(commit) = snapshot.find_commit(&sha) else {
            continue;
        };
        result.push(TrunkBasedCommit {
            commit,
            on_main: main_commits.contains(sha.as_str()),
            child: None,
        });
        for parent in &commit.parents {
            if seen.insert(parent.clone()) {
                queue.push(parent.clone());
            }
        }
    }
    result.sort_by_key(|item| item.commit.when);
    result
}

fn reachable_from<R: RepositorySnapshot>(snapshot: &R, start: &str) -> HashSet<String> {
    let mut seen = HashSet::new();
    let mut queue = vec![start.to_string()];
    while let Some(sha) = queue.pop() {
        if let Some(commit) = snapshot.find_commit(&sha) {
            for parent in &commit.parents {
                if !seen.contains(parent) {
                    queue.push(parent.clone());
                }
            }
        }
        seen.insert(sha);
    }
    seen
}

#[cfg(test)]
mod tests {
    use super::*;
    use apogee_core::config::{Configuration, Increment};
    use apogee_git::FixtureRepository;

    fn effective(config: &Configuration, fx: &FixtureRepository) -> EffectiveConfiguration {
        config
            .effective_configurations(&fx.current_branch().name.friendly)
            .unwrap()
            .remove(0)
    }

    fn anonymous_main_config(increment: Increment) -> Configuration {
        let mut config = Configuration::default();
        let main = config.branch_mut("main");
        main.increment = Some(increment);
        main.label = Some(None);
        config
    }

    #[test]
    fn test_plain_commits_accumulate_increments() {
        let mut fx = FixtureRepository::new("main");
        let a = fx.commit("first");
        fx.commit("second");

        let config = anonymous_main_config(Increment::Major);
        let eff = effective(&config, &fx);
        let tagged = TaggedVersionRepository::new(&fx);
        let branches = BranchRepository::new(&fx, &config);

        let base = find_base_version(&fx, &eff, &tagged, &branches).unwrap();
        // Each major bump restarts the anonymous counter at 1
        assert_eq!(base.semantic_version.to_string(), "2.0.0-1");
        assert_eq!(base.base_version_source.as_deref(), Some(a.as_str()));
        assert!(!base.should_increment);
    }

    #[test]
    fn test_stable_tag_anchors_the_version() {
        let mut fx = FixtureRepository::new("main");
        fx.commit("first");
        let b = fx.commit("second");
        fx.tag("v0.2.0", &b);

        let config = anonymous_main_config(Increment::Major);
        let eff = effective(&config, &fx);
        let tagged = TaggedVersionRepository::new(&fx);
        let branches = BranchRepository::new(&fx, &config);

        let base = find_base_version(&fx, &eff, &tagged, &branches).unwrap();
        assert_eq!(base.semantic_version.to_string(), "0.2.0");
        assert_eq!(base.base_version_source.as_deref(), Some(b.as_str()));
    }

    #[test]
    fn test_bump_message_forces_its_increment() {
        let mut fx = FixtureRepository::new("main");
        fx.commit("start +semver: major");
        fx.commit("more");

        let config = anonymous_main_config(Increment::None);
        let eff = effective(&config, &fx);
        let tagged = TaggedVersionRepository::new(&fx);
        let branches = BranchRepository::new(&fx, &config);

        let base = find_base_version(&fx, &eff, &tagged, &branches).unwrap();
        assert_eq!(base.semantic_version.to_string(), "1.0.0-2");
        let operator = base.operator.unwrap();
        assert!(operator.force_increment);
        assert_eq!(operator.increment, IncrementField::Major);
    }

    #[test]
    fn test_merged_branch_folds_child_increments() {
        let mut fx = FixtureRepository::new("main");
        fx.commit("base");
        fx.branch("feature/x");
        let feature_tip = fx.commit("work +semver: minor");
        fx.checkout("main");
        fx.merge("Merge branch 'feature/x'", &feature_tip);

        let config = anonymous_main_config(Increment::Patch);
        let eff = effective(&config, &fx);
        let tagged = TaggedVersionRepository::new(&fx);
        let branches = BranchRepository::new(&fx, &config);

        let base = find_base_version(&fx, &eff, &tagged, &branches).unwrap();
        // base commit bumps patch, the merge folds the child's minor in
        assert_eq!(base.semantic_version.to_string(), "0.1.0-1");
    }

    #[test]
    fn test_empty_branch_yields_nothing() {
        let fx = FixtureRepository::new("main");
        let config = anonymous_main_config(Increment::Patch);
        let eff = effective(&config, &fx);
        let tagged = TaggedVersionRepository::new(&fx);
        let branches = BranchRepository::new(&fx, &config);
        assert!(find_base_version(&fx, &eff, &tagged, &branches).is_none());
    }
}
