//! Merge-message strategy

use std::sync::LazyLock;

use regex::Regex;
use tracing::debug;

use apogee_git::RepositorySnapshot;

use crate::base_version::BaseVersion;
use crate::strategies::{version_in_branch_name, StrategyContext};

/// Common merge-commit subject shapes
static MERGE_MESSAGE_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"^Merge (?:branch|remote-tracking branch|tag) '(?P<branch>[^']+)'|^Merge pull request #\d+ (?:in [^ ]+ )?from (?P<pr_branch>[^ ]+)",
    )
    .expect("Invalid regex")
});

pub(crate) fn base_versions<R: RepositorySnapshot>(
    context: &StrategyContext<'_, R>,
) -> Vec<BaseVersion> {
    let configuration = context.configuration;
    let mut candidates = Vec::new();
    for sha in &context.snapshot.current_branch().commits {
        let Some(commit) = context.snapshot.find_commit(sha) else {
            continue;
        };
        if !commit.is_merge() {
            continue;
        }
        let Some(merged_branch) = merged_branch_name(&commit.message) else {
            continue;
        };
        let Some((version, _)) = version_in_branch_name(
            &merged_branch,
            &configuration.tag_prefix,
            configuration.semantic_version_format,
        ) else {
            debug!(branch = %merged_branch, "merge message carries no version");
            continue;
        };
        candidates.push(BaseVersion::new(
            format!("Merge message '{merged_branch}'"),
            true,
            version,
            Some(commit.sha.clone()),
        ));
    }
    candidates
}

/// The branch named by a merge commit subject, if recognisable
pub(crate) fn merged_branch_name(message: &str) -> Option<String> {
    let subject = message.lines().next().unwrap_or(message);
    let caps = MERGE_MESSAGE_REGEX.captures(subject)?;
    caps.name("branch")
        .or_else(|| caps.name("pr_branch"))
        .map(|m| m.as_str().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use apogee_core::config::Configuration;
    use apogee_git::FixtureRepository;

    use crate::branches::BranchRepository;
    use crate::tagged::TaggedVersionRepository;

    #[test]
    fn test_merged_branch_name_shapes() {
        assert_eq!(
            merged_branch_name("Merge branch 'release/1.2.0'").as_deref(),
            Some("release/1.2.0")
        );
        assert_eq!(
            merged_branch_name("Merge branch 'release/1.2.0' into develop").as_deref(),
            Some("release/1.2.0")
        );
        assert_eq!(
            merged_branch_name("Merge pull request #42 from release/2.0.0").as_deref(),
            Some("release/2.0.0")
        );
        assert_eq!(merged_branch_name("fix: a normal commit"), None);
    }

    #[test]
    fn test_release_merge_yields_embedded_version() {
        let mut fx = FixtureRepository::new("main");
        fx.commit("base");
        fx.branch("release/1.2.0");
        let release_tip = fx.commit("stabilize");
        fx.checkout("main");
        fx.merge("Merge branch 'release/1.2.0'", &release_tip);

        let config = Configuration::default();
        let eff = config.effective_configurations("main").unwrap().remove(0);
        let tagged = TaggedVersionRepository::new(&fx);
        let branches = BranchRepository::new(&fx, &config);
        let context = StrategyContext {
            snapshot: &fx,
            configuration: &eff,
            tagged: &tagged,
            branches: &branches,
        };

        let candidates = base_versions(&context);
        assert_eq!(candidates.len(), 1);
        assert_eq!(candidates[0].semantic_version.to_string(), "1.2.0");
        assert!(candidates[0].should_increment);
        assert!(candidates[0].base_version_source.is_some());
    }
}
