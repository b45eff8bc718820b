//! Track-release-branches strategy
//!
//! For branches that track release branches (develop, by default), the
//! versions carried in release-branch names become candidates.

use apogee_git::RepositorySnapshot;

use crate::base_version::BaseVersion;
use crate::strategies::{version_in_branch_name, StrategyContext};

pub(crate) fn base_versions<R: RepositorySnapshot>(
    context: &StrategyContext<'_, R>,
) -> Vec<BaseVersion> {
    let configuration = context.configuration;
    if !configuration.tracks_release_branches {
        return Vec::new();
    }

    let current = configuration.branch_name.as_str();
    let mut candidates = Vec::new();
    for release in context.branches.release_branches(&[current]) {
        let Some((version, _)) = version_in_branch_name(
            &release.name.friendly,
            &configuration.tag_prefix,
            configuration.semantic_version_format,
        ) else {
            continue;
        };
        candidates.push(
            BaseVersion::new(
                format!("Release branch '{}'", release.name.friendly),
                true,
                version,
                None,
            )
            .with_branch_name_override(release.name.friendly.clone()),
        );
    }
    candidates
}

#[cfg(test)]
mod tests {
    use super::*;
    use apogee_core::config::Configuration;
    use apogee_git::FixtureRepository;

    use crate::branches::BranchRepository;
    use crate::tagged::TaggedVersionRepository;

    #[test]
    fn test_develop_sees_release_branch_versions() {
        let mut fx = FixtureRepository::new("main");
        fx.commit("base");
        fx.branch("release/2.1.0");
        fx.commit("stabilize");
        fx.checkout("main");
        fx.branch("develop");
        fx.commit("next things");

        let config = Configuration::default();
        let eff = config.effective_configurations("develop").unwrap().remove(0);
        assert!(eff.tracks_release_branches);

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
        assert_eq!(candidates[0].semantic_version.to_string(), "2.1.0");
        assert_eq!(
            candidates[0].branch_name_override.as_deref(),
            Some("release/2.1.0")
        );
    }

    #[test]
    fn test_non_tracking_branch_yields_nothing() {
        let mut fx = FixtureRepository::new("main");
        fx.commit("base");
        fx.branch("release/2.1.0");
        fx.commit("stabilize");
        fx.checkout("main");

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

        assert!(base_versions(&context).is_empty());
    }
}
