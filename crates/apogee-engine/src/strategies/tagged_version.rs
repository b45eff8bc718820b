//! Tagged-version strategy: the highest prior tag on the branch

use apogee_git::RepositorySnapshot;

use crate::base_version::BaseVersion;
use crate::strategies::StrategyContext;

pub(crate) fn base_versions<R: RepositorySnapshot>(
    context: &StrategyContext<'_, R>,
) -> Vec<BaseVersion> {
    let configuration = context.configuration;
    let branch = context.snapshot.current_branch();
    let Some(head) = context.snapshot.head_commit() else {
        return Vec::new();
    };
    let label = configuration.effective_label(None);

    let grouped = context.tagged.all_tagged_versions(
        configuration,
        branch,
        label.as_deref(),
        head.when,
        context.branches,
    );
    let Some(best) = grouped
        .values()
        .flatten()
        .max_by(|a, b| a.version.cmp(&b.version))
    else {
        return Vec::new();
    };

    vec![BaseVersion::new(
        format!("Git tag '{}'", best.tag_name),
        true,
        best.version.clone(),
        Some(best.commit_sha.clone()),
    )]
}

#[cfg(test)]
mod tests {
    use super::*;
    use apogee_core::config::Configuration;
    use apogee_git::FixtureRepository;

    use crate::branches::BranchRepository;
    use crate::tagged::TaggedVersionRepository;

    #[test]
    fn test_highest_prior_tag_wins() {
        let mut fx = FixtureRepository::new("main");
        let a = fx.commit("first");
        fx.tag("v0.9.0", &a);
        let b = fx.commit("second");
        fx.tag("v1.1.0", &b);
        fx.commit("third");

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
        assert_eq!(candidates[0].semantic_version.to_string(), "1.1.0");
        assert_eq!(candidates[0].base_version_source.as_deref(), Some(b.as_str()));
        assert!(candidates[0].should_increment);
    }

    #[test]
    fn test_label_mismatch_excludes_tags() {
        let mut fx = FixtureRepository::new("main");
        let a = fx.commit("first");
        fx.tag("v1.0.0-other.1", &a);

        let mut config = Configuration::default();
        config.branch_mut("main").label = Some(Some("beta".to_string()));
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
