//! Configured next-version strategy

use tracing::debug;

use apogee_core::version::SemanticVersion;
use apogee_git::RepositorySnapshot;

use crate::base_version::BaseVersion;
use crate::strategies::StrategyContext;

pub(crate) fn base_versions<R: RepositorySnapshot>(
    context: &StrategyContext<'_, R>,
) -> Vec<BaseVersion> {
    let configuration = context.configuration;
    let Some(next_version) = &configuration.next_version else {
        return Vec::new();
    };
    match SemanticVersion::parse(next_version, None, configuration.semantic_version_format) {
        Ok(version) => vec![BaseVersion::new(
            "NextVersion in configuration",
            false,
            version,
            None,
        )],
        Err(e) => {
            debug!(next_version, error = %e, "configured next version is not parseable");
            Vec::new()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use apogee_core::config::Configuration;
    use apogee_git::FixtureRepository;

    use crate::branches::BranchRepository;
    use crate::tagged::TaggedVersionRepository;

    #[test]
    fn test_configured_next_version() {
        let mut fx = FixtureRepository::new("main");
        fx.commit("first");

        let mut config = Configuration::default();
        config.next_version = Some("1.4.0".to_string());
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
        assert_eq!(candidates[0].semantic_version.to_string(), "1.4.0");
        assert!(!candidates[0].should_increment);
    }

    #[test]
    fn test_absent_next_version_yields_nothing() {
        let mut fx = FixtureRepository::new("main");
        fx.commit("first");

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
