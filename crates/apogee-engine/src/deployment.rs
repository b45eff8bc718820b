//! Deployment-mode post-processors

use tracing::debug;

use apogee_core::config::DeploymentMode;
use apogee_core::version::{BuildMetadata, PreReleaseTag, SemanticVersion};
use apogee_git::{Commit, RepositorySnapshot};

use crate::base_version::NextVersion;
use crate::branches::BranchRepository;
use crate::increment::commits_between;
use crate::tagged::TaggedVersionRepository;

/// Produce the final version from the arbitration winner
pub fn finalize<'a, R: RepositorySnapshot>(
    snapshot: &'a R,
    tagged: &TaggedVersionRepository<'a, R>,
    branches: &BranchRepository<'a, R>,
    next: &NextVersion,
    mut version: SemanticVersion,
    head: &Commit,
) -> SemanticVersion {
    let configuration = &next.configuration;
    let branch = snapshot.current_branch();
    let source = next.base_version.base_version_source.as_deref();
    let distance = commits_between(snapshot, source).len() as u64;

    let mut metadata = BuildMetadata::at_commit(head.sha.clone(), head.when)
        .with_branch(branch.name.friendly.clone())
        .with_uncommitted(snapshot.uncommitted_changes());

    match configuration.deployment_mode {
        DeploymentMode::ManualDeployment => {
            metadata.commits_since_source = Some(distance);
            metadata.version_source_sha = source.map(str::to_string);
        }
        DeploymentMode::ContinuousDelivery => {
            // The pre-release number becomes the distance from the last
            // tag matching the label; commits-since is not rendered.
            if version.pre_release.has_tag() {
                let label = configuration.effective_label(None);
                let tag_distance = distance_from_last_matching_tag(
                    snapshot,
                    tagged,
                    branches,
                    next,
                    label.as_deref(),
                    head,
                );
                version.pre_release =
                    PreReleaseTag::new(version.pre_release.name.clone(), Some(tag_distance.max(1)));
            }
            metadata.version_source_sha = source.map(str::to_string);
        }
        DeploymentMode::ContinuousDeployment => {
            version.pre_release = PreReleaseTag::default();
            metadata.commits_since_source = Some(distance);
            metadata.version_source_sha = source.map(str::to_string);
        }
    }

    debug!(mode = %configuration.deployment_mode, version = %version, "deployment mode applied");
    version.with_build_metadata(metadata)
}

fn distance_from_last_matching_tag<'a, R: RepositorySnapshot>(
    snapshot: &'a R,
    tagged: &TaggedVersionRepository<'a, R>,
    branches: &BranchRepository<'a, R>,
    next: &NextVersion,
    label: Option<&str>,
    head: &Commit,
) -> u64 {
    let branch = snapshot.current_branch();
    let grouped =
        tagged.all_tagged_versions(&next.configuration, branch, label, head.when, branches);
    let latest = grouped
        .values()
        .flatten()
        .max_by_key(|entry| entry.commit_when)
        .map(|entry| entry.commit_sha.clone());
    commits_between(snapshot, latest.as_deref()).len() as u64
}

#[cfg(test)]
mod tests {
    use super::*;
    use apogee_core::config::Configuration;
    use apogee_core::version::IncrementField;
    use apogee_git::FixtureRepository;

    use crate::base_version::BaseVersion;

    fn winner(
        config: &Configuration,
        base: BaseVersion,
        incremented: SemanticVersion,
    ) -> NextVersion {
        NextVersion {
            incremented_version: incremented,
            base_version: base,
            configuration: config.effective_configurations("main").unwrap().remove(0),
        }
    }

    #[test]
    fn test_manual_mode_counts_from_source() {
        let mut fx = FixtureRepository::new("main");
        let a = fx.commit("first");
        fx.commit("second");

        let config = Configuration::default();
        let tagged = TaggedVersionRepository::new(&fx);
        let branches = BranchRepository::new(&fx, &config);
        let head = fx.head_commit().unwrap().clone();

        let base = BaseVersion::new("test", true, SemanticVersion::new(0, 1, 0), Some(a.clone()));
        let incremented = SemanticVersion::new(0, 1, 0).increment(IncrementField::Patch, Some(""));
        let next = winner(&config, base, incremented);

        let result = finalize(&fx, &tagged, &branches, &next, next.incremented_version.clone(), &head);
        assert_eq!(result.full_sem_ver(), "0.1.1+1");
        assert_eq!(result.build_metadata.version_source_sha.as_deref(), Some(a.as_str()));
    }

    #[test]
    fn test_continuous_deployment_strips_prerelease() {
        let mut fx = FixtureRepository::new("main");
        fx.commit("first");

        let mut config = Configuration::default();
        config.deployment_mode = apogee_core::config::DeploymentMode::ContinuousDeployment;
        config.branch_mut("main").deployment_mode =
            Some(apogee_core::config::DeploymentMode::ContinuousDeployment);
        let tagged = TaggedVersionRepository::new(&fx);
        let branches = BranchRepository::new(&fx, &config);
        let head = fx.head_commit().unwrap().clone();

        let base = BaseVersion::new("test", true, SemanticVersion::new(1, 0, 0), None);
        let incremented = SemanticVersion::new(1, 1, 0)
            .with_pre_release(PreReleaseTag::new("beta", Some(3)));
        let next = winner(&config, base, incremented);

        let result = finalize(&fx, &tagged, &branches, &next, next.incremented_version.clone(), &head);
        assert!(!result.is_pre_release());
        assert_eq!(result.to_string(), "1.1.0");
    }

    #[test]
    fn test_continuous_delivery_number_is_tag_distance() {
        let mut fx = FixtureRepository::new("main");
        let a = fx.commit("first");
        fx.tag("v1.0.0", &a);
        fx.commit("second");
        fx.commit("third");

        let mut config = Configuration::default();
        config.branch_mut("main").deployment_mode =
            Some(apogee_core::config::DeploymentMode::ContinuousDelivery);
        config.branch_mut("main").label = Some(Some("beta".to_string()));
        let tagged = TaggedVersionRepository::new(&fx);
        let branches = BranchRepository::new(&fx, &config);
        let head = fx.head_commit().unwrap().clone();

        let base = BaseVersion::new("test", true, SemanticVersion::new(1, 0, 0), Some(a.clone()));
        let incremented = SemanticVersion::new(1, 0, 1)
            .with_pre_release(PreReleaseTag::new("beta", Some(1)));
        let next = winner(&config, base, incremented);

        let result = finalize(&fx, &tagged, &branches, &next, next.incremented_version.clone(), &head);
        // Two commits since the last matching tag; commits-since cleared
        assert_eq!(result.to_string(), "1.0.1-beta.2");
        assert_eq!(result.full_sem_ver(), "1.0.1-beta.2");
    }
}
