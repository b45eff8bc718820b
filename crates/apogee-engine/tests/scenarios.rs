//! End-to-end calculation scenarios over fixture repositories

use apogee_core::config::{
    CommitMessageIncrementMode, Configuration, DeploymentMode, Increment, VersionStrategy,
};
use apogee_core::error::{ApogeeError, RepositoryError};
use apogee_core::version::SemanticVersion;
use apogee_engine::NextVersionCalculator;
use apogee_git::FixtureRepository;

fn trunk_configuration(
    increment: Increment,
    label: Option<&str>,
    mode: CommitMessageIncrementMode,
) -> Configuration {
    let mut config = Configuration::default();
    config.commit_message_incrementing = mode;
    config.version_strategies = vec![VersionStrategy::Fallback, VersionStrategy::TrunkBased];
    let main = config.branch_mut("main");
    main.increment = Some(increment);
    main.label = Some(label.map(str::to_string));
    config
}

fn calculate(fx: &FixtureRepository, config: &Configuration) -> SemanticVersion {
    NextVersionCalculator::new(fx, config).calculate().unwrap()
}

mod trunk_based_deployment {
    use super::*;

    fn tagged_prerelease_fixture() -> FixtureRepository {
        let mut fx = FixtureRepository::new("main");
        fx.commit("A");
        fx.tag_head("0.0.0-4");
        fx
    }

    #[test]
    fn matching_tag_on_head_is_preserved() {
        let fx = tagged_prerelease_fixture();
        let config = trunk_configuration(
            Increment::Major,
            None,
            CommitMessageIncrementMode::Enabled,
        );
        assert_eq!(calculate(&fx, &config).full_sem_ver(), "0.0.0-4");
    }

    #[test]
    fn label_switch_recalculates_from_the_tag() {
        let fx = tagged_prerelease_fixture();
        let config = trunk_configuration(
            Increment::Minor,
            Some("foo"),
            CommitMessageIncrementMode::Enabled,
        );
        assert_eq!(calculate(&fx, &config).full_sem_ver(), "0.1.0-foo.1+1");
    }

    #[test]
    fn stable_tag_on_head_matches_any_label() {
        let mut fx = FixtureRepository::new("main");
        fx.commit("A");
        fx.commit("B");
        fx.tag_head("0.2.0");
        let config = trunk_configuration(
            Increment::Major,
            Some("bar"),
            CommitMessageIncrementMode::Enabled,
        );
        assert_eq!(calculate(&fx, &config).full_sem_ver(), "0.2.0");
    }

    fn bump_message_fixture() -> FixtureRepository {
        let mut fx = FixtureRepository::new("main");
        fx.commit("A +semver: major");
        fx.commit("B");
        fx
    }

    #[test]
    fn bump_message_drives_the_walk() {
        let fx = bump_message_fixture();
        let config = trunk_configuration(
            Increment::None,
            None,
            CommitMessageIncrementMode::Enabled,
        );
        assert_eq!(calculate(&fx, &config).full_sem_ver(), "1.0.0-2+1");
    }

    #[test]
    fn disabled_mode_ignores_bump_messages() {
        let fx = bump_message_fixture();
        let config = trunk_configuration(
            Increment::Minor,
            Some("foo"),
            CommitMessageIncrementMode::Disabled,
        );
        assert_eq!(calculate(&fx, &config).full_sem_ver(), "0.2.0-foo.1+1");
    }

    #[test]
    fn merge_message_only_skips_plain_commits() {
        let fx = bump_message_fixture();
        let config = trunk_configuration(
            Increment::Major,
            Some("bar"),
            CommitMessageIncrementMode::MergeMessageOnly,
        );
        assert_eq!(calculate(&fx, &config).full_sem_ver(), "2.0.0-bar.1+1");
    }
}

mod tagged_versions {
    use super::*;

    #[test]
    fn commits_since_source_counts_to_head() {
        let mut fx = FixtureRepository::new("main");
        fx.commit("A");
        fx.tag_head("v1.2.3");
        fx.commit("B");
        fx.commit("C");

        let config = Configuration::default();
        let version = calculate(&fx, &config);
        assert_eq!(version.full_sem_ver(), "1.2.4+2");
        assert_eq!(version.build_metadata.commits_since_source, Some(2));
    }

    #[test]
    fn tag_on_head_without_prevention_is_incremented() {
        let mut fx = FixtureRepository::new("main");
        fx.commit("A");
        fx.tag_head("v1.0.0");

        let mut config = Configuration::default();
        config.prevent_increment_when_current_commit_tagged = false;
        config.branch_mut("main").prevent_increment_when_current_commit_tagged = Some(false);
        assert_eq!(calculate(&fx, &config).full_sem_ver(), "1.0.1");
    }

    #[test]
    fn inherit_increment_still_short_circuits_on_head_tag() {
        let mut fx = FixtureRepository::new("main");
        fx.commit("A");
        fx.commit("B");
        fx.tag_head("v0.3.0");

        let mut config = Configuration::default();
        config.increment = Increment::Patch;
        config.branch_mut("main").increment = Some(Increment::Inherit);
        assert_eq!(calculate(&fx, &config).full_sem_ver(), "0.3.0");
    }

    #[test]
    fn ignored_tag_is_invisible() {
        let mut fx = FixtureRepository::new("main");
        let a = fx.commit("A");
        fx.tag_head("v5.0.0");
        fx.commit("B");

        let mut config = Configuration::default();
        config.ignore.shas.insert(a);
        // Only the fallback remains, incremented once per the main config
        assert_eq!(calculate(&fx, &config).full_sem_ver(), "0.0.1+2");
    }

    #[test]
    fn tag_floor_lifts_a_lower_calculation() {
        let mut fx = FixtureRepository::new("main");
        fx.commit("A");
        fx.tag_head("v2.0.0");
        fx.commit("B");

        let mut config = Configuration::default();
        config.version_strategies = vec![VersionStrategy::Fallback];
        // The fallback alone would produce 0.0.1; the prior tag lifts the
        // triple to its level
        assert_eq!(calculate(&fx, &config).full_sem_ver(), "2.0.0+2");
    }
}

mod arbitration {
    use super::*;

    #[test]
    fn result_is_the_maximum_candidate() {
        let mut fx = FixtureRepository::new("main");
        fx.commit("A");
        fx.tag_head("v0.4.0");
        fx.commit("B");

        let mut config = Configuration::default();
        config.next_version = Some("0.2.0".to_string());
        // Tagged 0.4.0 -> 0.4.1 beats the configured 0.2.0
        assert_eq!(calculate(&fx, &config).full_sem_ver(), "0.4.1+1");
    }

    #[test]
    fn configured_next_version_wins_when_highest() {
        let mut fx = FixtureRepository::new("main");
        fx.commit("A");

        let mut config = Configuration::default();
        config.next_version = Some("3.0.0".to_string());
        assert_eq!(calculate(&fx, &config).full_sem_ver(), "3.0.0+1");
    }

    #[test]
    fn tied_candidates_prefer_the_oldest_source() {
        let mut fx = FixtureRepository::new("main");
        fx.commit("base");
        fx.branch("release/1.0.3");
        let first_release = fx.commit("stabilize");
        fx.checkout("main");
        fx.merge("Merge branch 'release/1.0.3'", &first_release);
        fx.commit("mid");
        fx.branch("hotfix/followup");
        let second_release = fx.commit("more stabilize");
        fx.checkout("main");
        fx.merge("Merge branch 'release/1.0.3'", &second_release);
        fx.commit("tail");

        let mut config = Configuration::default();
        config.version_strategies = vec![VersionStrategy::MergeMessage];
        let version = calculate(&fx, &config);
        // Both merges propose 1.0.3 -> 1.0.4; the older merge commit is
        // the source, so three commits lie between it and HEAD
        assert_eq!(version.full_sem_ver(), "1.0.4+3");
    }
}

mod deployment_modes {
    use super::*;

    fn delivery_fixture() -> FixtureRepository {
        let mut fx = FixtureRepository::new("main");
        fx.commit("A");
        fx.tag_head("v1.0.0");
        fx.commit("B");
        fx.commit("C");
        fx
    }

    #[test]
    fn continuous_delivery_number_tracks_tag_distance() {
        let fx = delivery_fixture();
        let mut config = Configuration::default();
        let main = config.branch_mut("main");
        main.deployment_mode = Some(DeploymentMode::ContinuousDelivery);
        main.label = Some(Some("beta".to_string()));

        let version = calculate(&fx, &config);
        assert_eq!(version.full_sem_ver(), "1.0.1-beta.2");
        assert_eq!(version.build_metadata.commits_since_source, None);
    }

    #[test]
    fn continuous_deployment_strips_the_prerelease() {
        let fx = delivery_fixture();
        let mut config = Configuration::default();
        let main = config.branch_mut("main");
        main.deployment_mode = Some(DeploymentMode::ContinuousDeployment);
        main.label = Some(Some("beta".to_string()));

        let version = calculate(&fx, &config);
        assert!(!version.is_pre_release());
        assert_eq!(version.to_string(), "1.0.1");
    }

    #[test]
    fn continuous_deployment_strips_a_head_tag_prerelease() {
        let mut fx = FixtureRepository::new("main");
        fx.commit("A");
        fx.tag_head("v1.2.0-beta.3");

        let mut config = Configuration::default();
        let main = config.branch_mut("main");
        main.deployment_mode = Some(DeploymentMode::ContinuousDeployment);
        main.label = Some(Some("beta".to_string()));

        let version = calculate(&fx, &config);
        assert_eq!(version.to_string(), "1.2.0");
    }
}

mod build_metadata {
    use super::*;

    #[test]
    fn metadata_references_head() {
        let mut fx = FixtureRepository::new("main");
        fx.commit("A");
        let head = fx.commit("B");
        fx.set_uncommitted(3);

        let config = Configuration::default();
        let version = calculate(&fx, &config);
        assert_eq!(version.build_metadata.sha.as_deref(), Some(head.as_str()));
        assert_eq!(
            version.build_metadata.short_sha.as_deref(),
            Some(&head[..7])
        );
        assert_eq!(version.build_metadata.branch.as_deref(), Some("main"));
        assert_eq!(version.build_metadata.uncommitted_changes, 3);
        assert_eq!(version.build_metadata.commit_date, Some(fx.when_of(&head)));
    }
}

mod failures {
    use super::*;

    #[test]
    fn empty_branch_reports_no_tip() {
        let fx = FixtureRepository::new("main");
        let config = Configuration::default();
        let result = NextVersionCalculator::new(&fx, &config).calculate();
        assert!(matches!(
            result,
            Err(ApogeeError::Repository(RepositoryError::NoTip { .. }))
        ));
    }

    #[test]
    fn no_strategies_reports_no_base_versions() {
        let mut fx = FixtureRepository::new("main");
        fx.commit("A");

        let mut config = Configuration::default();
        config.version_strategies = Vec::new();
        let result = NextVersionCalculator::new(&fx, &config).calculate();
        assert!(matches!(
            result,
            Err(ApogeeError::Repository(RepositoryError::NoBaseVersions { .. }))
        ));
    }
}
