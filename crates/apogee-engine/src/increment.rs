//! Increment resolution from configuration and commit messages

use std::sync::LazyLock;

use regex::Regex;
use tracing::debug;

use apogee_core::config::{CommitMessageIncrementMode, EffectiveConfiguration};
use apogee_core::version::IncrementField;
use apogee_git::{Commit, RepositorySnapshot};

use crate::base_version::BaseVersion;

/// `+semver:` directive grammar
static BUMP_MESSAGE_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\+semver:\s?(?P<word>breaking|major|feature|minor|fix|patch|none|skip)")
        .expect("Invalid regex")
});

/// The strongest `+semver:` directive in a message, if any
pub fn bump_directive(message: &str) -> Option<IncrementField> {
    BUMP_MESSAGE_REGEX
        .captures_iter(message)
        .map(|caps| match caps["word"].to_ascii_lowercase().as_str() {
            "breaking" | "major" => IncrementField::Major,
            "feature" | "minor" => IncrementField::Minor,
            "fix" | "patch" => IncrementField::Patch,
            _ => IncrementField::None,
        })
        .max()
}

/// Whether directives in this commit's message are honoured under `mode`
pub fn directives_allowed(commit: &Commit, mode: CommitMessageIncrementMode) -> bool {
    match mode {
        CommitMessageIncrementMode::Enabled => true,
        CommitMessageIncrementMode::Disabled => false,
        CommitMessageIncrementMode::MergeMessageOnly => commit.is_merge(),
    }
}

/// Commits after `source` (exclusive) up to the branch tip (inclusive)
///
/// A `None` source yields the whole branch history. Order is tip first.
pub fn commits_between<'a, R: RepositorySnapshot>(
    snapshot: &'a R,
    source: Option<&str>,
) -> Vec<&'a Commit> {
    snapshot
        .current_branch()
        .commits
        .iter()
        .take_while(|sha| Some(sha.as_str()) != source)
        .filter_map(|sha| snapshot.find_commit(sha))
        .collect()
}

/// Resolve the field to increment a base version by
///
/// Resolution order: an explicit (non-inherited) configured increment
/// wins; otherwise the strongest `+semver:` directive between the base
/// version source and HEAD; in both cases an unchanged base version whose
/// label already matches collapses to `None` so the version is preserved.
pub fn find_increment<R: RepositorySnapshot>(
    snapshot: &R,
    configuration: &EffectiveConfiguration,
    base_version: &BaseVersion,
    label: Option<&str>,
) -> IncrementField {
    let intervening = commits_between(snapshot, base_version.base_version_source.as_deref());

    let force = base_version
        .operator
        .as_ref()
        .is_some_and(|op| op.force_increment);
    if !force
        && configuration.prevent_increment_when_current_commit_tagged
        && intervening.is_empty()
        && base_version
            .semantic_version
            .is_match_for_branch_specific_label(label)
    {
        debug!(
            base = %base_version.semantic_version,
            "base version already matches the label with no new commits, not incrementing"
        );
        return IncrementField::None;
    }

    if let Some(operator) = &base_version.operator {
        return operator.increment;
    }

    if !configuration.increment_inherited {
        return configuration.increment;
    }

    let from_messages = intervening
        .iter()
        .filter(|commit| directives_allowed(commit, configuration.commit_message_incrementing))
        .filter_map(|commit| bump_directive(&commit.message))
        .max();
    match from_messages {
        Some(field) => {
            debug!(%field, "increment resolved from commit messages");
            field
        }
        None => configuration.increment,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use apogee_core::version::SemanticVersion;
    use apogee_git::FixtureRepository;
    use chrono::Utc;

    #[test]
    fn test_bump_directive_words() {
        assert_eq!(bump_directive("+semver: major"), Some(IncrementField::Major));
        assert_eq!(
            bump_directive("fix stuff +semver: breaking"),
            Some(IncrementField::Major)
        );
        assert_eq!(bump_directive("+semver:minor"), Some(IncrementField::Minor));
        assert_eq!(bump_directive("+semver: fix"), Some(IncrementField::Patch));
        assert_eq!(bump_directive("+semver: skip"), Some(IncrementField::None));
        assert_eq!(bump_directive("no directive here"), None);
    }

    #[test]
    fn test_bump_directive_takes_the_maximum() {
        assert_eq!(
            bump_directive("+semver: patch and later +semver: major"),
            Some(IncrementField::Major)
        );
    }

    #[test]
    fn test_directives_gated_by_mode() {
        let plain = Commit::new("a", "+semver: major", Utc::now(), vec!["p".into()]);
        let merge = Commit::new("b", "+semver: major", Utc::now(), vec!["p".into(), "q".into()]);

        assert!(directives_allowed(&plain, CommitMessageIncrementMode::Enabled));
        assert!(!directives_allowed(&plain, CommitMessageIncrementMode::Disabled));
        assert!(!directives_allowed(&plain, CommitMessageIncrementMode::MergeMessageOnly));
        assert!(directives_allowed(&merge, CommitMessageIncrementMode::MergeMessageOnly));
    }

    #[test]
    fn test_commits_between() {
        let mut fx = FixtureRepository::new("main");
        let a = fx.commit("first");
        fx.commit("second");
        fx.commit("third");

        assert_eq!(commits_between(&fx, Some(&a)).len(), 2);
        assert_eq!(commits_between(&fx, None).len(), 3);
    }

    #[test]
    fn test_identity_preserved_for_matching_tag_on_head() {
        let mut fx = FixtureRepository::new("main");
        let a = fx.commit("first");
        fx.tag("v1.2.0", &a);

        let config = apogee_core::config::Configuration::default();
        let eff = config.effective_configurations("main").unwrap().remove(0);
        let base = BaseVersion::new(
            "Git tag",
            true,
            SemanticVersion::new(1, 2, 0),
            Some(a.clone()),
        );
        assert_eq!(
            find_increment(&fx, &eff, &base, Some("")),
            IncrementField::None
        );
    }
}
