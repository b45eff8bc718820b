//! Effective configuration: the merged view applied at one branch

use regex::Regex;
use tracing::debug;

use crate::config::ignore::IgnoreConfiguration;
use crate::config::types::{
    BranchConfiguration, CommitMessageIncrementMode, Configuration, DeploymentMode, Increment,
    VersionStrategy,
};
use crate::error::ConfigurationError;
use crate::version::{IncrementField, SemanticVersionFormat};

/// Immutable merge of global and branch configuration
#[derive(Debug, Clone)]
pub struct EffectiveConfiguration {
    /// Friendly name of the branch this configuration applies to
    pub branch_name: String,
    /// Resolved pre-release label; `None` means anonymous
    pub label: Option<String>,
    /// Resolved increment field
    pub increment: IncrementField,
    /// Whether the branch section deferred the increment via `Inherit`
    pub increment_inherited: bool,
    pub deployment_mode: DeploymentMode,
    pub tag_prefix: String,
    pub semantic_version_format: SemanticVersionFormat,
    pub commit_message_incrementing: CommitMessageIncrementMode,
    pub prevent_increment_when_current_commit_tagged: bool,
    pub track_merge_target: bool,
    pub tracks_release_branches: bool,
    pub is_main_branch: bool,
    pub is_release_branch: bool,
    pub version_strategies: Vec<VersionStrategy>,
    pub next_version: Option<String>,
    pub ignore: IgnoreConfiguration,
}

impl EffectiveConfiguration {
    /// Resolve the label, substituting `{BranchName}` from the override
    /// branch when one is given, else from the configured branch
    pub fn effective_label(&self, branch_name_override: Option<&str>) -> Option<String> {
        self.label.as_ref().map(|label| {
            let branch = branch_name_override.unwrap_or(&self.branch_name);
            label.replace("{BranchName}", &sanitize_label_part(branch))
        })
    }
}

/// Branch names become label parts with separators flattened out
fn sanitize_label_part(branch: &str) -> String {
    let friendly = branch.rsplit('/').next().unwrap_or(branch);
    friendly
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '-' { c } else { '-' })
        .collect()
}

impl Configuration {
    /// The effective configurations relevant to `branch_name`
    ///
    /// Every branch section whose pattern matches contributes one merged
    /// configuration; a branch matching no section gets the global
    /// configuration alone. An unresolvable `Inherit` increment is a
    /// configuration error.
    pub fn effective_configurations(
        &self,
        branch_name: &str,
    ) -> Result<Vec<EffectiveConfiguration>, ConfigurationError> {
        let mut matched = Vec::new();
        for (name, branch) in &self.branches {
            let Some(pattern) = &branch.pattern else {
                continue;
            };
            let regex =
                Regex::new(pattern).map_err(|e| ConfigurationError::InvalidBranchPattern {
                    pattern: pattern.clone(),
                    reason: e.to_string(),
                })?;
            if regex.is_match(branch_name) {
                debug!(branch = branch_name, section = %name, "branch configuration matched");
                matched.push(self.merge(branch_name, branch)?);
            }
        }

        if matched.is_empty() {
            debug!(branch = branch_name, "no branch section matched, using global configuration");
            matched.push(self.merge(branch_name, &BranchConfiguration::default())?);
        }
        Ok(matched)
    }

    fn merge(
        &self,
        branch_name: &str,
        branch: &BranchConfiguration,
    ) -> Result<EffectiveConfiguration, ConfigurationError> {
        let configured = branch.increment.unwrap_or(Increment::Inherit);
        let (resolved, inherited) = match configured {
            Increment::Inherit => (self.increment, true),
            other => (other, false),
        };
        let increment = resolved
            .to_field()
            .ok_or_else(|| ConfigurationError::NothingToInherit {
                branch: branch_name.to_string(),
            })?;

        Ok(EffectiveConfiguration {
            branch_name: branch_name.to_string(),
            label: match &branch.label {
                Some(label) => label.clone(),
                None => self.label.clone(),
            },
            increment,
            increment_inherited: inherited,
            deployment_mode: branch.deployment_mode.unwrap_or(self.deployment_mode),
            tag_prefix: self.tag_prefix.clone(),
            semantic_version_format: self.semantic_version_format,
            commit_message_incrementing: branch
                .commit_message_incrementing
                .unwrap_or(self.commit_message_incrementing),
            prevent_increment_when_current_commit_tagged: branch
                .prevent_increment_when_current_commit_tagged
                .unwrap_or(self.prevent_increment_when_current_commit_tagged),
            track_merge_target: branch.track_merge_target.unwrap_or(false),
            tracks_release_branches: branch.tracks_release_branches.unwrap_or(false),
            is_main_branch: branch.is_main_branch.unwrap_or(false),
            is_release_branch: branch.is_release_branch.unwrap_or(false),
            version_strategies: branch
                .version_strategies
                .clone()
                .unwrap_or_else(|| self.version_strategies.clone()),
            next_version: self.next_version.clone(),
            ignore: self.ignore.clone(),
        })
    }

    /// Does `branch_name` fall under a main-branch section?
    pub fn is_main_branch(&self, branch_name: &str) -> bool {
        self.branch_flag(branch_name, |b| b.is_main_branch)
    }

    /// Does `branch_name` fall under a release-branch section?
    pub fn is_release_branch(&self, branch_name: &str) -> bool {
        self.branch_flag(branch_name, |b| b.is_release_branch)
    }

    fn branch_flag(
        &self,
        branch_name: &str,
        flag: impl Fn(&BranchConfiguration) -> Option<bool>,
    ) -> bool {
        self.branches.values().any(|branch| {
            flag(branch).unwrap_or(false)
                && branch
                    .pattern
                    .as_ref()
                    .and_then(|p| Regex::new(p).ok())
                    .is_some_and(|regex| regex.is_match(branch_name))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_main_branch_resolution() {
        let config = Configuration::default();
        let effective = config.effective_configurations("main").unwrap();
        assert_eq!(effective.len(), 1);
        let eff = &effective[0];
        assert!(eff.is_main_branch);
        assert_eq!(eff.increment, IncrementField::Patch);
        assert!(!eff.increment_inherited);
        assert_eq!(eff.label.as_deref(), Some(""));
    }

    #[test]
    fn test_feature_branch_inherits_increment() {
        let config = Configuration::default();
        let effective = config.effective_configurations("feature/login").unwrap();
        let eff = &effective[0];
        assert!(eff.increment_inherited);
        assert_eq!(eff.increment, IncrementField::Patch);
    }

    #[test]
    fn test_feature_branch_label_template() {
        let config = Configuration::default();
        let eff = &config.effective_configurations("feature/login").unwrap()[0];
        assert_eq!(eff.effective_label(None).as_deref(), Some("login"));
        assert_eq!(
            eff.effective_label(Some("feature/other_thing")).as_deref(),
            Some("other-thing")
        );
    }

    #[test]
    fn test_unmatched_branch_uses_global() {
        let config = Configuration::default();
        let eff = &config.effective_configurations("wip").unwrap()[0];
        assert!(!eff.is_main_branch);
        assert_eq!(eff.increment, IncrementField::Patch);
        assert!(eff.increment_inherited);
    }

    #[test]
    fn test_nothing_to_inherit_is_an_error() {
        let mut config = Configuration::default();
        config.increment = Increment::Inherit;
        let result = config.effective_configurations("feature/x");
        assert!(matches!(
            result,
            Err(ConfigurationError::NothingToInherit { .. })
        ));
    }

    #[test]
    fn test_branch_classification() {
        let config = Configuration::default();
        assert!(config.is_main_branch("main"));
        assert!(config.is_main_branch("master"));
        assert!(!config.is_main_branch("develop"));
        assert!(config.is_release_branch("release/1.2.0"));
        assert!(!config.is_release_branch("main"));
    }
}
