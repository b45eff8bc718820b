//! Configuration types

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Deserializer, Serialize};

use crate::config::ignore::IgnoreConfiguration;
use crate::error::ConfigurationError;
use crate::version::{IncrementField, SemanticVersionFormat};

/// How calculated versions are promoted to releases
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub enum DeploymentMode {
    /// Releases are cut by hand; pre-release tags accumulate per commit
    #[default]
    ManualDeployment,
    /// Every build is a release candidate; the pre-release number tracks
    /// the distance from the last matching tag
    ContinuousDelivery,
    /// Every build is a release; versions carry no pre-release tag
    ContinuousDeployment,
}

impl fmt::Display for DeploymentMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ManualDeployment => write!(f, "ManualDeployment"),
            Self::ContinuousDelivery => write!(f, "ContinuousDelivery"),
            Self::ContinuousDeployment => write!(f, "ContinuousDeployment"),
        }
    }
}

/// Configured increment, including the inheritable marker
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub enum Increment {
    /// Never increment the triple
    None,
    Patch,
    Minor,
    Major,
    /// Defer to the parent configuration
    #[default]
    Inherit,
}

impl Increment {
    /// The resolved field, or `None` for `Inherit`
    pub fn to_field(self) -> Option<IncrementField> {
        match self {
            Self::None => Some(IncrementField::None),
            Self::Patch => Some(IncrementField::Patch),
            Self::Minor => Some(IncrementField::Minor),
            Self::Major => Some(IncrementField::Major),
            Self::Inherit => None,
        }
    }
}

/// Whether `+semver:` directives in commit messages are honoured
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub enum CommitMessageIncrementMode {
    /// Every commit message is scanned
    #[default]
    Enabled,
    /// Directives are ignored entirely
    Disabled,
    /// Only merge commits are scanned
    MergeMessageOnly,
}

/// A base-version producer selectable in configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub enum VersionStrategy {
    /// Always propose 0.0.0 so every branch has a candidate
    Fallback,
    /// Propose the configured `next_version` verbatim
    ConfiguredNextVersion,
    /// Read versions out of merge commit messages
    MergeMessage,
    /// Highest prior tag on the branch
    TaggedVersion,
    /// Versions carried by release-branch names, for tracking branches
    TrackReleaseBranches,
    /// A version embedded in the branch name itself
    VersionInBranchName,
    /// Walk the trunk commit by commit
    TrunkBased,
}

/// Per-branch configuration overrides
///
/// Every field is optional; unset fields fall back to the global
/// configuration when the effective configuration is assembled. `label`
/// distinguishes *unset* (outer `None`) from an explicit null (inner
/// `None`, meaning an anonymous pre-release tag).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct BranchConfiguration {
    /// Regex matched against the friendly branch name
    pub pattern: Option<String>,
    #[serde(deserialize_with = "double_option")]
    pub label: Option<Option<String>>,
    pub increment: Option<Increment>,
    pub deployment_mode: Option<DeploymentMode>,
    pub prevent_increment_when_current_commit_tagged: Option<bool>,
    pub track_merge_target: Option<bool>,
    pub tracks_release_branches: Option<bool>,
    pub is_main_branch: Option<bool>,
    pub is_release_branch: Option<bool>,
    pub commit_message_incrementing: Option<CommitMessageIncrementMode>,
    pub version_strategies: Option<Vec<VersionStrategy>>,
}

/// Keep `label: ~` (explicit null) distinct from an absent `label` key
fn double_option<'de, D>(deserializer: D) -> Result<Option<Option<String>>, D::Error>
where
    D: Deserializer<'de>,
{
    Option::<String>::deserialize(deserializer).map(Some)
}

impl BranchConfiguration {
    /// Fill unset fields from a fallback section
    fn fill_from(&mut self, fallback: &BranchConfiguration) {
        macro_rules! fill {
            ($($field:ident),*) => {
                $(if self.$field.is_none() {
                    self.$field = fallback.$field.clone();
                })*
            };
        }
        fill!(
            pattern,
            label,
            increment,
            deployment_mode,
            prevent_increment_when_current_commit_tagged,
            track_merge_target,
            tracks_release_branches,
            is_main_branch,
            is_release_branch,
            commit_message_incrementing,
            version_strategies
        );
    }
}

/// The user-supplied configuration, immutable once loaded
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Configuration {
    /// Explicit floor for the next version
    pub next_version: Option<String>,
    /// Regex fragment stripped from tag names before parsing
    pub tag_prefix: String,
    /// Global pre-release label; `None` means anonymous
    pub label: Option<String>,
    pub increment: Increment,
    pub deployment_mode: DeploymentMode,
    pub semantic_version_format: SemanticVersionFormat,
    pub commit_message_incrementing: CommitMessageIncrementMode,
    pub prevent_increment_when_current_commit_tagged: bool,
    pub version_strategies: Vec<VersionStrategy>,
    /// Branch sections, keyed by a symbolic name
    pub branches: BTreeMap<String, BranchConfiguration>,
    pub ignore: IgnoreConfiguration,
}

impl Default for Configuration {
    fn default() -> Self {
        Self {
            next_version: None,
            tag_prefix: "[vV]?".to_string(),
            label: None,
            increment: Increment::Patch,
            deployment_mode: DeploymentMode::ManualDeployment,
            semantic_version_format: SemanticVersionFormat::Strict,
            commit_message_incrementing: CommitMessageIncrementMode::Enabled,
            prevent_increment_when_current_commit_tagged: true,
            version_strategies: vec![
                VersionStrategy::Fallback,
                VersionStrategy::ConfiguredNextVersion,
                VersionStrategy::MergeMessage,
                VersionStrategy::TaggedVersion,
                VersionStrategy::TrackReleaseBranches,
                VersionStrategy::VersionInBranchName,
            ],
            branches: default_branches(),
            ignore: IgnoreConfiguration::default(),
        }
    }
}

impl Configuration {
    /// Parse a configuration from YAML
    ///
    /// User branch sections are merged over the built-in sections of the
    /// same name, so overriding one field keeps the stock pattern.
    pub fn from_yaml_str(input: &str) -> Result<Self, ConfigurationError> {
        let mut config: Self = serde_yaml::from_str(input)?;
        for (name, defaults) in default_branches() {
            match config.branches.get_mut(&name) {
                Some(branch) => branch.fill_from(&defaults),
                None => {
                    config.branches.insert(name, defaults);
                }
            }
        }
        Ok(config)
    }

    /// The branch section for a symbolic name, if present
    pub fn branch(&self, name: &str) -> Option<&BranchConfiguration> {
        self.branches.get(name)
    }

    /// Mutable access for test setup and front-end overrides
    pub fn branch_mut(&mut self, name: &str) -> &mut BranchConfiguration {
        self.branches.entry(name.to_string()).or_default()
    }
}

fn default_branches() -> BTreeMap<String, BranchConfiguration> {
    let mut branches = BTreeMap::new();
    branches.insert(
        "main".to_string(),
        BranchConfiguration {
            pattern: Some("^master$|^main$".to_string()),
            label: Some(Some(String::new())),
            increment: Some(Increment::Patch),
            is_main_branch: Some(true),
            ..BranchConfiguration::default()
        },
    );
    branches.insert(
        "develop".to_string(),
        BranchConfiguration {
            pattern: Some("^dev(elop)?(ment)?$".to_string()),
            label: Some(Some("alpha".to_string())),
            increment: Some(Increment::Minor),
            tracks_release_branches: Some(true),
            track_merge_target: Some(true),
            ..BranchConfiguration::default()
        },
    );
    branches.insert(
        "release".to_string(),
        BranchConfiguration {
            pattern: Some("^releases?[/-]".to_string()),
            label: Some(Some("beta".to_string())),
            increment: Some(Increment::None),
            is_release_branch: Some(true),
            ..BranchConfiguration::default()
        },
    );
    branches.insert(
        "feature".to_string(),
        BranchConfiguration {
            pattern: Some("^features?[/-]".to_string()),
            label: Some(Some("{BranchName}".to_string())),
            increment: Some(Increment::Inherit),
            ..BranchConfiguration::default()
        },
    );
    branches.insert(
        "hotfix".to_string(),
        BranchConfiguration {
            pattern: Some("^hotfix(es)?[/-]".to_string()),
            label: Some(Some("beta".to_string())),
            increment: Some(Increment::Inherit),
            ..BranchConfiguration::default()
        },
    );
    branches.insert(
        "support".to_string(),
        BranchConfiguration {
            pattern: Some("^support[/-]".to_string()),
            label: Some(Some(String::new())),
            increment: Some(Increment::Patch),
            is_main_branch: Some(true),
            ..BranchConfiguration::default()
        },
    );
    branches
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = Configuration::default();
        assert_eq!(config.tag_prefix, "[vV]?");
        assert!(config.prevent_increment_when_current_commit_tagged);
        assert!(config.branches.contains_key("main"));
    }

    #[test]
    fn test_from_yaml() {
        let config = Configuration::from_yaml_str(
            r#"
next_version: "1.0.0"
deployment_mode: ContinuousDelivery
branches:
  main:
    label: stable
"#,
        )
        .unwrap();
        assert_eq!(config.next_version.as_deref(), Some("1.0.0"));
        assert_eq!(config.deployment_mode, DeploymentMode::ContinuousDelivery);
        assert_eq!(
            config.branches["main"].label,
            Some(Some("stable".to_string()))
        );
    }

    #[test]
    fn test_yaml_explicit_null_label() {
        let config = Configuration::from_yaml_str(
            r#"
branches:
  main:
    label: ~
"#,
        )
        .unwrap();
        assert_eq!(config.branches["main"].label, Some(None));
    }

    #[test]
    fn test_increment_to_field() {
        assert_eq!(Increment::Major.to_field(), Some(IncrementField::Major));
        assert_eq!(Increment::Inherit.to_field(), None);
    }
}
