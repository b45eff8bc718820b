//! Semantic version value type
//!
//! Follows the SemVer 2.0.0 specification: https://semver.org/ with one
//! engine-specific convention: when pre-release tags are compared, an
//! absent tag sorts *above* any present one, so `1.0.0` > `1.0.0-rc.1`.

mod build_metadata;
mod pre_release;

pub use build_metadata::BuildMetadata;
pub use pre_release::PreReleaseTag;

use std::cmp::Ordering;
use std::fmt;
use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::error::VersionError;

/// Permissive version grammar: minor and patch may be omitted
static LOOSE_VERSION_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"^(?P<major>\d+)(?:\.(?P<minor>\d+))?(?:\.(?P<patch>\d+))?(?:-(?P<pre>[0-9A-Za-z][0-9A-Za-z\-\.]*))?(?:\+(?P<build>[0-9A-Za-z\-\.]+))?$",
    )
    .expect("Invalid regex")
});

/// Which field of the version triple to increment
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub enum IncrementField {
    /// Leave the triple alone
    #[default]
    None,
    /// Bump the patch component
    Patch,
    /// Bump the minor component
    Minor,
    /// Bump the major component
    Major,
}

impl fmt::Display for IncrementField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::None => write!(f, "none"),
            Self::Patch => write!(f, "patch"),
            Self::Minor => write!(f, "minor"),
            Self::Major => write!(f, "major"),
        }
    }
}

/// How strictly version strings are parsed
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SemanticVersionFormat {
    /// Full SemVer 2.0.0 grammar only
    #[default]
    Strict,
    /// Allow omitted minor/patch components (`1`, `1.2`)
    Loose,
}

/// A semantic version with pre-release tag and build metadata
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SemanticVersion {
    pub major: u64,
    pub minor: u64,
    pub patch: u64,
    pub pre_release: PreReleaseTag,
    pub build_metadata: BuildMetadata,
}

impl SemanticVersion {
    /// Create a stable version from a triple
    pub fn new(major: u64, minor: u64, patch: u64) -> Self {
        Self {
            major,
            minor,
            patch,
            ..Self::default()
        }
    }

    /// Set the pre-release tag
    pub fn with_pre_release(mut self, tag: PreReleaseTag) -> Self {
        self.pre_release = tag;
        self
    }

    /// Set the build metadata
    pub fn with_build_metadata(mut self, metadata: BuildMetadata) -> Self {
        self.build_metadata = metadata;
        self
    }

    /// Whether this version carries a pre-release tag
    pub fn is_pre_release(&self) -> bool {
        self.pre_release.has_tag()
    }

    /// Parse a version string, optionally stripping a tag prefix first
    ///
    /// `tag_prefix` is a regex fragment anchored at the start of the
    /// input (the configuration default is `[vV]?`).
    pub fn parse(
        input: &str,
        tag_prefix: Option<&str>,
        format: SemanticVersionFormat,
    ) -> Result<Self, VersionError> {
        let stripped = match tag_prefix {
            Some(prefix) if !prefix.is_empty() => {
                let anchored =
                    Regex::new(&format!("^(?:{prefix})")).map_err(|e| VersionError::ParseFailed {
                        input: input.to_string(),
                        reason: format!("invalid tag prefix: {e}"),
                    })?;
                match anchored.find(input) {
                    Some(m) => &input[m.end()..],
                    None => input,
                }
            }
            _ => input,
        };

        match format {
            SemanticVersionFormat::Strict => {
                let version =
                    semver::Version::parse(stripped).map_err(|e| VersionError::ParseFailed {
                        input: input.to_string(),
                        reason: e.to_string(),
                    })?;
                Ok(Self {
                    major: version.major,
                    minor: version.minor,
                    patch: version.patch,
                    pre_release: PreReleaseTag::parse(version.pre.as_str()),
                    build_metadata: BuildMetadata::default(),
                })
            }
            SemanticVersionFormat::Loose => {
                let caps =
                    LOOSE_VERSION_REGEX
                        .captures(stripped)
                        .ok_or_else(|| VersionError::ParseFailed {
                            input: input.to_string(),
                            reason: "not a loose semantic version".to_string(),
                        })?;
                let component = |name: &str| {
                    caps.name(name)
                        .map_or(Ok(0), |m| m.as_str().parse::<u64>())
                        .map_err(|e| VersionError::ParseFailed {
                            input: input.to_string(),
                            reason: e.to_string(),
                        })
                };
                Ok(Self {
                    major: component("major")?,
                    minor: component("minor")?,
                    patch: component("patch")?,
                    pre_release: caps
                        .name("pre")
                        .map(|m| PreReleaseTag::parse(m.as_str()))
                        .unwrap_or_default(),
                    build_metadata: BuildMetadata::default(),
                })
            }
        }
    }

    /// Produce the incremented version
    ///
    /// `Patch`/`Minor`/`Major` bump the named field, zero the lower ones,
    /// and restart the pre-release tag from the label. `None` leaves the
    /// triple alone and advances the pre-release counter when one is
    /// present (or the label asks for a different tag). Build metadata is
    /// cleared in every case.
    pub fn increment(&self, field: IncrementField, label: Option<&str>) -> Self {
        let mut next = Self {
            major: self.major,
            minor: self.minor,
            patch: self.patch,
            pre_release: self.pre_release.clone(),
            build_metadata: BuildMetadata::default(),
        };

        match field {
            IncrementField::None => {
                if next.pre_release.has_tag() {
                    if next.pre_release.name_matches(label) {
                        next.pre_release = next.pre_release.increment_number();
                    } else {
                        next.pre_release = PreReleaseTag::from_label(label);
                    }
                } else if !matches!(label, None | Some("")) {
                    next.pre_release = PreReleaseTag::from_label(label);
                }
            }
            IncrementField::Patch => {
                next.patch += 1;
                next.pre_release = PreReleaseTag::from_label(label);
            }
            IncrementField::Minor => {
                next.minor += 1;
                next.patch = 0;
                next.pre_release = PreReleaseTag::from_label(label);
            }
            IncrementField::Major => {
                next.major += 1;
                next.minor = 0;
                next.patch = 0;
                next.pre_release = PreReleaseTag::from_label(label);
            }
        }

        next
    }

    /// Whether this version satisfies a branch-specific label request
    ///
    /// A stable version matches any label. A pre-release version matches
    /// when its tag name equals the label case-insensitively, where a
    /// missing label and an empty name are equivalent.
    pub fn is_match_for_branch_specific_label(&self, label: Option<&str>) -> bool {
        if !self.pre_release.has_tag() {
            return true;
        }
        self.pre_release.name_matches(label)
    }

    /// Compare only the major/minor/patch triple
    pub fn cmp_triple(&self, other: &Self) -> Ordering {
        self.major
            .cmp(&other.major)
            .then_with(|| self.minor.cmp(&other.minor))
            .then_with(|| self.patch.cmp(&other.patch))
    }

    /// Lift the triple to `alternative` when this version is lower,
    /// ignoring pre-release tags in the comparison
    pub fn with_alternative(mut self, alternative: &SemanticVersion) -> Self {
        if self.cmp_triple(alternative) == Ordering::Less {
            self.major = alternative.major;
            self.minor = alternative.minor;
            self.patch = alternative.patch;
        }
        self
    }

    /// Canonical rendering plus the commits-since count when present
    pub fn full_sem_ver(&self) -> String {
        match self.build_metadata.commits_since_source {
            Some(count) if count > 0 => format!("{self}+{count}"),
            _ => self.to_string(),
        }
    }

    /// Rendering with branch and sha appended, for informational output
    pub fn informational(&self) -> String {
        let mut out = self.full_sem_ver();
        if let Some(branch) = &self.build_metadata.branch {
            out.push_str(&format!(".Branch.{branch}"));
        }
        if let Some(sha) = &self.build_metadata.sha {
            out.push_str(&format!(".Sha.{sha}"));
        }
        out
    }
}

impl fmt::Display for SemanticVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}.{}", self.major, self.minor, self.patch)?;
        if self.pre_release.has_tag() {
            write!(f, "-{}", self.pre_release)?;
        }
        Ok(())
    }
}

impl PartialEq for SemanticVersion {
    fn eq(&self, other: &Self) -> bool {
        // Build metadata is ignored, per SemVer precedence rules
        self.major == other.major
            && self.minor == other.minor
            && self.patch == other.patch
            && self.pre_release == other.pre_release
    }
}

impl Eq for SemanticVersion {}

impl Ord for SemanticVersion {
    fn cmp(&self, other: &Self) -> Ordering {
        self.cmp_triple(other)
            .then_with(|| self.pre_release.cmp(&other.pre_release))
    }
}

impl PartialOrd for SemanticVersion {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}
