//! Pre-release tag handling

use std::cmp::Ordering;
use std::fmt;

use serde::{Deserialize, Serialize};

/// The pre-release portion of a semantic version
///
/// A tag is a `name` plus an optional counting `number`. Both pieces are
/// optional in the wild: `1.2.3-beta.4` has both, `1.2.3-beta` has only a
/// name, and `1.2.3-4` has only a number (an "anonymous" tag, which this
/// engine produces for branches without a configured label).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PreReleaseTag {
    /// Tag name, empty for anonymous tags
    pub name: String,
    /// Counting number, incremented per release candidate
    pub number: Option<u64>,
}

impl PreReleaseTag {
    /// Create a new pre-release tag
    pub fn new(name: impl Into<String>, number: Option<u64>) -> Self {
        Self {
            name: name.into(),
            number,
        }
    }

    /// Whether any pre-release information is present
    pub fn has_tag(&self) -> bool {
        !self.name.is_empty() || self.number.is_some()
    }

    /// Build the tag a freshly incremented version starts from
    ///
    /// A `None` label yields an anonymous `{"", 1}` tag, an empty label
    /// yields no tag at all (a stable version), and a named label yields
    /// `{label, 1}`.
    pub fn from_label(label: Option<&str>) -> Self {
        match label {
            None => Self::new("", Some(1)),
            Some("") => Self::default(),
            Some(name) => Self::new(name, Some(1)),
        }
    }

    /// Whether this tag's name is equivalent to `label`
    ///
    /// Comparison is case-insensitive; a `None` label and an empty name
    /// are equivalent.
    pub fn name_matches(&self, label: Option<&str>) -> bool {
        match label {
            None => self.name.is_empty(),
            Some(label) => self.name.eq_ignore_ascii_case(label),
        }
    }

    /// Parse the pre-release portion of a version string
    ///
    /// `beta.4` splits into name and number; a purely numeric tag becomes
    /// anonymous; anything else is a bare name.
    pub fn parse(input: &str) -> Self {
        if input.is_empty() {
            return Self::default();
        }
        if let Ok(number) = input.parse::<u64>() {
            return Self::new("", Some(number));
        }
        if let Some((name, number)) = input.rsplit_once('.') {
            if let Ok(number) = number.parse::<u64>() {
                return Self::new(name, Some(number));
            }
        }
        Self::new(input, None)
    }

    /// A copy with the counting number incremented
    pub fn increment_number(&self) -> Self {
        Self::new(self.name.clone(), Some(self.number.unwrap_or(0) + 1))
    }
}

impl fmt::Display for PreReleaseTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (self.name.is_empty(), self.number) {
            (true, Some(number)) => write!(f, "{number}"),
            (true, None) => Ok(()),
            (false, Some(number)) => write!(f, "{}.{number}", self.name),
            (false, None) => write!(f, "{}", self.name),
        }
    }
}

impl Ord for PreReleaseTag {
    fn cmp(&self, other: &Self) -> Ordering {
        match (self.has_tag(), other.has_tag()) {
            // An absent tag sorts above any present one: 1.0.0 > 1.0.0-rc.1
            (false, false) => Ordering::Equal,
            (false, true) => Ordering::Greater,
            (true, false) => Ordering::Less,
            (true, true) => self
                .name
                .to_lowercase()
                .cmp(&other.name.to_lowercase())
                .then_with(|| self.name.cmp(&other.name))
                .then_with(|| {
                    self.number
                        .unwrap_or(0)
                        .cmp(&other.number.unwrap_or(0))
                        .then_with(|| self.number.cmp(&other.number))
                }),
        }
    }
}

impl PartialOrd for PreReleaseTag {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}
