//! Version-in-branch-name strategy

use apogee_core::version::{SemanticVersion, SemanticVersionFormat};
use apogee_git::RepositorySnapshot;

use crate::base_version::BaseVersion;
use crate::strategies::StrategyContext;

pub(crate) fn base_versions<R: RepositorySnapshot>(
    context: &StrategyContext<'_, R>,
) -> Vec<BaseVersion> {
    let configuration = context.configuration;
    let branch = context.snapshot.current_branch();
    let Some((version, remainder)) = version_in_branch_name(
        &branch.name.friendly,
        &configuration.tag_prefix,
        configuration.semantic_version_format,
    ) else {
        return Vec::new();
    };

    let candidate = BaseVersion::new(
        format!("Version in branch name '{}'", branch.name.friendly),
        false,
        version,
        None,
    );
    match remainder {
        Some(remainder) => vec![candidate.with_branch_name_override(remainder)],
        None => vec![candidate],
    }
}

/// Extract a version embedded in a branch name
///
/// Segments are tried last to first, with a second attempt after any
/// leading `name-` prefix inside a segment. Returns the version and the
/// name with the version segment removed (for label derivation).
pub(crate) fn version_in_branch_name(
    name: &str,
    tag_prefix: &str,
    format: SemanticVersionFormat,
) -> Option<(SemanticVersion, Option<String>)> {
    let segments: Vec<&str> = name.split('/').collect();
    for (index, segment) in segments.iter().enumerate().rev() {
        let parsed = SemanticVersion::parse(segment, Some(tag_prefix), format)
            .ok()
            .or_else(|| {
                segment.split_once('-').and_then(|(_, rest)| {
                    SemanticVersion::parse(rest, Some(tag_prefix), format).ok()
                })
            });
        if let Some(version) = parsed {
            let remainder: Vec<&str> = segments
                .iter()
                .enumerate()
                .filter(|(i, _)| *i != index)
                .map(|(_, s)| *s)
                .collect();
            let remainder = (!remainder.is_empty()).then(|| remainder.join("/"));
            return Some((version, remainder));
        }
    }
    None
}
