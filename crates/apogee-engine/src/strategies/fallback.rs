//! Fallback strategy: every branch gets at least one candidate

use apogee_core::version::SemanticVersion;

use crate::base_version::BaseVersion;

pub(crate) fn base_versions() -> Vec<BaseVersion> {
    vec![BaseVersion::new(
        "Fallback base version",
        true,
        SemanticVersion::new(0, 0, 0),
        None,
    )]
}
