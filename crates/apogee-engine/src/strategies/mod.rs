//! Base version strategies
//!
//! A strategy proposes zero or more candidate base versions for an
//! effective branch configuration. The set is closed, so dispatch is a
//! plain match over the configuration enum.

mod branch_name;
mod configured_next;
mod fallback;
mod merge_message;
mod tagged_version;
mod track_release;
mod trunk_based;

use apogee_core::config::{EffectiveConfiguration, VersionStrategy};
use apogee_git::RepositorySnapshot;

use crate::base_version::BaseVersion;
use crate::branches::BranchRepository;
use crate::tagged::TaggedVersionRepository;

pub(crate) use branch_name::version_in_branch_name;

/// Everything a strategy may consult
pub struct StrategyContext<'a, R: RepositorySnapshot> {
    pub snapshot: &'a R,
    pub configuration: &'a EffectiveConfiguration,
    pub tagged: &'a TaggedVersionRepository<'a, R>,
    pub branches: &'a BranchRepository<'a, R>,
}

/// Run one strategy and collect its candidates
pub fn base_versions<R: RepositorySnapshot>(
    strategy: VersionStrategy,
    context: &StrategyContext<'_, R>,
) -> Vec<BaseVersion> {
    match strategy {
        VersionStrategy::Fallback => fallback::base_versions(),
        VersionStrategy::ConfiguredNextVersion => configured_next::base_versions(context),
        VersionStrategy::MergeMessage => merge_message::base_versions(context),
        VersionStrategy::TaggedVersion => tagged_version::base_versions(context),
        VersionStrategy::TrackReleaseBranches => track_release::base_versions(context),
        VersionStrategy::VersionInBranchName => branch_name::base_versions(context),
        VersionStrategy::TrunkBased => trunk_based::base_versions(context),
    }
}
