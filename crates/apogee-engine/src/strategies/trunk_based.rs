//! Trunk-based strategy: delegate to the iteration walker

use apogee_git::RepositorySnapshot;

use crate::base_version::BaseVersion;
use crate::strategies::StrategyContext;
use crate::trunk;

pub(crate) fn base_versions<R: RepositorySnapshot>(
    context: &StrategyContext<'_, R>,
) -> Vec<BaseVersion> {
    trunk::find_base_version(
        context.snapshot,
        context.configuration,
        context.tagged,
        context.branches,
    )
    .into_iter()
    .collect()
}
