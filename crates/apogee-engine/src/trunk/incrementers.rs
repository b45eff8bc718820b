//! The ordered incrementer list applied during trunk iteration

use tracing::trace;

use apogee_core::config::EffectiveConfiguration;
use apogee_core::version::IncrementField;

use crate::increment::{bump_directive, directives_allowed};
use crate::tagged::SemanticVersionWithTag;
use crate::trunk::{IterationContext, TrunkBasedCommit};

/// A rule matched against one commit during trunk iteration
///
/// Exactly one incrementer fires per commit: the first in
/// [`ORDERED_INCREMENTERS`] whose precondition holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Incrementer {
    /// A stable tag anchors the version and pins the branch label
    StableTagOnTrunk,
    /// A pre-release tag anchors the version, label untouched
    PreReleaseTagOnTrunk,
    /// A merge commit folds the merged branch's increments in
    MergedBranchOnTrunk,
    /// A `+semver:` directive forces its increment
    BumpMessage,
    /// A plain trunk commit applies the configured increment
    CommitOnTrunk,
    /// A commit off the trunk applies the configured increment but
    /// never anchors a version source from its tags
    CommitOnNonTrunk,
}

pub(crate) const ORDERED_INCREMENTERS: [Incrementer; 6] = [
    Incrementer::StableTagOnTrunk,
    Incrementer::PreReleaseTagOnTrunk,
    Incrementer::MergedBranchOnTrunk,
    Incrementer::BumpMessage,
    Incrementer::CommitOnTrunk,
    Incrementer::CommitOnNonTrunk,
];

impl Incrementer {
    /// Whether this rule applies to `item`
    pub(crate) fn matches(
        &self,
        item: &TrunkBasedCommit<'_>,
        tags: &[SemanticVersionWithTag],
        bump: Option<IncrementField>,
    ) -> bool {
        let highest_tag = tags.iter().map(|t| &t.version).max();
        match self {
            Self::StableTagOnTrunk => {
                item.on_main
                    && item.child.is_none()
                    && highest_tag.is_some_and(|v| !v.is_pre_release())
            }
            Self::PreReleaseTagOnTrunk => {
                item.on_main
                    && item.child.is_none()
                    && highest_tag.is_some_and(|v| v.is_pre_release())
            }
            Self::MergedBranchOnTrunk => item.child.is_some(),
            Self::BumpMessage => bump.is_some(),
            Self::CommitOnTrunk => item.on_main,
            Self::CommitOnNonTrunk => !item.on_main,
        }
    }

    /// Apply this rule's increment records to the iteration context
    pub(crate) fn apply(
        &self,
        item: &TrunkBasedCommit<'_>,
        tags: &[SemanticVersionWithTag],
        bump: Option<IncrementField>,
        configuration: &EffectiveConfiguration,
        context: &mut IterationContext,
    ) {
        trace!(incrementer = ?self, commit = %item.commit.short_sha, "incrementer fired");
        match self {
            Self::StableTagOnTrunk => {
                let version = tags
                    .iter()
                    .map(|t| &t.version)
                    .max()
                    .expect("precondition guarantees a tag")
                    .clone();
                context.anchor(version, &item.commit.sha);
                context.label = configuration.effective_label(None);
            }
            Self::PreReleaseTagOnTrunk => {
                let version = tags
                    .iter()
                    .map(|t| &t.version)
                    .max()
                    .expect("precondition guarantees a tag")
                    .clone();
                context.anchor(version, &item.commit.sha);
            }
            Self::MergedBranchOnTrunk => {
                let children = item.child.as_deref().unwrap_or_default();
                let folded = children
                    .iter()
                    .map(|child| {
                        let allowed = directives_allowed(
                            child.commit,
                            configuration.commit_message_incrementing,
                        );
                        allowed
                            .then(|| bump_directive(&child.commit.message))
                            .flatten()
                            .unwrap_or(configuration.increment)
                    })
                    .max()
                    .unwrap_or(configuration.increment);
                context.record_increment(folded, false);
            }
            Self::BumpMessage => {
                context.record_increment(bump.expect("precondition guarantees a directive"), true);
            }
            Self::CommitOnTrunk | Self::CommitOnNonTrunk => {
                context.record_increment(configuration.increment, false);
            }
        }
    }
}
