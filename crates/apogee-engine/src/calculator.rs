//! Next-version calculation orchestrator

use chrono::{DateTime, Utc};
use tracing::{debug, info};

use apogee_core::config::{Configuration, DeploymentMode, EffectiveConfiguration};
use apogee_core::error::{ApogeeError, RepositoryError, Result};
use apogee_core::version::{BuildMetadata, PreReleaseTag, SemanticVersion};
use apogee_git::{Commit, RepositorySnapshot};

use crate::base_version::{BaseVersion, NextVersion};
use crate::branches::BranchRepository;
use crate::deployment;
use crate::increment::find_increment;
use crate::strategies::{self, StrategyContext};
use crate::tagged::{SemanticVersionWithTag, TaggedVersionRepository};

/// Computes the next semantic version for the current branch
pub struct NextVersionCalculator<'a, R: RepositorySnapshot> {
    snapshot: &'a R,
    configuration: &'a Configuration,
    tagged: TaggedVersionRepository<'a, R>,
    branches: BranchRepository<'a, R>,
}

impl<'a, R: RepositorySnapshot> NextVersionCalculator<'a, R> {
    /// Create a calculator over a snapshot and configuration
    pub fn new(snapshot: &'a R, configuration: &'a Configuration) -> Self {
        Self {
            snapshot,
            configuration,
            tagged: TaggedVersionRepository::new(snapshot),
            branches: BranchRepository::new(snapshot, configuration),
        }
    }

    /// Run the calculation
    pub fn calculate(&self) -> Result<SemanticVersion> {
        let branch = self.snapshot.current_branch();
        let head = self
            .snapshot
            .head_commit()
            .ok_or_else(|| RepositoryError::NoTip {
                branch: branch.name.friendly.clone(),
            })?
            .clone();
        let effective = self
            .configuration
            .effective_configurations(&branch.name.friendly)?;

        // Tag on HEAD: skip the whole calculation when the branch says so
        // and its increment needs no resolution
        for configuration in &effective {
            if configuration.prevent_increment_when_current_commit_tagged
                && !configuration.increment_inherited
            {
                if let Some(tagged) = self.tagged_version_at_head(configuration, &head) {
                    info!(version = %tagged.version, tag = %tagged.tag_name, "using the tag on HEAD");
                    return Ok(self.wrap_tagged(tagged, configuration, &head));
                }
            }
        }

        let mut candidates = Vec::new();
        for configuration in &effective {
            let context = StrategyContext {
                snapshot: self.snapshot,
                configuration,
                tagged: &self.tagged,
                branches: &self.branches,
            };
            for strategy in &configuration.version_strategies {
                for base in strategies::base_versions(*strategy, &context) {
                    if self.is_ignored(configuration, &base) {
                        continue;
                    }
                    debug!(
                        source = %base.source,
                        version = %base.semantic_version,
                        should_increment = base.should_increment,
                        "base version found"
                    );
                    candidates.push(self.next_version_from(base, configuration));
                }
            }
        }
        if candidates.is_empty() {
            return Err(ApogeeError::Repository(RepositoryError::NoBaseVersions {
                branch: branch.name.friendly.clone(),
            }));
        }

        let winner = self.arbitrate(candidates);
        debug!(
            version = %winner.incremented_version,
            source = %winner.base_version.source,
            "arbitration winner"
        );

        // Increment resolved late: the tag on HEAD may still short-circuit
        if winner.configuration.prevent_increment_when_current_commit_tagged
            && winner.configuration.increment_inherited
        {
            if let Some(tagged) = self.tagged_version_at_head(&winner.configuration, &head) {
                info!(version = %tagged.version, tag = %tagged.tag_name, "using the tag on HEAD");
                return Ok(self.wrap_tagged(tagged, &winner.configuration, &head));
            }
        }

        let version = self.apply_tag_floor(&winner, head.when);
        Ok(deployment::finalize(
            self.snapshot,
            &self.tagged,
            &self.branches,
            &winner,
            version,
            &head,
        ))
    }

    /// Increment a candidate into its arbitration form
    fn next_version_from(
        &self,
        base: BaseVersion,
        configuration: &EffectiveConfiguration,
    ) -> NextVersion {
        let label = match base.operator.as_ref().and_then(|op| op.label.clone()) {
            Some(label) => label,
            None => configuration.effective_label(base.branch_name_override.as_deref()),
        };

        let mut incremented = if base.should_increment {
            let field = find_increment(self.snapshot, configuration, &base, label.as_deref());
            base.semantic_version.increment(field, label.as_deref())
        } else {
            base.semantic_version.clone()
        };
        if let Some(alternative) = base
            .operator
            .as_ref()
            .and_then(|op| op.alternative_semantic_version.as_ref())
        {
            incremented = incremented.with_alternative(alternative);
        }

        NextVersion {
            incremented_version: incremented,
            base_version: base,
            configuration: configuration.clone(),
        }
    }

    /// Pick the winning candidate
    ///
    /// Highest incremented version first; on a tie the oldest
    /// base-version source wins, maximising the commits-since count.
    fn arbitrate(&self, candidates: Vec<NextVersion>) -> NextVersion {
        let max_version = candidates
            .iter()
            .map(|c| c.incremented_version.clone())
            .max()
            .expect("arbitration requires at least one candidate");
        let mut at_max: Vec<NextVersion> = candidates
            .into_iter()
            .filter(|c| c.incremented_version == max_version)
            .collect();

        let sourced: Vec<usize> = at_max
            .iter()
            .enumerate()
            .filter(|(_, c)| c.base_version.base_version_source.is_some())
            .map(|(i, _)| i)
            .collect();
        if !sourced.is_empty() {
            let oldest = sourced
                .into_iter()
                .min_by_key(|&i| self.source_when(&at_max[i]))
                .expect("non-empty");
            return at_max.swap_remove(oldest);
        }

        if !max_version.is_pre_release() {
            // A stable result should grow from a stable base
            let stable = at_max
                .iter()
                .enumerate()
                .filter(|(_, c)| !c.base_version.semantic_version.is_pre_release())
                .max_by_key(|(i, _)| self.source_when(&at_max[*i]))
                .map(|(i, _)| i);
            if let Some(index) = stable {
                return at_max.swap_remove(index);
            }
        }

        at_max.swap_remove(0)
    }

    /// Lift the triple to the highest tag already on the branch
    fn apply_tag_floor(&self, winner: &NextVersion, not_older_than: DateTime<Utc>) -> SemanticVersion {
        let configuration = &winner.configuration;
        let branch = self.snapshot.current_branch();
        let tagged = self.tagged.tagged_versions_of_branch(
            branch,
            &configuration.tag_prefix,
            configuration.semantic_version_format,
            &configuration.ignore,
        );
        let floor = tagged
            .values()
            .flatten()
            .filter(|entry| entry.commit_when <= not_older_than)
            .map(|entry| &entry.version)
            .max();
        match floor {
            Some(floor) => winner.incremented_version.clone().with_alternative(floor),
            None => winner.incremented_version.clone(),
        }
    }

    fn tagged_version_at_head(
        &self,
        configuration: &EffectiveConfiguration,
        head: &Commit,
    ) -> Option<SemanticVersionWithTag> {
        let all = self.tagged.tagged_versions(
            &configuration.tag_prefix,
            configuration.semantic_version_format,
            &configuration.ignore,
        );
        let label = configuration.effective_label(None);
        all.get(&head.sha)?
            .iter()
            .filter(|entry| {
                entry
                    .version
                    .is_match_for_branch_specific_label(label.as_deref())
            })
            .max_by(|a, b| a.version.cmp(&b.version))
            .cloned()
    }

    /// Wrap a tag found on HEAD with fresh build metadata
    fn wrap_tagged(
        &self,
        tagged: SemanticVersionWithTag,
        configuration: &EffectiveConfiguration,
        head: &Commit,
    ) -> SemanticVersion {
        let mut version = tagged.version;
        if configuration.deployment_mode == DeploymentMode::ContinuousDeployment {
            version.pre_release = PreReleaseTag::default();
        }
        let metadata = BuildMetadata::at_commit(head.sha.clone(), head.when)
            .with_branch(self.snapshot.current_branch().name.friendly.clone())
            .with_uncommitted(self.snapshot.uncommitted_changes());
        version.with_build_metadata(metadata)
    }

    fn is_ignored(&self, configuration: &EffectiveConfiguration, base: &BaseVersion) -> bool {
        let Some(source) = &base.base_version_source else {
            return false;
        };
        let Some(commit) = self.snapshot.find_commit(source) else {
            return false;
        };
        match configuration.ignore.exclusion_reason(&commit.sha, commit.when) {
            Some(reason) => {
                info!(source = %base.source, %reason, "base version excluded by ignore filter");
                true
            }
            None => false,
        }
    }

    fn source_when(&self, candidate: &NextVersion) -> Option<DateTime<Utc>> {
        candidate
            .base_version
            .base_version_source
            .as_deref()
            .and_then(|sha| self.snapshot.find_commit(sha))
            .map(|commit| commit.when)
    }
}
