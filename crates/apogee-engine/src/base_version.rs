//! Base version candidates and the arbitration unit

use apogee_core::config::EffectiveConfiguration;
use apogee_core::version::{IncrementField, SemanticVersion};

/// A candidate prior version proposed by a strategy
///
/// The rationale record: where the candidate came from (`source` is the
/// strategy's human-readable label), whether the calculator should
/// increment it, and which commit anchors it. A `None`
/// `base_version_source` means the candidate was produced from nothing.
#[derive(Debug, Clone)]
pub struct BaseVersion {
    /// Free-form strategy label, used in diagnostics
    pub source: String,
    /// Whether the calculator applies an increment on top
    pub should_increment: bool,
    /// The candidate version itself
    pub semantic_version: SemanticVersion,
    /// Commit the candidate was anchored at
    pub base_version_source: Option<String>,
    /// Branch to derive the label from instead of the current one
    pub branch_name_override: Option<String>,
    /// Explicit increment decision carried by newer strategies
    pub operator: Option<BaseVersionOperator>,
}

impl BaseVersion {
    /// Create a plain candidate
    pub fn new(
        source: impl Into<String>,
        should_increment: bool,
        semantic_version: SemanticVersion,
        base_version_source: Option<String>,
    ) -> Self {
        Self {
            source: source.into(),
            should_increment,
            semantic_version,
            base_version_source,
            branch_name_override: None,
            operator: None,
        }
    }

    /// Set the branch-name override
    pub fn with_branch_name_override(mut self, branch: impl Into<String>) -> Self {
        self.branch_name_override = Some(branch.into());
        self
    }

    /// Attach an explicit increment decision
    pub fn with_operator(mut self, operator: BaseVersionOperator) -> Self {
        self.operator = Some(operator);
        self
    }
}

/// Explicit increment decision attached to a candidate
///
/// Strategies that resolve increments themselves (the trunk walk) record
/// the outcome here instead of leaving it to the increment finder.
#[derive(Debug, Clone, Default)]
pub struct BaseVersionOperator {
    /// Aggregated increment field
    pub increment: IncrementField,
    /// Bump even when the label already matches and nothing changed
    pub force_increment: bool,
    /// Label override: outer `None` defers to the effective
    /// configuration, inner value is the resolved label
    pub label: Option<Option<String>>,
    /// Floor applied to the triple after incrementing
    pub alternative_semantic_version: Option<SemanticVersion>,
}

/// The arbitration unit: a candidate with its increment applied
#[derive(Debug, Clone)]
pub struct NextVersion {
    /// The candidate after incrementing
    pub incremented_version: SemanticVersion,
    /// The rationale it was produced from
    pub base_version: BaseVersion,
    /// The branch configuration it was produced under
    pub configuration: EffectiveConfiguration,
}
