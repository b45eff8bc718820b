//! Apogee Engine - The next-version calculation kernel
//!
//! Given a configuration and a read-only commit-graph snapshot, the
//! calculator discovers base versions through a set of strategies,
//! arbitrates between candidates, and applies the configured
//! deployment-mode post-processing to produce a single semantic version.

pub mod base_version;
pub mod branches;
pub mod calculator;
pub mod deployment;
pub mod increment;
pub mod strategies;
pub mod tagged;
pub mod trunk;

pub use base_version::{BaseVersion, BaseVersionOperator, NextVersion};
pub use branches::BranchRepository;
pub use calculator::NextVersionCalculator;
pub use tagged::{SemanticVersionWithTag, TaggedVersionRepository};
