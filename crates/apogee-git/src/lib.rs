//! Apogee Git - Read-only commit-graph snapshots
//!
//! The engine consumes an immutable [`RepositorySnapshot`]; this crate
//! provides the record types, a git2-backed implementation, and an
//! in-memory fixture for tests.

mod backend;
mod fixture;
mod snapshot;
mod types;

pub use backend::GitSnapshot;
pub use fixture::FixtureRepository;
pub use snapshot::RepositorySnapshot;
pub use types::{Branch, BranchName, Commit, Tag};
