//! Error types for Apogee

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias using ApogeeError
pub type Result<T> = std::result::Result<T, ApogeeError>;

/// Main error type for Apogee operations
#[derive(Debug, Error)]
pub enum ApogeeError {
    /// Configuration-related errors
    #[error(transparent)]
    Configuration(#[from] ConfigurationError),

    /// Repository-state errors
    #[error(transparent)]
    Repository(#[from] RepositoryError),

    /// Version-related errors
    #[error(transparent)]
    Version(#[from] VersionError),

    /// Git-related errors
    #[error(transparent)]
    Git(#[from] GitError),

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Generic errors
    #[error("{0}")]
    Other(String),
}

/// Configuration-related errors
///
/// All of these are fatal: the calculation cannot start from an
/// inconsistent configuration.
#[derive(Debug, Error)]
pub enum ConfigurationError {
    /// `Inherit` with no parent configuration to inherit from
    #[error("Branch '{branch}' has increment 'Inherit' but there is nothing to inherit from")]
    NothingToInherit { branch: String },

    /// A branch pattern failed to compile
    #[error("Invalid branch pattern '{pattern}': {reason}")]
    InvalidBranchPattern { pattern: String, reason: String },

    /// YAML parsing error
    #[error("Failed to parse configuration: {0}")]
    Yaml(#[from] serde_yaml::Error),
}

/// Repository-state errors reported by the calculation kernel
#[derive(Debug, Error)]
pub enum RepositoryError {
    /// The current branch has no tip commit
    #[error("Branch '{branch}' has no tip; cannot calculate a version without commits")]
    NoTip { branch: String },

    /// No strategy produced a usable base version
    #[error("No base versions determined on branch '{branch}'")]
    NoBaseVersions { branch: String },
}

/// Version-related errors
///
/// Parse failures are usually non-fatal: an unparseable tag or branch
/// name is skipped with a debug log rather than reported.
#[derive(Debug, Error)]
pub enum VersionError {
    /// Failed to parse a version string
    #[error("Failed to parse version '{input}': {reason}")]
    ParseFailed { input: String, reason: String },
}

/// Git-related errors
#[derive(Debug, Error)]
pub enum GitError {
    /// Repository not found
    #[error("Git repository not found at {0}")]
    RepositoryNotFound(PathBuf),

    /// Not a git repository
    #[error("Not a git repository: {0}")]
    NotARepository(PathBuf),

    /// Failed to open repository
    #[error("Failed to open repository: {0}")]
    OpenFailed(String),

    /// Detached HEAD or no branch checked out
    #[error("No branch is currently checked out")]
    NoCurrentBranch,

    /// Git2 library error
    #[error("Git error: {0}")]
    Git2(#[from] git2::Error),
}

impl ApogeeError {
    /// Create a new "other" error with a message
    pub fn other<S: Into<String>>(msg: S) -> Self {
        Self::Other(msg.into())
    }
}
