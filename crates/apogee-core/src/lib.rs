//! Apogee Core - Shared types for the apogee version calculation engine
//!
//! This crate provides the error taxonomy, the configuration surface, and
//! the semantic version value type the rest of the workspace builds on.

pub mod config;
pub mod error;
pub mod version;

pub use config::{Configuration, EffectiveConfiguration};
pub use error::{ApogeeError, Result};
pub use version::{BuildMetadata, IncrementField, PreReleaseTag, SemanticVersion, SemanticVersionFormat};
