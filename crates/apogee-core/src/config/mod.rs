//! Configuration surface consumed by the calculation kernel

mod effective;
mod ignore;
mod types;

pub use effective::EffectiveConfiguration;
pub use ignore::{IgnoreConfiguration, VersionFilter};
pub use types::{
    BranchConfiguration, CommitMessageIncrementMode, Configuration, DeploymentMode, Increment,
    VersionStrategy,
};
