//! Command-line interface

use std::path::PathBuf;

use clap::{Parser, ValueEnum};
use console::style;
use tracing::info;

use apogee_core::config::Configuration;
use apogee_core::version::SemanticVersion;
use apogee_engine::NextVersionCalculator;
use apogee_git::{GitSnapshot, RepositorySnapshot};

/// Output format
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Human-readable output
    #[default]
    Text,
    /// Machine-readable JSON
    Json,
}

impl std::fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Text => write!(f, "text"),
            Self::Json => write!(f, "json"),
        }
    }
}

/// Calculate the next semantic version of a repository
#[derive(Debug, Parser)]
#[command(name = "apogee", version, about)]
pub struct Cli {
    /// Repository path (searched upward for a .git directory)
    #[arg(short, long, default_value = ".")]
    pub path: PathBuf,

    /// Configuration file, defaults to apogee.yml in the repository root
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Output format
    #[arg(short, long, value_enum, default_value_t = OutputFormat::Text)]
    pub format: OutputFormat,

    /// Print only the full version string
    #[arg(short, long)]
    pub quiet: bool,
}

impl Cli {
    /// Execute the calculation and print the result
    pub fn execute(&self) -> anyhow::Result<()> {
        let snapshot = GitSnapshot::discover(&self.path)?;
        let configuration = self.load_configuration(&snapshot)?;

        info!(branch = %snapshot.current_branch().name.friendly, "calculating next version");
        let version = NextVersionCalculator::new(&snapshot, &configuration).calculate()?;

        match self.format {
            OutputFormat::Json => self.print_json(&version)?,
            OutputFormat::Text => self.print_text(&version),
        }
        Ok(())
    }

    fn load_configuration(&self, snapshot: &GitSnapshot) -> anyhow::Result<Configuration> {
        let path = match &self.config {
            Some(path) => path.clone(),
            None => snapshot.path().join("apogee.yml"),
        };
        if path.is_file() {
            info!(path = %path.display(), "loading configuration");
            let contents = std::fs::read_to_string(&path)?;
            Ok(Configuration::from_yaml_str(&contents)?)
        } else {
            Ok(Configuration::default())
        }
    }

    fn print_json(&self, version: &SemanticVersion) -> anyhow::Result<()> {
        let metadata = &version.build_metadata;
        let output = serde_json::json!({
            "fullSemVer": version.full_sem_ver(),
            "semVer": version.to_string(),
            "informationalVersion": version.informational(),
            "major": version.major,
            "minor": version.minor,
            "patch": version.patch,
            "preReleaseTag": version.pre_release.to_string(),
            "branchName": metadata.branch,
            "sha": metadata.sha,
            "shortSha": metadata.short_sha,
            "commitDate": metadata.commit_date,
            "commitsSinceVersionSource": metadata.commits_since_source,
            "versionSourceSha": metadata.version_source_sha,
            "uncommittedChanges": metadata.uncommitted_changes,
        });
        println!("{}", serde_json::to_string_pretty(&output)?);
        Ok(())
    }

    fn print_text(&self, version: &SemanticVersion) {
        if self.quiet {
            println!("{}", version.full_sem_ver());
            return;
        }
        println!("{}", style("Next Version").bold());
        println!();
        println!(
            "  Full version:  {}",
            style(version.full_sem_ver()).green().bold()
        );
        println!("  Version:       {}", style(version.to_string()).cyan());
        if let Some(branch) = &version.build_metadata.branch {
            println!("  Branch:        {branch}");
        }
        if let Some(short_sha) = &version.build_metadata.short_sha {
            println!("  Commit:        {short_sha}");
        }
        if let Some(commits) = version.build_metadata.commits_since_source {
            println!("  Commits since: {commits}");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_defaults() {
        let cli = Cli::parse_from(["apogee"]);
        assert_eq!(cli.format, OutputFormat::Text);
        assert!(!cli.quiet);
    }
}
