//! CLI commands for compreq.

pub mod bounds;
pub mod python;
pub mod releases;
pub mod resolve;
pub mod update;

use clap::{ArgAction, Args, Parser, Subcommand};
use compreq_config::CliOverrides;
use std::path::PathBuf;

/// compreq - computed version requirements for Python dependencies
#[derive(Parser, Debug)]
#[command(name = "compreq")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Increase log output (-v info, -vv debug, -vvv trace)
    #[arg(short, long, global = true, action = ArgAction::Count)]
    pub verbose: u8,

    /// Only log errors
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Working directory
    #[arg(short = 'd', long, global = true)]
    pub working_dir: Option<PathBuf>,

    /// Disable ANSI colors
    #[arg(long, global = true)]
    pub no_ansi: bool,

    #[command(flatten)]
    pub settings: SettingsArgs,

    #[command(subcommand)]
    pub command: Commands,
}

/// Settings that override the configuration files and environment.
#[derive(Args, Debug, Clone, Default)]
pub struct SettingsArgs {
    /// Package index URL
    #[arg(long, global = true, value_name = "URL")]
    pub pypi_url: Option<String>,

    /// Root of the Python release archive
    #[arg(long, global = true, value_name = "URL")]
    pub python_ftp_url: Option<String>,

    /// Request timeout in seconds
    #[arg(long, global = true, value_name = "SECONDS")]
    pub timeout: Option<u64>,

    /// Retries after a failed request
    #[arg(long, global = true)]
    pub retries: Option<usize>,

    /// Program used to create virtual environments
    #[arg(long, global = true, value_name = "PROGRAM")]
    pub virtualenv: Option<String>,

    /// Evaluate release ages relative to this time (RFC 3339 or YYYY-MM-DD)
    #[arg(long, global = true, value_name = "TIME")]
    pub now: Option<String>,

    /// Supported Python versions, e.g. ">=3.9,<4"
    #[arg(long, global = true, value_name = "SPECIFIERS")]
    pub python: Option<String>,
}

impl SettingsArgs {
    /// The configuration layer these flags form.
    pub fn to_overrides(&self) -> CliOverrides {
        CliOverrides {
            pypi_url: self.pypi_url.clone(),
            python_ftp_url: self.python_ftp_url.clone(),
            timeout: self.timeout,
            retries: self.retries,
            virtualenv: self.virtualenv.clone(),
            now: self.now.clone(),
            python: self.python.clone(),
        }
    }
}

/// Available commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// List the releases of a package
    Releases(releases::ReleasesArgs),

    /// Show the bounds of a specifier set
    Bounds(bounds::BoundsArgs),

    /// Resolve requirements, optionally computing their versions
    Resolve(resolve::ResolveArgs),

    /// Recompute the requirements of a manifest
    Update(update::UpdateArgs),

    /// Compute the supported Python range
    Python(python::PythonArgs),
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::policy::Policy;

    #[test]
    fn global_flags_after_subcommand() {
        let cli = Cli::try_parse_from([
            "compreq", "resolve", "foo", "-vv", "--python", ">=3.10", "--policy", "dev",
        ])
        .unwrap();
        assert_eq!(cli.verbose, 2);
        assert_eq!(cli.settings.to_overrides().python.as_deref(), Some(">=3.10"));
        let Commands::Resolve(args) = cli.command else {
            panic!("expected resolve");
        };
        assert_eq!(args.requirements, ["foo"]);
        assert_eq!(args.policy, Some(Policy::Dev));
    }

    #[test]
    fn quiet_conflicts_with_verbose() {
        assert!(Cli::try_parse_from(["compreq", "-q", "-v", "bounds", ">=1"]).is_err());
    }

    #[test]
    fn update_defaults() {
        let cli = Cli::try_parse_from(["compreq", "update"]).unwrap();
        let Commands::Update(args) = cli.command else {
            panic!("expected update");
        };
        assert_eq!(args.file, PathBuf::from("pyproject.toml"));
        assert_eq!(args.policy, Policy::Default);
        assert!(!args.dry_run);
    }

    #[test]
    fn python_tool_configs_need_a_manifest() {
        assert!(Cli::try_parse_from(["compreq", "python", "--tool-configs"]).is_err());
        let cli = Cli::try_parse_from([
            "compreq",
            "python",
            "--github-workflows",
            ".github/workflows",
            "--dry-run",
        ])
        .unwrap();
        let Commands::Python(args) = cli.command else {
            panic!("expected python");
        };
        assert_eq!(args.github_workflows, Some(PathBuf::from(".github/workflows")));
        assert!(args.dry_run);
        assert!(!args.tool_configs);
    }
}
