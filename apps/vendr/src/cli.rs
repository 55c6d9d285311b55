//! Command line interface definition

use clap::{Parser, Subcommand};
use vendr_types::ColorChoice;
use std::path::PathBuf;

/// vendr - vendor tree manager for Go-style import paths
#[derive(Parser)]
#[command(name = "vendr")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Vendor tree manager for Go-style import paths")]
#[command(long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    #[command(flatten)]
    pub global: GlobalArgs,
}

/// Global arguments available for all commands
#[derive(Parser)]
pub struct GlobalArgs {
    /// Output in JSON format
    #[arg(long, global = true)]
    pub json: bool,

    /// Enable debug logging to the vendr home
    #[arg(long, global = true)]
    pub debug: bool,

    /// Color output control
    #[arg(long, global = true, value_enum)]
    pub color: Option<ColorChoice>,

    /// Use alternate config file
    #[arg(long, global = true, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Home directory for repository mirrors
    #[arg(long, global = true, value_name = "DIR")]
    pub home: Option<PathBuf>,

    /// Number of concurrent fetch/update workers
    #[arg(long, short = 'w', global = true, value_name = "N")]
    pub workers: Option<usize>,

    /// Per-repository operation timeout in seconds (0 = none)
    #[arg(long, global = true, value_name = "SECS")]
    pub timeout: Option<u64>,

    /// Clone directly instead of going through the mirror cache
    #[arg(long, global = true)]
    pub no_cache: bool,

    /// Replace vendor directories that are not working copies
    #[arg(long, global = true)]
    pub force: bool,

    /// Copy from the source path when a package is already there
    #[arg(long, global = true)]
    pub use_source_path: bool,
}

/// Available commands
#[derive(Subcommand)]
pub enum Commands {
    /// Install the versions recorded in the lock file
    #[command(alias = "i")]
    Install,

    /// Resolve imports, refresh every repository and rewrite the lock file
    #[command(alias = "up")]
    Update {
        /// Remove vendor directories no dependency uses
        #[arg(long)]
        delete_unused: bool,

        /// List each sub-package once in the lock file
        #[arg(long)]
        dedupe_subpackages: bool,
    },

    /// Fetch declared dependencies that are not vendored yet
    #[command(alias = "co")]
    Checkout {
        /// Include development imports
        #[arg(long)]
        dev: bool,
    },
}

impl Commands {
    /// Short name used in reports and logs
    pub fn name(&self) -> &'static str {
        match self {
            Commands::Install => "install",
            Commands::Update { .. } => "update",
            Commands::Checkout { .. } => "checkout",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    #[test]
    fn test_cli_parsing() {
        let cli = Cli::parse_from(["vendr", "install"]);
        assert!(matches!(cli.command, Commands::Install));

        let cli = Cli::parse_from(["vendr", "--json", "--debug", "checkout", "--dev"]);
        assert!(cli.global.json);
        assert!(cli.global.debug);
        assert!(matches!(cli.command, Commands::Checkout { dev: true }));
    }

    #[test]
    fn test_global_flags_after_subcommand() {
        let cli = Cli::parse_from([
            "vendr",
            "update",
            "--delete-unused",
            "--workers",
            "4",
            "--no-cache",
            "--force",
        ]);
        assert_eq!(cli.global.workers, Some(4));
        assert!(cli.global.no_cache);
        assert!(cli.global.force);
        assert!(matches!(
            cli.command,
            Commands::Update {
                delete_unused: true,
                dedupe_subpackages: false
            }
        ));
    }

    #[test]
    fn test_command_aliases() {
        let cli = Cli::parse_from(["vendr", "i"]);
        assert!(matches!(cli.command, Commands::Install));

        let cli = Cli::parse_from(["vendr", "up"]);
        assert_eq!(cli.command.name(), "update");

        let cli = Cli::parse_from(["vendr", "co"]);
        assert!(matches!(cli.command, Commands::Checkout { dev: false }));
    }
}
