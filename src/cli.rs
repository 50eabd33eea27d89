//! Command-line interface definitions.
//!
//! ```bash
//! # Print duplicate groups
//! duplyzer scan ~/Downloads
//!
//! # JSON report of every digest, pretty-printed to a file
//! duplyzer scan ~/Downloads --output json --pretty --output-file report.json
//!
//! # Move every duplicate after the first of its group into a quarantine dir
//! duplyzer scan ~/Downloads --action move --target-dir ~/dupes --dry-run
//! ```

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};

use crate::actions::Action;
use crate::duplicates::Strategy;

/// Find duplicate files by content digest.
#[derive(Debug, Parser)]
#[command(name = "duplyzer")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Increase verbosity level (-v for debug, -vv for trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress all output except errors
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Report fatal errors as a JSON object on stderr
    #[arg(long, global = true)]
    pub json_errors: bool,

    /// Configuration file (default: config.toml in the platform config dir)
    #[arg(long, global = true, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,
}

/// Available subcommands.
#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Scan a directory for duplicate files
    Scan(ScanArgs),
    /// Write a configuration file with the current effective settings
    InitConfig(InitConfigArgs),
}

/// Arguments for the scan subcommand.
#[derive(Debug, Args)]
pub struct ScanArgs {
    /// Directory to scan
    #[arg(value_name = "DIR")]
    pub path: PathBuf,

    /// Traversal strategy
    #[arg(long, value_enum)]
    pub strategy: Option<Strategy>,

    /// Maximum number of directories or files processed at once
    /// (default: twice the number of CPUs)
    #[arg(short, long, value_name = "N", value_parser = clap::value_parser!(u64).range(1..))]
    pub workers: Option<u64>,

    /// Output format
    #[arg(short, long, value_enum, default_value_t = OutputFormat::Text)]
    pub output: OutputFormat,

    /// Write the report to a file instead of stdout
    #[arg(long, value_name = "PATH")]
    pub output_file: Option<PathBuf>,

    /// Pretty-print JSON output
    #[arg(long)]
    pub pretty: bool,

    /// Action applied to every duplicate after the first of its group
    #[arg(long, value_enum)]
    pub action: Option<ActionArg>,

    /// Destination directory for move and hard-link
    #[arg(
        long,
        value_name = "DIR",
        required_if_eq_any([("action", "move"), ("action", "hard-link")])
    )]
    pub target_dir: Option<PathBuf>,

    /// Log what the action would do without touching any file
    #[arg(long, requires = "action")]
    pub dry_run: bool,

    /// Do not draw the progress spinner
    #[arg(long)]
    pub no_progress: bool,
}

/// Arguments for the init-config subcommand.
#[derive(Debug, Args)]
pub struct InitConfigArgs {
    /// Overwrite an existing file
    #[arg(long)]
    pub force: bool,
}

/// Report format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Duplicate groups as indented text
    Text,
    /// JSON array of every digest
    Json,
    /// One CSV row per digest
    Csv,
}

impl std::fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OutputFormat::Text => write!(f, "text"),
            OutputFormat::Json => write!(f, "json"),
            OutputFormat::Csv => write!(f, "csv"),
        }
    }
}

/// Duplicate management action.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ActionArg {
    /// Remove permanently
    Delete,
    /// Move to the system trash
    Trash,
    /// Move into --target-dir
    Move,
    /// Hard-link into --target-dir
    HardLink,
}

impl From<ActionArg> for Action {
    fn from(arg: ActionArg) -> Self {
        match arg {
            ActionArg::Delete => Self::Delete,
            ActionArg::Trash => Self::Trash,
            ActionArg::Move => Self::Move,
            ActionArg::HardLink => Self::HardLink,
        }
    }
}
