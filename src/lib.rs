//! duplyzer - duplicate file finder
//!
//! Walks a directory tree with a spawn-per-entry walker whose concurrent
//! I/O is bounded by an admission gate, hashes every non-empty regular file
//! with BLAKE3 and groups paths by digest. Results can be printed, exported
//! as JSON or CSV, and acted upon (delete, trash, move, hard-link).

pub mod actions;
pub mod cli;
pub mod config;
pub mod duplicates;
pub mod error;
pub mod logging;
pub mod output;
pub mod progress;
pub mod scanner;
pub mod signal;

use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::sync::Arc;

use anyhow::{Context, Result};

use crate::actions::{manage_duplicates, ManageConfig};
use crate::cli::{Cli, Commands, InitConfigArgs, OutputFormat, ScanArgs};
use crate::config::Config;
use crate::duplicates::{DuplicateFinder, FinderConfig, Results};
use crate::error::ExitCode;
use crate::output::{summary_line, CsvOutput, JsonOutput, TextOutput};
use crate::progress::Progress;

/// Run the application for parsed command-line arguments.
///
/// # Errors
///
/// Returns an error for invalid configuration, a failed or interrupted
/// scan, or a report that cannot be written.
pub fn run_app(cli: Cli) -> Result<ExitCode> {
    logging::init_logging(cli.verbose, cli.quiet);
    let config = Config::load(cli.config.as_deref())?;

    match cli.command {
        Commands::Scan(args) => run_scan(args, config, cli.quiet),
        Commands::InitConfig(args) => init_config(&args, &config, cli.config),
    }
}

fn run_scan(args: ScanArgs, config: Config, quiet: bool) -> Result<ExitCode> {
    let workers = args
        .workers
        .map(|n| usize::try_from(n).unwrap_or(usize::MAX));
    let config = config.with_overrides(workers, args.strategy, args.pretty);

    let shutdown = signal::install_handler();
    let progress = Arc::new(Progress::new(quiet || args.no_progress));
    let finder = DuplicateFinder::new(
        FinderConfig::default()
            .with_workers(config.effective_workers())
            .with_strategy(config.strategy)
            .with_shutdown_flag(shutdown.flag())
            .with_progress_callback(progress),
    );

    let (results, summary) = finder
        .find_duplicates(&args.path)
        .with_context(|| format!("Failed to scan {}", args.path.display()))?;

    write_report(&results, &args, config.pretty_json)?;
    log::info!("{}", summary_line(&summary));

    let mut exit_code = ExitCode::from_summary(&summary);
    if let Some(action) = args.action {
        let mut manage = ManageConfig::new(action.into()).with_dry_run(args.dry_run);
        if let Some(dir) = &args.target_dir {
            manage = manage.with_target_dir(dir);
        }
        let report = manage_duplicates(&results, &manage)?;
        if !report.all_succeeded() {
            exit_code = ExitCode::PartialSuccess;
        }
    }
    Ok(exit_code)
}

fn write_report(results: &Results, args: &ScanArgs, pretty: bool) -> Result<()> {
    let mut writer: Box<dyn Write> = match &args.output_file {
        Some(path) => Box::new(BufWriter::new(
            File::create(path).with_context(|| format!("Failed to create {}", path.display()))?,
        )),
        None => Box::new(BufWriter::new(io::stdout().lock())),
    };

    match args.output {
        OutputFormat::Text => TextOutput::new(results).write_to(&mut writer)?,
        OutputFormat::Json => JsonOutput::new(results).write_to(&mut writer, pretty)?,
        OutputFormat::Csv => CsvOutput::new(results).write_to(&mut writer)?,
    }
    writer.flush()?;

    if let Some(path) = &args.output_file {
        log::info!("Wrote {} report to {}", args.output, path.display());
    }
    Ok(())
}

fn init_config(
    args: &InitConfigArgs,
    config: &Config,
    explicit: Option<std::path::PathBuf>,
) -> Result<ExitCode> {
    let path = match explicit {
        Some(path) => path,
        None => Config::default_path()?,
    };
    if path.exists() && !args.force {
        anyhow::bail!(
            "Config file already exists: {} (use --force to overwrite)",
            path.display()
        );
    }
    config.save_to(&path)?;
    println!("{}", path.display());
    Ok(ExitCode::Success)
}
