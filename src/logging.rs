//! Logging setup on top of the `log` facade and `env_logger`.
//!
//! The level comes from, in priority order:
//!
//! 1. `RUST_LOG` (if set)
//! 2. `--quiet` (errors only) or `-v` / `-vv` (debug / trace)
//! 3. info
//!
//! Debug builds prefix every line with a timestamp and, from `-v` upwards,
//! the module path. Release builds print the level and the message only.

use std::env;
use std::io::Write;

use env_logger::Builder;
use log::LevelFilter;

/// Initialize logging from the CLI verbosity flags.
///
/// Call once, before the first log statement. Later calls are ignored.
///
/// ```rust,no_run
/// duplyzer::logging::init_logging(1, false);
/// log::debug!("visible with -v");
/// ```
pub fn init_logging(verbose: u8, quiet: bool) {
    let from_env = env::var("RUST_LOG").is_ok();
    let mut builder = Builder::new();

    if from_env {
        builder.parse_default_env();
    } else {
        builder.filter_level(level_for(verbose, quiet));
    }
    configure_format(&mut builder, verbose);

    if builder.try_init().is_err() {
        return;
    }
    if from_env {
        log::debug!("Logging configured from RUST_LOG");
    } else {
        log::debug!("Logging initialized at level {}", level_for(verbose, quiet));
    }
}

fn level_for(verbose: u8, quiet: bool) -> LevelFilter {
    if quiet {
        return LevelFilter::Error;
    }
    match verbose {
        0 => LevelFilter::Info,
        1 => LevelFilter::Debug,
        _ => LevelFilter::Trace,
    }
}

#[cfg(debug_assertions)]
fn configure_format(builder: &mut Builder, verbose: u8) {
    builder.format(move |buf, record| {
        let style = buf.default_level_style(record.level());
        let timestamp = buf.timestamp_seconds();
        if verbose >= 1 {
            writeln!(
                buf,
                "{timestamp} {style}{:<5}{style:#} [{}] {}",
                record.level(),
                record.module_path().unwrap_or("unknown"),
                record.args()
            )
        } else {
            writeln!(
                buf,
                "{timestamp} {style}{:<5}{style:#} {}",
                record.level(),
                record.args()
            )
        }
    });
}

#[cfg(not(debug_assertions))]
fn configure_format(builder: &mut Builder, _verbose: u8) {
    builder.format(|buf, record| {
        let style = buf.default_level_style(record.level());
        writeln!(buf, "{style}{:<5}{style:#} {}", record.level(), record.args())
    });
}
