//! Pipeline coordinator.
//!
//! # Overview
//!
//! [`DuplicateFinder::find_duplicates`] wires the scan together:
//!
//! 1. Validate the root before any work starts
//! 2. Spawn the [`ResultAggregator`] on its own thread, reading a bounded
//!    record stream
//! 3. Run the selected [`Strategy`]; for [`Strategy::Limited`] the root walk
//!    runs inside `rayon::scope` on a dedicated pool, and the scope returning
//!    means every transitively spawned task has finished
//! 4. Drop the only remaining [`Sender`], closing the stream exactly once
//! 5. Join the aggregator and hand back its [`Results`]
//!
//! A fatal traversal error or a raised shutdown flag turns the run into an
//! error; partial results are never returned.

use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use crossbeam::channel::{self, Sender};
use serde::Serialize;

use super::aggregator::{Aggregated, ResultAggregator};
use super::strategy::{
    run_concurrent_walks, run_fixed_pool, run_sequential, Strategy, StrategyContext,
};
use super::Results;
use crate::progress::ProgressCallback;
use crate::scanner::walker::WalkStats;
use crate::scanner::{AdmissionGate, Record, ScanError, TreeWalker};

/// Default gate capacity: twice the number of logical CPUs.
#[must_use]
pub fn default_workers() -> usize {
    (num_cpus::get() * 2).max(1)
}

/// Configuration for the duplicate finder.
#[derive(Clone)]
pub struct FinderConfig {
    /// Gate capacity, i.e. the number of listing or hashing tasks allowed to
    /// do I/O at once. Also the number of hashing threads of
    /// [`Strategy::ConcurrentWalks`] and [`Strategy::FixedPool`].
    pub workers: usize,
    /// Size of the rayon pool used by [`Strategy::Limited`] and
    /// [`Strategy::ConcurrentWalks`]. 0 uses `workers`.
    pub threads: usize,
    /// Traversal strategy.
    pub strategy: Strategy,
    /// Optional shutdown flag for graceful termination.
    pub shutdown_flag: Option<Arc<AtomicBool>>,
    /// Optional progress callback for reporting.
    pub progress_callback: Option<Arc<dyn ProgressCallback>>,
}

impl fmt::Debug for FinderConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FinderConfig")
            .field("workers", &self.workers)
            .field("threads", &self.threads)
            .field("strategy", &self.strategy)
            .field("shutdown_flag", &self.shutdown_flag)
            .field(
                "progress_callback",
                &self.progress_callback.as_ref().map(|_| "<callback>"),
            )
            .finish()
    }
}

impl Default for FinderConfig {
    fn default() -> Self {
        Self {
            workers: default_workers(),
            threads: 0,
            strategy: Strategy::default(),
            shutdown_flag: None,
            progress_callback: None,
        }
    }
}

impl FinderConfig {
    /// Set the gate capacity (clamped to at least 1).
    #[must_use]
    pub fn with_workers(mut self, workers: usize) -> Self {
        self.workers = workers.max(1);
        self
    }

    /// Set the rayon pool size. 0 follows `workers`.
    #[must_use]
    pub fn with_threads(mut self, threads: usize) -> Self {
        self.threads = threads;
        self
    }

    /// Set the traversal strategy.
    #[must_use]
    pub fn with_strategy(mut self, strategy: Strategy) -> Self {
        self.strategy = strategy;
        self
    }

    /// Set the shutdown flag for graceful termination.
    #[must_use]
    pub fn with_shutdown_flag(mut self, flag: Arc<AtomicBool>) -> Self {
        self.shutdown_flag = Some(flag);
        self
    }

    /// Set the progress callback.
    #[must_use]
    pub fn with_progress_callback(mut self, callback: Arc<dyn ProgressCallback>) -> Self {
        self.progress_callback = Some(callback);
        self
    }

    /// Rayon pool size actually used.
    #[must_use]
    pub fn effective_threads(&self) -> usize {
        if self.threads == 0 {
            self.workers.max(1)
        } else {
            self.threads
        }
    }

    fn is_shutdown_requested(&self) -> bool {
        self.shutdown_flag
            .as_ref()
            .is_some_and(|f| f.load(Ordering::SeqCst))
    }
}

/// Summary statistics from a duplicate scan.
#[derive(Debug, Clone, Default, Serialize)]
pub struct ScanSummary {
    /// Total number of files hashed
    pub total_files: usize,
    /// Files whose content appears nowhere else
    pub unique_files: usize,
    /// Number of digests shared by two or more files
    pub duplicate_groups: usize,
    /// Files beyond the first of each duplicate group
    pub duplicate_files: usize,
    /// Directories listed
    pub dirs_walked: usize,
    /// Files that could not be read, with the reason
    pub unreadable: Vec<(PathBuf, String)>,
    /// Highest number of gate permits held at once (0 without a gate)
    pub peak_concurrency: usize,
    /// Strategy used for the run
    pub strategy: Strategy,
    /// Gate capacity or pool size used for the run
    pub workers: usize,
    /// Wall-clock duration of the run
    #[serde(skip)]
    pub duration: Duration,
}

impl ScanSummary {
    fn from_run(results: &Results, stats: WalkStats, unreadable: Vec<(PathBuf, String)>) -> Self {
        let mut summary = Self {
            total_files: results.total_files(),
            dirs_walked: stats.dirs_walked,
            unreadable,
            peak_concurrency: stats.peak_concurrency,
            ..Self::default()
        };
        for group in results.groups() {
            if group.is_duplicate() {
                summary.duplicate_groups += 1;
                summary.duplicate_files += group.redundant().len();
            } else {
                summary.unique_files += 1;
            }
        }
        summary
    }

    /// Whether any duplicate group was found.
    #[must_use]
    pub fn has_duplicates(&self) -> bool {
        self.duplicate_groups > 0
    }

    /// Whether some files were skipped because they could not be read.
    #[must_use]
    pub fn is_partial(&self) -> bool {
        !self.unreadable.is_empty()
    }
}

/// Errors that can occur during duplicate finding.
#[derive(thiserror::Error, Debug)]
pub enum FinderError {
    /// The scan was interrupted by user (Ctrl+C or shutdown signal).
    #[error("Scan interrupted by user")]
    Interrupted,

    /// The provided path does not exist.
    #[error("Path not found: {0}")]
    PathNotFound(PathBuf),

    /// The provided path is not a directory.
    #[error("Not a directory: {0}")]
    NotADirectory(PathBuf),

    /// A directory could not be listed.
    #[error(transparent)]
    Scan(#[from] ScanError),

    /// The worker pool or aggregator thread could not be started.
    #[error("Failed to start worker threads: {0}")]
    ThreadPool(String),

    /// The aggregator thread panicked before returning its results.
    #[error("Result aggregator panicked")]
    AggregatorPanicked,
}

/// Duplicate finder running the walk, hash and aggregate pipeline.
///
/// # Example
///
/// ```no_run
/// use duplyzer::duplicates::{DuplicateFinder, FinderConfig, Strategy};
/// use std::path::Path;
///
/// let config = FinderConfig::default()
///     .with_workers(8)
///     .with_strategy(Strategy::Limited);
/// let finder = DuplicateFinder::new(config);
///
/// let (results, summary) = finder.find_duplicates(Path::new("/some/path")).unwrap();
/// println!("{} digests, {} duplicate groups", results.len(), summary.duplicate_groups);
/// ```
#[derive(Debug, Default)]
pub struct DuplicateFinder {
    config: FinderConfig,
}

impl DuplicateFinder {
    /// Create a new duplicate finder with the given configuration.
    #[must_use]
    pub fn new(config: FinderConfig) -> Self {
        Self { config }
    }

    /// Create a new duplicate finder with default configuration.
    #[must_use]
    pub fn with_defaults() -> Self {
        Self::new(FinderConfig::default())
    }

    /// The configuration this finder runs with.
    #[must_use]
    pub fn config(&self) -> &FinderConfig {
        &self.config
    }

    /// Hash every non-empty regular file under `root` and group paths by digest.
    ///
    /// # Errors
    ///
    /// Returns `FinderError` if:
    /// - `root` does not exist or is not a directory
    /// - a directory below `root` cannot be listed
    /// - the shutdown flag was raised before the run completed
    /// - the worker pool or aggregator thread cannot be started or panics
    pub fn find_duplicates(&self, root: &Path) -> Result<(Results, ScanSummary), FinderError> {
        let start = Instant::now();
        validate_root(root)?;

        if self.config.is_shutdown_requested() {
            return Err(FinderError::Interrupted);
        }

        let workers = self.config.workers.max(1);
        log::info!(
            "Starting duplicate scan of {} ({} strategy, {} workers)",
            root.display(),
            self.config.strategy,
            workers
        );
        if let Some(callback) = &self.config.progress_callback {
            callback.on_scan_start(root);
        }

        let (sender, receiver) = channel::bounded::<Record>(workers);
        let aggregator = ResultAggregator::new(receiver)
            .spawn()
            .map_err(|e| FinderError::ThreadPool(e.to_string()))?;

        // Every path below consumes `sender`; the aggregator ends once the
        // last clone of it is gone.
        let walked = match self.config.strategy {
            Strategy::Limited => self.run_limited(root, sender),
            Strategy::ConcurrentWalks => self.run_concurrent_walks(root, workers, sender),
            Strategy::FixedPool => {
                run_fixed_pool(root, workers, sender, &self.context()).map_err(FinderError::from)
            }
            Strategy::Sequential => {
                run_sequential(root, sender, &self.context()).map_err(FinderError::from)
            }
        };

        let Aggregated {
            results,
            unreadable,
        } = aggregator
            .join()
            .map_err(|_| FinderError::AggregatorPanicked)?;

        let mut stats = walked?;
        if let Some(callback) = &self.config.progress_callback {
            callback.on_scan_end(stats.files_hashed);
        }
        if let Some(error) = stats.first_error.take() {
            return Err(FinderError::Scan(error));
        }
        if self.config.is_shutdown_requested() {
            log::info!("Scan interrupted after {} files", results.total_files());
            return Err(FinderError::Interrupted);
        }

        let mut summary = ScanSummary::from_run(&results, stats, unreadable);
        summary.strategy = self.config.strategy;
        summary.workers = workers;
        summary.duration = start.elapsed();

        log::info!(
            "Scan complete: {} files, {} duplicate groups, {} unreadable in {:.2?}",
            summary.total_files,
            summary.duplicate_groups,
            summary.unreadable.len(),
            summary.duration
        );
        Ok((results, summary))
    }

    fn build_pool(&self) -> Result<rayon::ThreadPool, FinderError> {
        rayon::ThreadPoolBuilder::new()
            .num_threads(self.config.effective_threads())
            .thread_name(|i| format!("duplyzer-worker-{i}"))
            .build()
            .map_err(|e| FinderError::ThreadPool(e.to_string()))
    }

    /// Spawn-per-entry walk on a dedicated rayon pool, bounded by the gate.
    fn run_limited(&self, root: &Path, records: Sender<Record>) -> Result<WalkStats, FinderError> {
        let pool = self.build_pool()?;

        let mut walker = TreeWalker::new(AdmissionGate::new(self.config.workers), records);
        if let Some(flag) = &self.config.shutdown_flag {
            walker = walker.with_shutdown_flag(Arc::clone(flag));
        }
        if let Some(callback) = &self.config.progress_callback {
            walker = walker.with_progress_callback(Arc::clone(callback));
        }

        let root = root.to_path_buf();
        pool.install(|| rayon::scope(|scope| walker.walk(root, scope)));

        let stats = walker.finish();
        log::debug!(
            "Walked {} directories, peak concurrency {}",
            stats.dirs_walked,
            stats.peak_concurrency
        );
        Ok(stats)
    }

    /// Ungated per-directory walks on a dedicated rayon pool.
    fn run_concurrent_walks(
        &self,
        root: &Path,
        workers: usize,
        records: Sender<Record>,
    ) -> Result<WalkStats, FinderError> {
        let pool = self.build_pool()?;
        let ctx = self.context();
        pool.install(|| run_concurrent_walks(root, workers, records, &ctx))
            .map_err(FinderError::from)
    }

    fn context(&self) -> StrategyContext<'_> {
        StrategyContext {
            shutdown: self.config.shutdown_flag.as_deref(),
            progress: self.config.progress_callback.as_deref(),
        }
    }
}

fn validate_root(root: &Path) -> Result<(), FinderError> {
    match fs::metadata(root) {
        Ok(metadata) if metadata.is_dir() => Ok(()),
        Ok(_) => Err(FinderError::NotADirectory(root.to_path_buf())),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            Err(FinderError::PathNotFound(root.to_path_buf()))
        }
        Err(e) => Err(FinderError::Scan(ScanError::from_io(root.to_path_buf(), e))),
    }
}
