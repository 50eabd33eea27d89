//! Traversal strategies.
//!
//! Every strategy feeds the same record stream and obeys the same rules:
//! empty and non-regular files are skipped, entries that vanish mid-walk are
//! tolerated, unreadable files are isolated and any other listing error is
//! fatal. Only scheduling differs, so every strategy yields the same
//! digest-to-paths membership for an unchanged tree.
//!
//! - [`Strategy::Limited`]: spawn-per-entry walk gated by an
//!   [`AdmissionGate`](crate::scanner::AdmissionGate) (see
//!   [`TreeWalker`](crate::scanner::TreeWalker))
//! - [`Strategy::ConcurrentWalks`]: one ungated rayon task per directory,
//!   handing files over a rendezvous channel to a fixed pool of hashing
//!   threads
//! - [`Strategy::FixedPool`]: one listing thread feeding a fixed pool of
//!   hashing threads
//! - [`Strategy::Sequential`]: one thread walks and hashes inline

use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Mutex, PoisonError};
use std::thread;

use crossbeam::channel::{self, Receiver, Sender};
use rayon::Scope;
use serde::{Deserialize, Serialize};
use walkdir::WalkDir;

use crate::progress::ProgressCallback;
use crate::scanner::walker::{hash_record, WalkStats};
use crate::scanner::{Record, ScanError};

/// How the directory tree is traversed and hashed.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum,
)]
#[serde(rename_all = "kebab-case")]
pub enum Strategy {
    /// Spawn a task per directory and file, bounded by the admission gate
    #[default]
    Limited,
    /// A task per directory feeding a fixed pool of hashing threads
    ConcurrentWalks,
    /// Fixed pool of hashing threads fed by a single walker
    FixedPool,
    /// Single-threaded walk and hash
    Sequential,
}

impl fmt::Display for Strategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Strategy::Limited => write!(f, "limited"),
            Strategy::ConcurrentWalks => write!(f, "concurrent-walks"),
            Strategy::FixedPool => write!(f, "fixed-pool"),
            Strategy::Sequential => write!(f, "sequential"),
        }
    }
}

/// Shared inputs of the thread-based strategies.
pub(crate) struct StrategyContext<'a> {
    pub shutdown: Option<&'a AtomicBool>,
    pub progress: Option<&'a dyn ProgressCallback>,
}

impl StrategyContext<'_> {
    fn is_shutdown(&self) -> bool {
        self.shutdown.is_some_and(|f| f.load(Ordering::SeqCst))
    }

    fn report(&self, counter: &AtomicUsize, record: &Record) {
        if let Record::Hashed(pair) = record {
            let count = counter.fetch_add(1, Ordering::Relaxed) + 1;
            if let Some(progress) = self.progress {
                progress.on_file_hashed(count, &pair.path);
            }
        }
    }
}

/// What the listing side found for one walkdir entry.
enum Visit {
    Directory(PathBuf),
    File(PathBuf),
    Skip,
}

/// Apply the shared skip and error rules to one walkdir result.
fn visit(root: &Path, entry: Result<walkdir::DirEntry, walkdir::Error>) -> Result<Visit, ScanError> {
    let entry = match entry {
        Ok(entry) => entry,
        Err(e) => {
            let err = ScanError::from_walkdir(root, e);
            if err.is_not_found() {
                log::debug!("Entry vanished during listing: {}", err);
                return Ok(Visit::Skip);
            }
            return Err(err);
        }
    };

    let file_type = entry.file_type();
    if file_type.is_dir() {
        return Ok(Visit::Directory(entry.into_path()));
    }
    if !file_type.is_file() {
        log::trace!("Skipping non-regular entry: {}", entry.path().display());
        return Ok(Visit::Skip);
    }

    match entry.metadata() {
        Ok(metadata) if metadata.len() > 0 => Ok(Visit::File(entry.into_path())),
        Ok(_) => {
            log::debug!("Skipping empty file: {}", entry.path().display());
            Ok(Visit::Skip)
        }
        Err(e) => {
            let err = ScanError::from_walkdir(root, e);
            if err.is_not_found() {
                log::debug!("File vanished before stat: {}", err);
                Ok(Visit::Skip)
            } else {
                Err(err)
            }
        }
    }
}

/// Walk and hash on the calling thread.
///
/// `records` is dropped on return, closing the stream.
pub(crate) fn run_sequential(
    root: &Path,
    records: Sender<Record>,
    ctx: &StrategyContext<'_>,
) -> Result<WalkStats, ScanError> {
    let mut stats = WalkStats::default();
    let hashed = AtomicUsize::new(0);

    for entry in WalkDir::new(root).follow_links(false) {
        if ctx.is_shutdown() {
            break;
        }
        match visit(root, entry)? {
            Visit::Directory(_) => stats.dirs_walked += 1,
            Visit::File(path) => {
                if let Some(record) = hash_record(&path) {
                    ctx.report(&hashed, &record);
                    if records.send(record).is_err() {
                        break;
                    }
                }
            }
            Visit::Skip => {}
        }
    }

    stats.files_hashed = hashed.into_inner();
    Ok(stats)
}

/// Walk on the calling thread while `workers` threads hash.
///
/// Paths travel over a bounded channel; workers stop once it is closed and
/// drained. `records` is dropped after every worker has joined.
pub(crate) fn run_fixed_pool(
    root: &Path,
    workers: usize,
    records: Sender<Record>,
    ctx: &StrategyContext<'_>,
) -> Result<WalkStats, ScanError> {
    let workers = workers.max(1);
    let (paths, queue) = channel::bounded::<PathBuf>(workers * 4);
    let hashed = AtomicUsize::new(0);
    let aborted = AtomicBool::new(false);

    let walked = thread::scope(|scope| {
        for _ in 0..workers {
            let queue = queue.clone();
            let records = records.clone();
            let hashed = &hashed;
            let aborted = &aborted;
            scope.spawn(move || hash_worker(queue, records, hashed, aborted, ctx));
        }
        drop(queue);

        let walked = list_into(root, &paths, ctx, &aborted);
        if walked.is_err() {
            aborted.store(true, Ordering::SeqCst);
        }
        drop(paths);
        walked
    });
    drop(records);

    Ok(WalkStats {
        dirs_walked: walked?,
        files_hashed: hashed.into_inner(),
        peak_concurrency: 0,
        first_error: None,
    })
}

/// Producer side of the fixed pool: push every hashable path onto `paths`.
fn list_into(
    root: &Path,
    paths: &Sender<PathBuf>,
    ctx: &StrategyContext<'_>,
    aborted: &AtomicBool,
) -> Result<usize, ScanError> {
    let mut dirs_walked = 0;
    for entry in WalkDir::new(root).follow_links(false) {
        if ctx.is_shutdown() || aborted.load(Ordering::SeqCst) {
            break;
        }
        match visit(root, entry)? {
            Visit::Directory(_) => dirs_walked += 1,
            Visit::File(path) => {
                if paths.send(path).is_err() {
                    break;
                }
            }
            Visit::Skip => {}
        }
    }
    Ok(dirs_walked)
}

/// Consumer side of both pools: hash every path until `queue` is closed.
///
/// Once `aborted` or shutdown is raised the remaining paths are drained
/// without hashing so the producers never block on a full channel.
fn hash_worker(
    queue: Receiver<PathBuf>,
    records: Sender<Record>,
    hashed: &AtomicUsize,
    aborted: &AtomicBool,
    ctx: &StrategyContext<'_>,
) {
    for path in queue {
        if aborted.load(Ordering::SeqCst) || ctx.is_shutdown() {
            continue;
        }
        if let Some(record) = hash_record(&path) {
            ctx.report(hashed, &record);
            if records.send(record).is_err() {
                aborted.store(true, Ordering::SeqCst);
            }
        }
    }
}

/// Spawn a rayon task per directory, each handing its files to `workers`
/// hashing threads over a rendezvous channel.
///
/// Directory tasks are not gated. Must run inside the pool that should
/// carry them (see `ThreadPool::install`). `records` is dropped after every
/// hashing thread has joined.
pub(crate) fn run_concurrent_walks(
    root: &Path,
    workers: usize,
    records: Sender<Record>,
    ctx: &StrategyContext<'_>,
) -> Result<WalkStats, ScanError> {
    let workers = workers.max(1);
    let (paths, queue) = channel::bounded::<PathBuf>(0);
    let hashed = AtomicUsize::new(0);
    let aborted = AtomicBool::new(false);

    let (dirs_walked, first_error) = thread::scope(|scope| {
        for _ in 0..workers {
            let queue = queue.clone();
            let records = records.clone();
            let hashed = &hashed;
            let aborted = &aborted;
            scope.spawn(move || hash_worker(queue, records, hashed, aborted, ctx));
        }
        drop(queue);

        let walks = DirWalks {
            paths,
            ctx,
            aborted: &aborted,
            first_error: Mutex::new(None),
            dirs_walked: AtomicUsize::new(0),
        };
        rayon::scope(|s| walks.walk(root.to_path_buf(), s));
        walks.finish()
    });
    drop(records);

    if let Some(error) = first_error {
        return Err(error);
    }
    Ok(WalkStats {
        dirs_walked,
        files_hashed: hashed.into_inner(),
        peak_concurrency: 0,
        first_error: None,
    })
}

/// Shared state of the per-directory tasks of [`run_concurrent_walks`].
struct DirWalks<'a> {
    paths: Sender<PathBuf>,
    ctx: &'a StrategyContext<'a>,
    aborted: &'a AtomicBool,
    first_error: Mutex<Option<ScanError>>,
    dirs_walked: AtomicUsize,
}

impl DirWalks<'_> {
    fn stopped(&self) -> bool {
        self.aborted.load(Ordering::SeqCst) || self.ctx.is_shutdown()
    }

    fn walk<'s>(&'s self, dir: PathBuf, scope: &Scope<'s>) {
        if self.stopped() {
            return;
        }
        self.dirs_walked.fetch_add(1, Ordering::Relaxed);

        let listing = WalkDir::new(&dir)
            .min_depth(1)
            .max_depth(1)
            .follow_links(false);
        for entry in listing {
            if self.stopped() {
                return;
            }
            match visit(&dir, entry) {
                Ok(Visit::Directory(path)) => scope.spawn(move |s| self.walk(path, s)),
                Ok(Visit::File(path)) => {
                    if self.paths.send(path).is_err() {
                        return;
                    }
                }
                Ok(Visit::Skip) => {}
                Err(err) => {
                    self.fail(err);
                    return;
                }
            }
        }
    }

    fn fail(&self, error: ScanError) {
        log::error!("Traversal failed: {}", error);
        let mut slot = self
            .first_error
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        if slot.is_none() {
            *slot = Some(error);
        }
        self.aborted.store(true, Ordering::SeqCst);
    }

    /// Close the path channel and hand back the counters.
    fn finish(self) -> (usize, Option<ScanError>) {
        let Self {
            paths,
            first_error,
            dirs_walked,
            ..
        } = self;
        drop(paths);
        (
            dirs_walked.into_inner(),
            first_error
                .into_inner()
                .unwrap_or_else(PoisonError::into_inner),
        )
    }
}
