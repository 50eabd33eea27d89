//! Spawn-per-entry tree walker bounded by an admission gate.
//!
//! # Overview
//!
//! [`TreeWalker::walk`] lists one directory while holding a permit from the
//! shared [`AdmissionGate`], then spawns one rayon task per subdirectory
//! (another walk) and one per non-empty regular file (a hash task). The
//! number of spawned tasks is unbounded; the number of tasks actually doing
//! I/O at the same moment never exceeds the gate capacity.
//!
//! Every hash task pushes exactly one [`Record`] onto the record stream. The
//! walker owns the only [`Sender`], so dropping it (see
//! [`TreeWalker::finish`]) is what closes the stream, and that can only
//! happen after the enclosing `rayon::scope` has waited for every task.
//!
//! # Errors
//!
//! - An entry that disappears between listing and visiting (`NotFound`) is
//!   skipped silently, both when listing and when hashing.
//! - Any other listing error is fatal: it is kept as the run's first error,
//!   the gate is closed and the remaining tasks return without doing work.
//! - Any other hashing error only drops that one file
//!   ([`Record::Unreadable`]).
//!
//! # Example
//!
//! ```no_run
//! use duplyzer::scanner::{AdmissionGate, Record, TreeWalker};
//! use std::path::PathBuf;
//!
//! let (sender, receiver) = crossbeam::channel::unbounded::<Record>();
//! let walker = TreeWalker::new(AdmissionGate::new(4), sender);
//! rayon::scope(|scope| walker.walk(PathBuf::from("."), scope));
//! let stats = walker.finish();
//! assert!(stats.first_error.is_none());
//! println!("{} records", receiver.iter().count());
//! ```

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

use crossbeam::channel::Sender;
use rayon::Scope;
use walkdir::WalkDir;

use super::gate::AdmissionGate;
use super::hasher::hash_file;
use super::{HashError, Record, ScanError};
use crate::progress::ProgressCallback;

/// Hash `path` into a record, or `None` if the file vanished before it was opened.
///
/// Read failures other than `NotFound` are isolated to the file and
/// reported as [`Record::Unreadable`].
pub(crate) fn hash_record(path: &Path) -> Option<Record> {
    match hash_file(path) {
        Ok(pair) => Some(Record::Hashed(pair)),
        Err(HashError::NotFound(path)) => {
            log::debug!("File vanished before hashing: {}", path.display());
            None
        }
        Err(e) => {
            log::warn!("Skipping unreadable file: {}", e);
            Some(Record::Unreadable(e))
        }
    }
}

/// Counters and the fatal error collected by one walk.
#[derive(Debug, Default)]
pub struct WalkStats {
    /// Directories whose entries were listed
    pub dirs_walked: usize,
    /// Files hashed successfully
    pub files_hashed: usize,
    /// Highest number of gate permits held at once
    pub peak_concurrency: usize,
    /// First fatal traversal error, if any
    pub first_error: Option<ScanError>,
}

/// Concurrent directory walker feeding the record stream.
pub struct TreeWalker {
    gate: AdmissionGate,
    records: Sender<Record>,
    shutdown_flag: Option<Arc<AtomicBool>>,
    progress: Option<Arc<dyn ProgressCallback>>,
    aborted: AtomicBool,
    first_error: Mutex<Option<ScanError>>,
    dirs_walked: AtomicUsize,
    files_hashed: AtomicUsize,
}

impl TreeWalker {
    /// Create a walker that publishes records on `records`.
    #[must_use]
    pub fn new(gate: AdmissionGate, records: Sender<Record>) -> Self {
        Self {
            gate,
            records,
            shutdown_flag: None,
            progress: None,
            aborted: AtomicBool::new(false),
            first_error: Mutex::new(None),
            dirs_walked: AtomicUsize::new(0),
            files_hashed: AtomicUsize::new(0),
        }
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
        self.progress = Some(callback);
        self
    }

    /// The gate shared by every walk and hash task.
    #[must_use]
    pub fn gate(&self) -> &AdmissionGate {
        &self.gate
    }

    /// Whether remaining tasks should stop before doing any work.
    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.aborted.load(Ordering::SeqCst)
            || self
                .shutdown_flag
                .as_ref()
                .is_some_and(|f| f.load(Ordering::SeqCst))
    }

    /// Walk `dir`, spawning a task on `scope` for each subdirectory and file.
    pub fn walk<'s>(&'s self, dir: PathBuf, scope: &Scope<'s>) {
        if self.is_cancelled() {
            return;
        }
        let Ok(_permit) = self.gate.acquire_unless(self.shutdown_flag.as_deref()) else {
            return;
        };
        self.dirs_walked.fetch_add(1, Ordering::Relaxed);
        log::trace!("Listing {}", dir.display());

        let listing = WalkDir::new(&dir)
            .min_depth(1)
            .max_depth(1)
            .follow_links(false);

        for entry in listing {
            if self.is_cancelled() {
                return;
            }

            let entry = match entry {
                Ok(entry) => entry,
                Err(e) => {
                    let err = ScanError::from_walkdir(&dir, e);
                    if err.is_not_found() {
                        log::debug!("Entry vanished during listing: {}", err);
                        continue;
                    }
                    self.fail(err);
                    return;
                }
            };

            let file_type = entry.file_type();
            if file_type.is_dir() {
                let path = entry.into_path();
                scope.spawn(move |s| self.walk(path, s));
            } else if file_type.is_file() {
                let size = match entry.metadata() {
                    Ok(metadata) => metadata.len(),
                    Err(e) => {
                        let err = ScanError::from_walkdir(&dir, e);
                        if err.is_not_found() {
                            log::debug!("File vanished before stat: {}", err);
                            continue;
                        }
                        self.fail(err);
                        return;
                    }
                };
                if size == 0 {
                    log::debug!("Skipping empty file: {}", entry.path().display());
                    continue;
                }
                let path = entry.into_path();
                scope.spawn(move |_| self.hash(path));
            } else {
                log::trace!("Skipping non-regular entry: {}", entry.path().display());
            }
        }
    }

    /// Hash one file and publish the outcome.
    fn hash(&self, path: PathBuf) {
        if self.is_cancelled() {
            return;
        }
        let Ok(_permit) = self.gate.acquire_unless(self.shutdown_flag.as_deref()) else {
            return;
        };

        let Some(record) = hash_record(&path) else {
            return;
        };
        if let Record::Hashed(pair) = &record {
            let count = self.files_hashed.fetch_add(1, Ordering::Relaxed) + 1;
            if let Some(progress) = &self.progress {
                progress.on_file_hashed(count, &pair.path);
            }
        }

        if self.records.send(record).is_err() {
            log::error!("Record stream closed while hashing {}", path.display());
            self.aborted.store(true, Ordering::SeqCst);
            self.gate.close();
        }
    }

    /// Keep the first fatal error and stop all remaining work.
    fn fail(&self, error: ScanError) {
        log::error!("Traversal failed: {}", error);
        {
            let mut slot = self
                .first_error
                .lock()
                .unwrap_or_else(PoisonError::into_inner);
            if slot.is_none() {
                *slot = Some(error);
            }
        }
        self.aborted.store(true, Ordering::SeqCst);
        self.gate.close();
    }

    /// Consume the walker, closing the record stream.
    ///
    /// Must only be called once every task spawned by [`walk`](Self::walk)
    /// has finished, i.e. after the enclosing `rayon::scope` returned.
    #[must_use]
    pub fn finish(self) -> WalkStats {
        let Self {
            gate,
            records,
            first_error,
            dirs_walked,
            files_hashed,
            ..
        } = self;
        drop(records);

        WalkStats {
            dirs_walked: dirs_walked.into_inner(),
            files_hashed: files_hashed.into_inner(),
            peak_concurrency: gate.peak(),
            first_error: first_error
                .into_inner()
                .unwrap_or_else(PoisonError::into_inner),
        }
    }
}
