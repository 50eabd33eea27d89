//! Single-owner aggregation of the record stream.
//!
//! [`ResultAggregator`] runs on its own thread for as long as any
//! [`Sender`](crossbeam::channel::Sender) of the record stream is alive. It is
//! the only writer of the [`Results`] map, so the map needs no lock. When the
//! last sender is dropped the receive loop ends and the finished map comes
//! back through the thread's `JoinHandle`.

use std::path::PathBuf;
use std::thread::{self, JoinHandle};

use crossbeam::channel::Receiver;

use super::Results;
use crate::scanner::Record;

/// Everything the aggregator collected from one run.
#[derive(Debug, Default)]
pub struct Aggregated {
    /// Digest to paths
    pub results: Results,
    /// Files that could not be read, with the reason
    pub unreadable: Vec<(PathBuf, String)>,
}

/// Consumer side of the record stream.
pub struct ResultAggregator {
    records: Receiver<Record>,
}

impl ResultAggregator {
    /// Create an aggregator reading from `records`.
    #[must_use]
    pub fn new(records: Receiver<Record>) -> Self {
        Self { records }
    }

    /// Fold records until the stream is closed.
    #[must_use]
    pub fn collect(self) -> Aggregated {
        let mut aggregated = Aggregated::default();

        for record in self.records {
            match record {
                Record::Hashed(pair) => aggregated.results.insert(pair.hash, pair.path),
                Record::Unreadable(error) => {
                    aggregated
                        .unreadable
                        .push((error.path().to_path_buf(), error.to_string()));
                }
            }
        }

        log::debug!(
            "Aggregated {} files into {} digests ({} unreadable)",
            aggregated.results.total_files(),
            aggregated.results.len(),
            aggregated.unreadable.len()
        );
        aggregated
    }

    /// Run [`collect`](Self::collect) on a dedicated thread.
    ///
    /// # Errors
    ///
    /// Returns an I/O error if the thread cannot be spawned.
    pub fn spawn(self) -> std::io::Result<JoinHandle<Aggregated>> {
        thread::Builder::new()
            .name("duplyzer-aggregator".to_string())
            .spawn(move || self.collect())
    }
}
