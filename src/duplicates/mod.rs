//! Duplicate detection: result model, aggregation and the pipeline coordinator.
//!
//! # Architecture
//!
//! - [`aggregator`]: folds the record stream into [`Results`]
//! - [`finder`]: the [`DuplicateFinder`] coordinating walk, hash and aggregation
//! - [`strategy`]: alternative traversal strategies sharing the same record stream
//!
//! # Example
//!
//! ```no_run
//! use duplyzer::duplicates::DuplicateFinder;
//! use std::path::Path;
//!
//! let finder = DuplicateFinder::with_defaults();
//! let (results, summary) = finder.find_duplicates(Path::new(".")).unwrap();
//! for group in results.duplicates() {
//!     println!("{} {}", group.short_hash(), group.files.len());
//! }
//! println!("{} duplicate groups", summary.duplicate_groups);
//! ```

pub mod aggregator;
pub mod finder;
pub mod strategy;

use std::collections::HashMap;
use std::path::PathBuf;

pub use aggregator::ResultAggregator;
pub use finder::{DuplicateFinder, FinderConfig, FinderError, ScanSummary};
pub use strategy::Strategy;

/// Paths sharing one digest, in the order their hashing completed.
pub type FileList = Vec<PathBuf>;

/// Number of trailing hex characters shown in the text summary.
pub const SHORT_HASH_LEN: usize = 7;

/// Mapping from content digest to every path with that content.
///
/// Built once per run by the aggregator. The order of paths inside a
/// [`FileList`] and the iteration order of the map depend on task scheduling;
/// use [`groups`](Self::groups) or [`duplicates`](Self::duplicates) for a
/// stable, digest-sorted view.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Results {
    map: HashMap<String, FileList>,
}

impl Results {
    /// Create an empty result set.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Append `path` to the list for `hash`, creating the list on first use.
    pub(crate) fn insert(&mut self, hash: String, path: PathBuf) {
        self.map.entry(hash).or_default().push(path);
    }

    /// Number of distinct digests.
    #[must_use]
    pub fn len(&self) -> usize {
        self.map.len()
    }

    /// Whether no file was hashed.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }

    /// Paths recorded for a digest.
    #[must_use]
    pub fn get(&self, hash: &str) -> Option<&FileList> {
        self.map.get(hash)
    }

    /// Iterate over `(digest, paths)` in unspecified order.
    pub fn iter(&self) -> impl Iterator<Item = (&String, &FileList)> {
        self.map.iter()
    }

    /// Total number of paths across all digests.
    #[must_use]
    pub fn total_files(&self) -> usize {
        self.map.values().map(Vec::len).sum()
    }

    /// Every digest as a group, sorted by digest.
    #[must_use]
    pub fn groups(&self) -> Vec<DuplicateGroup<'_>> {
        let mut groups: Vec<_> = self
            .map
            .iter()
            .map(|(hash, files)| DuplicateGroup { hash, files })
            .collect();
        groups.sort_by(|a, b| a.hash.cmp(b.hash));
        groups
    }

    /// Only digests shared by two or more paths, sorted by digest.
    #[must_use]
    pub fn duplicates(&self) -> Vec<DuplicateGroup<'_>> {
        self.groups()
            .into_iter()
            .filter(DuplicateGroup::is_duplicate)
            .collect()
    }

    /// Unwrap into the underlying map.
    #[must_use]
    pub fn into_inner(self) -> HashMap<String, FileList> {
        self.map
    }
}

impl From<HashMap<String, FileList>> for Results {
    fn from(map: HashMap<String, FileList>) -> Self {
        Self { map }
    }
}

/// Borrowed view of one digest and its paths.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DuplicateGroup<'a> {
    /// Full hex digest
    pub hash: &'a str,
    /// Paths with this content
    pub files: &'a [PathBuf],
}

impl DuplicateGroup<'_> {
    /// Trailing characters of the digest used in the text summary.
    #[must_use]
    pub fn short_hash(&self) -> &str {
        let start = self.hash.len().saturating_sub(SHORT_HASH_LEN);
        &self.hash[start..]
    }

    /// Whether two or more paths share this digest.
    #[must_use]
    pub fn is_duplicate(&self) -> bool {
        self.files.len() >= 2
    }

    /// The path kept when managing duplicates.
    #[must_use]
    pub fn original(&self) -> Option<&PathBuf> {
        self.files.first()
    }

    /// Every path after the first.
    #[must_use]
    pub fn redundant(&self) -> &[PathBuf] {
        self.files.get(1..).unwrap_or(&[])
    }
}
