//! Scanner module for directory traversal and file hashing.
//!
//! This module provides the leaf pieces of the scan pipeline:
//! - [`hasher`]: BLAKE3 content digests (streaming)
//! - [`gate`]: the admission gate bounding concurrently active tasks
//! - [`walker`]: the spawn-per-entry tree walker running on a rayon scope
//!
//! # Example
//!
//! ```no_run
//! use duplyzer::scanner::hash_file;
//! use std::path::Path;
//!
//! let pair = hash_file(Path::new("Cargo.toml")).unwrap();
//! println!("{} {}", pair.hash, pair.path.display());
//! ```

pub mod gate;
pub mod hasher;
pub mod walker;

use std::path::PathBuf;

// Re-export main types
pub use gate::{AdmissionGate, GateClosed, Permit};
pub use hasher::{hash_bytes, hash_file, DIGEST_HEX_LEN};
pub use walker::TreeWalker;

/// A content digest paired with the file that produced it.
///
/// Created once per successfully hashed file and moved onto the record
/// stream; never modified afterwards.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Pair {
    /// Lower-case hexadecimal BLAKE3 digest
    pub hash: String,
    /// Path of the hashed file
    pub path: PathBuf,
}

impl Pair {
    /// Create a new pair.
    #[must_use]
    pub fn new(hash: String, path: PathBuf) -> Self {
        Self { hash, path }
    }
}

/// One message on the record stream between hash tasks and the aggregator.
#[derive(Debug)]
pub enum Record {
    /// A file was hashed successfully.
    Hashed(Pair),
    /// A file could not be read; the run continues without it.
    Unreadable(HashError),
}

/// Errors that can occur during directory scanning.
#[derive(thiserror::Error, Debug)]
pub enum ScanError {
    /// Permission was denied when listing a directory.
    #[error("Permission denied: {0}")]
    PermissionDenied(PathBuf),

    /// The specified path was not found.
    #[error("Path not found: {0}")]
    NotFound(PathBuf),

    /// An I/O error occurred while listing a directory.
    #[error("I/O error for {path}: {source}")]
    Io {
        /// Path where the error occurred
        path: PathBuf,
        /// The underlying I/O error
        #[source]
        source: std::io::Error,
    },
}

impl ScanError {
    /// Classify an I/O error raised while listing `path`.
    pub(crate) fn from_io(path: PathBuf, source: std::io::Error) -> Self {
        match source.kind() {
            std::io::ErrorKind::PermissionDenied => Self::PermissionDenied(path),
            std::io::ErrorKind::NotFound => Self::NotFound(path),
            _ => Self::Io { path, source },
        }
    }

    /// Classify a walkdir error, falling back to the walk root for the path.
    pub(crate) fn from_walkdir(fallback: &std::path::Path, error: walkdir::Error) -> Self {
        let path = error
            .path()
            .map_or_else(|| fallback.to_path_buf(), std::path::Path::to_path_buf);
        match error.into_io_error() {
            Some(source) => Self::from_io(path, source),
            None => Self::Io {
                source: std::io::Error::other("filesystem loop detected"),
                path,
            },
        }
    }

    /// Whether this error only reports an entry that vanished mid-walk.
    #[must_use]
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound(_))
    }
}

/// Errors that can occur during file hashing.
#[derive(thiserror::Error, Debug)]
pub enum HashError {
    /// The specified file was not found.
    #[error("File not found: {0}")]
    NotFound(PathBuf),

    /// Permission was denied when reading the file.
    #[error("Permission denied: {0}")]
    PermissionDenied(PathBuf),

    /// An I/O error occurred while reading the file.
    #[error("I/O error for {path}: {source}")]
    Io {
        /// Path where the error occurred
        path: PathBuf,
        /// The underlying I/O error
        #[source]
        source: std::io::Error,
    },
}

impl HashError {
    /// Path of the file that failed to hash.
    #[must_use]
    pub fn path(&self) -> &std::path::Path {
        match self {
            Self::NotFound(p) | Self::PermissionDenied(p) | Self::Io { path: p, .. } => p,
        }
    }
}
