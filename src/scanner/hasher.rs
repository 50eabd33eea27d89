//! BLAKE3 content hasher with streaming support.
//!
//! # Overview
//!
//! [`hash_file`] opens one file, streams its bytes through a BLAKE3 hasher
//! and returns the lower-case hex digest together with the original path.
//! It holds no shared state, so any number of hash tasks may call it at once.

use std::fs::File;
use std::io::{self, BufReader};
use std::path::Path;

use super::{HashError, Pair};

/// Length of a hex-encoded digest (BLAKE3 produces 32 bytes).
pub const DIGEST_HEX_LEN: usize = 64;

/// Read buffer used while streaming file contents into the hasher.
const READ_BUFFER_SIZE: usize = 64 * 1024;

/// Compute the content digest of a single file.
///
/// # Errors
///
/// Returns [`HashError`] if the file cannot be opened or read.
///
/// # Example
///
/// ```no_run
/// use duplyzer::scanner::hash_file;
/// use std::path::Path;
///
/// let pair = hash_file(Path::new("/tmp/a.txt")).unwrap();
/// assert_eq!(pair.hash.len(), 64);
/// ```
pub fn hash_file(path: &Path) -> Result<Pair, HashError> {
    let file = File::open(path).map_err(|e| map_io_error(path, e))?;
    let mut reader = BufReader::with_capacity(READ_BUFFER_SIZE, file);

    let mut hasher = blake3::Hasher::new();
    io::copy(&mut reader, &mut hasher).map_err(|e| map_io_error(path, e))?;

    let hash = hasher.finalize().to_hex().to_string();
    log::trace!("Hashed {} -> {}", path.display(), hash);
    Ok(Pair::new(hash, path.to_path_buf()))
}

/// Digest an in-memory buffer the same way [`hash_file`] digests a file.
#[must_use]
pub fn hash_bytes(data: &[u8]) -> String {
    blake3::hash(data).to_hex().to_string()
}

fn map_io_error(path: &Path, error: io::Error) -> HashError {
    match error.kind() {
        io::ErrorKind::NotFound => HashError::NotFound(path.to_path_buf()),
        io::ErrorKind::PermissionDenied => HashError::PermissionDenied(path.to_path_buf()),
        _ => HashError::Io {
            path: path.to_path_buf(),
            source: error,
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_hash_file_matches_hash_bytes() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("a.txt");
        fs::write(&path, b"hi").unwrap();

        let pair = hash_file(&path).unwrap();
        assert_eq!(pair.path, path);
        assert_eq!(pair.hash, hash_bytes(b"hi"));
        assert_eq!(pair.hash.len(), DIGEST_HEX_LEN);
        assert!(pair
            .hash
            .chars()
            .all(|c| c.is_ascii_digit() || ('a'..='f').contains(&c)));
    }

    #[test]
    fn test_identical_content_same_digest() {
        let dir = TempDir::new().unwrap();
        let a = dir.path().join("a.txt");
        let b = dir.path().join("b.txt");
        let c = dir.path().join("c.txt");
        fs::write(&a, b"hi").unwrap();
        fs::write(&b, b"hi").unwrap();
        fs::write(&c, b"bye").unwrap();

        let ha = hash_file(&a).unwrap().hash;
        let hb = hash_file(&b).unwrap().hash;
        let hc = hash_file(&c).unwrap().hash;
        assert_eq!(ha, hb);
        assert_ne!(ha, hc);
    }

    #[test]
    fn test_large_file_streams_past_buffer() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("big.bin");
        let data: Vec<u8> = (0..(READ_BUFFER_SIZE * 3 + 17))
            .map(|i| (i % 251) as u8)
            .collect();
        fs::write(&path, &data).unwrap();

        assert_eq!(hash_file(&path).unwrap().hash, hash_bytes(&data));
    }

    #[test]
    fn test_missing_file_is_not_found() {
        let dir = TempDir::new().unwrap();
        let err = hash_file(&dir.path().join("missing")).unwrap_err();
        assert!(matches!(err, HashError::NotFound(_)));
    }
}
