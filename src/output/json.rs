//! JSON report of every digest.
//!
//! # Output Schema
//!
//! ```json
//! [
//!   { "hash": "3f9a...", "files": ["/photos/a.jpg", "/backup/a.jpg"] },
//!   { "hash": "b71c...", "files": ["/notes.txt"] }
//! ]
//! ```
//!
//! Entries are sorted by hash. Digests held by a single file are included,
//! so the report is a complete image of the scan.

use std::io::Write;

use serde::{Deserialize, Serialize};

use crate::duplicates::{DuplicateGroup, Results};

/// One digest and the files that share it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JsonGroup {
    /// BLAKE3 digest as 64 lower-case hex characters
    pub hash: String,
    /// Paths with this content, as discovered
    pub files: Vec<String>,
}

impl From<DuplicateGroup<'_>> for JsonGroup {
    fn from(group: DuplicateGroup<'_>) -> Self {
        Self {
            hash: group.hash.to_string(),
            files: group
                .files
                .iter()
                .map(|p| p.to_string_lossy().into_owned())
                .collect(),
        }
    }
}

/// Complete JSON report.
#[derive(Debug, Clone, Serialize)]
#[serde(transparent)]
pub struct JsonOutput {
    /// Every digest, sorted by hash
    pub groups: Vec<JsonGroup>,
}

impl JsonOutput {
    /// Build the report for `results`.
    #[must_use]
    pub fn new(results: &Results) -> Self {
        Self {
            groups: results.groups().into_iter().map(JsonGroup::from).collect(),
        }
    }

    /// Serialize to compact JSON string.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails (unlikely for valid data).
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    /// Serialize to pretty-printed JSON string.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails (unlikely for valid data).
    pub fn to_json_pretty(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    /// Write the report followed by a newline.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization or writing fails.
    pub fn write_to<W: Write>(&self, writer: &mut W, pretty: bool) -> Result<(), JsonOutputError> {
        let json = if pretty {
            self.to_json_pretty()?
        } else {
            self.to_json()?
        };
        writer.write_all(json.as_bytes())?;
        writer.write_all(b"\n")?;
        writer.flush()?;
        Ok(())
    }
}

/// Errors that can occur during JSON output.
#[derive(thiserror::Error, Debug)]
pub enum JsonOutputError {
    /// JSON serialization error
    #[error("JSON serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// I/O error during writing
    #[error("I/O error during JSON generation: {0}")]
    Io(#[from] std::io::Error),
}
