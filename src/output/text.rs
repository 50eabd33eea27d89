//! Plain-text duplicate listing.
//!
//! ```text
//! 3f9a2c1 2
//!    /photos/a.jpg
//!    /backup/a.jpg
//! ```
//!
//! Only digests shared by two or more files are listed.

use std::io::{self, Write};

use crate::duplicates::{Results, ScanSummary};

const PATH_INDENT: &str = "   ";

/// Text formatter over a finished result set.
pub struct TextOutput<'a> {
    results: &'a Results,
}

impl<'a> TextOutput<'a> {
    /// Create a formatter for `results`.
    #[must_use]
    pub fn new(results: &'a Results) -> Self {
        Self { results }
    }

    /// Write every duplicate group to `writer`.
    ///
    /// # Errors
    ///
    /// Returns the first write error.
    pub fn write_to<W: Write>(&self, writer: &mut W) -> io::Result<()> {
        for group in self.results.duplicates() {
            writeln!(writer, "{} {}", group.short_hash(), group.files.len())?;
            for path in group.files {
                writeln!(writer, "{PATH_INDENT}{}", path.display())?;
            }
        }
        writer.flush()
    }

    /// Render the listing into a string.
    #[must_use]
    pub fn to_text(&self) -> String {
        let mut buffer = Vec::new();
        // Writing into a Vec cannot fail.
        let _ = self.write_to(&mut buffer);
        String::from_utf8_lossy(&buffer).into_owned()
    }
}

/// One-line description of a finished scan.
#[must_use]
pub fn summary_line(summary: &ScanSummary) -> String {
    let mut line = format!(
        "Hashed {} files in {} directories: {} duplicate groups ({} redundant files), {} unique",
        summary.total_files,
        summary.dirs_walked,
        summary.duplicate_groups,
        summary.duplicate_files,
        summary.unique_files
    );
    if !summary.unreadable.is_empty() {
        line.push_str(&format!(", {} unreadable", summary.unreadable.len()));
    }
    line.push_str(&format!(" [{:.2?}]", summary.duration));
    line
}
