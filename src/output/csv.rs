//! CSV report: one row per digest.
//!
//! Each row is the digest followed by every path with that content, so rows
//! have different lengths and there is no header:
//!
//! ```text
//! 3f9a...,/photos/a.jpg,/backup/a.jpg
//! b71c...,/notes.txt
//! ```

use std::io;

use thiserror::Error;

use crate::duplicates::Results;

/// Errors that can occur during CSV output generation.
#[derive(Debug, Error)]
pub enum CsvOutputError {
    /// I/O error during writing.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// Error during CSV serialization.
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
}

/// CSV output formatter.
pub struct CsvOutput<'a> {
    results: &'a Results,
}

impl<'a> CsvOutput<'a> {
    /// Create a new CSV output formatter.
    #[must_use]
    pub fn new(results: &'a Results) -> Self {
        Self { results }
    }

    /// Write one record per digest, sorted by digest.
    ///
    /// # Errors
    ///
    /// Returns `CsvOutputError` if writing or serialization fails.
    pub fn write_to<W: io::Write>(&self, writer: W) -> Result<(), CsvOutputError> {
        let mut csv_writer = csv::WriterBuilder::new()
            .flexible(true)
            .has_headers(false)
            .from_writer(writer);

        for group in self.results.groups() {
            let mut record = csv::StringRecord::with_capacity(0, group.files.len() + 1);
            record.push_field(group.hash);
            for path in group.files {
                record.push_field(&path.to_string_lossy());
            }
            csv_writer.write_record(&record)?;
        }

        csv_writer.flush()?;
        Ok(())
    }

    /// Generate CSV output as a string.
    ///
    /// # Errors
    ///
    /// Returns `CsvOutputError` if serialization fails.
    pub fn to_csv_string(&self) -> Result<String, CsvOutputError> {
        let mut buffer = Vec::new();
        self.write_to(&mut buffer)?;
        Ok(String::from_utf8_lossy(&buffer).into_owned())
    }
}
