//! Report formatters for scan results.
//!
//! - [`text`]: duplicate groups as indented text (the default)
//! - [`json`]: every digest as a JSON array
//! - [`csv`]: one CSV row per digest
//!
//! All formatters read a finished [`Results`](crate::duplicates::Results)
//! and emit digests in sorted order, so repeated scans of an unchanged tree
//! produce comparable reports.
//!
//! # Example
//!
//! ```no_run
//! use duplyzer::duplicates::DuplicateFinder;
//! use duplyzer::output::JsonOutput;
//! use std::path::Path;
//!
//! let (results, _) = DuplicateFinder::with_defaults()
//!     .find_duplicates(Path::new("."))
//!     .unwrap();
//! println!("{}", JsonOutput::new(&results).to_json_pretty().unwrap());
//! ```

pub mod csv;
pub mod json;
pub mod text;

pub use self::csv::{CsvOutput, CsvOutputError};
pub use self::json::{JsonOutput, JsonOutputError};
pub use self::text::{summary_line, TextOutput};
