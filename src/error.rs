//! Process exit codes and machine-readable error reports.

use serde::Serialize;

use crate::duplicates::{FinderError, ScanSummary};

/// Exit status of a `duplyzer` run.
///
/// - 0: scan completed and duplicates were found
/// - 1: the run failed
/// - 2: scan completed, no duplicates
/// - 3: scan completed but some files could not be read
/// - 130: interrupted by Ctrl+C (128 + SIGINT)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ExitCode {
    /// Duplicates were found.
    Success = 0,
    /// The run failed.
    GeneralError = 1,
    /// No duplicate group exists.
    NoDuplicates = 2,
    /// Completed, with unreadable files left out of the results.
    PartialSuccess = 3,
    /// Interrupted by the user.
    Interrupted = 130,
}

impl ExitCode {
    /// Numeric process exit status.
    #[must_use]
    pub fn as_i32(self) -> i32 {
        self as i32
    }

    /// Machine-readable prefix printed in front of error messages.
    #[must_use]
    pub fn code_prefix(self) -> &'static str {
        match self {
            Self::Success => "DZ000",
            Self::GeneralError => "DZ001",
            Self::NoDuplicates => "DZ002",
            Self::PartialSuccess => "DZ003",
            Self::Interrupted => "DZ130",
        }
    }

    /// Exit code for a completed scan.
    ///
    /// Unreadable files outrank the duplicate count.
    #[must_use]
    pub fn from_summary(summary: &ScanSummary) -> Self {
        if summary.is_partial() {
            Self::PartialSuccess
        } else if summary.has_duplicates() {
            Self::Success
        } else {
            Self::NoDuplicates
        }
    }

    /// Exit code for a failed run.
    #[must_use]
    pub fn from_error(err: &anyhow::Error) -> Self {
        match err.downcast_ref::<FinderError>() {
            Some(FinderError::Interrupted) => Self::Interrupted,
            _ => Self::GeneralError,
        }
    }
}

/// One-line JSON error report written to stderr with `--json-errors`.
#[derive(Debug, Serialize)]
pub struct StructuredError {
    /// Prefix such as `DZ001`
    pub code: String,
    /// Numeric exit status
    pub exit_code: i32,
    /// Error message including its causes
    pub message: String,
    /// Whether the run was interrupted
    pub interrupted: bool,
}

impl StructuredError {
    /// Build a report for `err` exiting with `exit_code`.
    #[must_use]
    pub fn new(err: &anyhow::Error, exit_code: ExitCode) -> Self {
        Self {
            code: exit_code.code_prefix().to_string(),
            exit_code: exit_code.as_i32(),
            message: format!("{err:#}"),
            interrupted: exit_code == ExitCode::Interrupted,
        }
    }
}
