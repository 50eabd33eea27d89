//! Duplicate management actions.
//!
//! For every duplicate group the first path is kept and the chosen
//! [`Action`] is applied to each later path:
//!
//! - [`Action::Delete`]: permanent removal
//! - [`Action::Trash`]: move to the system trash (recoverable)
//! - [`Action::Move`]: move into a target directory under the same file name
//! - [`Action::HardLink`]: create a hard link to the duplicate inside the
//!   target directory under the same file name
//!
//! Per-file failures are collected in an [`ActionReport`] and never stop the
//! batch. A destination that already exists is a failure, not an overwrite.
//!
//! ```no_run
//! use duplyzer::actions::{manage_duplicates, Action, ManageConfig};
//! use duplyzer::duplicates::DuplicateFinder;
//! use std::path::Path;
//!
//! let (results, _) = DuplicateFinder::with_defaults()
//!     .find_duplicates(Path::new("."))
//!     .unwrap();
//! let config = ManageConfig::new(Action::Trash).with_dry_run(true);
//! let report = manage_duplicates(&results, &config).unwrap();
//! println!("{}", report.summary());
//! ```

pub mod manage;

pub use manage::{
    apply_action, manage_duplicates, Action, ActionError, ActionOutcome, ActionReport,
    ManageConfig,
};
