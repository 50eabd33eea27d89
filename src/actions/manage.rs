//! Keep-first duplicate management.

use std::fmt;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::duplicates::Results;

/// What happens to every duplicate after the first of its group.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    /// Remove permanently
    Delete,
    /// Move to the system trash
    Trash,
    /// Move into the target directory
    Move,
    /// Hard-link into the target directory
    HardLink,
}

impl Action {
    /// Whether the action writes into a target directory.
    #[must_use]
    pub fn needs_target_dir(self) -> bool {
        matches!(self, Self::Move | Self::HardLink)
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Delete => write!(f, "delete"),
            Self::Trash => write!(f, "trash"),
            Self::Move => write!(f, "move"),
            Self::HardLink => write!(f, "hard-link"),
        }
    }
}

/// Error type for duplicate management.
#[derive(Debug, Error)]
pub enum ActionError {
    /// Move or hard-link was requested without a target directory.
    #[error("{0} requires a target directory")]
    MissingTargetDir(Action),

    /// The target directory does not exist or is not a directory.
    #[error("target directory not found: {0}")]
    TargetDirNotFound(PathBuf),

    /// The duplicate no longer exists.
    #[error("file not found: {0}")]
    NotFound(PathBuf),

    /// Permission denied on the duplicate or the destination.
    #[error("permission denied: {0}")]
    PermissionDenied(PathBuf),

    /// The destination path is already taken.
    #[error("destination already exists: {0}")]
    DestinationExists(PathBuf),

    /// Trash operation failed.
    #[error("trash operation failed for {path}: {message}")]
    TrashFailed { path: PathBuf, message: String },

    /// General I/O error.
    #[error("I/O error for {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

impl ActionError {
    fn from_io(path: &Path, source: io::Error) -> Self {
        match source.kind() {
            io::ErrorKind::NotFound => Self::NotFound(path.to_path_buf()),
            io::ErrorKind::PermissionDenied => Self::PermissionDenied(path.to_path_buf()),
            io::ErrorKind::AlreadyExists => Self::DestinationExists(path.to_path_buf()),
            _ => Self::Io {
                path: path.to_path_buf(),
                source,
            },
        }
    }
}

/// Settings for one management pass.
#[derive(Debug, Clone)]
pub struct ManageConfig {
    /// Action to apply
    pub action: Action,
    /// Destination for move and hard-link
    pub target_dir: Option<PathBuf>,
    /// Log what would happen without touching any file
    pub dry_run: bool,
}

impl ManageConfig {
    /// Configuration for `action` with no target directory.
    #[must_use]
    pub fn new(action: Action) -> Self {
        Self {
            action,
            target_dir: None,
            dry_run: false,
        }
    }

    /// Set the target directory.
    #[must_use]
    pub fn with_target_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.target_dir = Some(dir.into());
        self
    }

    /// Enable or disable dry-run mode.
    #[must_use]
    pub fn with_dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }

    fn validate(&self) -> Result<(), ActionError> {
        if !self.action.needs_target_dir() {
            return Ok(());
        }
        let dir = self
            .target_dir
            .as_deref()
            .ok_or(ActionError::MissingTargetDir(self.action))?;
        if !dir.is_dir() {
            return Err(ActionError::TargetDirNotFound(dir.to_path_buf()));
        }
        Ok(())
    }
}

/// One action applied (or planned, in dry-run mode) to one file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActionOutcome {
    /// The duplicate acted upon
    pub source: PathBuf,
    /// Where it went, for move and hard-link
    pub destination: Option<PathBuf>,
}

/// Results of a management pass.
#[derive(Debug, Clone, Default)]
pub struct ActionReport {
    /// Files handled successfully
    pub successes: Vec<ActionOutcome>,
    /// Files that failed, with the reason
    pub failures: Vec<(PathBuf, String)>,
    /// Whether this was a dry run
    pub dry_run: bool,
}

impl ActionReport {
    /// Whether every file was handled.
    #[must_use]
    pub fn all_succeeded(&self) -> bool {
        self.failures.is_empty()
    }

    /// Human-readable summary of the pass.
    #[must_use]
    pub fn summary(&self) -> String {
        let verb = if self.dry_run { "Would process" } else { "Processed" };
        if self.all_succeeded() {
            format!("{} {} file(s)", verb, self.successes.len())
        } else {
            format!(
                "{} {} file(s), {} failed",
                verb,
                self.successes.len(),
                self.failures.len()
            )
        }
    }
}

/// Apply `config.action` to every path after the first of each duplicate group.
///
/// Groups are visited in digest order.
///
/// # Errors
///
/// Returns an error before touching any file if the action needs a target
/// directory that is missing. Per-file errors go into the report.
pub fn manage_duplicates(results: &Results, config: &ManageConfig) -> Result<ActionReport, ActionError> {
    config.validate()?;

    let mut report = ActionReport {
        dry_run: config.dry_run,
        ..ActionReport::default()
    };

    for group in results.duplicates() {
        if let Some(original) = group.original() {
            log::debug!("Keeping {}", original.display());
        }
        for path in group.redundant() {
            let outcome = if config.dry_run {
                plan(config.action, path, config.target_dir.as_deref())
            } else {
                apply_action(config.action, path, config.target_dir.as_deref())
            };
            match outcome {
                Ok(outcome) => report.successes.push(outcome),
                Err(e) => {
                    log::warn!("Failed to {} {}: {}", config.action, path.display(), e);
                    report.failures.push((path.clone(), e.to_string()));
                }
            }
        }
    }

    log::info!("{}", report.summary());
    Ok(report)
}

/// Apply `action` to a single file.
///
/// # Errors
///
/// Returns an error if the file is gone, the destination exists, or the
/// filesystem operation fails.
pub fn apply_action(
    action: Action,
    path: &Path,
    target_dir: Option<&Path>,
) -> Result<ActionOutcome, ActionError> {
    let destination = destination_for(action, path, target_dir)?;
    if let Some(dest) = &destination {
        if dest.symlink_metadata().is_ok() {
            return Err(ActionError::DestinationExists(dest.clone()));
        }
    }
    fs::symlink_metadata(path).map_err(|e| ActionError::from_io(path, e))?;

    match (action, destination.as_deref()) {
        (Action::Delete, _) => {
            fs::remove_file(path).map_err(|e| ActionError::from_io(path, e))?;
            log::info!("Permanently deleted: {}", path.display());
        }
        (Action::Trash, _) => {
            trash::delete(path).map_err(|e| ActionError::TrashFailed {
                path: path.to_path_buf(),
                message: e.to_string(),
            })?;
            log::info!("Moved to trash: {}", path.display());
        }
        (Action::Move, Some(dest)) => {
            move_file(path, dest)?;
            log::info!("Moved {} -> {}", path.display(), dest.display());
        }
        (Action::HardLink, Some(dest)) => {
            fs::hard_link(path, dest).map_err(|e| ActionError::from_io(dest, e))?;
            log::info!("Linked {} -> {}", dest.display(), path.display());
        }
        (Action::Move | Action::HardLink, None) => {
            return Err(ActionError::MissingTargetDir(action));
        }
    }

    Ok(ActionOutcome {
        source: path.to_path_buf(),
        destination,
    })
}

fn plan(action: Action, path: &Path, target_dir: Option<&Path>) -> Result<ActionOutcome, ActionError> {
    let destination = destination_for(action, path, target_dir)?;
    match &destination {
        Some(dest) => log::info!("[dry-run] {} {} -> {}", action, path.display(), dest.display()),
        None => log::info!("[dry-run] {} {}", action, path.display()),
    }
    Ok(ActionOutcome {
        source: path.to_path_buf(),
        destination,
    })
}

/// `target_dir/<file name of path>` for actions that need one.
fn destination_for(
    action: Action,
    path: &Path,
    target_dir: Option<&Path>,
) -> Result<Option<PathBuf>, ActionError> {
    if !action.needs_target_dir() {
        return Ok(None);
    }
    let dir = target_dir.ok_or(ActionError::MissingTargetDir(action))?;
    let name = path.file_name().ok_or_else(|| ActionError::Io {
        path: path.to_path_buf(),
        source: io::Error::new(io::ErrorKind::InvalidInput, "path has no file name"),
    })?;
    Ok(Some(dir.join(name)))
}

/// Rename, falling back to copy and remove when the rename cannot work
/// (e.g. across filesystems).
fn move_file(src: &Path, dest: &Path) -> Result<(), ActionError> {
    match fs::rename(src, dest) {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Err(ActionError::NotFound(src.to_path_buf())),
        Err(e) => {
            log::debug!("Rename of {} failed ({}), copying instead", src.display(), e);
            fs::copy(src, dest).map_err(|e| ActionError::from_io(dest, e))?;
            fs::remove_file(src).map_err(|e| ActionError::from_io(src, e))
        }
    }
}
