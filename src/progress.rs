//! Progress reporting utilities using indicatif.
//!
//! The pipeline reports through the [`ProgressCallback`] trait so that the
//! library never draws to the terminal by itself. [`Progress`] is the
//! indicatif-backed implementation used by the CLI.

use std::path::Path;
use std::time::Duration;

use indicatif::{ProgressBar, ProgressStyle};

/// Progress callback for the scan pipeline.
///
/// Implementations must be cheap and thread-safe: `on_file_hashed` is called
/// from every hash task.
pub trait ProgressCallback: Send + Sync {
    /// Called once before the root directory is walked.
    fn on_scan_start(&self, root: &Path);

    /// Called after each file is hashed.
    ///
    /// # Arguments
    ///
    /// * `count` - Number of files hashed so far (1-based)
    /// * `path` - File that was just hashed
    fn on_file_hashed(&self, count: usize, path: &Path);

    /// Called once when every task has finished.
    fn on_scan_end(&self, total: usize);
}

/// Spinner showing how many files have been hashed.
pub struct Progress {
    bar: ProgressBar,
}

impl Progress {
    /// Create a new progress reporter.
    ///
    /// # Arguments
    ///
    /// * `quiet` - If true, nothing is drawn.
    ///
    /// # Examples
    ///
    /// ```
    /// use duplyzer::progress::Progress;
    ///
    /// let progress = Progress::new(true);
    /// ```
    #[must_use]
    pub fn new(quiet: bool) -> Self {
        let bar = if quiet {
            ProgressBar::hidden()
        } else {
            let bar = ProgressBar::new_spinner();
            bar.set_style(
                ProgressStyle::with_template("{spinner:.green} {msg} [{elapsed_precise}] {pos} files")
                    .unwrap_or_else(|_| ProgressStyle::default_spinner())
                    .tick_chars("⠁⠂⠄⡀⢀⠠⠐⠈ "),
            );
            bar
        };
        Self { bar }
    }
}

impl ProgressCallback for Progress {
    fn on_scan_start(&self, root: &Path) {
        self.bar
            .set_message(format!("Hashing {}", truncate_path(&root.to_string_lossy(), 40)));
        self.bar.enable_steady_tick(Duration::from_millis(100));
    }

    fn on_file_hashed(&self, count: usize, path: &Path) {
        self.bar.set_position(count as u64);
        self.bar.set_message(truncate_path(&path.to_string_lossy(), 30));
    }

    fn on_scan_end(&self, total: usize) {
        self.bar.set_position(total as u64);
        self.bar.finish_with_message("Hashing complete");
    }
}

/// Truncate a path for display in the progress bar.
fn truncate_path(path: &str, max_len: usize) -> String {
    if path.chars().count() <= max_len {
        return path.to_string();
    }

    let file_name = Path::new(path)
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_default();

    let name_len = file_name.chars().count();
    if name_len + 4 > max_len {
        let tail: String = file_name
            .chars()
            .skip(name_len.saturating_sub(max_len.saturating_sub(3)))
            .collect();
        return format!("...{tail}");
    }

    format!(".../{file_name}")
}
