//! Ctrl+C handling.
//!
//! The handler raises a shared `AtomicBool`. The scan checks it before each
//! task starts and while waiting for a gate permit, then returns
//! [`FinderError::Interrupted`](crate::duplicates::FinderError::Interrupted),
//! which the binary maps to exit code 130.

use std::io::Write;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, OnceLock};

/// Shared shutdown flag raised by Ctrl+C.
#[derive(Debug, Clone, Default)]
pub struct ShutdownHandler {
    flag: Arc<AtomicBool>,
}

impl ShutdownHandler {
    /// Handler with the flag lowered and no signal hook attached.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether shutdown was requested.
    #[must_use]
    pub fn is_shutdown_requested(&self) -> bool {
        self.flag.load(Ordering::SeqCst)
    }

    /// Raise the flag by hand.
    pub fn request_shutdown(&self) {
        self.flag.store(true, Ordering::SeqCst);
    }

    /// Clone of the flag, for [`FinderConfig::with_shutdown_flag`](crate::duplicates::FinderConfig::with_shutdown_flag).
    #[must_use]
    pub fn flag(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.flag)
    }

    fn reset(&self) {
        self.flag.store(false, Ordering::SeqCst);
    }
}

static INSTALLED: OnceLock<ShutdownHandler> = OnceLock::new();

/// Install the process-wide Ctrl+C hook and return its handler.
///
/// The hook can only be registered once per process. Later calls return the
/// same handler with its flag lowered again. If registration fails (another
/// hook already owns the signal), the returned handler is unhooked and only
/// [`request_shutdown`](ShutdownHandler::request_shutdown) raises it.
pub fn install_handler() -> ShutdownHandler {
    if let Some(handler) = INSTALLED.get() {
        handler.reset();
        return handler.clone();
    }

    let handler = ShutdownHandler::new();
    let flag = handler.flag();
    let hooked = ctrlc::set_handler(move || {
        flag.store(true, Ordering::SeqCst);
        let mut stderr = std::io::stderr();
        let _ = writeln!(stderr, "\nInterrupted. Finishing running tasks...");
        let _ = stderr.flush();
        log::info!("Shutdown signal received");
    });
    if let Err(e) = hooked {
        log::debug!("Ctrl+C hook unavailable, using unhooked handler: {}", e);
    }

    INSTALLED.get_or_init(|| handler).clone()
}
