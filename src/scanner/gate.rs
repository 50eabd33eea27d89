//! Admission gate bounding concurrently active walk and hash tasks.
//!
//! # Overview
//!
//! [`AdmissionGate`] is a counting semaphore shared by every task kind in the
//! pipeline: directory listing and file hashing contend for the same permits.
//! A task acquires one [`Permit`] before doing I/O or CPU work and the permit
//! is returned when it is dropped, so early returns and error paths cannot
//! leak it.
//!
//! Spawning new tasks is never gated, only running them is. A task waiting
//! for a permit on a rayon worker yields back to the pool, so the thread keeps
//! running other queued tasks instead of parking.
//!
//! # Example
//!
//! ```
//! use duplyzer::scanner::AdmissionGate;
//!
//! let gate = AdmissionGate::new(2);
//! let first = gate.acquire().unwrap();
//! let second = gate.acquire().unwrap();
//! assert_eq!(gate.in_use(), 2);
//!
//! drop(first);
//! second.release();
//! assert_eq!(gate.in_use(), 0);
//! assert_eq!(gate.peak(), 2);
//! ```

use std::cell::Cell;
use std::fmt;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::thread;

use semaphore::{Semaphore, SemaphoreGuard, TryAccessError};

/// Deepest nesting of rayon tasks run from inside a waiting acquire on one
/// thread. Past it, waiters fall back to an OS-level yield.
const MAX_NESTED_YIELDS: usize = 64;

thread_local! {
    static YIELD_DEPTH: Cell<usize> = const { Cell::new(0) };
}

/// Returned when the gate has been closed or shutdown was requested while waiting.
#[derive(thiserror::Error, Debug, Clone, Copy, PartialEq, Eq)]
#[error("admission gate closed")]
pub struct GateClosed;

/// Counting semaphore with RAII permits.
pub struct AdmissionGate {
    capacity: usize,
    semaphore: Semaphore<()>,
    closed: AtomicBool,
    held: AtomicUsize,
    peak: AtomicUsize,
}

impl fmt::Debug for AdmissionGate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AdmissionGate")
            .field("capacity", &self.capacity)
            .field("in_use", &self.in_use())
            .field("peak", &self.peak())
            .field("closed", &self.is_closed())
            .finish()
    }
}

impl AdmissionGate {
    /// Create a gate with `capacity` permits (at least one).
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            capacity,
            semaphore: Semaphore::new(capacity, ()),
            closed: AtomicBool::new(false),
            held: AtomicUsize::new(0),
            peak: AtomicUsize::new(0),
        }
    }

    /// Total number of permits.
    #[must_use]
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Permits currently held.
    #[must_use]
    pub fn in_use(&self) -> usize {
        self.held.load(Ordering::SeqCst)
    }

    /// Highest number of permits ever held at the same time.
    #[must_use]
    pub fn peak(&self) -> usize {
        self.peak.load(Ordering::SeqCst)
    }

    /// Whether [`close`](Self::close) has been called.
    #[must_use]
    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }

    /// Wait until a permit is free and reserve it.
    ///
    /// # Errors
    ///
    /// Returns [`GateClosed`] if the gate is closed before a permit frees up.
    pub fn acquire(&self) -> Result<Permit<'_>, GateClosed> {
        self.acquire_unless(None)
    }

    /// Like [`acquire`](Self::acquire), but also gives up once `shutdown` is raised.
    ///
    /// # Errors
    ///
    /// Returns [`GateClosed`] if the gate is closed or the flag is set.
    pub fn acquire_unless(&self, shutdown: Option<&AtomicBool>) -> Result<Permit<'_>, GateClosed> {
        loop {
            if shutdown.is_some_and(|f| f.load(Ordering::SeqCst)) {
                return Err(GateClosed);
            }
            match self.semaphore.try_access() {
                Ok(guard) => {
                    let held = self.held.fetch_add(1, Ordering::SeqCst) + 1;
                    self.peak.fetch_max(held, Ordering::SeqCst);
                    return Ok(Permit {
                        gate: self,
                        _guard: guard,
                    });
                }
                Err(TryAccessError::NoCapacity) => yield_while_waiting(),
                Err(TryAccessError::Shutdown) => return Err(GateClosed),
            }
        }
    }

    /// Refuse all further acquisitions. Waiters give up on their next retry.
    ///
    /// Permits already held stay valid until dropped.
    pub fn close(&self) {
        if !self.closed.swap(true, Ordering::SeqCst) {
            let _ = self.semaphore.shutdown();
        }
    }
}

/// Run other pool work while waiting, or yield the OS thread outside rayon.
fn yield_while_waiting() {
    let depth = YIELD_DEPTH.with(Cell::get);
    if depth >= MAX_NESTED_YIELDS {
        thread::yield_now();
        return;
    }

    YIELD_DEPTH.with(|d| d.set(depth + 1));
    let ran = rayon::yield_now();
    YIELD_DEPTH.with(|d| d.set(depth));

    if !matches!(ran, Some(rayon::Yield::Executed)) {
        thread::yield_now();
    }
}

/// A held admission permit. Returned to the gate on drop.
#[must_use = "dropping a permit releases it immediately"]
pub struct Permit<'a> {
    gate: &'a AdmissionGate,
    _guard: SemaphoreGuard<()>,
}

impl fmt::Debug for Permit<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Permit")
            .field("capacity", &self.gate.capacity)
            .finish_non_exhaustive()
    }
}

impl Permit<'_> {
    /// Return the permit explicitly.
    pub fn release(self) {
        drop(self);
    }
}

impl Drop for Permit<'_> {
    fn drop(&mut self) {
        let previous = self.gate.held.fetch_sub(1, Ordering::SeqCst);
        debug_assert!(previous > 0, "released more permits than acquired");
    }
}
