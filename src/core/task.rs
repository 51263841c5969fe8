//! Task state flags and the task interface the registry drives.

use std::sync::atomic::{AtomicBool, Ordering};

use crate::core::buffer::ResultBuffer;

/// One-way state flags for a transfer task.
///
/// Each flag is set exactly once and never cleared. `mark_error` latches
/// the error flag before the done flag so a reader that observes done
/// can trust the error flag it reads afterwards.
pub(crate) struct TaskStatus {
    initialized: AtomicBool,
    done: AtomicBool,
    error: AtomicBool,
}

impl TaskStatus {
    pub(crate) fn new() -> Self {
        Self {
            initialized: AtomicBool::new(false),
            done: AtomicBool::new(false),
            error: AtomicBool::new(false),
        }
    }

    /// True once the render thread has started the transfer.
    pub(crate) fn is_initialized(&self) -> bool {
        self.initialized.load(Ordering::SeqCst)
    }

    /// True once the transfer finished, successfully or not.
    pub(crate) fn is_done(&self) -> bool {
        self.done.load(Ordering::SeqCst)
    }

    /// True if the transfer failed. Implies done.
    pub(crate) fn has_error(&self) -> bool {
        self.error.load(Ordering::SeqCst)
    }

    pub(crate) fn mark_initialized(&self) {
        self.initialized.store(true, Ordering::SeqCst);
    }

    pub(crate) fn mark_done(&self) {
        self.done.store(true, Ordering::SeqCst);
    }

    pub(crate) fn mark_error(&self) {
        self.error.store(true, Ordering::SeqCst);
        self.done.store(true, Ordering::SeqCst);
    }
}

/// A transfer the registry tracks and the render thread drives.
///
/// `begin` and `advance` are only ever called on the render thread, via
/// the scheduler bridge. Status and result reads may come from any
/// thread.
pub(crate) trait ReadbackTask: Send + Sync {
    /// Kick off the backend copy. Must latch error state on failure and
    /// mark the task initialized before returning.
    fn begin(&self);

    /// Poll the in-flight copy once, latching done or error when the
    /// fence resolves.
    fn advance(&self);

    fn status(&self) -> &TaskStatus;

    fn result(&self) -> &ResultBuffer;
}
