//! Request identifiers and the cloneable request handle.

use std::fmt;
use std::sync::Arc;

use crate::core::registry::Registry;

/// Identifier of one readback request.
///
/// Ids are allocated in strictly increasing order per service and are
/// never reused within a service's lifetime short of `u64` wraparound.
/// A stale id is harmless: every query on it reports the request as
/// done and errored.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct RequestId(u64);

impl RequestId {
    /// Reserved id tagging scheduler callbacks that act on the whole
    /// registry rather than a single request. Never assigned to a
    /// request.
    pub const NONE: RequestId = RequestId(0);

    /// Wrap a raw id value, e.g. one carried through FFI or savegames.
    pub const fn from_raw(raw: u64) -> Self {
        Self(raw)
    }

    /// Get the raw id value.
    pub const fn raw(self) -> u64 {
        self.0
    }
}

impl fmt::Display for RequestId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Handle to one readback request.
///
/// Cloneable and thread-safe; all methods delegate to the service the
/// request was created on. The handle does not keep the request alive:
/// after disposal it keeps answering, reporting done and errored.
#[derive(Clone)]
pub struct ReadbackRequest {
    id: RequestId,
    registry: Arc<Registry>,
}

impl ReadbackRequest {
    pub(crate) fn new(id: RequestId, registry: Arc<Registry>) -> Self {
        Self { id, registry }
    }

    /// This request's id.
    pub fn id(&self) -> RequestId {
        self.id
    }

    /// Check whether the request is still in the registry.
    pub fn exists(&self) -> bool {
        self.registry.exists(self.id)
    }

    /// Check whether the transfer finished, successfully or not.
    pub fn done(&self) -> bool {
        self.registry.is_done(self.id)
    }

    /// Check whether the transfer failed.
    pub fn has_error(&self) -> bool {
        self.registry.has_error(self.id)
    }

    /// Borrow the result bytes of a successful transfer.
    ///
    /// Returns `None` until the request is done, after it was disposed,
    /// or if it failed. The closure runs under the request's buffer
    /// lock; keep it short.
    pub fn with_data<R>(&self, f: impl FnOnce(&[u8]) -> R) -> Option<R> {
        self.registry.with_data(self.id, f)
    }

    /// Pointer and length of the result bytes of a successful transfer.
    ///
    /// For requests created with a caller-supplied destination this is
    /// the caller's own pointer, with the length actually written. The
    /// pointer is valid until the request is disposed.
    pub fn data_ptr(&self) -> Option<(*const u8, usize)> {
        self.registry.data_ptr(self.id)
    }

    /// Block until the transfer finishes.
    ///
    /// Drives render passes through the scheduler while waiting, so it
    /// makes progress even if the host stops pumping updates. Must not
    /// be called from the render thread.
    pub fn wait(&self) {
        self.registry.wait_for_completion(self.id);
    }
}
