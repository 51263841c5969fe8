//! Scheduler bridge between the registry and the host's render thread.
//!
//! The registry never owns a render thread. Everything that must run
//! there - starting transfers, polling fences - is packaged as a
//! callback and handed to the host through [`RenderScheduler`].
//! [`CallbackQueue`] is a ready-made implementation for hosts that pump
//! their render thread manually.

mod queue;

pub use queue::CallbackQueue;

use crate::api::request::RequestId;

/// A deferred unit of render-thread work.
pub type RenderCallback = Box<dyn FnOnce() + Send + 'static>;

/// Host-provided bridge that runs callbacks on the render thread.
///
/// The contract: every scheduled callback runs on the render thread,
/// at most one at a time, in submission order per tag. `schedule` may be
/// called from any thread.
pub trait RenderScheduler: Send + Sync {
    /// Arrange for `callback` to run on the render thread.
    ///
    /// `id` tags the callback with the request that caused it, or
    /// [`RequestId::NONE`] for registry-wide passes. Hosts that forward
    /// into a native dispatch layer can use the tag for correlation;
    /// others may ignore it.
    fn schedule(&self, id: RequestId, callback: RenderCallback);
}
