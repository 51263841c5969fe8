//! # readback
//!
//! Asynchronous GPU readback tracking for Rust game engines.
//!
//! ## Features
//!
//! - Non-blocking texture and GPU buffer readback requests
//! - Mutex-guarded ordered registry with O(log n) id lookup
//! - Render-thread work dispatched through an injected scheduler bridge
//! - Deferred disposal: results stay readable for one full update cycle
//! - Caller-owned destination buffers with clamped copies
//! - Blocking waits that drive their own render passes
//! - Completion and disposal hooks
//! - Coded diagnostics for misuse and degraded transfers
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use readback::{AsyncReadback, CallbackQueue, DummyBackend, ReadbackConfig};
//!
//! let backend = Arc::new(DummyBackend::new());
//! let texture = backend.add_texture(4, 4, 1, 4, &[0u8; 64]);
//!
//! let readback = AsyncReadback::new(backend, ReadbackConfig::default());
//! let queue = CallbackQueue::new();
//! readback.set_scheduler(queue.clone());
//!
//! let request = readback.create_texture_transfer(texture, 0);
//!
//! // Game loop
//! loop {
//!     queue.run_pending(); // render thread
//!     readback.update_once(); // control thread
//!     if request.done() {
//!         if let Some(len) = request.with_data(|bytes| bytes.len()) {
//!             println!("{} bytes", len);
//!         }
//!         break;
//!     }
//! }
//! ```

pub mod api;
pub mod diagnostics;
pub mod gpu;
pub mod sched;

mod core;
mod sync;

// Re-export public API at crate root for convenience
pub use api::config::ReadbackConfig;
pub use api::request::{ReadbackRequest, RequestId};
pub use api::service::AsyncReadback;
pub use api::stats::ReadbackStats;

// Scheduler bridge
pub use sched::{CallbackQueue, RenderCallback, RenderScheduler};

// Backend interface
pub use gpu::traits::{
    BufferHandle, FencePoll, ReadbackBackend, StagingCopy, TextureHandle, TextureInfo,
    TransferError,
};
pub use gpu::dummy::DummyBackend;

// Diagnostics - core types and predefined codes
pub use diagnostics::{set_verbose, suppress_diagnostics};
pub use diagnostics::{CollectingSink, Diagnostic, DiagnosticKind, DiagnosticSink};
pub use diagnostics::{RB001, RB002, RB101, RB102, RB103};
