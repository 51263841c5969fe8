//! Rendering backend boundary
//!
//! The traits here define the interface a host engine implements to let
//! the registry copy GPU resources into CPU memory. Transfer tasks live
//! here too since they are the only code that talks to a backend.

// Always present for API stability: traits define the interface
pub mod traits;
pub use traits::{
    BufferHandle, FencePoll, ReadbackBackend, StagingCopy, TextureHandle, TextureInfo,
    TransferError,
};

// Dummy backend for testing (always available)
pub mod dummy;
pub use dummy::DummyBackend;

// Transfer tasks driven by the registry
pub(crate) mod buffer;
pub(crate) mod copy;
pub(crate) mod texture;
