//! GPU readback traits and types
//!
//! This module defines the rendering backend interface WITHOUT pulling in any
//! API-specific dependencies. The registry depends on these traits, never on
//! a concrete graphics API.

use std::fmt;

/// Errors a backend can report while starting or finishing a transfer
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransferError {
    /// The texture or buffer handle does not name a live resource
    UnknownResource,
    /// The resource format has no byte-addressable layout to read back
    UnsupportedFormat,
    /// The transfer would copy zero bytes
    ZeroSized,
    /// The completion fence failed before the copy signaled
    FenceLost,
    /// Mapping the staging memory for CPU access failed
    MapFailed,
    /// Backend-specific error (opaque)
    BackendError(String),
}

impl fmt::Display for TransferError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TransferError::UnknownResource => write!(f, "Unknown GPU resource handle"),
            TransferError::UnsupportedFormat => write!(f, "Resource format cannot be read back"),
            TransferError::ZeroSized => write!(f, "Transfer would copy zero bytes"),
            TransferError::FenceLost => write!(f, "Completion fence lost"),
            TransferError::MapFailed => write!(f, "Failed to map staging memory"),
            TransferError::BackendError(msg) => write!(f, "Backend error: {}", msg),
        }
    }
}

impl std::error::Error for TransferError {}

/// Opaque handle to a texture owned by the host's rendering backend
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TextureHandle(u64);

impl TextureHandle {
    /// Wrap a backend-defined raw handle value
    pub const fn new(raw: u64) -> Self {
        Self(raw)
    }

    /// Get the raw handle value
    pub const fn raw(self) -> u64 {
        self.0
    }
}

/// Opaque handle to a GPU buffer owned by the host's rendering backend
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct BufferHandle(u64);

impl BufferHandle {
    /// Wrap a backend-defined raw handle value
    pub const fn new(raw: u64) -> Self {
        Self(raw)
    }

    /// Get the raw handle value
    pub const fn raw(self) -> u64 {
        self.0
    }
}

/// Layout of one mip level of a texture, as reported by the backend
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TextureInfo {
    /// Width in texels
    pub width: u32,
    /// Height in texels
    pub height: u32,
    /// Depth in texels (1 for 2D textures)
    pub depth: u32,
    /// Bytes per texel; 0 means the format has no linear byte layout
    pub bytes_per_pixel: u32,
}

impl TextureInfo {
    /// Tightly packed byte size of this mip level
    pub fn byte_len(&self) -> usize {
        self.width as usize
            * self.height as usize
            * self.depth as usize
            * self.bytes_per_pixel as usize
    }
}

/// Result of polling an in-flight copy's completion fence
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FencePoll {
    /// The copy has not finished yet
    Pending,
    /// The copy finished; the staging memory can be mapped
    Signaled,
    /// The fence failed and the copy will never complete
    Lost,
}

/// Rendering backend interface for asynchronous readback
///
/// All methods are called on the host's render thread, via the scheduler
/// bridge. Implementations must not block on GPU completion; a started
/// copy is observed through [`StagingCopy::poll`] instead.
pub trait ReadbackBackend: Send + Sync {
    /// Query the layout of one mip level of a texture
    fn texture_info(&self, texture: TextureHandle, mip_level: u32)
        -> Result<TextureInfo, TransferError>;

    /// Start an asynchronous copy of a texture mip level into staging
    /// memory, returning the in-flight copy
    fn begin_texture_copy(
        &self,
        texture: TextureHandle,
        mip_level: u32,
    ) -> Result<Box<dyn StagingCopy>, TransferError>;

    /// Start an asynchronous copy of `byte_len` bytes of a GPU buffer
    /// into staging memory, returning the in-flight copy
    fn begin_buffer_copy(
        &self,
        buffer: BufferHandle,
        byte_len: usize,
    ) -> Result<Box<dyn StagingCopy>, TransferError>;
}

/// An in-flight copy into backend-owned staging memory
///
/// Dropping a staging copy releases its backend resources, whether or
/// not the copy completed.
pub trait StagingCopy: Send {
    /// Check the completion fence without blocking
    fn poll(&mut self) -> FencePoll;

    /// Map the staging memory for CPU reads. Only valid after `poll`
    /// returned [`FencePoll::Signaled`]
    fn map(&mut self) -> Result<&[u8], TransferError>;

    /// Release the CPU mapping established by `map`
    fn unmap(&mut self);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_texture_info_byte_len() {
        let info = TextureInfo {
            width: 4,
            height: 4,
            depth: 1,
            bytes_per_pixel: 4,
        };
        assert_eq!(info.byte_len(), 64);
    }

    #[test]
    fn test_zero_bpp_means_zero_len() {
        let info = TextureInfo {
            width: 1024,
            height: 1024,
            depth: 1,
            bytes_per_pixel: 0,
        };
        assert_eq!(info.byte_len(), 0);
    }

    #[test]
    fn test_transfer_error_display() {
        let err = TransferError::BackendError("device removed".into());
        assert_eq!(err.to_string(), "Backend error: device removed");
        assert_eq!(
            TransferError::FenceLost.to_string(),
            "Completion fence lost"
        );
    }
}
