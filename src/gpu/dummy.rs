//! Dummy rendering backend for testing
//!
//! Resources are plain byte vectors in RAM, fences signal after a
//! configurable number of polls, and fence loss can be injected per
//! resource. No GPU hardware required.

use std::collections::{HashMap, HashSet};
use std::sync::Mutex;

use super::traits::*;

struct DummyTexture {
    width: u32,
    height: u32,
    depth: u32,
    bytes_per_pixel: u32,
    data: Vec<u8>,
}

struct DummyState {
    textures: HashMap<u64, DummyTexture>,
    buffers: HashMap<u64, Vec<u8>>,
    /// Polls a fence stays Pending before it signals.
    fence_latency: u32,
    /// Raw handles whose fences report Lost instead of signaling.
    lost_fences: HashSet<u64>,
    next_handle: u64,
}

/// In-memory backend for tests, demos and benchmarks.
pub struct DummyBackend {
    state: Mutex<DummyState>,
}

impl DummyBackend {
    /// Create a backend whose fences signal on the first poll.
    pub fn new() -> Self {
        Self {
            state: Mutex::new(DummyState {
                textures: HashMap::new(),
                buffers: HashMap::new(),
                fence_latency: 0,
                lost_fences: HashSet::new(),
                next_handle: 1,
            }),
        }
    }

    /// Make fences report Pending for `polls` polls before signaling.
    /// Applies to copies started after the call.
    pub fn set_fence_latency(&self, polls: u32) {
        self.state.lock().unwrap().fence_latency = polls;
    }

    /// Register a texture. `data` holds the tightly packed texels; a
    /// `bytes_per_pixel` of 0 models a format with no linear layout.
    pub fn add_texture(
        &self,
        width: u32,
        height: u32,
        depth: u32,
        bytes_per_pixel: u32,
        data: &[u8],
    ) -> TextureHandle {
        let mut state = self.state.lock().unwrap();
        let raw = state.next_handle;
        state.next_handle += 1;
        state.textures.insert(
            raw,
            DummyTexture {
                width,
                height,
                depth,
                bytes_per_pixel,
                data: data.to_vec(),
            },
        );
        TextureHandle::new(raw)
    }

    /// Register a GPU buffer holding `data`.
    pub fn add_buffer(&self, data: &[u8]) -> BufferHandle {
        let mut state = self.state.lock().unwrap();
        let raw = state.next_handle;
        state.next_handle += 1;
        state.buffers.insert(raw, data.to_vec());
        BufferHandle::new(raw)
    }

    /// Make copies of this texture lose their fence mid-flight.
    pub fn fail_texture(&self, texture: TextureHandle) {
        self.state.lock().unwrap().lost_fences.insert(texture.raw());
    }

    /// Make copies of this buffer lose their fence mid-flight.
    pub fn fail_buffer(&self, buffer: BufferHandle) {
        self.state.lock().unwrap().lost_fences.insert(buffer.raw());
    }
}

impl Default for DummyBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl ReadbackBackend for DummyBackend {
    fn texture_info(
        &self,
        texture: TextureHandle,
        _mip_level: u32,
    ) -> Result<TextureInfo, TransferError> {
        let state = self.state.lock().unwrap();
        let tex = state
            .textures
            .get(&texture.raw())
            .ok_or(TransferError::UnknownResource)?;
        Ok(TextureInfo {
            width: tex.width,
            height: tex.height,
            depth: tex.depth,
            bytes_per_pixel: tex.bytes_per_pixel,
        })
    }

    fn begin_texture_copy(
        &self,
        texture: TextureHandle,
        _mip_level: u32,
    ) -> Result<Box<dyn StagingCopy>, TransferError> {
        let state = self.state.lock().unwrap();
        let tex = state
            .textures
            .get(&texture.raw())
            .ok_or(TransferError::UnknownResource)?;
        Ok(Box::new(DummyStaging {
            bytes: tex.data.clone(),
            remaining_polls: state.fence_latency,
            lost: state.lost_fences.contains(&texture.raw()),
            mapped: false,
        }))
    }

    fn begin_buffer_copy(
        &self,
        buffer: BufferHandle,
        byte_len: usize,
    ) -> Result<Box<dyn StagingCopy>, TransferError> {
        let state = self.state.lock().unwrap();
        let data = state
            .buffers
            .get(&buffer.raw())
            .ok_or(TransferError::UnknownResource)?;
        let copied = byte_len.min(data.len());
        Ok(Box::new(DummyStaging {
            bytes: data[..copied].to_vec(),
            remaining_polls: state.fence_latency,
            lost: state.lost_fences.contains(&buffer.raw()),
            mapped: false,
        }))
    }
}

struct DummyStaging {
    bytes: Vec<u8>,
    remaining_polls: u32,
    lost: bool,
    mapped: bool,
}

impl StagingCopy for DummyStaging {
    fn poll(&mut self) -> FencePoll {
        if self.lost {
            return FencePoll::Lost;
        }
        if self.remaining_polls > 0 {
            self.remaining_polls -= 1;
            return FencePoll::Pending;
        }
        FencePoll::Signaled
    }

    fn map(&mut self) -> Result<&[u8], TransferError> {
        debug_assert!(!self.mapped, "staging buffer mapped twice");
        self.mapped = true;
        Ok(&self.bytes)
    }

    fn unmap(&mut self) {
        self.mapped = false;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_texture_info_round_trip() {
        let backend = DummyBackend::new();
        let texture = backend.add_texture(8, 4, 1, 4, &[0u8; 128]);

        let info = backend.texture_info(texture, 0).unwrap();
        assert_eq!(info.width, 8);
        assert_eq!(info.height, 4);
        assert_eq!(info.byte_len(), 128);
    }

    #[test]
    fn test_unknown_handles_are_rejected() {
        let backend = DummyBackend::new();
        assert_eq!(
            backend.texture_info(TextureHandle::new(77), 0),
            Err(TransferError::UnknownResource)
        );
        assert!(backend
            .begin_buffer_copy(BufferHandle::new(77), 16)
            .is_err());
    }

    #[test]
    fn test_fence_latency_counts_polls() {
        let backend = DummyBackend::new();
        backend.set_fence_latency(2);
        let buffer = backend.add_buffer(&[1, 2, 3]);

        let mut copy = backend.begin_buffer_copy(buffer, 3).unwrap();
        assert_eq!(copy.poll(), FencePoll::Pending);
        assert_eq!(copy.poll(), FencePoll::Pending);
        assert_eq!(copy.poll(), FencePoll::Signaled);
        assert_eq!(copy.map().unwrap(), &[1, 2, 3]);
    }

    #[test]
    fn test_injected_fence_loss() {
        let backend = DummyBackend::new();
        let texture = backend.add_texture(2, 2, 1, 4, &[9u8; 16]);
        backend.fail_texture(texture);

        let mut copy = backend.begin_texture_copy(texture, 0).unwrap();
        assert_eq!(copy.poll(), FencePoll::Lost);
    }

    #[test]
    fn test_buffer_copy_clamps_to_stored_data() {
        let backend = DummyBackend::new();
        let buffer = backend.add_buffer(&[5, 6]);

        let mut copy = backend.begin_buffer_copy(buffer, 100).unwrap();
        assert_eq!(copy.poll(), FencePoll::Signaled);
        assert_eq!(copy.map().unwrap().len(), 2);
    }

    #[test]
    fn test_handles_are_unique_across_kinds() {
        let backend = DummyBackend::new();
        let texture = backend.add_texture(1, 1, 1, 4, &[0u8; 4]);
        let buffer = backend.add_buffer(&[1]);
        assert_ne!(texture.raw(), buffer.raw());
    }
}
