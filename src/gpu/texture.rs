//! Texture transfer task.

use std::sync::{Arc, Mutex};

use crate::api::request::RequestId;
use crate::core::buffer::ResultBuffer;
use crate::core::task::{ReadbackTask, TaskStatus};
use crate::diagnostics;
use crate::gpu::copy::PendingCopy;
use crate::gpu::traits::{ReadbackBackend, TextureHandle, TransferError};

/// Reads one mip level of a texture back into a result buffer.
///
/// `begin` introspects the texture to validate its layout, then hands
/// the copy to the backend. The tracked mip level is copied tightly
/// packed, width * height * depth * bytes_per_pixel bytes.
pub(crate) struct TextureTask {
    id: RequestId,
    backend: Arc<dyn ReadbackBackend>,
    texture: TextureHandle,
    mip_level: u32,
    status: TaskStatus,
    result: ResultBuffer,
    copy: Mutex<PendingCopy>,
    warn_on_truncation: bool,
}

impl TextureTask {
    pub(crate) fn new(
        id: RequestId,
        backend: Arc<dyn ReadbackBackend>,
        texture: TextureHandle,
        mip_level: u32,
        result: ResultBuffer,
        warn_on_truncation: bool,
    ) -> Self {
        Self {
            id,
            backend,
            texture,
            mip_level,
            status: TaskStatus::new(),
            result,
            copy: Mutex::new(PendingCopy::empty()),
            warn_on_truncation,
        }
    }

    fn start(&self) -> Result<(), TransferError> {
        let info = self.backend.texture_info(self.texture, self.mip_level)?;
        if info.byte_len() == 0 {
            return Err(TransferError::UnsupportedFormat);
        }
        let staging = self
            .backend
            .begin_texture_copy(self.texture, self.mip_level)?;
        self.copy.lock().unwrap().install(staging);
        Ok(())
    }
}

impl ReadbackTask for TextureTask {
    fn begin(&self) {
        if let Err(err) = self.start() {
            diagnostics::emit_with_context(
                &diagnostics::RB101,
                &format!("request {} (texture {}): {}", self.id, self.texture.raw(), err),
            );
            self.status.mark_error();
        }
        self.status.mark_initialized();
    }

    fn advance(&self) {
        self.copy.lock().unwrap().poll_once(
            self.id,
            &self.status,
            &self.result,
            self.warn_on_truncation,
        );
    }

    fn status(&self) -> &TaskStatus {
        &self.status
    }

    fn result(&self) -> &ResultBuffer {
        &self.result
    }
}
