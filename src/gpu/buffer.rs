//! GPU buffer transfer task.

use std::sync::{Arc, Mutex};

use crate::api::request::RequestId;
use crate::core::buffer::ResultBuffer;
use crate::core::task::{ReadbackTask, TaskStatus};
use crate::diagnostics;
use crate::gpu::copy::PendingCopy;
use crate::gpu::traits::{BufferHandle, ReadbackBackend, TransferError};

/// Reads a byte range of a GPU buffer back into a result buffer.
///
/// The caller declares the byte length up front; buffers have no
/// layout to introspect the way textures do.
pub(crate) struct BufferTask {
    id: RequestId,
    backend: Arc<dyn ReadbackBackend>,
    buffer: BufferHandle,
    byte_len: usize,
    status: TaskStatus,
    result: ResultBuffer,
    copy: Mutex<PendingCopy>,
    warn_on_truncation: bool,
}

impl BufferTask {
    pub(crate) fn new(
        id: RequestId,
        backend: Arc<dyn ReadbackBackend>,
        buffer: BufferHandle,
        byte_len: usize,
        result: ResultBuffer,
        warn_on_truncation: bool,
    ) -> Self {
        Self {
            id,
            backend,
            buffer,
            byte_len,
            status: TaskStatus::new(),
            result,
            copy: Mutex::new(PendingCopy::empty()),
            warn_on_truncation,
        }
    }

    fn start(&self) -> Result<(), TransferError> {
        if self.byte_len == 0 {
            return Err(TransferError::ZeroSized);
        }
        let staging = self.backend.begin_buffer_copy(self.buffer, self.byte_len)?;
        self.copy.lock().unwrap().install(staging);
        Ok(())
    }
}

impl ReadbackTask for BufferTask {
    fn begin(&self) {
        if let Err(err) = self.start() {
            diagnostics::emit_with_context(
                &diagnostics::RB101,
                &format!("request {} (buffer {}): {}", self.id, self.buffer.raw(), err),
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

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gpu::dummy::DummyBackend;

    fn task_for(backend: &Arc<DummyBackend>, buffer: BufferHandle, byte_len: usize) -> BufferTask {
        BufferTask::new(
            RequestId::from_raw(1),
            Arc::clone(backend) as Arc<dyn ReadbackBackend>,
            buffer,
            byte_len,
            ResultBuffer::unset(),
            true,
        )
    }

    #[test]
    fn test_buffer_round_trip() {
        let backend = Arc::new(DummyBackend::new());
        let payload = [1u8, 2, 3, 4, 5, 42];
        let buffer = backend.add_buffer(&payload);

        let task = task_for(&backend, buffer, payload.len());
        task.begin();
        task.advance();

        assert!(task.status().is_done());
        assert!(!task.status().has_error());
        task.result().with_bytes(|bytes| assert_eq!(bytes, &payload[..]));
    }

    #[test]
    fn test_zero_length_errors_at_begin() {
        let backend = Arc::new(DummyBackend::new());
        let buffer = backend.add_buffer(&[1, 2, 3]);

        let task = task_for(&backend, buffer, 0);
        diagnostics::suppress_diagnostics(true);
        task.begin();
        diagnostics::suppress_diagnostics(false);

        assert!(task.status().is_done());
        assert!(task.status().has_error());
    }

    #[test]
    fn test_unknown_buffer_errors_at_begin() {
        let backend = Arc::new(DummyBackend::new());
        let task = task_for(&backend, BufferHandle::new(404), 16);

        diagnostics::suppress_diagnostics(true);
        task.begin();
        diagnostics::suppress_diagnostics(false);

        assert!(task.status().has_error());
    }
}
