//! The readback service.

use std::sync::Arc;

use crate::api::config::ReadbackConfig;
use crate::api::request::{ReadbackRequest, RequestId};
use crate::api::stats::ReadbackStats;
use crate::core::buffer::ResultBuffer;
use crate::core::registry::Registry;
use crate::core::task::ReadbackTask;
use crate::gpu::buffer::BufferTask;
use crate::gpu::texture::TextureTask;
use crate::gpu::traits::{BufferHandle, ReadbackBackend, TextureHandle};
use crate::sched::RenderScheduler;

/// Asynchronous GPU readback service.
///
/// Tracks every in-flight readback request against an injected
/// rendering backend. The service never blocks on the GPU: requests are
/// started and polled in small render-thread callbacks dispatched
/// through the registered [`RenderScheduler`], while any thread may
/// poll request state or read finished results.
///
/// Cloning is cheap and every clone shares the same registry. Dropping
/// the last clone tears the registry down; requests still in flight are
/// released along with their backend staging resources.
///
/// # Example
///
/// ```no_run
/// use std::sync::Arc;
/// use readback::{AsyncReadback, CallbackQueue, DummyBackend, ReadbackConfig};
///
/// let backend = Arc::new(DummyBackend::new());
/// let texture = backend.add_texture(4, 4, 1, 4, &[0u8; 64]);
///
/// let readback = AsyncReadback::new(backend, ReadbackConfig::default());
/// let queue = CallbackQueue::new();
/// readback.set_scheduler(queue.clone());
///
/// let request = readback.create_texture_transfer(texture, 0);
///
/// // Render thread, once per frame:
/// queue.run_pending();
/// // Control thread, once per frame:
/// readback.update_once();
///
/// if request.done() && !request.has_error() {
///     let len = request.with_data(|bytes| bytes.len());
///     println!("read {:?} bytes", len);
/// }
/// ```
#[derive(Clone)]
pub struct AsyncReadback {
    registry: Arc<Registry>,
    backend: Arc<dyn ReadbackBackend>,
}

impl AsyncReadback {
    /// Create a service over `backend` with the given configuration.
    pub fn new(backend: Arc<dyn ReadbackBackend>, config: ReadbackConfig) -> Self {
        Self {
            registry: Registry::new(config),
            backend,
        }
    }

    /// Create a service over `backend` with the default configuration.
    pub fn with_defaults(backend: Arc<dyn ReadbackBackend>) -> Self {
        Self::new(backend, ReadbackConfig::default())
    }

    // ==================== Scheduler bridge ====================

    /// Register the bridge that runs callbacks on the render thread.
    ///
    /// Must be called before any request is created. Replacing the
    /// scheduler is allowed; callbacks already handed to the old one
    /// still run wherever it runs them.
    pub fn set_scheduler(&self, scheduler: Arc<dyn RenderScheduler>) {
        self.registry.set_scheduler(scheduler);
    }

    /// Remove the scheduler bridge, e.g. ahead of render thread
    /// shutdown. Creating or updating requests afterwards panics until
    /// a new one is registered.
    pub fn clear_scheduler(&self) {
        self.registry.clear_scheduler();
    }

    // ==================== Request creation ====================

    /// Request a readback of one mip level of `texture`.
    ///
    /// Returns immediately; the copy starts on the render thread during
    /// the next scheduled callback. The result buffer is allocated by
    /// the service, sized to the bytes the backend produces.
    pub fn create_texture_transfer(
        &self,
        texture: TextureHandle,
        mip_level: u32,
    ) -> ReadbackRequest {
        self.create_texture(texture, mip_level, ResultBuffer::unset())
    }

    /// Request a readback of one mip level of `texture` into a
    /// caller-owned buffer of `dst_len` bytes at `dst`.
    ///
    /// If the backend produces more than `dst_len` bytes the copy is
    /// clamped and a truncation diagnostic is emitted; the request still
    /// completes successfully with the clamped length.
    ///
    /// # Safety
    ///
    /// `dst` must point to `dst_len` bytes that stay valid and are not
    /// read or written by anything else until the request is disposed
    /// (or the last service clone is dropped).
    pub unsafe fn create_texture_transfer_into(
        &self,
        dst: *mut u8,
        dst_len: usize,
        texture: TextureHandle,
        mip_level: u32,
    ) -> ReadbackRequest {
        self.create_texture(texture, mip_level, ResultBuffer::external(dst, dst_len))
    }

    /// Request a readback of the first `byte_len` bytes of `buffer`.
    pub fn create_buffer_transfer(
        &self,
        buffer: BufferHandle,
        byte_len: usize,
    ) -> ReadbackRequest {
        self.create_buffer(buffer, byte_len, ResultBuffer::unset())
    }

    /// Request a readback of the first `byte_len` bytes of `buffer`
    /// into a caller-owned destination.
    ///
    /// # Safety
    ///
    /// Same contract as
    /// [`create_texture_transfer_into`](Self::create_texture_transfer_into).
    pub unsafe fn create_buffer_transfer_into(
        &self,
        dst: *mut u8,
        dst_len: usize,
        buffer: BufferHandle,
        byte_len: usize,
    ) -> ReadbackRequest {
        self.create_buffer(buffer, byte_len, ResultBuffer::external(dst, dst_len))
    }

    fn create_texture(
        &self,
        texture: TextureHandle,
        mip_level: u32,
        result: ResultBuffer,
    ) -> ReadbackRequest {
        let id = self.registry.next_id();
        let task = TextureTask::new(
            id,
            Arc::clone(&self.backend),
            texture,
            mip_level,
            result,
            self.registry.config().warn_on_truncation,
        );
        self.registry.insert(id, Arc::new(task) as Arc<dyn ReadbackTask>);
        ReadbackRequest::new(id, Arc::clone(&self.registry))
    }

    fn create_buffer(
        &self,
        buffer: BufferHandle,
        byte_len: usize,
        result: ResultBuffer,
    ) -> ReadbackRequest {
        let id = self.registry.next_id();
        let task = BufferTask::new(
            id,
            Arc::clone(&self.backend),
            buffer,
            byte_len,
            result,
            self.registry.config().warn_on_truncation,
        );
        self.registry.insert(id, Arc::new(task) as Arc<dyn ReadbackTask>);
        ReadbackRequest::new(id, Arc::clone(&self.registry))
    }

    /// Re-wrap an id, e.g. one received over FFI, as a request handle.
    pub fn request(&self, id: RequestId) -> ReadbackRequest {
        ReadbackRequest::new(id, Arc::clone(&self.registry))
    }

    // ==================== Request state ====================

    /// Check whether `id` is still in the registry.
    pub fn exists(&self, id: RequestId) -> bool {
        self.registry.exists(id)
    }

    /// Check whether `id` finished, successfully or not. Unknown and
    /// disposed ids read as done.
    pub fn is_done(&self, id: RequestId) -> bool {
        self.registry.is_done(id)
    }

    /// Check whether `id` failed. Unknown and disposed ids read as
    /// errored.
    pub fn has_error(&self, id: RequestId) -> bool {
        self.registry.has_error(id)
    }

    /// Borrow the result bytes of a successful transfer. See
    /// [`ReadbackRequest::with_data`].
    pub fn with_data<R>(&self, id: RequestId, f: impl FnOnce(&[u8]) -> R) -> Option<R> {
        self.registry.with_data(id, f)
    }

    /// Pointer and length of the result bytes of a successful transfer.
    /// See [`ReadbackRequest::data_ptr`].
    pub fn data_ptr(&self, id: RequestId) -> Option<(*const u8, usize)> {
        self.registry.data_ptr(id)
    }

    /// Block until `id` finishes. See [`ReadbackRequest::wait`].
    pub fn wait_for_completion(&self, id: RequestId) {
        self.registry.wait_for_completion(id);
    }

    // ==================== Frame driving ====================

    /// Run one render pass now, on the calling thread.
    ///
    /// Hosts that own their render loop can call this directly instead
    /// of routing the registry's scheduled passes through a queue; every
    /// started, unfinished request is polled once.
    pub fn advance_all(&self) {
        self.registry.advance_all();
    }

    /// Run one update cycle from the control thread.
    ///
    /// Erases requests queued for release last cycle, queues requests
    /// now observed done, and schedules one render pass. Call once per
    /// frame. A finished request stays readable until the second update
    /// after its completion was observed.
    pub fn update_once(&self) {
        self.registry.update_once();
    }

    // ==================== Hooks ====================

    /// Set the completion hook, replacing any previous one. Runs on the
    /// render thread each time a request finishes during a render pass.
    pub fn on_complete<F>(&self, hook: F)
    where
        F: Fn(RequestId) + Send + Sync + 'static,
    {
        self.registry.hooks().set_on_complete(hook);
    }

    /// Remove the completion hook.
    pub fn clear_on_complete(&self) {
        self.registry.hooks().clear_on_complete();
    }

    /// Set the disposal hook, replacing any previous one. Runs on the
    /// control thread as update_once erases each request.
    pub fn on_destruct<F>(&self, hook: F)
    where
        F: Fn(RequestId) + Send + Sync + 'static,
    {
        self.registry.hooks().set_on_destruct(hook);
    }

    /// Remove the disposal hook.
    pub fn clear_on_destruct(&self) {
        self.registry.hooks().clear_on_destruct();
    }

    // ==================== Statistics ====================

    /// Snapshot the service statistics.
    pub fn stats(&self) -> ReadbackStats {
        self.registry.stats()
    }
}
