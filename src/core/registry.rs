//! The in-flight request registry.
//!
//! One mutex-guarded ordered table maps request ids to their transfer
//! tasks. Ids are handed out from an atomic counter, so the table
//! almost always appends at the tail; lookups are binary searches.
//! Disposal is deferred by one update cycle: a request observed done
//! stays readable until the update after next.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Weak};
use std::thread::ThreadId;

use crate::api::config::ReadbackConfig;
use crate::api::hooks::RequestHooks;
use crate::api::request::RequestId;
use crate::api::stats::ReadbackStats;
use crate::core::task::ReadbackTask;
use crate::core::waiters::WaitTable;
use crate::diagnostics;
use crate::sched::RenderScheduler;
use crate::sync::atomics::{AtomicCounter, AtomicGauge};
use crate::sync::mutex::Mutex;

struct Entry {
    id: RequestId,
    task: Arc<dyn ReadbackTask>,
}

struct RegistryInner {
    /// Live requests, sorted by id.
    entries: Vec<Entry>,
    /// Ids seen done last update, to be erased next update.
    pending_release: Vec<RequestId>,
}

#[derive(Default)]
struct Counters {
    created: AtomicCounter,
    completed: AtomicCounter,
    failed: AtomicCounter,
    disposed: AtomicCounter,
    bytes_copied: AtomicCounter,
    peak_in_flight: AtomicGauge,
}

/// Shared state behind every service handle and request handle.
pub(crate) struct Registry {
    inner: Mutex<RegistryInner>,
    next_id: AtomicU64,
    scheduler: std::sync::Mutex<Option<Arc<dyn RenderScheduler>>>,
    hooks: RequestHooks,
    waiters: WaitTable,
    /// Thread currently inside a scheduler-dispatched pass, if any.
    render_pass_thread: std::sync::Mutex<Option<ThreadId>>,
    counters: Counters,
    config: ReadbackConfig,
    weak_self: Weak<Registry>,
}

impl Registry {
    pub(crate) fn new(config: ReadbackConfig) -> Arc<Self> {
        Arc::new_cyclic(|weak| Self {
            inner: Mutex::new(RegistryInner {
                entries: Vec::with_capacity(config.initial_capacity),
                pending_release: Vec::new(),
            }),
            next_id: AtomicU64::new(1),
            scheduler: std::sync::Mutex::new(None),
            hooks: RequestHooks::new(),
            waiters: WaitTable::new(),
            render_pass_thread: std::sync::Mutex::new(None),
            counters: Counters::default(),
            config,
            weak_self: weak.clone(),
        })
    }

    pub(crate) fn config(&self) -> &ReadbackConfig {
        &self.config
    }

    pub(crate) fn hooks(&self) -> &RequestHooks {
        &self.hooks
    }

    // ==================== Scheduler bridge ====================

    pub(crate) fn set_scheduler(&self, scheduler: Arc<dyn RenderScheduler>) {
        *self.scheduler.lock().unwrap() = Some(scheduler);
    }

    pub(crate) fn clear_scheduler(&self) {
        *self.scheduler.lock().unwrap() = None;
    }

    /// Fetch the scheduler. Creating or updating requests without one
    /// is a contract violation, reported and then escalated to a panic.
    fn scheduler(&self) -> Arc<dyn RenderScheduler> {
        let guard = self.scheduler.lock().unwrap();
        match guard.as_ref() {
            Some(scheduler) => Arc::clone(scheduler),
            None => {
                diagnostics::emit(&diagnostics::RB001);
                panic!("no render scheduler registered");
            }
        }
    }

    fn schedule_advance(&self, id: RequestId) {
        let scheduler = self.scheduler();
        let registry = self.weak_self.clone();
        scheduler.schedule(
            id,
            Box::new(move || {
                if let Some(registry) = registry.upgrade() {
                    registry.advance_all();
                }
            }),
        );
    }

    // ==================== Creation ====================

    /// Allocate the next request id. Id 0 tags registry-wide callbacks
    /// and is skipped when the counter wraps.
    pub(crate) fn next_id(&self) -> RequestId {
        loop {
            let raw = self.next_id.fetch_add(1, Ordering::Relaxed);
            if raw != 0 {
                return RequestId::from_raw(raw);
            }
        }
    }

    /// Add a task under `id` and schedule its kickoff on the render
    /// thread. The table lock is released before scheduling.
    pub(crate) fn insert(&self, id: RequestId, task: Arc<dyn ReadbackTask>) {
        let scheduler = self.scheduler();
        {
            let mut inner = self.inner.lock();
            let entry = Entry { id, task };
            let tail_append = inner.entries.last().map_or(true, |last| last.id < id);
            if tail_append {
                inner.entries.push(entry);
            } else {
                // Only reachable after id wraparound.
                let at = inner.entries.partition_point(|e| e.id < id);
                inner.entries.insert(at, entry);
            }
            self.counters.created.increment();
            self.counters.peak_in_flight.update_max(inner.entries.len());
        }
        let registry = self.weak_self.clone();
        scheduler.schedule(
            id,
            Box::new(move || {
                if let Some(registry) = registry.upgrade() {
                    registry.begin_request(id);
                }
            }),
        );
    }

    /// Render thread: start the transfer for `id`, if it still exists.
    pub(crate) fn begin_request(&self, id: RequestId) {
        let task = match self.task_for(id) {
            Some(task) => task,
            None => return,
        };
        let _pass = self.enter_render_pass();
        task.begin();
        if task.status().has_error() {
            // Failed at kickoff; it will never reach a polling pass.
            self.counters.failed.increment();
            self.waiters.complete(id);
        }
    }

    // ==================== Render passes ====================

    /// Render thread: poll every started, unfinished task once.
    ///
    /// Tasks are snapshotted under the lock and advanced outside it, so
    /// backend calls never run under the registry mutex.
    pub(crate) fn advance_all(&self) {
        let runnable: Vec<(RequestId, Arc<dyn ReadbackTask>)> = {
            let inner = self.inner.lock();
            inner
                .entries
                .iter()
                .filter(|e| {
                    let status = e.task.status();
                    status.is_initialized() && !status.is_done()
                })
                .map(|e| (e.id, Arc::clone(&e.task)))
                .collect()
        };

        let _pass = self.enter_render_pass();
        for (id, task) in runnable {
            task.advance();
            let status = task.status();
            if status.is_done() {
                if status.has_error() {
                    self.counters.failed.increment();
                } else {
                    self.counters.completed.increment();
                    self.counters.bytes_copied.add(task.result().len() as u64);
                }
                self.hooks.fire_complete(id);
                self.waiters.complete(id);
            }
        }
        self.waiters.pulse_all();
    }

    /// Control thread: run one disposal cycle and schedule a render
    /// pass.
    ///
    /// Entries queued for release last cycle are erased now; entries
    /// observed done this cycle are queued for the next. A request is
    /// therefore readable for one full cycle after it is seen done.
    pub(crate) fn update_once(&self) {
        let scheduler = self.scheduler();

        let removed: Vec<(RequestId, Arc<dyn ReadbackTask>)> = {
            let mut guard = self.inner.lock();
            let inner = &mut *guard;

            let pending = std::mem::take(&mut inner.pending_release);
            let mut removed = Vec::with_capacity(pending.len());
            for id in pending {
                if let Ok(at) = inner.entries.binary_search_by_key(&id, |e| e.id) {
                    let entry = inner.entries.remove(at);
                    removed.push((entry.id, entry.task));
                }
            }

            for entry in &inner.entries {
                if entry.task.status().is_done() {
                    inner.pending_release.push(entry.id);
                }
            }

            removed
        };

        for (id, task) in removed {
            self.hooks.fire_destruct(id);
            self.waiters.complete(id);
            self.counters.disposed.increment();
            drop(task);
        }

        let registry = self.weak_self.clone();
        scheduler.schedule(
            RequestId::NONE,
            Box::new(move || {
                if let Some(registry) = registry.upgrade() {
                    registry.advance_all();
                }
            }),
        );
    }

    fn enter_render_pass(&self) -> RenderPassGuard<'_> {
        *self.render_pass_thread.lock().unwrap() = Some(std::thread::current().id());
        RenderPassGuard { registry: self }
    }

    fn assert_not_render_pass(&self) {
        let current = std::thread::current().id();
        if *self.render_pass_thread.lock().unwrap() == Some(current) {
            diagnostics::emit(&diagnostics::RB002);
            panic!("wait_for_completion called from inside a render pass");
        }
    }

    // ==================== Queries ====================

    fn task_for(&self, id: RequestId) -> Option<Arc<dyn ReadbackTask>> {
        let inner = self.inner.lock();
        inner
            .entries
            .binary_search_by_key(&id, |e| e.id)
            .ok()
            .map(|at| Arc::clone(&inner.entries[at].task))
    }

    pub(crate) fn exists(&self, id: RequestId) -> bool {
        let inner = self.inner.lock();
        inner.entries.binary_search_by_key(&id, |e| e.id).is_ok()
    }

    /// Done flag for `id`. Unknown ids read as done: the caller's
    /// request either never existed or was already disposed, and
    /// neither will ever make progress again.
    pub(crate) fn is_done(&self, id: RequestId) -> bool {
        let inner = self.inner.lock();
        match inner.entries.binary_search_by_key(&id, |e| e.id) {
            Ok(at) => inner.entries[at].task.status().is_done(),
            Err(_) => true,
        }
    }

    /// Error flag for `id`. Unknown ids read as errored, for the same
    /// reason they read as done.
    pub(crate) fn has_error(&self, id: RequestId) -> bool {
        let inner = self.inner.lock();
        match inner.entries.binary_search_by_key(&id, |e| e.id) {
            Ok(at) => inner.entries[at].task.status().has_error(),
            Err(_) => true,
        }
    }

    // ==================== Result access ====================

    /// Borrow the result bytes of a successfully finished request.
    pub(crate) fn with_data<R>(&self, id: RequestId, f: impl FnOnce(&[u8]) -> R) -> Option<R> {
        let task = self.task_for(id)?;
        let status = task.status();
        if !status.is_done() || status.has_error() {
            return None;
        }
        Some(task.result().with_bytes(f))
    }

    /// Pointer and length of the result bytes of a successfully
    /// finished request.
    pub(crate) fn data_ptr(&self, id: RequestId) -> Option<(*const u8, usize)> {
        let task = self.task_for(id)?;
        let status = task.status();
        if !status.is_done() || status.has_error() {
            return None;
        }
        Some(task.result().raw_parts())
    }

    // ==================== Blocking wait ====================

    /// Block until `id` is done, driving render passes through the
    /// scheduler. Returns immediately for finished or unknown ids.
    pub(crate) fn wait_for_completion(&self, id: RequestId) {
        self.assert_not_render_pass();
        if self.is_done(id) {
            return;
        }
        let channel = self.waiters.register(id);
        while !self.is_done(id) {
            let seen = channel.current_pass();
            self.schedule_advance(id);
            channel.wait_pass_after(seen);
        }
        self.waiters.complete(id);
    }

    // ==================== Statistics ====================

    pub(crate) fn stats(&self) -> ReadbackStats {
        let (in_flight, pending_release) = {
            let inner = self.inner.lock();
            (inner.entries.len(), inner.pending_release.len())
        };
        ReadbackStats {
            created: self.counters.created.get(),
            completed: self.counters.completed.get(),
            failed: self.counters.failed.get(),
            disposed: self.counters.disposed.get(),
            bytes_copied: self.counters.bytes_copied.get(),
            in_flight,
            pending_release,
            peak_in_flight: self.counters.peak_in_flight.get(),
        }
    }
}

struct RenderPassGuard<'a> {
    registry: &'a Registry,
}

impl Drop for RenderPassGuard<'_> {
    fn drop(&mut self) {
        *self.registry.render_pass_thread.lock().unwrap() = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::buffer::ResultBuffer;
    use crate::core::task::TaskStatus;
    use crate::sched::CallbackQueue;
    use std::sync::atomic::AtomicU32;

    /// Task that completes after a fixed number of advances.
    struct StubTask {
        status: TaskStatus,
        result: ResultBuffer,
        polls_left: AtomicU32,
        payload: Vec<u8>,
    }

    impl StubTask {
        fn new(polls: u32, payload: Vec<u8>) -> Arc<Self> {
            Arc::new(Self {
                status: TaskStatus::new(),
                result: ResultBuffer::unset(),
                polls_left: AtomicU32::new(polls),
                payload,
            })
        }
    }

    impl ReadbackTask for StubTask {
        fn begin(&self) {
            self.status.mark_initialized();
        }

        fn advance(&self) {
            if self.polls_left.fetch_sub(1, Ordering::SeqCst) <= 1 {
                self.result.write(&self.payload);
                self.status.mark_done();
            }
        }

        fn status(&self) -> &TaskStatus {
            &self.status
        }

        fn result(&self) -> &ResultBuffer {
            &self.result
        }
    }

    fn registry_with_queue() -> (Arc<Registry>, Arc<CallbackQueue>) {
        let registry = Registry::new(ReadbackConfig::default());
        let queue = CallbackQueue::new();
        registry.set_scheduler(queue.clone());
        (registry, queue)
    }

    #[test]
    fn test_insert_appends_at_tail() {
        let (registry, _queue) = registry_with_queue();
        for _ in 0..3 {
            let id = registry.next_id();
            registry.insert(id, StubTask::new(1, vec![]));
        }
        let inner = registry.inner.lock();
        let ids: Vec<u64> = inner.entries.iter().map(|e| e.id.raw()).collect();
        assert_eq!(ids, vec![1, 2, 3]);
    }

    #[test]
    fn test_out_of_order_insert_keeps_table_sorted() {
        let (registry, _queue) = registry_with_queue();
        registry.insert(RequestId::from_raw(5), StubTask::new(1, vec![]));
        registry.insert(RequestId::from_raw(3), StubTask::new(1, vec![]));
        registry.insert(RequestId::from_raw(4), StubTask::new(1, vec![]));

        let inner = registry.inner.lock();
        let ids: Vec<u64> = inner.entries.iter().map(|e| e.id.raw()).collect();
        assert_eq!(ids, vec![3, 4, 5]);
    }

    #[test]
    fn test_id_allocation_skips_zero_on_wrap() {
        let (registry, _queue) = registry_with_queue();
        registry.next_id.store(u64::MAX, Ordering::Relaxed);
        assert_eq!(registry.next_id().raw(), u64::MAX);
        assert_eq!(registry.next_id().raw(), 1);
    }

    #[test]
    fn test_unknown_id_reads_done_and_errored() {
        let (registry, _queue) = registry_with_queue();
        let id = RequestId::from_raw(42);
        assert!(!registry.exists(id));
        assert!(registry.is_done(id));
        assert!(registry.has_error(id));
        assert!(registry.with_data(id, |_| ()).is_none());
        assert!(registry.data_ptr(id).is_none());
    }

    #[test]
    fn test_full_lifecycle_with_deferred_disposal() {
        let (registry, queue) = registry_with_queue();
        let id = registry.next_id();
        registry.insert(id, StubTask::new(1, vec![1, 2, 3]));

        queue.run_pending(); // kickoff
        assert!(!registry.is_done(id));

        registry.update_once(); // nothing done yet; schedules a pass
        queue.run_pending(); // pass completes the task
        assert!(registry.is_done(id));
        assert!(!registry.has_error(id));
        assert_eq!(registry.with_data(id, |b| b.to_vec()), Some(vec![1, 2, 3]));

        registry.update_once(); // queues for release
        assert!(registry.exists(id));
        assert_eq!(registry.with_data(id, |b| b.len()), Some(3));

        registry.update_once(); // erases
        assert!(!registry.exists(id));
        assert!(registry.is_done(id));
        assert!(registry.has_error(id));
    }

    #[test]
    fn test_advance_skips_unstarted_tasks() {
        let (registry, queue) = registry_with_queue();
        let id = registry.next_id();
        registry.insert(id, StubTask::new(1, vec![]));

        // Kickoff callback still queued; a pass must not touch the task.
        registry.advance_all();
        assert!(!registry.is_done(id));

        queue.run_pending();
        registry.advance_all();
        assert!(registry.is_done(id));
    }

    #[test]
    fn test_wait_blocks_until_done() {
        let (registry, queue) = registry_with_queue();
        let id = registry.next_id();
        registry.insert(id, StubTask::new(3, vec![7]));
        queue.run_pending(); // kickoff

        let waiter = {
            let registry = Arc::clone(&registry);
            std::thread::spawn(move || {
                registry.wait_for_completion(id);
                registry.is_done(id)
            })
        };

        // Play the render thread until the waiter-driven passes finish
        // the task.
        while !registry.is_done(id) {
            queue.run_pending();
            std::thread::yield_now();
        }
        assert!(waiter.join().expect("Thread panicked"));
    }

    #[test]
    fn test_wait_returns_for_unknown_and_finished_ids() {
        let (registry, queue) = registry_with_queue();
        registry.wait_for_completion(RequestId::from_raw(99));

        let id = registry.next_id();
        registry.insert(id, StubTask::new(1, vec![]));
        queue.run_pending();
        registry.advance_all();
        assert!(registry.is_done(id));
        registry.wait_for_completion(id);
    }

    #[test]
    #[should_panic(expected = "no render scheduler registered")]
    fn test_insert_without_scheduler_panics() {
        let registry = Registry::new(ReadbackConfig::default());
        diagnostics::suppress_diagnostics(true);
        registry.insert(RequestId::from_raw(1), StubTask::new(1, vec![]));
    }

    #[test]
    fn test_stats_track_lifecycle() {
        let (registry, queue) = registry_with_queue();
        let id = registry.next_id();
        registry.insert(id, StubTask::new(1, vec![0u8; 8]));
        queue.run_pending();
        registry.update_once();
        queue.run_pending();

        let stats = registry.stats();
        assert_eq!(stats.created, 1);
        assert_eq!(stats.completed, 1);
        assert_eq!(stats.failed, 0);
        assert_eq!(stats.bytes_copied, 8);
        assert_eq!(stats.in_flight, 1);
        assert_eq!(stats.peak_in_flight, 1);

        registry.update_once();
        registry.update_once();
        let stats = registry.stats();
        assert_eq!(stats.disposed, 1);
        assert_eq!(stats.in_flight, 0);
        assert_eq!(stats.pending_release, 0);
    }
}
