//! Lock-free callback queue for manually pumped render threads.

use std::sync::Arc;

use crossbeam_queue::SegQueue;

use super::{RenderCallback, RenderScheduler};
use crate::api::request::RequestId;

struct Scheduled {
    id: RequestId,
    callback: RenderCallback,
}

/// A [`RenderScheduler`] backed by a lock-free queue.
///
/// Any thread may schedule; the host drains the queue from its render
/// thread once per frame with [`run_pending`](CallbackQueue::run_pending).
/// Callbacks run in submission order.
pub struct CallbackQueue {
    queue: SegQueue<Scheduled>,
}

impl CallbackQueue {
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            queue: SegQueue::new(),
        })
    }

    /// Run the oldest pending callback, returning its tag.
    pub fn run_one(&self) -> Option<RequestId> {
        let next = self.queue.pop()?;
        (next.callback)();
        Some(next.id)
    }

    /// Run every callback queued so far. Returns how many ran.
    pub fn run_pending(&self) -> usize {
        let mut ran = 0;
        while self.run_one().is_some() {
            ran += 1;
        }
        ran
    }

    /// Check if the queue is empty.
    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }

    /// Number of callbacks waiting to run.
    pub fn len(&self) -> usize {
        self.queue.len()
    }
}

impl RenderScheduler for CallbackQueue {
    fn schedule(&self, id: RequestId, callback: RenderCallback) {
        self.queue.push(Scheduled { id, callback });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::thread;

    #[test]
    fn test_callbacks_run_in_submission_order() {
        let queue = CallbackQueue::new();
        let order = Arc::new(std::sync::Mutex::new(Vec::new()));

        for n in 0..4 {
            let order = Arc::clone(&order);
            queue.schedule(
                RequestId::from_raw(n + 1),
                Box::new(move || order.lock().unwrap().push(n)),
            );
        }

        assert_eq!(queue.len(), 4);
        assert_eq!(queue.run_pending(), 4);
        assert!(queue.is_empty());
        assert_eq!(*order.lock().unwrap(), vec![0, 1, 2, 3]);
    }

    #[test]
    fn test_run_one_reports_the_tag() {
        let queue = CallbackQueue::new();
        queue.schedule(RequestId::from_raw(7), Box::new(|| {}));
        queue.schedule(RequestId::NONE, Box::new(|| {}));

        assert_eq!(queue.run_one(), Some(RequestId::from_raw(7)));
        assert_eq!(queue.run_one(), Some(RequestId::NONE));
        assert_eq!(queue.run_one(), None);
    }

    #[test]
    fn test_schedule_from_multiple_threads() {
        let queue = CallbackQueue::new();
        let ran = Arc::new(AtomicUsize::new(0));

        let handles: Vec<_> = (0..4)
            .map(|_| {
                let queue = Arc::clone(&queue);
                let ran = Arc::clone(&ran);
                thread::spawn(move || {
                    for _ in 0..100 {
                        let ran = Arc::clone(&ran);
                        queue.schedule(
                            RequestId::NONE,
                            Box::new(move || {
                                ran.fetch_add(1, Ordering::Relaxed);
                            }),
                        );
                    }
                })
            })
            .collect();

        for handle in handles {
            handle.join().expect("Thread panicked");
        }

        assert_eq!(queue.run_pending(), 400);
        assert_eq!(ran.load(Ordering::Relaxed), 400);
    }
}
