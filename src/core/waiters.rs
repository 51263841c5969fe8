//! Per-request wait channels for blocking completion waits.
//!
//! A waiter parks on the channel for its request id and is woken either
//! when that request completes or whenever a render pass finishes, so it
//! can re-check the request flags. Channels are created on first wait
//! and removed at completion.

use std::collections::HashMap;
use std::sync::{Arc, Condvar, Mutex};

use crate::api::request::RequestId;

struct ChannelState {
    completed: bool,
    /// Render passes observed so far. Waiters use this to detect a pass
    /// that finished between scheduling and parking.
    passes: u64,
}

/// Wake-up channel shared by all waiters of one request.
pub(crate) struct WaitChannel {
    state: Mutex<ChannelState>,
    cvar: Condvar,
}

impl WaitChannel {
    fn new() -> Self {
        Self {
            state: Mutex::new(ChannelState {
                completed: false,
                passes: 0,
            }),
            cvar: Condvar::new(),
        }
    }

    /// Pass count to capture before scheduling an advance.
    pub(crate) fn current_pass(&self) -> u64 {
        self.state.lock().unwrap().passes
    }

    /// Park until the request completes or a render pass newer than
    /// `seen` finishes.
    pub(crate) fn wait_pass_after(&self, seen: u64) {
        let mut state = self.state.lock().unwrap();
        while !state.completed && state.passes == seen {
            state = self.cvar.wait(state).unwrap();
        }
    }

    fn mark_completed(&self) {
        let mut state = self.state.lock().unwrap();
        state.completed = true;
        drop(state);
        self.cvar.notify_all();
    }

    fn pulse(&self) {
        let mut state = self.state.lock().unwrap();
        state.passes += 1;
        drop(state);
        self.cvar.notify_all();
    }
}

/// Registry-wide table of wait channels, keyed by request id.
pub(crate) struct WaitTable {
    channels: Mutex<HashMap<u64, Arc<WaitChannel>>>,
}

impl WaitTable {
    pub(crate) fn new() -> Self {
        Self {
            channels: Mutex::new(HashMap::new()),
        }
    }

    /// Get or create the channel for `id`.
    pub(crate) fn register(&self, id: RequestId) -> Arc<WaitChannel> {
        let mut channels = self.channels.lock().unwrap();
        Arc::clone(
            channels
                .entry(id.raw())
                .or_insert_with(|| Arc::new(WaitChannel::new())),
        )
    }

    /// Mark `id` completed and drop its channel. Wakes every waiter.
    /// Safe to call for ids that were never waited on.
    pub(crate) fn complete(&self, id: RequestId) {
        let channel = self.channels.lock().unwrap().remove(&id.raw());
        if let Some(channel) = channel {
            channel.mark_completed();
        }
    }

    /// Record a finished render pass on every live channel so parked
    /// waiters re-check their request flags.
    pub(crate) fn pulse_all(&self) {
        let channels: Vec<Arc<WaitChannel>> =
            self.channels.lock().unwrap().values().cloned().collect();
        for channel in channels {
            channel.pulse();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;
    use std::time::Duration;

    #[test]
    fn test_complete_wakes_waiter() {
        let table = Arc::new(WaitTable::new());
        let id = RequestId::from_raw(1);
        let channel = table.register(id);

        let waiter = {
            let channel = Arc::clone(&channel);
            thread::spawn(move || {
                let seen = channel.current_pass();
                channel.wait_pass_after(seen);
            })
        };

        thread::sleep(Duration::from_millis(20));
        table.complete(id);
        waiter.join().expect("Thread panicked");
    }

    #[test]
    fn test_pulse_wakes_waiter_without_completing() {
        let table = Arc::new(WaitTable::new());
        let channel = table.register(RequestId::from_raw(2));

        let waiter = {
            let channel = Arc::clone(&channel);
            thread::spawn(move || {
                let seen = channel.current_pass();
                channel.wait_pass_after(seen);
                channel.current_pass()
            })
        };

        thread::sleep(Duration::from_millis(20));
        table.pulse_all();
        let passes = waiter.join().expect("Thread panicked");
        assert_eq!(passes, 1);
    }

    #[test]
    fn test_wait_returns_immediately_after_missed_pass() {
        let channel = WaitChannel::new();
        let seen = channel.current_pass();
        channel.pulse();
        // The pass we were waiting for already happened; must not park.
        channel.wait_pass_after(seen);
    }

    #[test]
    fn test_completed_channel_never_parks() {
        let table = WaitTable::new();
        let id = RequestId::from_raw(3);
        let channel = table.register(id);
        table.complete(id);
        channel.wait_pass_after(channel.current_pass());
    }

    #[test]
    fn test_register_returns_shared_channel() {
        let table = WaitTable::new();
        let a = table.register(RequestId::from_raw(4));
        let b = table.register(RequestId::from_raw(4));
        assert!(Arc::ptr_eq(&a, &b));
    }
}
