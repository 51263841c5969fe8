//! Relaxed atomic counters behind the service statistics.
//!
//! Statistics are advisory. Every access is `Relaxed`: each counter is
//! consistent with itself, but a snapshot across counters is not a
//! linearizable cut. That is enough for overlays and tests.

use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};

/// Monotonic event counter.
pub struct AtomicCounter(AtomicU64);

impl AtomicCounter {
    pub const fn new(initial: u64) -> Self {
        Self(AtomicU64::new(initial))
    }

    /// Count one event.
    pub fn increment(&self) {
        self.add(1);
    }

    /// Count `value` events at once, e.g. a byte total.
    pub fn add(&self, value: u64) {
        self.0.fetch_add(value, Ordering::Relaxed);
    }

    pub fn get(&self) -> u64 {
        self.0.load(Ordering::Relaxed)
    }
}

impl Default for AtomicCounter {
    fn default() -> Self {
        Self::new(0)
    }
}

/// High-water mark. Only ever raised.
pub struct AtomicGauge(AtomicUsize);

impl AtomicGauge {
    pub const fn new(initial: usize) -> Self {
        Self(AtomicUsize::new(initial))
    }

    pub fn get(&self) -> usize {
        self.0.load(Ordering::Relaxed)
    }

    /// Raise the mark to `value` if it exceeds the current one.
    pub fn update_max(&self, value: usize) {
        self.0.fetch_max(value, Ordering::Relaxed);
    }
}

impl Default for AtomicGauge {
    fn default() -> Self {
        Self::new(0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_counter_increment_and_add() {
        let counter = AtomicCounter::new(0);
        counter.increment();
        counter.add(5);
        assert_eq!(counter.get(), 6);
    }

    #[test]
    fn test_default_matches_new_zero() {
        assert_eq!(AtomicCounter::default().get(), AtomicCounter::new(0).get());
        assert_eq!(AtomicGauge::default().get(), AtomicGauge::new(0).get());
    }

    #[test]
    fn test_gauge_update_max_only_raises() {
        let gauge = AtomicGauge::new(0);
        gauge.update_max(10);
        gauge.update_max(5);
        assert_eq!(gauge.get(), 10);
        gauge.update_max(20);
        assert_eq!(gauge.get(), 20);
    }

    #[test]
    fn test_gauge_update_max_under_contention() {
        use std::sync::Arc;
        use std::thread;

        let gauge = Arc::new(AtomicGauge::new(0));
        let handles: Vec<_> = (1..=8u32)
            .map(|n| {
                let gauge = Arc::clone(&gauge);
                thread::spawn(move || {
                    for i in 0..100 {
                        gauge.update_max((n as usize) * 100 + i);
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().expect("Thread panicked");
        }
        assert_eq!(gauge.get(), 899);
    }
}
