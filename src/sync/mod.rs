//! Synchronization primitives.
//!
//! Thin wrappers over std or parking_lot mutexes, plus the atomic
//! counters backing the service statistics.

pub(crate) mod atomics;
pub(crate) mod mutex;
