//! Registry internals: task state, result storage and the id table.

pub(crate) mod buffer;
pub(crate) mod registry;
pub(crate) mod task;
pub(crate) mod waiters;
