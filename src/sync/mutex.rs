//! The registry lock.
//!
//! `sync::Mutex` resolves to `parking_lot::Mutex` when the `parking_lot`
//! feature is on, and to a thin std wrapper otherwise. The wrapper folds
//! the poison check away so both arms expose the same guard-returning
//! `lock()`.

#[cfg(feature = "parking_lot")]
pub use parking_lot::{Mutex, MutexGuard};

#[cfg(not(feature = "parking_lot"))]
pub struct Mutex<T>(std::sync::Mutex<T>);

#[cfg(not(feature = "parking_lot"))]
pub struct MutexGuard<'a, T>(std::sync::MutexGuard<'a, T>);

#[cfg(not(feature = "parking_lot"))]
impl<T> Mutex<T> {
    pub const fn new(value: T) -> Self {
        Self(std::sync::Mutex::new(value))
    }

    pub fn lock(&self) -> MutexGuard<'_, T> {
        MutexGuard(self.0.lock().expect("Mutex poisoned"))
    }
}

#[cfg(not(feature = "parking_lot"))]
impl<T> std::ops::Deref for MutexGuard<'_, T> {
    type Target = T;

    fn deref(&self) -> &T {
        &self.0
    }
}

#[cfg(not(feature = "parking_lot"))]
impl<T> std::ops::DerefMut for MutexGuard<'_, T> {
    fn deref_mut(&mut self) -> &mut T {
        &mut self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lock_round_trip() {
        let mutex = Mutex::new(7u32);
        {
            let mut guard = mutex.lock();
            *guard += 1;
        }
        assert_eq!(*mutex.lock(), 8);
    }
}
