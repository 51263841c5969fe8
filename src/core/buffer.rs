//! Result storage for finished transfers.
//!
//! A result buffer starts out either unset (the service allocates it
//! lazily, sized to the bytes the backend actually produced) or borrowed
//! (the caller supplied a destination region up front). Writes are
//! clamped to the destination length and the written span is tracked so
//! readers never observe uninitialized bytes.

use std::sync::Mutex;

enum Storage {
    /// No storage yet; allocated on first write.
    Unset,
    /// Caller-owned region. Never freed by this crate.
    Borrowed { ptr: *mut u8, len: usize },
    /// Service-owned storage, allocated to the exact result size.
    Owned(Box<[u8]>),
}

impl Storage {
    fn as_mut_slice(&mut self) -> &mut [u8] {
        match self {
            Storage::Unset => &mut [],
            Storage::Borrowed { ptr, len } => unsafe {
                std::slice::from_raw_parts_mut(*ptr, *len)
            },
            Storage::Owned(bytes) => bytes,
        }
    }
}

struct BufferState {
    storage: Storage,
    /// Bytes written by the transfer. Readers see only this prefix.
    written: usize,
}

// SAFETY: the raw pointer is either crate-owned storage or a caller
// region whose validity and exclusive use are the create_*_into()
// contract; every access is serialized by the state mutex.
unsafe impl Send for BufferState {}

/// Destination for one transfer's bytes.
///
/// Guarded by its own mutex so result reads never contend with the
/// registry lock.
pub(crate) struct ResultBuffer {
    state: Mutex<BufferState>,
}

impl ResultBuffer {
    /// Buffer that will be allocated when the transfer lands.
    pub(crate) fn unset() -> Self {
        Self {
            state: Mutex::new(BufferState {
                storage: Storage::Unset,
                written: 0,
            }),
        }
    }

    /// Buffer backed by a caller-owned region of `len` bytes at `ptr`.
    ///
    /// The caller keeps ownership; the region must stay valid and
    /// otherwise untouched until the request is disposed.
    pub(crate) fn external(ptr: *mut u8, len: usize) -> Self {
        Self {
            state: Mutex::new(BufferState {
                storage: Storage::Borrowed { ptr, len },
                written: 0,
            }),
        }
    }

    /// Copy `src` into the buffer, clamping to the destination length.
    ///
    /// Allocates owned storage sized to `src` if the buffer is unset.
    /// Returns the number of bytes written.
    pub(crate) fn write(&self, src: &[u8]) -> usize {
        let mut guard = self.state.lock().unwrap();
        let state = &mut *guard;
        if matches!(state.storage, Storage::Unset) {
            state.storage = Storage::Owned(vec![0u8; src.len()].into_boxed_slice());
        }
        let dst = state.storage.as_mut_slice();
        let n = src.len().min(dst.len());
        dst[..n].copy_from_slice(&src[..n]);
        state.written = n;
        n
    }

    /// Run `f` over the written bytes while holding the buffer lock.
    pub(crate) fn with_bytes<R>(&self, f: impl FnOnce(&[u8]) -> R) -> R {
        let guard = self.state.lock().unwrap();
        let bytes = match &guard.storage {
            Storage::Unset => &[],
            Storage::Borrowed { ptr, .. } => unsafe {
                std::slice::from_raw_parts(*ptr as *const u8, guard.written)
            },
            Storage::Owned(bytes) => &bytes[..guard.written],
        };
        f(bytes)
    }

    /// Base pointer and written length of the result.
    ///
    /// For borrowed storage the pointer is the caller's own region.
    pub(crate) fn raw_parts(&self) -> (*const u8, usize) {
        let guard = self.state.lock().unwrap();
        let ptr = match &guard.storage {
            Storage::Unset => std::ptr::null(),
            Storage::Borrowed { ptr, .. } => *ptr as *const u8,
            Storage::Owned(bytes) => bytes.as_ptr(),
        };
        (ptr, guard.written)
    }

    /// Number of bytes written so far.
    pub(crate) fn len(&self) -> usize {
        self.state.lock().unwrap().written
    }
}
