//! Completion and disposal notification hooks.
//!
//! One slot per event. Hooks run on the thread that drove the
//! transition: on_complete on the render thread, on_destruct on the
//! control thread that called update_once.

use std::sync::{Arc, Mutex};

use crate::api::request::RequestId;

type Hook = Arc<dyn Fn(RequestId) + Send + Sync>;

#[derive(Default)]
pub(crate) struct RequestHooks {
    on_complete: Mutex<Option<Hook>>,
    on_destruct: Mutex<Option<Hook>>,
}

impl RequestHooks {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn set_on_complete<F>(&self, hook: F)
    where
        F: Fn(RequestId) + Send + Sync + 'static,
    {
        *self.on_complete.lock().unwrap() = Some(Arc::new(hook));
    }

    pub(crate) fn clear_on_complete(&self) {
        *self.on_complete.lock().unwrap() = None;
    }

    pub(crate) fn set_on_destruct<F>(&self, hook: F)
    where
        F: Fn(RequestId) + Send + Sync + 'static,
    {
        *self.on_destruct.lock().unwrap() = Some(Arc::new(hook));
    }

    pub(crate) fn clear_on_destruct(&self) {
        *self.on_destruct.lock().unwrap() = None;
    }

    /// Invoke the completion hook. The slot lock is released before the
    /// call so a hook may freely re-enter the service.
    pub(crate) fn fire_complete(&self, id: RequestId) {
        let hook = self.on_complete.lock().unwrap().clone();
        if let Some(hook) = hook {
            hook(id);
        }
    }

    /// Invoke the disposal hook. Same locking contract as
    /// [`fire_complete`](Self::fire_complete).
    pub(crate) fn fire_destruct(&self, id: RequestId) {
        let hook = self.on_destruct.lock().unwrap().clone();
        if let Some(hook) = hook {
            hook(id);
        }
    }
}
