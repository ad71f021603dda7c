use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

pub type Callback<T> = Arc<dyn Fn(&T) + Send + Sync>;

/// Handle returned by [`Callbacks::add`], used to unregister.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CallbackId(u64);

/// Listener list shared by the polling services.
pub struct Callbacks<T> {
    name: &'static str,
    next_id: AtomicU64,
    entries: Mutex<Vec<(CallbackId, Callback<T>)>>,
}

impl<T> Callbacks<T> {
    pub fn new(name: &'static str) -> Self {
        Self {
            name,
            next_id: AtomicU64::new(1),
            entries: Mutex::new(Vec::new()),
        }
    }

    pub fn add<F>(&self, func: F) -> CallbackId
    where
        F: Fn(&T) + Send + Sync + 'static,
    {
        let id = CallbackId(self.next_id.fetch_add(1, Ordering::Relaxed));
        if let Ok(mut entries) = self.entries.lock() {
            entries.push((id, Arc::new(func)));
        }
        log::debug!("[{}] Added callback {:?}", self.name, id);
        id
    }

    pub fn remove(&self, id: CallbackId) -> bool {
        let Ok(mut entries) = self.entries.lock() else {
            return false;
        };
        let before = entries.len();
        entries.retain(|(entry_id, _)| *entry_id != id);
        let removed = entries.len() < before;
        if removed {
            log::debug!("[{}] Removed callback {:?}", self.name, id);
        }
        removed
    }

    pub fn len(&self) -> usize {
        self.entries.lock().map(|e| e.len()).unwrap_or(0)
    }

    /// Calls every listener with `state`. The list is copied first so a
    /// listener may register or remove others; a panicking listener is
    /// logged and skipped.
    pub fn notify(&self, state: &T) {
        let listeners: Vec<(CallbackId, Callback<T>)> = match self.entries.lock() {
            Ok(entries) => entries.clone(),
            Err(_) => return,
        };

        for (id, func) in listeners {
            if panic::catch_unwind(AssertUnwindSafe(|| func(state))).is_err() {
                log::error!("[{}] Callback {:?} panicked", self.name, id);
            }
        }
    }
}
