use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};

/// Running flag plus a loop generation.
///
/// Each `start` hands out a new generation; a loop keeps going only while it
/// holds the current one, so a loop left asleep across `stop` + `start`
/// exits instead of running beside its replacement.
#[derive(Debug, Default)]
pub struct PollState {
    running: AtomicBool,
    generation: AtomicU64,
}

impl PollState {
    pub fn new() -> Self {
        Self::default()
    }

    /// `None` when a loop is already running.
    pub fn start(&self) -> Option<u64> {
        if self.running.swap(true, Ordering::SeqCst) {
            return None;
        }
        Some(self.generation.fetch_add(1, Ordering::SeqCst) + 1)
    }

    /// Returns `true` if it was running.
    pub fn stop(&self) -> bool {
        self.running.swap(false, Ordering::SeqCst)
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }

    pub fn is_current(&self, generation: u64) -> bool {
        self.is_running() && self.generation.load(Ordering::SeqCst) == generation
    }
}

/// Seconds from a settings file, never below one.
pub fn interval_secs(secs: u64) -> std::time::Duration {
    std::time::Duration::from_secs(secs.max(1))
}
