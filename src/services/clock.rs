use std::sync::{Arc, Mutex};
use std::time::Duration;

use chrono::{DateTime, Local, TimeZone};

use super::callbacks::{CallbackId, Callbacks};
use super::poll::PollState;
use crate::models::ClockReading;

const TICK: Duration = Duration::from_millis(500);

pub fn reading_at<Tz: TimeZone>(now: &DateTime<Tz>) -> ClockReading
where
    Tz::Offset: std::fmt::Display,
{
    ClockReading {
        time: now.format("%I:%M %p").to_string(),
        date: now.format("%A, %B %d, %Y").to_string(),
    }
}

/// Emits a new reading whenever the displayed text changes.
pub struct ClockService {
    last: Mutex<ClockReading>,
    callbacks: Callbacks<ClockReading>,
    poll: PollState,
}

impl Default for ClockService {
    fn default() -> Self {
        Self::new()
    }
}

impl ClockService {
    pub fn new() -> Self {
        Self {
            last: Mutex::new(ClockReading::default()),
            callbacks: Callbacks::new("Clock"),
            poll: PollState::new(),
        }
    }

    pub fn add_callback<F>(&self, func: F) -> CallbackId
    where
        F: Fn(&ClockReading) + Send + Sync + 'static,
    {
        self.callbacks.add(func)
    }

    pub fn current(&self) -> ClockReading {
        reading_at(&Local::now())
    }

    /// Returns `true` when `reading` differs from the last one and was pushed.
    pub fn tick(&self, reading: ClockReading) -> bool {
        let changed = match self.last.lock() {
            Ok(mut last) if *last != reading => {
                *last = reading.clone();
                true
            }
            _ => false,
        };
        if changed {
            self.callbacks.notify(&reading);
        }
        changed
    }

    pub fn start(self: &Arc<Self>) {
        let Some(generation) = self.poll.start() else {
            return;
        };
        let service = Arc::clone(self);
        tokio::spawn(async move {
            while service.poll.is_current(generation) {
                service.tick(reading_at(&Local::now()));
                tokio::time::sleep(TICK).await;
            }
        });
    }

    pub fn stop(&self) {
        self.poll.stop();
    }
}
