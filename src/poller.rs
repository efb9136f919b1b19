//! Fixed-interval position polling.

use std::time::{Duration, Instant};

/// A repeating timer driven by the caller's event loop.
///
/// The timer never fires on its own; the loop asks [`PositionPoller::due`]
/// with the current time and the poller reschedules itself whenever it fires.
#[derive(Debug, Clone)]
pub struct PositionPoller {
    interval: Duration,
    next_due: Option<Instant>,
}

impl PositionPoller {
    pub fn new(interval: Duration) -> Self {
        Self {
            interval,
            next_due: None,
        }
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Schedules the first tick one interval after `now`.
    pub fn start(&mut self, now: Instant) {
        self.next_due = Some(now + self.interval);
    }

    pub fn cancel(&mut self) {
        self.next_due = None;
    }

    pub fn is_active(&self) -> bool {
        self.next_due.is_some()
    }

    /// Returns true once per elapsed interval. Missed intervals collapse into a
    /// single tick rather than firing in a burst.
    pub fn due(&mut self, now: Instant) -> bool {
        match self.next_due {
            Some(deadline) if now >= deadline => {
                let mut next = deadline + self.interval;
                if next <= now {
                    next = now + self.interval;
                }
                self.next_due = Some(next);
                true
            }
            _ => false,
        }
    }
}
