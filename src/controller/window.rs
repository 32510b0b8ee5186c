//! Run timing.

use std::time::{Duration, Instant};

/// Source of monotonic time for the run controller.
pub trait Clock: Send + Sync {
    fn now(&self) -> Instant;
}

/// The real monotonic clock.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Instant {
        Instant::now()
    }
}

/// Start of a run and how long it may last.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RunWindow {
    start: Instant,
    max_duration: Option<Duration>,
}

impl RunWindow {
    pub fn new(start: Instant, max_duration: Option<Duration>) -> Self {
        Self {
            start,
            max_duration,
        }
    }

    pub fn max_duration(&self) -> Option<Duration> {
        self.max_duration
    }

    /// When capture must stop; `None` for an unbounded run.
    pub fn deadline(&self) -> Option<Instant> {
        self.max_duration.and_then(|d| self.start.checked_add(d))
    }

    pub fn is_expired(&self, now: Instant) -> bool {
        self.deadline().is_some_and(|deadline| now >= deadline)
    }

    pub fn elapsed(&self, now: Instant) -> Duration {
        now.saturating_duration_since(self.start)
    }
}
