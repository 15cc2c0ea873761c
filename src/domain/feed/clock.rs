//! Monotonic clock abstraction and the flush timer driven by it

use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

/// Source of monotonic time for the pipeline
pub trait Clock: Send + Sync {
    fn now(&self) -> Instant;
}

/// Wall clock backed by `Instant::now`
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Instant {
        Instant::now()
    }
}

/// Virtual clock that only moves when told to.
///
/// Clones share the same reading, so a test can keep one handle and give
/// another to the pipeline.
#[derive(Debug, Clone)]
pub struct ManualClock {
    current: Arc<Mutex<Instant>>,
}

impl ManualClock {
    pub fn new() -> Self {
        Self {
            current: Arc::new(Mutex::new(Instant::now())),
        }
    }

    pub fn advance(&self, by: Duration) {
        let mut current = self.current.lock().unwrap_or_else(|e| e.into_inner());
        *current += by;
    }
}

impl Default for ManualClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for ManualClock {
    fn now(&self) -> Instant {
        *self.current.lock().unwrap_or_else(|e| e.into_inner())
    }
}

/// Fixed-period timer with a single owner.
///
/// Arming replaces any previous deadline, so there is never more than one
/// schedule alive.
#[derive(Debug, Clone)]
pub struct FlushTimer {
    period: Duration,
    deadline: Option<Instant>,
}

impl FlushTimer {
    pub fn new(period: Duration) -> Self {
        Self {
            period,
            deadline: None,
        }
    }

    pub fn period(&self) -> Duration {
        self.period
    }

    pub fn arm(&mut self, now: Instant) {
        self.deadline = Some(now + self.period);
    }

    pub fn disarm(&mut self) {
        self.deadline = None;
    }

    pub fn is_armed(&self) -> bool {
        self.deadline.is_some()
    }

    /// Returns true at most once per call when the deadline has passed.
    ///
    /// Missed periods collapse into a single firing; the next deadline stays
    /// on the original grid.
    pub fn fire_if_due(&mut self, now: Instant) -> bool {
        let Some(deadline) = self.deadline else {
            return false;
        };
        if now < deadline {
            return false;
        }

        let mut next = deadline + self.period;
        while next <= now {
            next += self.period;
        }
        self.deadline = Some(next);
        true
    }
}
