//! Monotonic time source.
//!
//! Health records, cache entries and the rate limiter read time through
//! [`Clock`] so tests can move time forward without sleeping. Timers
//! (backoff sleeps, probe intervals) use Tokio directly and are controlled
//! in tests with Tokio's paused clock.

use std::fmt::Debug;
use std::sync::Mutex;
use std::time::Duration;
use tokio::time::Instant;

/// A monotonic time source.
pub trait Clock: Debug + Send + Sync {
    fn now(&self) -> Instant;
}

/// Wall clock backed by Tokio's `Instant`.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Instant {
        Instant::now()
    }
}

/// Clock that only moves when told to.
#[derive(Debug)]
pub struct ManualClock {
    base: Instant,
    offset: Mutex<Duration>,
}

impl ManualClock {
    pub fn new() -> Self {
        Self {
            base: Instant::now(),
            offset: Mutex::new(Duration::ZERO),
        }
    }

    /// Move the clock forward by `by`.
    pub fn advance(&self, by: Duration) {
        let mut offset = self.offset.lock().expect("manual clock mutex poisoned");
        *offset += by;
    }
}

impl Default for ManualClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for ManualClock {
    fn now(&self) -> Instant {
        let offset = *self.offset.lock().expect("manual clock mutex poisoned");
        self.base + offset
    }
}
