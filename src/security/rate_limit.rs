//! Admission rate limiting for outbound dispatch.

use std::sync::{Arc, Mutex};
use tokio::time::Instant;

use crate::clock::{Clock, SystemClock};

/// A simple token bucket.
#[derive(Debug)]
struct TokenBucket {
    tokens: f64,
    last_update: Instant,
}

impl TokenBucket {
    fn new(capacity: f64, now: Instant) -> Self {
        Self {
            tokens: capacity,
            last_update: now,
        }
    }

    fn try_acquire(&mut self, capacity: f64, refill_per_sec: f64, now: Instant) -> bool {
        let elapsed = now.saturating_duration_since(self.last_update).as_secs_f64();
        self.tokens = (self.tokens + elapsed * refill_per_sec).min(capacity);
        self.last_update = now;

        if self.tokens >= 1.0 {
            self.tokens -= 1.0;
            true
        } else {
            false
        }
    }
}

/// Process-wide limit on logical requests per minute.
///
/// Burst capacity equals the per-minute limit; tokens refill continuously
/// at `limit / 60` per second. A limit of zero admits everything.
#[derive(Debug)]
pub struct RateLimiter {
    bucket: Mutex<TokenBucket>,
    per_minute: u32,
    clock: Arc<dyn Clock>,
}

impl RateLimiter {
    pub fn new(per_minute: u32, clock: Arc<dyn Clock>) -> Self {
        let now = clock.now();
        Self {
            bucket: Mutex::new(TokenBucket::new(per_minute as f64, now)),
            per_minute,
            clock,
        }
    }

    pub fn limit_per_minute(&self) -> u32 {
        self.per_minute
    }

    /// Take one token if available.
    pub fn check(&self) -> bool {
        if self.per_minute == 0 {
            return true;
        }
        let capacity = self.per_minute as f64;
        let now = self.clock.now();
        let mut bucket = self.bucket.lock().expect("rate limiter mutex poisoned");
        bucket.try_acquire(capacity, capacity / 60.0, now)
    }
}

impl Default for RateLimiter {
    fn default() -> Self {
        Self::new(100, Arc::new(SystemClock))
    }
}
