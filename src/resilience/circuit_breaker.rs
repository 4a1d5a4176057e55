//! Circuit breaker for host protection.
//!
//! # States
//! - Closed: normal operation, requests pass through
//! - Open: host assumed down, attempts are skipped without I/O
//!
//! # State Transitions
//! ```text
//! Closed → Open: consecutive_failures >= threshold
//! Open → Closed: now > circuit_open_until (checked lazily, no timer)
//! ```
//!
//! Breaker state lives inside each [`HealthRecord`]; this type only holds
//! the policy and applies it.

use std::time::Duration;
use tokio::time::Instant;

use crate::config::CircuitBreakerConfig;
use crate::health::state::HealthRecord;

#[derive(Debug, Clone, Copy)]
pub struct CircuitBreaker {
    threshold: u32,
    cooldown: Duration,
}

impl CircuitBreaker {
    pub fn new(threshold: u32, cooldown: Duration) -> Self {
        Self {
            threshold: threshold.max(1),
            cooldown,
        }
    }

    pub fn from_config(config: &CircuitBreakerConfig) -> Self {
        Self::new(config.failure_threshold, config.cooldown())
    }

    pub fn threshold(&self) -> u32 {
        self.threshold
    }

    pub fn on_success(&self, record: &mut HealthRecord) {
        record.consecutive_failures = 0;
        record.circuit_open_until = None;
        record.healthy = true;
    }

    /// Count a failure. Returns true when this failure opened the breaker.
    pub fn on_failure(&self, record: &mut HealthRecord, now: Instant) -> bool {
        record.consecutive_failures = record.consecutive_failures.saturating_add(1);
        if record.consecutive_failures >= self.threshold && record.circuit_open_until.is_none() {
            record.circuit_open_until = Some(now + self.cooldown);
            record.healthy = false;
            return true;
        }
        false
    }

    /// Whether the breaker is open at `now`. Clears an elapsed breaker.
    pub fn is_open(&self, record: &mut HealthRecord, now: Instant) -> bool {
        match record.circuit_open_until {
            Some(until) if now > until => {
                record.circuit_open_until = None;
                record.healthy = true;
                false
            }
            Some(_) => true,
            None => false,
        }
    }
}

impl Default for CircuitBreaker {
    fn default() -> Self {
        Self::from_config(&CircuitBreakerConfig::default())
    }
}
