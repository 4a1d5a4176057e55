//! Per-host health record.
//!
//! # States
//! - Healthy: host receives traffic
//! - Unhealthy: breaker tripped; host excluded until the cooldown lapses
//!
//! # State Transitions
//! ```text
//! any → Healthy (failures = 0):   success observed
//! Healthy → Unhealthy (open):     consecutive_failures >= threshold
//! Unhealthy → Healthy (closed):   now > circuit_open_until (lazy, on read)
//! ```
//!
//! The failure count survives re-admission, so a single further failure
//! re-opens the breaker.

use tokio::time::Instant;

/// Health observations for one host.
#[derive(Debug, Clone, PartialEq)]
pub struct HealthRecord {
    pub healthy: bool,
    pub last_checked_at: Instant,
    pub last_response_time_ms: Option<f64>,
    pub consecutive_failures: u32,
    pub circuit_open_until: Option<Instant>,
}

impl HealthRecord {
    /// A fresh record: healthy, no failures.
    pub fn new(now: Instant) -> Self {
        Self {
            healthy: true,
            last_checked_at: now,
            last_response_time_ms: None,
            consecutive_failures: 0,
            circuit_open_until: None,
        }
    }
}
