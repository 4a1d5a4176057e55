//! Concurrency limit on in-flight attempts.
//!
//! # Responsibilities
//! - Cap the number of attempts executing at once
//! - Release the slot automatically when an attempt finishes or is dropped
//!
//! Waiters poll; there is no FIFO fairness between them.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

const POLL_INTERVAL: Duration = Duration::from_millis(10);

/// Counting gate shared by every attempt of a dispatcher.
#[derive(Debug)]
pub struct ConcurrencyGate {
    max_in_flight: usize,
    in_flight: AtomicUsize,
}

impl ConcurrencyGate {
    pub fn new(max_in_flight: usize) -> Arc<Self> {
        Arc::new(Self {
            max_in_flight,
            in_flight: AtomicUsize::new(0),
        })
    }

    pub fn in_flight(&self) -> usize {
        self.in_flight.load(Ordering::Relaxed)
    }

    pub fn max_in_flight(&self) -> usize {
        self.max_in_flight
    }

    /// Take a slot if one is free.
    pub fn try_acquire(self: &Arc<Self>) -> Option<GatePermit> {
        let mut prev = self.in_flight.load(Ordering::Relaxed);
        loop {
            if prev >= self.max_in_flight {
                return None;
            }
            match self.in_flight.compare_exchange_weak(
                prev,
                prev + 1,
                Ordering::AcqRel,
                Ordering::Relaxed,
            ) {
                Ok(_) => break,
                Err(x) => prev = x,
            }
        }
        Some(GatePermit { gate: self.clone() })
    }

    /// Wait until a slot is free.
    pub async fn acquire(self: &Arc<Self>) -> GatePermit {
        loop {
            if let Some(permit) = self.try_acquire() {
                return permit;
            }
            tokio::time::sleep(POLL_INTERVAL).await;
        }
    }
}

/// RAII slot; dropping it frees the slot.
#[derive(Debug)]
pub struct GatePermit {
    gate: Arc<ConcurrencyGate>,
}

impl Drop for GatePermit {
    fn drop(&mut self) {
        self.gate.in_flight.fetch_sub(1, Ordering::AcqRel);
    }
}
