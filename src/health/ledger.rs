//! Health ledger (passive + active observations).
//!
//! # Responsibilities
//! - Record attempt and probe outcomes per host
//! - Track consecutive failures and drive the circuit breaker
//! - Answer "is this host usable now" for host selection
//!
//! A host with no record is optimistically usable. Writers are the
//! dispatcher (after each attempt) and the prober (after each probe); the
//! map is concurrent so both can race on the same host safely.

use dashmap::DashMap;
use std::collections::BTreeMap;
use std::sync::Arc;

use crate::clock::{Clock, SystemClock};
use crate::health::state::HealthRecord;
use crate::observability::metrics;
use crate::resilience::circuit_breaker::CircuitBreaker;

/// Session-wide per-host health store.
#[derive(Debug)]
pub struct HealthLedger {
    records: DashMap<String, HealthRecord>,
    breaker: CircuitBreaker,
    clock: Arc<dyn Clock>,
}

impl HealthLedger {
    pub fn new(breaker: CircuitBreaker, clock: Arc<dyn Clock>) -> Self {
        Self {
            records: DashMap::new(),
            breaker,
            clock,
        }
    }

    /// Record the outcome of an attempt or probe against `host`.
    pub fn record_outcome(&self, host: &str, success: bool, response_time_ms: Option<f64>) {
        let now = self.clock.now();
        let mut record = self
            .records
            .entry(host.to_string())
            .or_insert_with(|| HealthRecord::new(now));
        record.last_checked_at = now;

        if success {
            let recovered = !record.healthy;
            self.breaker.on_success(&mut record);
            record.last_response_time_ms = response_time_ms;
            if recovered {
                tracing::info!(host = %host, "Host recovered");
            }
        } else if self.breaker.on_failure(&mut record, now) {
            tracing::warn!(
                host = %host,
                consecutive_failures = record.consecutive_failures,
                "Circuit opened"
            );
        } else {
            tracing::debug!(
                host = %host,
                consecutive_failures = record.consecutive_failures,
                "Failure recorded"
            );
        }

        let usable = record.healthy && record.circuit_open_until.is_none();
        drop(record);
        metrics::record_host_usable(host, usable);
    }

    /// True iff the breaker for `host` is open right now.
    ///
    /// Clears the breaker as a side effect once its cooldown has elapsed.
    pub fn is_circuit_open(&self, host: &str) -> bool {
        let now = self.clock.now();
        match self.records.get_mut(host) {
            Some(mut record) => {
                let was_open = record.circuit_open_until.is_some();
                let open = self.breaker.is_open(&mut record, now);
                if was_open && !open {
                    tracing::info!(host = %host, "Circuit cooldown elapsed, host re-admitted");
                }
                open
            }
            None => false,
        }
    }

    /// `!is_circuit_open(host) && (no record || record.healthy)`.
    pub fn is_usable(&self, host: &str) -> bool {
        if self.is_circuit_open(host) {
            return false;
        }
        self.records.get(host).map(|r| r.healthy).unwrap_or(true)
    }

    pub fn record(&self, host: &str) -> Option<HealthRecord> {
        self.records.get(host).map(|r| r.value().clone())
    }

    pub fn consecutive_failures(&self, host: &str) -> u32 {
        self.records.get(host).map(|r| r.consecutive_failures).unwrap_or(0)
    }

    /// Copy of every record, keyed by host.
    pub fn snapshot(&self) -> BTreeMap<String, HealthRecord> {
        self.records
            .iter()
            .map(|r| (r.key().clone(), r.value().clone()))
            .collect()
    }
}

impl Default for HealthLedger {
    fn default() -> Self {
        Self::new(CircuitBreaker::default(), Arc::new(SystemClock))
    }
}
