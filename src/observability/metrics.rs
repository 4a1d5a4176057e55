//! Metrics emitted through the `metrics` facade.
//!
//! # Metrics
//! - `dispatch_requests_total` (counter): logical calls by outcome
//! - `dispatch_attempts_total` (counter): attempts by host and outcome
//! - `dispatch_attempt_duration_seconds` (histogram): per-attempt latency
//! - `dispatch_cache_events_total` (counter): cache hit/miss/store
//! - `dispatch_rate_limited_total` (counter): calls denied admission
//! - `dispatch_host_usable` (gauge): 1=usable, 0=breaker open
//!
//! Nothing is recorded until the embedding application installs a recorder.

use std::time::Duration;

/// Record the final outcome of a logical request.
pub fn record_request(outcome: &'static str) {
    metrics::counter!("dispatch_requests_total", "outcome" => outcome).increment(1);
}

/// Record one attempt against one host.
pub fn record_attempt(host: &str, outcome: &'static str, elapsed: Duration) {
    metrics::counter!(
        "dispatch_attempts_total",
        "host" => host.to_string(),
        "outcome" => outcome
    )
    .increment(1);
    metrics::histogram!("dispatch_attempt_duration_seconds", "host" => host.to_string())
        .record(elapsed.as_secs_f64());
}

pub fn record_cache(event: &'static str) {
    metrics::counter!("dispatch_cache_events_total", "event" => event).increment(1);
}

pub fn record_rate_limited() {
    metrics::counter!("dispatch_rate_limited_total").increment(1);
}

pub fn record_host_usable(host: &str, usable: bool) {
    metrics::gauge!("dispatch_host_usable", "host" => host.to_string())
        .set(if usable { 1.0 } else { 0.0 });
}
