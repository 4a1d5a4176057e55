//! Exponential backoff with optional jitter.

use std::time::Duration;
use rand::Rng;

/// Delay after the failed attempt with 0-based index `attempt_index`:
/// `base_ms * 2^attempt_index`, capped at `max_ms`.
pub fn calculate_backoff(attempt_index: u32, base_ms: u64, max_ms: u64, jitter: bool) -> Duration {
    let exponential_base = 2u64.saturating_pow(attempt_index);
    let delay_ms = base_ms.saturating_mul(exponential_base);
    let capped_delay = delay_ms.min(max_ms);

    // Apply jitter (0 to 10% of the delay)
    let jitter_range = capped_delay / 10;
    let jitter_ms = if jitter && jitter_range > 0 {
        rand::thread_rng().gen_range(0..jitter_range)
    } else {
        0
    };

    Duration::from_millis(capped_delay + jitter_ms)
}
