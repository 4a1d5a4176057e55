//! Resilience subsystem.
//!
//! # Data Flow
//! ```text
//! Attempt against a host:
//!     → http/executor.rs (enforce per-attempt deadline)
//!     → retries.rs (classify outcome, decide if the host may be retried)
//!     → circuit_breaker.rs (track failures, open circuit at threshold)
//!     → backoff.rs (delay before the next attempt in the same call)
//! ```
//!
//! # Design Decisions
//! - Every attempt has a deadline; a timeout cancels only that attempt
//! - The retry budget is per logical call and shared across hosts
//! - Circuit breaker is per host and resets lazily, without timers

pub mod backoff;
pub mod circuit_breaker;
pub mod retries;

pub use circuit_breaker::CircuitBreaker;
pub use retries::{classify_status, AttemptError};
