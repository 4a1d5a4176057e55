//! Admission control for outbound requests.
//!
//! # Data Flow
//! ```text
//! request()
//!     → rate_limit.rs (token bucket per dispatcher; reject fast when empty)
//!     → per attempt: limits.rs (wait for an in-flight slot)
//!     → executor
//! ```

pub mod limits;
pub mod rate_limit;

pub use limits::{ConcurrencyGate, GatePermit};
pub use rate_limit::RateLimiter;
