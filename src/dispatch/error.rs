//! Errors returned to dispatcher callers.

use thiserror::Error;

use crate::resilience::AttemptError;

/// Why a logical request failed.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum DispatchError {
    /// Every configured host is excluded by the health ledger.
    #[error("no healthy hosts available")]
    NoHealthyHosts,

    /// The attempt budget ran out without a successful response.
    #[error("all hosts unavailable after {attempts} attempts: {last_error}")]
    AllHostsUnavailable {
        attempts: u32,
        #[source]
        last_error: AttemptError,
    },

    #[error("rate limit of {limit_per_minute} requests per minute exceeded")]
    RateLimitExceeded { limit_per_minute: u32 },

    #[error("dispatcher has been shut down")]
    Shutdown,

    /// The path is not root-relative.
    #[error("invalid request path: {0:?}")]
    InvalidPath(String),
}

impl DispatchError {
    /// Short label for metrics.
    pub fn kind(&self) -> &'static str {
        match self {
            DispatchError::NoHealthyHosts => "no_healthy_hosts",
            DispatchError::AllHostsUnavailable { .. } => "all_hosts_unavailable",
            DispatchError::RateLimitExceeded { .. } => "rate_limited",
            DispatchError::Shutdown => "shutdown",
            DispatchError::InvalidPath(_) => "invalid_path",
        }
    }
}
