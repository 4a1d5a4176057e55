//! Attempt outcome classification.
//!
//! # Responsibilities
//! - Typed per-attempt failure kinds (never inferred from message text)
//! - Decide success by status code (`200..400`)
//! - Decide whether a failed host may be tried again within the same call
//!
//! Timeouts, network errors and 5xx are retryable. A 4xx ends the call's
//! use of that host but the dispatcher still moves on to the next one.

use std::time::Duration;
use thiserror::Error;

use crate::http::transport::TransportError;

/// Why a single attempt did not produce a usable response.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum AttemptError {
    #[error("attempt timed out after {}ms", .after.as_millis())]
    Timeout { after: Duration },

    #[error("network error: {0}")]
    Network(String),

    #[error("host returned HTTP {status}")]
    Http { status: u16 },

    /// Skip reason; no I/O happened.
    #[error("circuit open for host '{host}'")]
    CircuitOpen { host: String },

    /// Cancelled by dispatcher shutdown.
    #[error("attempt aborted by shutdown")]
    Aborted,
}

impl AttemptError {
    /// Whether the same host may be attempted again within this call.
    pub fn is_retryable(&self) -> bool {
        match self {
            AttemptError::Timeout { .. } | AttemptError::Network(_) => true,
            AttemptError::Http { status } => *status >= 500,
            AttemptError::CircuitOpen { .. } => true,
            AttemptError::Aborted => false,
        }
    }

    /// Short label for metrics and logs.
    pub fn kind(&self) -> &'static str {
        match self {
            AttemptError::Timeout { .. } => "timeout",
            AttemptError::Network(_) => "network",
            AttemptError::Http { .. } => "http_error",
            AttemptError::CircuitOpen { .. } => "circuit_open",
            AttemptError::Aborted => "aborted",
        }
    }

    pub(crate) fn from_transport(error: TransportError, timeout: Duration) -> Self {
        match error {
            TransportError::Timeout => AttemptError::Timeout { after: timeout },
            other => AttemptError::Network(other.to_string()),
        }
    }
}

/// Map a received status to success or `AttemptError::Http`.
pub fn classify_status(status: u16) -> Result<(), AttemptError> {
    if (200..400).contains(&status) {
        Ok(())
    } else {
        Err(AttemptError::Http { status })
    }
}
