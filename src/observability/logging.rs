//! Structured logging.
//!
//! # Responsibilities
//! - Initialize a `tracing` subscriber for applications embedding the dispatcher
//! - Log level from config, overridable through `RUST_LOG`

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::ObservabilityConfig;

/// Install a global `tracing` subscriber.
///
/// Fails if a global subscriber is already set.
pub fn init_logging(
    config: &ObservabilityConfig,
) -> Result<(), tracing_subscriber::util::TryInitError> {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| format!("mirror_dispatch={}", config.log_level).into());

    let registry = tracing_subscriber::registry().with(filter);
    if config.compact {
        registry.with(tracing_subscriber::fmt::layer().compact()).try_init()
    } else {
        registry.with(tracing_subscriber::fmt::layer()).try_init()
    }
}
