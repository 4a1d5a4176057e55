//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! All subsystems produce:
//!     → tracing events and spans (request_id, host, attempt)
//!     → metrics.rs (counters, gauges, histograms via the `metrics` facade)
//!
//! Consumers (installed by the embedding application):
//!     → logging.rs helper or any tracing subscriber
//!     → any `metrics` recorder (Prometheus, statsd, ...)
//! ```

pub mod logging;
pub mod metrics;

pub use logging::init_logging;
