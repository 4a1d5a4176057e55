//! Lifecycle management subsystem.
//!
//! # Data Flow
//! ```text
//! Startup (Dispatcher::build):
//!     Validate config → Create session state → Start prober
//!
//! Shutdown (Dispatcher::shutdown):
//!     Trigger signal → Abort in-flight attempts → Stop prober → Clear cache
//! ```
//!
//! # Design Decisions
//! - Fail fast: an invalid config never produces a dispatcher
//! - Shutdown is one-way; a shut-down dispatcher rejects all calls

pub mod shutdown;

pub use shutdown::Shutdown;
