//! Request dispatch subsystem.
//!
//! # Data Flow
//! ```text
//! Dispatcher::request(path, options)
//!     → admission (shutdown, rate limit, path)
//!     → cache lookup (GET only)
//!     → HostSelector order
//!     → attempt loop (circuit check → concurrency slot → executor)
//!     → ledger update, cache store, stats
//! ```

pub mod dispatcher;
pub mod error;
pub mod stats;

pub use dispatcher::{Dispatcher, DispatcherBuilder, StatusSnapshot};
pub use error::DispatchError;
pub use stats::{RequestStats, StatsSnapshot};
