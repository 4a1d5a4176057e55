//! Host selection subsystem.
//!
//! # Data Flow
//! ```text
//! Configured hosts (primary + fallbacks)
//!     → host.rs (descriptor with precomputed base URL)
//!     → weighted.rs (filter through the health ledger, weighted shuffle)
//!     → ordered attempt list for the dispatcher
//! ```
//!
//! Weight only affects ordering; `priority` and `region` are carried for
//! reporting.

pub mod host;
pub mod weighted;

pub use host::{base_url_for, HostDescriptor};
pub use weighted::{HostSelector, NoHealthyHosts};
