//! Response caching subsystem.
//!
//! # Data Flow
//! ```text
//! GET request
//!     → key.rs (method + path + vary headers)
//!     → store.rs lookup: live entry → response, no network
//!     → miss: dispatcher fetches, stores successful response with TTL
//! ```

pub mod key;
pub mod store;

pub use key::cache_key;
pub use store::{CacheEntry, ResponseCache};
