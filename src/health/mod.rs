//! Health tracking subsystem.
//!
//! # Data Flow
//! ```text
//! Passive (dispatcher):
//!     attempt outcome → ledger.rs record_outcome
//!
//! Active (active.rs):
//!     interval tick → probe every host concurrently → ledger.rs record_outcome
//!
//! Per host (state.rs + resilience::circuit_breaker):
//!     Healthy ←→ Unhealthy, breaker opens after N consecutive failures
//!     and closes lazily once its cooldown has elapsed
//! ```

pub mod active;
pub mod ledger;
pub mod state;

pub use active::HealthProber;
pub use ledger::HealthLedger;
pub use state::HealthRecord;
