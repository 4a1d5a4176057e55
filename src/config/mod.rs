//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! config file (TOML) or in-memory DispatchConfig
//!     → loader.rs (parse & deserialize)
//!     → validation.rs (semantic checks)
//!     → DispatchConfig (validated, immutable)
//!     → owned by one Dispatcher for its whole session
//! ```
//!
//! # Design Decisions
//! - Config is an immutable snapshot per session; no hot reload
//! - All fields have defaults to allow minimal configs
//! - Validation separates syntactic (serde) from semantic checks

pub mod loader;
pub mod schema;
pub mod validation;

pub use loader::{load_config, parse_config, ConfigError};
pub use schema::{
    CacheConfig, CircuitBreakerConfig, DispatchConfig, HealthCheckConfig, HostConfig,
    ObservabilityConfig, PerformanceConfig, Protocol, SecurityConfig,
};
pub use validation::{validate_config, ValidationError};
