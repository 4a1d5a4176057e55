//! Resilient client-side request dispatcher.
//!
//! Sends requests to a primary origin and its fallback mirrors, with
//! weighted host selection, per-host circuit breakers, active health
//! probing, a TTL response cache for GETs and admission control.

pub mod cache;
pub mod clock;
pub mod config;
pub mod dispatch;
pub mod health;
pub mod http;
pub mod lifecycle;
pub mod load_balancer;
pub mod observability;
pub mod resilience;
pub mod security;

pub use clock::{Clock, ManualClock, SystemClock};
pub use config::{load_config, parse_config, ConfigError, DispatchConfig, HostConfig};
pub use dispatch::{DispatchError, Dispatcher, DispatcherBuilder, StatsSnapshot, StatusSnapshot};
pub use http::{RequestOptions, Response, Transport, TransportError, TransportRequest};
pub use resilience::AttemptError;
