//! Configuration schema definitions.
//!
//! This module defines the complete configuration snapshot consumed by the
//! dispatcher. All types derive Serde traits for deserialization from
//! config files; every section has defaults so minimal configs work.

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Root configuration for a dispatcher session.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct DispatchConfig {
    /// Primary origin.
    pub primary: HostConfig,

    /// Fallback mirrors, in configured order.
    pub fallbacks: Vec<HostConfig>,

    /// Active health probing.
    pub health_check: HealthCheckConfig,

    /// Per-host circuit breaker.
    pub circuit_breaker: CircuitBreakerConfig,

    /// Response cache for GET requests.
    pub cache: CacheConfig,

    /// Timeouts, retries and concurrency.
    pub performance: PerformanceConfig,

    /// Admission control.
    pub security: SecurityConfig,

    /// Logging settings.
    pub observability: ObservabilityConfig,
}

impl DispatchConfig {
    /// All configured hosts, primary first.
    pub fn hosts(&self) -> impl Iterator<Item = &HostConfig> {
        std::iter::once(&self.primary).chain(self.fallbacks.iter())
    }
}

/// URL scheme used to reach a host.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Protocol {
    Http,
    #[default]
    Https,
}

impl Protocol {
    pub fn scheme(&self) -> &'static str {
        match self {
            Protocol::Http => "http",
            Protocol::Https => "https",
        }
    }

    pub fn default_port(&self) -> u16 {
        match self {
            Protocol::Http => 80,
            Protocol::Https => 443,
        }
    }
}

/// A single origin or mirror.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct HostConfig {
    /// Host name, unique within the config (e.g., "mirror1.example.com").
    pub host: String,

    /// Port; defaults to the protocol's well-known port.
    #[serde(default)]
    pub port: Option<u16>,

    #[serde(default)]
    pub protocol: Protocol,

    /// Relative selection weight (default: 1.0).
    #[serde(default = "default_weight")]
    pub weight: f64,

    #[serde(default)]
    pub region: Option<String>,

    #[serde(default)]
    pub priority: Option<i32>,
}

impl HostConfig {
    /// An https host with default port and weight.
    pub fn new(host: impl Into<String>) -> Self {
        Self {
            host: host.into(),
            port: None,
            protocol: Protocol::Https,
            weight: default_weight(),
            region: None,
            priority: None,
        }
    }

    pub fn with_weight(mut self, weight: f64) -> Self {
        self.weight = weight;
        self
    }

    pub fn with_protocol(mut self, protocol: Protocol) -> Self {
        self.protocol = protocol;
        self
    }

    pub fn with_port(mut self, port: u16) -> Self {
        self.port = Some(port);
        self
    }

    pub fn effective_port(&self) -> u16 {
        self.port.unwrap_or_else(|| self.protocol.default_port())
    }
}

impl Default for HostConfig {
    fn default() -> Self {
        Self::new("")
    }
}

fn default_weight() -> f64 {
    1.0
}

/// Health check configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct HealthCheckConfig {
    /// Enable active health probing.
    pub enabled: bool,

    /// Probe interval in milliseconds.
    pub interval_ms: u64,

    /// Probe timeout in milliseconds, independent of the request timeout.
    pub timeout_ms: u64,

    /// Probe paths; only the first one is used.
    pub endpoints: Vec<String>,
}

impl HealthCheckConfig {
    pub fn interval(&self) -> Duration {
        Duration::from_millis(self.interval_ms)
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }
}

impl Default for HealthCheckConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            interval_ms: 30_000,
            timeout_ms: 5_000,
            endpoints: vec!["/health".to_string()],
        }
    }
}

/// Circuit breaker configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct CircuitBreakerConfig {
    /// Consecutive failures that open the breaker.
    pub failure_threshold: u32,

    /// How long an open breaker keeps the host out, in milliseconds.
    pub cooldown_ms: u64,
}

impl CircuitBreakerConfig {
    pub fn cooldown(&self) -> Duration {
        Duration::from_millis(self.cooldown_ms)
    }
}

impl Default for CircuitBreakerConfig {
    fn default() -> Self {
        Self {
            failure_threshold: 5,
            cooldown_ms: 30_000,
        }
    }
}

/// Response cache configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct CacheConfig {
    pub enabled: bool,

    /// Entry lifetime in milliseconds.
    pub ttl_ms: u64,

    /// Maximum number of entries.
    pub max_size: usize,

    /// Request headers that take part in the cache key.
    pub vary_headers: Vec<String>,
}

impl CacheConfig {
    pub fn ttl(&self) -> Duration {
        Duration::from_millis(self.ttl_ms)
    }
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            ttl_ms: 300_000,
            max_size: 100,
            vary_headers: vec![
                "accept".to_string(),
                "accept-language".to_string(),
                "authorization".to_string(),
            ],
        }
    }
}

/// Timeouts, retry and concurrency configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct PerformanceConfig {
    /// Maximum attempts in flight across all calls.
    pub max_concurrent_requests: usize,

    /// Deadline for a single attempt in milliseconds.
    pub request_timeout_ms: u64,

    /// Base delay for exponential backoff in milliseconds.
    pub retry_delay_ms: u64,

    /// Upper bound for a single backoff delay in milliseconds.
    pub max_retry_delay_ms: u64,

    /// Retries after the first attempt; the budget is shared by all hosts.
    pub max_retries: u32,

    /// Add up to 10% random jitter to backoff delays.
    pub jitter: bool,
}

impl PerformanceConfig {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }
}

impl Default for PerformanceConfig {
    fn default() -> Self {
        Self {
            max_concurrent_requests: 10,
            request_timeout_ms: 10_000,
            retry_delay_ms: 1_000,
            max_retry_delay_ms: 30_000,
            max_retries: 3,
            jitter: false,
        }
    }
}

/// Admission control configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct SecurityConfig {
    /// Calls admitted per minute; 0 disables the limit.
    pub rate_limit_per_minute: u32,
}

impl Default for SecurityConfig {
    fn default() -> Self {
        Self {
            rate_limit_per_minute: 100,
        }
    }
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,

    /// Use the compact single-line log formatter.
    pub compact: bool,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            compact: false,
        }
    }
}
