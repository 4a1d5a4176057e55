//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Host identity is unique and every host yields a valid base URL
//! - Value ranges (weights > 0, timeouts > 0, thresholds >= 1)
//! - Health probing has an endpoint when enabled
//!
//! Returns all validation errors, not just the first. Runs before a
//! dispatcher is constructed; a failure here is fatal.

use std::collections::HashSet;
use thiserror::Error;

use crate::config::schema::{DispatchConfig, HostConfig};
use crate::load_balancer::host::base_url_for;

/// A single semantic problem in the configuration.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ValidationError {
    #[error("primary host must not be empty")]
    EmptyPrimary,

    #[error("fallback host #{0} must not be empty")]
    EmptyFallback(usize),

    #[error("duplicate host '{0}'")]
    DuplicateHost(String),

    #[error("host '{host}' has invalid weight {weight} (must be finite and > 0)")]
    InvalidWeight { host: String, weight: f64 },

    #[error("sum of host weights is not finite")]
    TotalWeightOverflow,

    #[error("host '{0}' has port 0")]
    InvalidPort(String),

    #[error("host '{host}' does not form a valid URL: {reason}")]
    InvalidHostUrl { host: String, reason: String },

    #[error("health checks are enabled but no endpoint is configured")]
    MissingHealthEndpoint,

    #[error("health endpoint '{0}' must start with '/'")]
    RelativeHealthEndpoint(String),

    #[error("{0} must be greater than zero")]
    Zero(&'static str),
}

/// Validate a configuration snapshot.
pub fn validate_config(config: &DispatchConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.primary.host.trim().is_empty() {
        errors.push(ValidationError::EmptyPrimary);
    }
    for (i, fallback) in config.fallbacks.iter().enumerate() {
        if fallback.host.trim().is_empty() {
            errors.push(ValidationError::EmptyFallback(i));
        }
    }

    let mut seen = HashSet::new();
    for host in config.hosts().filter(|h| !h.host.trim().is_empty()) {
        if !seen.insert(host.host.as_str()) {
            errors.push(ValidationError::DuplicateHost(host.host.clone()));
        }
        validate_host(host, &mut errors);
    }

    let total_weight: f64 = config.hosts().map(|h| h.weight).sum();
    if config.hosts().all(|h| h.weight.is_finite()) && !total_weight.is_finite() {
        errors.push(ValidationError::TotalWeightOverflow);
    }

    let health = &config.health_check;
    if health.enabled {
        match health.endpoints.first() {
            None => errors.push(ValidationError::MissingHealthEndpoint),
            Some(_) => {
                for endpoint in &health.endpoints {
                    if !endpoint.starts_with('/') {
                        errors.push(ValidationError::RelativeHealthEndpoint(endpoint.clone()));
                    }
                }
            }
        }
        if health.interval_ms == 0 {
            errors.push(ValidationError::Zero("health_check.interval_ms"));
        }
        if health.timeout_ms == 0 {
            errors.push(ValidationError::Zero("health_check.timeout_ms"));
        }
    }

    if config.circuit_breaker.failure_threshold == 0 {
        errors.push(ValidationError::Zero("circuit_breaker.failure_threshold"));
    }
    if config.performance.request_timeout_ms == 0 {
        errors.push(ValidationError::Zero("performance.request_timeout_ms"));
    }
    if config.performance.max_concurrent_requests == 0 {
        errors.push(ValidationError::Zero("performance.max_concurrent_requests"));
    }
    if config.cache.enabled && config.cache.max_size == 0 {
        errors.push(ValidationError::Zero("cache.max_size"));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

fn validate_host(host: &HostConfig, errors: &mut Vec<ValidationError>) {
    if !host.weight.is_finite() || host.weight <= 0.0 {
        errors.push(ValidationError::InvalidWeight {
            host: host.host.clone(),
            weight: host.weight,
        });
    }
    if host.port == Some(0) {
        errors.push(ValidationError::InvalidPort(host.host.clone()));
        return;
    }
    if let Err(e) = base_url_for(host) {
        errors.push(ValidationError::InvalidHostUrl {
            host: host.host.clone(),
            reason: e.to_string(),
        });
    }
}
