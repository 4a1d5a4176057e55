//! Host abstraction.
//!
//! # Responsibilities
//! - Represent a single origin or mirror from configuration
//! - Pre-compute the base URL used for every attempt and probe
//! - Join root-relative request paths onto the base URL

use serde::Serialize;
use url::Url;

use crate::config::schema::{HostConfig, Protocol};

/// Build the base URL (`scheme://host[:port]/`) for a configured host.
///
/// Default ports are dropped by `Url`, so `https://x:443/` becomes `https://x/`.
pub fn base_url_for(config: &HostConfig) -> Result<Url, url::ParseError> {
    Url::parse(&format!(
        "{}://{}:{}/",
        config.protocol.scheme(),
        config.host,
        config.effective_port()
    ))
}

/// A single origin or mirror. Identity is `host`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HostDescriptor {
    pub host: String,
    pub port: u16,
    pub protocol: Protocol,
    pub weight: f64,
    pub region: Option<String>,
    pub priority: Option<i32>,
    /// Pre-calculated base URL.
    #[serde(skip)]
    pub base_url: Url,
}

impl HostDescriptor {
    pub fn from_config(config: &HostConfig) -> Result<Self, url::ParseError> {
        Ok(Self {
            host: config.host.clone(),
            port: config.effective_port(),
            protocol: config.protocol,
            weight: config.weight,
            region: config.region.clone(),
            priority: config.priority,
            base_url: base_url_for(config)?,
        })
    }

    /// Target URL for a root-relative `path` (may carry a query string).
    pub fn url_for(&self, path: &str) -> Result<Url, url::ParseError> {
        self.base_url.join(path)
    }
}

impl std::fmt::Display for HostDescriptor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.host)
    }
}
