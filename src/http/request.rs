//! Request options and request IDs.
//!
//! # Responsibilities
//! - Carry method, headers and body of a logical request
//! - Generate a unique request ID (UUID v4) per logical request
//! - Decide cacheability by method (GET only)

use bytes::Bytes;
use reqwest::Method;
use std::collections::BTreeMap;
use uuid::Uuid;

/// Header carrying the request ID to every host.
pub const X_REQUEST_ID: &str = "x-request-id";

/// Unique identifier for one logical request (shared by all its attempts).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RequestId(Uuid);

impl RequestId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for RequestId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for RequestId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Caller-supplied options for `Dispatcher::request`.
///
/// `method` defaults to GET. Header names are stored lower-case.
#[derive(Debug, Clone, Default)]
pub struct RequestOptions {
    pub method: Option<Method>,
    pub headers: BTreeMap<String, String>,
    pub body: Option<Bytes>,
}

impl RequestOptions {
    pub fn get() -> Self {
        Self::default()
    }

    pub fn method(method: Method) -> Self {
        Self {
            method: Some(method),
            ..Default::default()
        }
    }

    pub fn header(mut self, name: &str, value: impl Into<String>) -> Self {
        self.headers.insert(name.to_ascii_lowercase(), value.into());
        self
    }

    pub fn body(mut self, body: impl Into<Bytes>) -> Self {
        self.body = Some(body.into());
        self
    }

    pub fn effective_method(&self) -> Method {
        self.method.clone().unwrap_or(Method::GET)
    }

    /// Only GET responses (explicit or implied) may be cached.
    pub fn is_cacheable(&self) -> bool {
        self.effective_method() == Method::GET
    }
}

/// A fully resolved request handed to a transport.
#[derive(Debug, Clone)]
pub struct TransportRequest {
    pub method: Method,
    pub url: url::Url,
    pub headers: BTreeMap<String, String>,
    pub body: Option<Bytes>,
}

impl TransportRequest {
    pub fn new(url: url::Url, options: &RequestOptions) -> Self {
        Self {
            method: options.effective_method(),
            url,
            headers: options.headers.clone(),
            body: options.body.clone(),
        }
    }

    pub fn with_request_id(mut self, id: RequestId) -> Self {
        self.headers.insert(X_REQUEST_ID.to_string(), id.to_string());
        self
    }
}
