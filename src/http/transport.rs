//! Transport abstraction.
//!
//! # Responsibilities
//! - Perform one HTTP exchange and return status, headers and body
//! - Report transport failures as a typed [`TransportError`]
//!
//! The dispatcher never talks to the network directly; it goes through a
//! `Transport`. [`ReqwestTransport`] is the production implementation and
//! tests plug in their own.

use futures_util::future::BoxFuture;
use std::collections::BTreeMap;
use thiserror::Error;

use crate::http::request::TransportRequest;
use crate::http::response::Response;

/// Transport-level failure (no HTTP status was received).
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum TransportError {
    /// DNS, connection refused, TLS handshake.
    #[error("connect error: {0}")]
    Connect(String),

    /// The transport's own timer fired.
    #[error("transport timed out")]
    Timeout,

    /// The response body could not be read.
    #[error("body error: {0}")]
    Body(String),

    #[error("transport error: {0}")]
    Other(String),
}

/// Perform an HTTP request.
pub trait Transport: Send + Sync {
    fn send(&self, request: TransportRequest) -> BoxFuture<'_, Result<Response, TransportError>>;
}

/// `reqwest`-backed transport.
#[derive(Debug, Clone)]
pub struct ReqwestTransport {
    client: reqwest::Client,
}

impl ReqwestTransport {
    pub fn new() -> Self {
        Self::with_client(reqwest::Client::new())
    }

    pub fn with_client(client: reqwest::Client) -> Self {
        Self { client }
    }
}

impl Default for ReqwestTransport {
    fn default() -> Self {
        Self::new()
    }
}

impl Transport for ReqwestTransport {
    fn send(&self, request: TransportRequest) -> BoxFuture<'_, Result<Response, TransportError>> {
        Box::pin(async move {
            let mut builder = self.client.request(request.method, request.url);
            for (name, value) in &request.headers {
                builder = builder.header(name.as_str(), value.as_str());
            }
            if let Some(body) = request.body {
                builder = builder.body(body);
            }

            let response = builder.send().await.map_err(classify_reqwest_error)?;

            let status = response.status();
            let mut headers = BTreeMap::new();
            for (name, value) in response.headers() {
                headers.insert(
                    name.as_str().to_string(),
                    String::from_utf8_lossy(value.as_bytes()).into_owned(),
                );
            }
            let body = response
                .bytes()
                .await
                .map_err(|e| TransportError::Body(e.to_string()))?;

            Ok(Response {
                status: status.as_u16(),
                status_text: status.canonical_reason().unwrap_or("").to_string(),
                headers,
                body,
            })
        })
    }
}

fn classify_reqwest_error(error: reqwest::Error) -> TransportError {
    if error.is_timeout() {
        TransportError::Timeout
    } else if error.is_connect() {
        TransportError::Connect(error.to_string())
    } else if error.is_body() || error.is_decode() {
        TransportError::Body(error.to_string())
    } else {
        TransportError::Other(error.to_string())
    }
}
