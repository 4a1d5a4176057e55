//! Shared utilities for integration tests.

#![allow(dead_code)]

use futures_util::future::BoxFuture;
use mirror_dispatch::config::{DispatchConfig, HostConfig};
use mirror_dispatch::{Response, Transport, TransportError, TransportRequest};
use std::collections::HashMap;
use std::future::Future;
use std::net::SocketAddr;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;

/// What a mocked host does with every request it receives.
#[derive(Debug, Clone)]
pub enum Outcome {
    Status(u16),
    Network,
    /// Never answers; only the attempt deadline ends it.
    Hang,
    Delayed(Duration, u16),
}

/// In-process transport with a fixed behaviour per host.
///
/// Hosts without a configured outcome answer 200. Every call is logged
/// as `(host, path)`.
#[derive(Debug, Default)]
pub struct MockTransport {
    outcomes: HashMap<String, Outcome>,
    calls: Mutex<Vec<(String, String)>>,
    requests: Mutex<Vec<TransportRequest>>,
}

impl MockTransport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn host(mut self, host: &str, outcome: Outcome) -> Self {
        self.outcomes.insert(host.to_string(), outcome);
        self
    }

    pub fn arc(self) -> Arc<Self> {
        Arc::new(self)
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }

    pub fn calls_to(&self, host: &str) -> usize {
        self.calls.lock().unwrap().iter().filter(|(h, _)| h == host).count()
    }

    /// Hosts in the order they were called.
    pub fn hosts_called(&self) -> Vec<String> {
        self.calls.lock().unwrap().iter().map(|(h, _)| h.clone()).collect()
    }

    pub fn requests(&self) -> Vec<TransportRequest> {
        self.requests.lock().unwrap().clone()
    }
}

impl Transport for MockTransport {
    fn send(&self, request: TransportRequest) -> BoxFuture<'_, Result<Response, TransportError>> {
        Box::pin(async move {
            let host = request.url.host_str().unwrap_or_default().to_string();
            let path = request.url.path().to_string();
            self.calls.lock().unwrap().push((host.clone(), path.clone()));
            self.requests.lock().unwrap().push(request);

            match self.outcomes.get(&host).cloned().unwrap_or(Outcome::Status(200)) {
                Outcome::Status(status) => Ok(Response::new(status, format!("{} {}", host, path))),
                Outcome::Network => Err(TransportError::Connect(format!(
                    "{}: connection refused",
                    host
                ))),
                Outcome::Hang => std::future::pending().await,
                Outcome::Delayed(delay, status) => {
                    tokio::time::sleep(delay).await;
                    Ok(Response::new(status, format!("{} {}", host, path)))
                }
            }
        })
    }
}

/// Config with the given hosts (first is primary), probing disabled and no
/// rate limit.
pub fn config(hosts: &[(&str, f64)]) -> DispatchConfig {
    let mut hosts = hosts
        .iter()
        .map(|(name, weight)| HostConfig::new(*name).with_weight(*weight));
    let mut config = DispatchConfig {
        primary: hosts.next().expect("at least one host"),
        fallbacks: hosts.collect(),
        ..DispatchConfig::default()
    };
    config.health_check.enabled = false;
    config.security.rate_limit_per_minute = 0;
    config
}

/// Start a programmable HTTP backend on an ephemeral port.
///
/// `f` receives the raw request head and returns `(status, body)`.
pub async fn start_programmable_backend<F, Fut>(f: F) -> SocketAddr
where
    F: Fn(String) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = (u16, String)> + Send + 'static,
{
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let f = Arc::new(f);

    tokio::spawn(async move {
        loop {
            match listener.accept().await {
                Ok((mut socket, _)) => {
                    let f = f.clone();
                    tokio::spawn(async move {
                        let head = read_head(&mut socket).await;
                        let (status, body) = f(head).await;
                        let reason = reqwest::StatusCode::from_u16(status)
                            .ok()
                            .and_then(|s| s.canonical_reason())
                            .unwrap_or("Unknown");

                        let response_str = format!(
                            "HTTP/1.1 {} {}\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
                            status,
                            reason,
                            body.len(),
                            body
                        );
                        let _ = socket.write_all(response_str.as_bytes()).await;
                        let _ = socket.shutdown().await;
                    });
                }
                Err(_) => break,
            }
        }
    });
    addr
}

async fn read_head(socket: &mut tokio::net::TcpStream) -> String {
    let mut buf = Vec::new();
    let mut chunk = [0u8; 1024];
    loop {
        match socket.read(&mut chunk).await {
            Ok(0) | Err(_) => break,
            Ok(n) => {
                buf.extend_from_slice(&chunk[..n]);
                if buf.windows(4).any(|w| w == b"\r\n\r\n") {
                    break;
                }
            }
        }
    }
    String::from_utf8_lossy(&buf).into_owned()
}

/// An address nothing is listening on.
pub async fn closed_port() -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    listener.local_addr().unwrap()
}
