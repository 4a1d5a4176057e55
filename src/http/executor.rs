//! Single-attempt execution.
//!
//! # Responsibilities
//! - Send one request to one host through the [`Transport`]
//! - Enforce the attempt deadline; dropping the future cancels the I/O
//! - Abort in-flight attempts when the session shuts down
//! - Return any received status as a `Response` (no status interpretation)

use std::sync::Arc;
use std::time::Duration;
use tokio::time;
use url::Url;

use crate::http::request::{RequestOptions, TransportRequest};
use crate::http::response::Response;
use crate::http::transport::Transport;
use crate::lifecycle::Shutdown;
use crate::resilience::AttemptError;

pub struct RequestExecutor {
    transport: Arc<dyn Transport>,
    shutdown: Shutdown,
}

impl RequestExecutor {
    pub fn new(transport: Arc<dyn Transport>, shutdown: Shutdown) -> Self {
        Self { transport, shutdown }
    }

    /// Execute `options` against `url` with a deadline of `timeout`.
    pub async fn execute(
        &self,
        url: Url,
        options: &RequestOptions,
        timeout: Duration,
    ) -> Result<Response, AttemptError> {
        self.send(TransportRequest::new(url, options), timeout).await
    }

    /// Execute an already resolved request.
    pub async fn send(
        &self,
        request: TransportRequest,
        timeout: Duration,
    ) -> Result<Response, AttemptError> {
        if self.shutdown.is_triggered() {
            return Err(AttemptError::Aborted);
        }

        let url = request.url.clone();
        tokio::select! {
            biased;
            _ = self.shutdown.triggered() => {
                tracing::debug!(url = %url, "Attempt aborted by shutdown");
                Err(AttemptError::Aborted)
            }
            result = time::timeout(timeout, self.transport.send(request)) => match result {
                Ok(Ok(response)) => Ok(response),
                Ok(Err(e)) => {
                    tracing::debug!(url = %url, error = %e, "Transport failure");
                    Err(AttemptError::from_transport(e, timeout))
                }
                Err(_) => {
                    tracing::debug!(
                        url = %url,
                        timeout_ms = timeout.as_millis() as u64,
                        "Attempt timed out"
                    );
                    Err(AttemptError::Timeout { after: timeout })
                }
            },
        }
    }
}

impl std::fmt::Debug for RequestExecutor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RequestExecutor")
            .field("shutdown", &self.shutdown.is_triggered())
            .finish()
    }
}
