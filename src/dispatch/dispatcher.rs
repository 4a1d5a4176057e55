//! The request dispatcher.
//!
//! # Responsibilities
//! - Admit calls (shutdown, rate limit, path check)
//! - Serve cacheable GETs from the response cache
//! - Walk the weighted host order with a shared attempt budget
//! - Feed attempt outcomes back into the health ledger
//! - Own the session state and tear it down on shutdown
//!
//! # Attempt loop
//! ```text
//! order = [h0, h1, h2]   budget = max_retries + 1
//!
//! slot 0 → h0   circuit open?  skip (no I/O, no sleep)
//! slot 1 → h1   5xx / timeout / network → record failure, back off
//! slot 2 → h2   4xx → record failure, h2 is not revisited in this call
//! slot 3 → h0   (order wraps when the budget exceeds the host count)
//! ```

use rand::RngCore;
use std::collections::{BTreeMap, HashSet};
use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;
use tracing::Instrument;

use crate::cache::{cache_key, ResponseCache};
use crate::clock::{Clock, SystemClock};
use crate::config::{validate_config, ConfigError, DispatchConfig, ValidationError};
use crate::dispatch::error::DispatchError;
use crate::dispatch::stats::{RequestStats, StatsSnapshot};
use crate::health::{HealthLedger, HealthProber, HealthRecord};
use crate::http::executor::RequestExecutor;
use crate::http::request::{RequestId, RequestOptions, TransportRequest};
use crate::http::response::Response;
use crate::http::transport::{ReqwestTransport, Transport};
use crate::lifecycle::Shutdown;
use crate::load_balancer::{HostDescriptor, HostSelector};
use crate::observability::metrics;
use crate::resilience::backoff::calculate_backoff;
use crate::resilience::{classify_status, AttemptError, CircuitBreaker};
use crate::security::{ConcurrencyGate, GatePermit, RateLimiter};

/// Read-only diagnostic view of a dispatcher.
#[derive(Debug, Clone)]
pub struct StatusSnapshot {
    /// False once the dispatcher has been shut down.
    pub initialized: bool,
    pub stats: StatsSnapshot,
    pub health_by_host: BTreeMap<String, HealthRecord>,
    pub cache_size: usize,
    pub last_probe_at: Option<Instant>,
    /// Attempts currently holding a concurrency slot.
    pub in_flight: usize,
    pub prober_running: bool,
}

/// Builder for [`Dispatcher`].
pub struct DispatcherBuilder {
    config: DispatchConfig,
    transport: Option<Arc<dyn Transport>>,
    clock: Option<Arc<dyn Clock>>,
    rng: Option<Box<dyn RngCore + Send>>,
}

impl DispatcherBuilder {
    /// Transport used for every attempt and probe. Defaults to reqwest.
    pub fn transport(mut self, transport: Arc<dyn Transport>) -> Self {
        self.transport = Some(transport);
        self
    }

    pub fn clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = Some(clock);
        self
    }

    /// Random source for host ordering.
    pub fn rng(mut self, rng: impl RngCore + Send + 'static) -> Self {
        self.rng = Some(Box::new(rng));
        self
    }

    /// Validate the configuration and assemble the session.
    ///
    /// Starts the health prober when health checks are enabled.
    pub fn build(self) -> Result<Dispatcher, ConfigError> {
        validate_config(&self.config)?;

        let hosts = self
            .config
            .hosts()
            .map(|h| {
                HostDescriptor::from_config(h).map_err(|e| {
                    ConfigError::Validation(vec![ValidationError::InvalidHostUrl {
                        host: h.host.clone(),
                        reason: e.to_string(),
                    }])
                })
            })
            .collect::<Result<Vec<_>, _>>()?;

        let clock = self.clock.unwrap_or_else(|| Arc::new(SystemClock));
        let transport = self
            .transport
            .unwrap_or_else(|| Arc::new(ReqwestTransport::new()));
        let shutdown = Shutdown::new();

        let ledger = Arc::new(HealthLedger::new(
            CircuitBreaker::from_config(&self.config.circuit_breaker),
            clock.clone(),
        ));
        let selector = match self.rng {
            Some(rng) => HostSelector::with_rng(ledger.clone(), rng),
            None => HostSelector::new(ledger.clone()),
        };
        let executor = Arc::new(RequestExecutor::new(transport, shutdown.clone()));
        let prober = HealthProber::new(
            hosts.clone(),
            ledger.clone(),
            executor.clone(),
            self.config.health_check.clone(),
            clock.clone(),
        );

        let dispatcher = Dispatcher {
            cache: ResponseCache::new(self.config.cache.max_size, clock.clone()),
            rate_limiter: RateLimiter::new(self.config.security.rate_limit_per_minute, clock),
            gate: ConcurrencyGate::new(self.config.performance.max_concurrent_requests),
            stats: RequestStats::default(),
            hosts,
            ledger,
            selector,
            executor,
            prober,
            shutdown,
            config: self.config,
        };

        tracing::info!(
            primary = %dispatcher.config.primary.host,
            fallbacks = dispatcher.config.fallbacks.len(),
            "Dispatcher initialized"
        );

        if dispatcher.config.health_check.enabled {
            dispatcher.prober.start();
        }
        Ok(dispatcher)
    }
}

/// Resilient client for a primary origin and its mirrors.
pub struct Dispatcher {
    config: DispatchConfig,
    hosts: Vec<HostDescriptor>,
    ledger: Arc<HealthLedger>,
    selector: HostSelector,
    cache: ResponseCache,
    executor: Arc<RequestExecutor>,
    prober: HealthProber,
    rate_limiter: RateLimiter,
    gate: Arc<ConcurrencyGate>,
    stats: RequestStats,
    shutdown: Shutdown,
}

impl Dispatcher {
    pub fn builder(config: DispatchConfig) -> DispatcherBuilder {
        DispatcherBuilder {
            config,
            transport: None,
            clock: None,
            rng: None,
        }
    }

    /// Dispatcher with the reqwest transport and system clock.
    pub fn new(config: DispatchConfig) -> Result<Self, ConfigError> {
        Self::builder(config).build()
    }

    /// Send one logical request to the best available host.
    pub async fn request(
        &self,
        path: &str,
        options: RequestOptions,
    ) -> Result<Response, DispatchError> {
        if self.shutdown.is_triggered() {
            return Err(DispatchError::Shutdown);
        }
        self.stats.record_total();

        let request_id = RequestId::new();
        let span = tracing::info_span!(
            "dispatch",
            request_id = %request_id,
            method = %options.effective_method(),
            path = %path,
        );

        let result = self.dispatch(path, &options, request_id).instrument(span).await;
        if let Err(e) = &result {
            self.stats.record_failed();
            metrics::record_request(e.kind());
        }
        result
    }

    async fn dispatch(
        &self,
        path: &str,
        options: &RequestOptions,
        request_id: RequestId,
    ) -> Result<Response, DispatchError> {
        if !self.rate_limiter.check() {
            tracing::warn!(
                limit_per_minute = self.rate_limiter.limit_per_minute(),
                "Rate limit exceeded"
            );
            metrics::record_rate_limited();
            return Err(DispatchError::RateLimitExceeded {
                limit_per_minute: self.rate_limiter.limit_per_minute(),
            });
        }

        if !path.starts_with('/') || path.starts_with("//") {
            return Err(DispatchError::InvalidPath(path.to_string()));
        }

        let key = if self.config.cache.enabled && options.is_cacheable() {
            Some(cache_key(
                &options.effective_method(),
                path,
                &options.headers,
                &self.config.cache.vary_headers,
            ))
        } else {
            None
        };

        if let Some(key) = &key {
            if let Some(entry) = self.cache.get(key) {
                tracing::debug!("Cache hit");
                metrics::record_cache("hit");
                metrics::record_request("cached");
                self.stats.record_cached();
                return Ok(entry.to_response());
            }
            metrics::record_cache("miss");
        }

        let order = self
            .selector
            .select_order(&self.hosts)
            .map_err(|_| DispatchError::NoHealthyHosts)?;

        self.attempt_loop(path, options, request_id, &order, key.as_deref())
            .await
    }

    async fn attempt_loop(
        &self,
        path: &str,
        options: &RequestOptions,
        request_id: RequestId,
        order: &[HostDescriptor],
        cache_key: Option<&str>,
    ) -> Result<Response, DispatchError> {
        let perf = &self.config.performance;
        let budget = perf.max_retries.saturating_add(1);
        let timeout = perf.request_timeout();

        let mut client_errors: HashSet<&str> = HashSet::new();
        let mut last_error: Option<AttemptError> = None;
        let mut attempts = 0u32;
        let mut cursor = 0usize;

        while attempts < budget && client_errors.len() < order.len() {
            let host = loop {
                let candidate = &order[cursor % order.len()];
                cursor += 1;
                if !client_errors.contains(candidate.host.as_str()) {
                    break candidate;
                }
            };
            let attempt = attempts;
            attempts += 1;

            if self.ledger.is_circuit_open(&host.host) {
                tracing::debug!(host = %host.host, attempt, "Circuit open, skipping host");
                last_error.get_or_insert(AttemptError::CircuitOpen {
                    host: host.host.clone(),
                });
                continue;
            }

            let url = host
                .url_for(path)
                .map_err(|_| DispatchError::InvalidPath(path.to_string()))?;
            let request = TransportRequest::new(url, options).with_request_id(request_id);

            let permit = self.acquire_permit().await?;
            let started = Instant::now();
            let result = self
                .executor
                .send(request, timeout)
                .await
                .and_then(|response| classify_status(response.status).map(|_| response));
            let elapsed = started.elapsed();
            drop(permit);

            match result {
                Ok(response) => {
                    let elapsed_ms = elapsed.as_secs_f64() * 1000.0;
                    self.ledger.record_outcome(&host.host, true, Some(elapsed_ms));
                    metrics::record_attempt(&host.host, "success", elapsed);

                    if let Some(key) = cache_key {
                        self.cache.put(key, &response, self.config.cache.ttl());
                        metrics::record_cache("store");
                    }
                    self.stats.record_success();
                    metrics::record_request("success");
                    tracing::debug!(
                        host = %host.host,
                        attempt,
                        status = response.status,
                        elapsed_ms,
                        "Request succeeded"
                    );
                    return Ok(response);
                }
                Err(AttemptError::Aborted) => return Err(DispatchError::Shutdown),
                Err(err) => {
                    self.ledger.record_outcome(&host.host, false, None);
                    metrics::record_attempt(&host.host, err.kind(), elapsed);
                    tracing::warn!(host = %host.host, attempt, error = %err, "Attempt failed");

                    if !err.is_retryable() {
                        client_errors.insert(host.host.as_str());
                    }
                    last_error = Some(err);

                    if attempts < budget && client_errors.len() < order.len() {
                        let delay = calculate_backoff(
                            attempt,
                            perf.retry_delay_ms,
                            perf.max_retry_delay_ms,
                            perf.jitter,
                        );
                        self.backoff(delay).await?;
                    }
                }
            }
        }

        let last_error = last_error.unwrap_or_else(|| AttemptError::CircuitOpen {
            host: order[0].host.clone(),
        });
        tracing::error!(attempts, last_error = %last_error, "All hosts unavailable");
        Err(DispatchError::AllHostsUnavailable {
            attempts,
            last_error,
        })
    }

    async fn acquire_permit(&self) -> Result<GatePermit, DispatchError> {
        tokio::select! {
            biased;
            _ = self.shutdown.triggered() => Err(DispatchError::Shutdown),
            permit = self.gate.acquire() => Ok(permit),
        }
    }

    async fn backoff(&self, delay: Duration) -> Result<(), DispatchError> {
        tracing::debug!(delay_ms = delay.as_millis() as u64, "Backing off");
        tokio::select! {
            biased;
            _ = self.shutdown.triggered() => Err(DispatchError::Shutdown),
            _ = tokio::time::sleep(delay) => Ok(()),
        }
    }

    /// Diagnostic snapshot of the session.
    pub fn status(&self) -> StatusSnapshot {
        StatusSnapshot {
            initialized: !self.shutdown.is_triggered(),
            stats: self.stats.snapshot(),
            health_by_host: self.ledger.snapshot(),
            cache_size: self.cache.len(),
            last_probe_at: self.prober.last_probe_at(),
            in_flight: self.gate.in_flight(),
            prober_running: self.prober.is_running(),
        }
    }

    pub fn reset_stats(&self) {
        self.stats.reset();
    }

    /// Run one health probe cycle now, independent of the background task.
    pub async fn probe_now(&self) {
        self.prober.probe_all().await;
    }

    pub fn hosts(&self) -> &[HostDescriptor] {
        &self.hosts
    }

    pub fn config(&self) -> &DispatchConfig {
        &self.config
    }

    /// Stop probing, abort in-flight attempts and clear the cache.
    ///
    /// Later calls fail with [`DispatchError::Shutdown`]. Idempotent.
    pub fn shutdown(&self) {
        if !self.shutdown.trigger() {
            return;
        }
        self.prober.stop();
        self.cache.clear();
        tracing::info!("Dispatcher shut down");
    }

    pub fn is_shutdown(&self) -> bool {
        self.shutdown.is_triggered()
    }
}

impl std::fmt::Debug for Dispatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Dispatcher")
            .field("hosts", &self.hosts)
            .field("shutdown", &self.shutdown.is_triggered())
            .finish_non_exhaustive()
    }
}
