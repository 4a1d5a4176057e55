//! Active health probing.
//!
//! # Responsibilities
//! - Periodically probe every configured host
//! - Feed probe outcomes into the health ledger
//!
//! The first cycle runs as soon as the prober starts. Probe failures are
//! recorded, never propagated.

use futures_util::future::join_all;
use std::sync::{Arc, Mutex};
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::{self, Instant, MissedTickBehavior};

use crate::clock::Clock;
use crate::config::HealthCheckConfig;
use crate::health::HealthLedger;
use crate::http::executor::RequestExecutor;
use crate::http::request::{RequestOptions, TransportRequest};
use crate::load_balancer::host::HostDescriptor;
use crate::resilience::AttemptError;

const USER_AGENT: &str = concat!("mirror-dispatch-health-check/", env!("CARGO_PKG_VERSION"));

struct ProbeShared {
    hosts: Vec<HostDescriptor>,
    ledger: Arc<HealthLedger>,
    executor: Arc<RequestExecutor>,
    config: HealthCheckConfig,
    clock: Arc<dyn Clock>,
    last_probe_at: Mutex<Option<Instant>>,
}

struct ProbeTask {
    handle: JoinHandle<()>,
    stop: watch::Sender<bool>,
}

/// Background task probing hosts on a fixed interval.
pub struct HealthProber {
    shared: Arc<ProbeShared>,
    task: Mutex<Option<ProbeTask>>,
}

impl HealthProber {
    pub fn new(
        hosts: Vec<HostDescriptor>,
        ledger: Arc<HealthLedger>,
        executor: Arc<RequestExecutor>,
        config: HealthCheckConfig,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            shared: Arc::new(ProbeShared {
                hosts,
                ledger,
                executor,
                config,
                clock,
                last_probe_at: Mutex::new(None),
            }),
            task: Mutex::new(None),
        }
    }

    /// Spawn the probe loop. No-op when already running.
    ///
    /// Needs a Tokio runtime; without one the prober stays stopped and an
    /// error is logged.
    pub fn start(&self) {
        let mut task = self.task.lock().expect("prober task mutex poisoned");
        if task.as_ref().map_or(false, |t| !t.handle.is_finished()) {
            return;
        }

        let runtime = match tokio::runtime::Handle::try_current() {
            Ok(handle) => handle,
            Err(e) => {
                tracing::error!(error = %e, "Cannot start health prober outside a Tokio runtime");
                return;
            }
        };

        let (stop, stop_rx) = watch::channel(false);
        let shared = self.shared.clone();
        let handle = runtime.spawn(run(shared, stop_rx));
        *task = Some(ProbeTask { handle, stop });
    }

    /// Stop the probe loop. Safe to call when not running.
    pub fn stop(&self) {
        let task = self.task.lock().expect("prober task mutex poisoned").take();
        if let Some(task) = task {
            let _ = task.stop.send(true);
            task.handle.abort();
            tracing::info!("Health prober stopped");
        }
    }

    pub fn is_running(&self) -> bool {
        self.task
            .lock()
            .expect("prober task mutex poisoned")
            .as_ref()
            .map_or(false, |t| !t.handle.is_finished())
    }

    /// Run one probe cycle now.
    pub async fn probe_all(&self) {
        self.shared.probe_all().await;
    }

    /// Completion time of the most recent cycle.
    pub fn last_probe_at(&self) -> Option<Instant> {
        *self
            .shared
            .last_probe_at
            .lock()
            .expect("prober state mutex poisoned")
    }
}

impl Drop for HealthProber {
    fn drop(&mut self) {
        self.stop();
    }
}

impl std::fmt::Debug for HealthProber {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HealthProber")
            .field("hosts", &self.shared.hosts.len())
            .field("running", &self.is_running())
            .finish()
    }
}

async fn run(shared: Arc<ProbeShared>, mut stop: watch::Receiver<bool>) {
    tracing::info!(
        interval_ms = shared.config.interval_ms,
        hosts = shared.hosts.len(),
        "Health prober starting"
    );

    let mut ticker = time::interval(shared.config.interval());
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            _ = ticker.tick() => {
                shared.probe_all().await;
            }
            _ = stop.changed() => {
                tracing::debug!("Health prober received stop signal, exiting loop");
                break;
            }
        }
    }
}

impl ProbeShared {
    async fn probe_all(&self) {
        join_all(self.hosts.iter().map(|host| self.probe(host))).await;
        *self.last_probe_at.lock().expect("prober state mutex poisoned") = Some(self.clock.now());
    }

    async fn probe(&self, host: &HostDescriptor) {
        let endpoint = match self.config.endpoints.first() {
            Some(endpoint) => endpoint,
            None => return,
        };
        let url = match host.url_for(endpoint) {
            Ok(url) => url,
            Err(e) => {
                tracing::error!(host = %host.host, error = %e, "Invalid health check URL");
                return;
            }
        };

        let options = RequestOptions::get().header("user-agent", USER_AGENT);
        let started = Instant::now();
        let result = self
            .executor
            .send(TransportRequest::new(url, &options), self.config.timeout())
            .await;
        let elapsed_ms = started.elapsed().as_secs_f64() * 1000.0;

        match result {
            Ok(response) if response.is_success() => {
                self.ledger.record_outcome(&host.host, true, Some(elapsed_ms));
            }
            Ok(response) => {
                tracing::warn!(
                    host = %host.host,
                    status = response.status,
                    "Health check failed: non-success status"
                );
                self.ledger.record_outcome(&host.host, false, None);
            }
            Err(AttemptError::Aborted) => {}
            Err(e) => {
                tracing::warn!(host = %host.host, error = %e, "Health check failed");
                self.ledger.record_outcome(&host.host, false, None);
            }
        }
    }
}
