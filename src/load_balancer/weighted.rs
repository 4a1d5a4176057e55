//! Weighted-random host ordering.
//!
//! Produces a full priority ordering (weighted sampling without
//! replacement) over the hosts the health ledger considers usable, so a
//! single logical request can fall through several hosts.

use rand::rngs::StdRng;
use rand::{Rng, RngCore, SeedableRng};
use std::sync::{Arc, Mutex};
use thiserror::Error;

use crate::health::HealthLedger;
use crate::load_balancer::host::HostDescriptor;

/// No configured host passed the usability filter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("no healthy hosts available")]
pub struct NoHealthyHosts;

/// Orders hosts for one logical request.
pub struct HostSelector {
    ledger: Arc<HealthLedger>,
    rng: Mutex<Box<dyn RngCore + Send>>,
}

impl HostSelector {
    pub fn new(ledger: Arc<HealthLedger>) -> Self {
        Self::with_rng(ledger, StdRng::from_entropy())
    }

    /// Selector drawing from a caller-provided random source.
    pub fn with_rng(ledger: Arc<HealthLedger>, rng: impl RngCore + Send + 'static) -> Self {
        Self {
            ledger,
            rng: Mutex::new(Box::new(rng)),
        }
    }

    /// Usable hosts in weighted-random order, each exactly once.
    pub fn select_order(
        &self,
        hosts: &[HostDescriptor],
    ) -> Result<Vec<HostDescriptor>, NoHealthyHosts> {
        let mut pool: Vec<&HostDescriptor> = hosts
            .iter()
            .filter(|h| self.ledger.is_usable(&h.host))
            .collect();

        if pool.is_empty() {
            tracing::warn!(configured = hosts.len(), "No usable hosts");
            return Err(NoHealthyHosts);
        }

        let mut rng = self.rng.lock().expect("host selector rng mutex poisoned");
        let mut order = Vec::with_capacity(pool.len());
        while !pool.is_empty() {
            let index = pick_weighted(&pool, &mut **rng);
            order.push(pool.remove(index).clone());
        }
        Ok(order)
    }
}

/// Index of the next host: draw in `[0, total)` and subtract weights until
/// the cursor is non-positive.
///
/// Weights are rescaled by the largest one when their sum overflows.
fn pick_weighted(pool: &[&HostDescriptor], rng: &mut dyn RngCore) -> usize {
    if pool.len() == 1 {
        return 0;
    }
    let mut scale = 1.0;
    let mut total: f64 = pool.iter().map(|h| h.weight).sum();
    if total.is_infinite() {
        scale = pool.iter().map(|h| h.weight).fold(0.0, f64::max);
        total = pool.iter().map(|h| h.weight / scale).sum();
    }
    if !(total > 0.0 && total.is_finite()) {
        return 0;
    }
    let mut cursor = rng.gen_range(0.0..total);
    for (i, host) in pool.iter().enumerate() {
        cursor -= host.weight / scale;
        if cursor <= 0.0 {
            return i;
        }
    }
    pool.len() - 1
}

impl std::fmt::Debug for HostSelector {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HostSelector").finish_non_exhaustive()
    }
}
