//! Active health checking.
//!
//! # Responsibilities
//! - Periodically probe every tracked endpoint with a cheap read-only call
//! - Feed probe outcomes into the tracker like request-driven outcomes
//! - Take a slot from the client's concurrency limiter for every probe

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use futures_util::future::join_all;
use tokio::sync::broadcast;
use tokio::time::{self, MissedTickBehavior};

use crate::chain::NetworkId;
use crate::config::HealthCheckConfig;
use crate::dispatch::ConcurrencyLimiter;
use crate::health::tracker::HealthTracker;
use crate::resilience::retries::{AttemptOutcome, OutcomeClassifier};
use crate::resilience::timeouts::with_timeout;
use crate::rpc::transport::RpcTransport;
use crate::rpc::types::JsonRpcRequest;

pub struct HealthChecker {
    tracker: Arc<HealthTracker>,
    transport: Arc<dyn RpcTransport>,
    limiter: Arc<ConcurrencyLimiter>,
    classifier: OutcomeClassifier,
    config: HealthCheckConfig,
    next_id: AtomicU64,
}

impl HealthChecker {
    pub fn new(
        tracker: Arc<HealthTracker>,
        transport: Arc<dyn RpcTransport>,
        limiter: Arc<ConcurrencyLimiter>,
        classifier: OutcomeClassifier,
        config: HealthCheckConfig,
    ) -> Self {
        Self {
            tracker,
            transport,
            limiter,
            classifier,
            config,
            next_id: AtomicU64::new(1),
        }
    }

    /// Probe on every interval tick until the shutdown signal fires.
    pub async fn run(&self, mut shutdown: broadcast::Receiver<()>) {
        tracing::info!(
            interval = self.config.interval_secs,
            method = %self.config.method,
            "Health checker starting"
        );

        let mut ticker = time::interval(Duration::from_secs(self.config.interval_secs.max(1)));
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    self.check_all().await;
                }
                _ = shutdown.recv() => {
                    tracing::info!("Health checker received shutdown signal, exiting loop");
                    break;
                }
            }
        }
    }

    /// Probe every endpoint of every tracked network once.
    pub async fn check_all(&self) -> usize {
        let mut probed = 0;
        for network in self.tracker.networks() {
            probed += self.check_network(&network).await;
        }
        probed
    }

    /// Probe every endpoint of `network` concurrently. Returns the number of probes sent.
    ///
    /// Endpoints inside a rate-limit cooldown are left alone. Probes wait for a
    /// limiter slot like calls do, and are dropped once the limiter is closed.
    pub async fn check_network(&self, network: &NetworkId) -> usize {
        let targets: Vec<String> = self
            .tracker
            .urls(network)
            .into_iter()
            .filter(|url| !self.tracker.is_rate_limited(url))
            .collect();

        let probes = targets.iter().map(|url| self.probe(network, url));
        join_all(probes).await.into_iter().filter(|sent| *sent).count()
    }

    async fn probe(&self, network: &NetworkId, url: &str) -> bool {
        let _permit = match self.limiter.acquire(network).await {
            Ok(permit) => permit,
            Err(_) => {
                tracing::debug!(network = %network, endpoint = %url, "Health probe skipped, limiter closed");
                return false;
            }
        };

        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let request = JsonRpcRequest::new(id, &self.config.method, serde_json::json!([]));
        let timeout = Duration::from_secs(self.config.timeout_secs);

        let result = with_timeout(timeout, self.transport.send(url, &request)).await;
        match self.classifier.classify(result) {
            AttemptOutcome::Success(_) => {
                self.tracker.record_outcome(network, url, true);
            }
            AttemptOutcome::RateLimited(error) => {
                tracing::warn!(network = %network, endpoint = %url, error = %error, "Health probe rate limited");
                self.tracker.mark_rate_limited(url);
                self.tracker.record_outcome(network, url, false);
            }
            AttemptOutcome::Retriable(error) => {
                tracing::warn!(network = %network, endpoint = %url, error = %error, "Health probe failed");
                self.tracker.record_outcome(network, url, false);
            }
            AttemptOutcome::Fatal(error) => {
                // The endpoint answered; the probe itself was rejected.
                tracing::debug!(network = %network, endpoint = %url, error = %error, "Health probe rejected");
            }
        }
        true
    }
}

impl std::fmt::Debug for HealthChecker {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HealthChecker")
            .field("interval_secs", &self.config.interval_secs)
            .field("method", &self.config.method)
            .finish()
    }
}
