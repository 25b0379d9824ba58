//! Public RPC client facade.
//!
//! # Responsibilities
//! - The single entry point for application code issuing JSON-RPC calls
//! - Compose registry, health tracker, dispatcher and health checker
//! - Own the periodic health-check task and stop it on `destroy()`
//! - Read-only diagnostics (health snapshot, fallback order, in-flight calls)

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use serde_json::Value;
use tokio::runtime::Handle;
use tokio::task::JoinHandle;
use tokio::time::Instant;

use crate::chain::{ChainConfigSource, NetworkId, StaticChainConfig};
use crate::config::ClientConfig;
use crate::dispatch::{
    AttemptPlan, ConcurrencyLimiter, DispatchPolicy, InFlightRequest, RequestDispatcher,
};
use crate::health::{HealthChecker, HealthPolicy, HealthRecord, HealthTracker};
use crate::lifecycle::Shutdown;
use crate::observability::metrics;
use crate::registry::EndpointRegistry;
use crate::resilience::retries::OutcomeClassifier;
use crate::rpc::error::{RpcClientError, RpcResult};
use crate::rpc::transport::{HttpTransport, RpcTransport};
use crate::rpc::types::RpcCall;

/// Per-call overrides of the chain configuration defaults.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RequestOptions {
    /// Tries per endpoint.
    pub retry_attempts: Option<u32>,
    /// Per-attempt timeout.
    pub timeout: Option<Duration>,
    /// Cap on the total wall-clock time of the call.
    pub deadline: Option<Duration>,
}

impl RequestOptions {
    pub fn with_retry_attempts(mut self, attempts: u32) -> Self {
        self.retry_attempts = Some(attempts);
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    pub fn with_deadline(mut self, deadline: Duration) -> Self {
        self.deadline = Some(deadline);
        self
    }
}

/// Multi-endpoint JSON-RPC client with health-ranked failover.
pub struct RpcClient {
    registry: EndpointRegistry,
    tracker: Arc<HealthTracker>,
    dispatcher: RequestDispatcher,
    checker: Arc<HealthChecker>,
    shutdown: Shutdown,
    health_task: Mutex<Option<JoinHandle<()>>>,
    closed: AtomicBool,
}

impl RpcClient {
    /// Create a client with its own health tracker.
    pub fn new(
        config: &ClientConfig,
        source: Arc<dyn ChainConfigSource>,
        transport: Arc<dyn RpcTransport>,
    ) -> Self {
        let tracker = Arc::new(HealthTracker::new(HealthPolicy::from(&config.health)));
        Self::with_tracker(config, source, transport, tracker)
    }

    /// Create a client around an existing health tracker.
    pub fn with_tracker(
        config: &ClientConfig,
        source: Arc<dyn ChainConfigSource>,
        transport: Arc<dyn RpcTransport>,
        tracker: Arc<HealthTracker>,
    ) -> Self {
        let classifier = OutcomeClassifier::new(config.health.rate_limit_codes.clone());
        let limiter = Arc::new(ConcurrencyLimiter::new(
            config.dispatch.scope,
            config.dispatch.max_concurrent,
        ));
        let dispatcher = RequestDispatcher::new(
            tracker.clone(),
            transport.clone(),
            limiter.clone(),
            classifier.clone(),
            DispatchPolicy::from(&config.dispatch),
        );
        let checker = Arc::new(HealthChecker::new(
            tracker.clone(),
            transport,
            limiter,
            classifier,
            config.health_check.clone(),
        ));

        let client = Self {
            registry: EndpointRegistry::new(source, tracker.clone()),
            tracker,
            dispatcher,
            checker,
            shutdown: Shutdown::new(),
            health_task: Mutex::new(None),
            closed: AtomicBool::new(false),
        };

        if config.health_check.enabled {
            client.spawn_health_check();
        }
        client
    }

    /// Create an HTTP client for the networks in `config`, initializing each of them.
    pub fn from_config(config: &ClientConfig) -> RpcResult<Self> {
        let source = StaticChainConfig::new(config.networks.clone());
        let networks = source.network_ids();
        let transport = HttpTransport::new().map_err(|e| RpcClientError::Transport(e.to_string()))?;

        let client = Self::new(config, Arc::new(source), Arc::new(transport));
        for network in &networks {
            client.registry.initialize_network(network);
        }
        Ok(client)
    }

    fn spawn_health_check(&self) {
        let handle = match Handle::try_current() {
            Ok(handle) => handle,
            Err(_) => {
                tracing::warn!("No Tokio runtime available, periodic health check not started");
                return;
            }
        };

        let checker = self.checker.clone();
        let shutdown = self.shutdown.subscribe();
        let task = handle.spawn(async move { checker.run(shutdown).await });
        *self.health_task.lock().unwrap_or_else(PoisonError::into_inner) = Some(task);
    }

    /// Send one JSON-RPC call through the fallback order of `network`.
    pub async fn request(
        &self,
        network: &NetworkId,
        call: RpcCall,
        options: RequestOptions,
    ) -> RpcResult<Value> {
        if self.is_closed() {
            return Err(RpcClientError::Closed);
        }

        let started = Instant::now();
        self.registry.initialize_network(network);
        let plan = self.plan_for(network, &options);
        let dispatch = self.dispatcher.dispatch(network, &call, plan);

        let result = match options.deadline {
            Some(deadline) => match tokio::time::timeout(deadline, dispatch).await {
                Ok(result) => result,
                Err(_) => {
                    tracing::warn!(
                        network = %network,
                        method = %call.method,
                        deadline = ?deadline,
                        "Request deadline exceeded"
                    );
                    Err(RpcClientError::Timeout(deadline))
                }
            },
            None => dispatch.await,
        };

        let outcome = match &result {
            Ok(_) => "success",
            Err(e) => e.label(),
        };
        metrics::record_request(network, outcome, started);
        result
    }

    /// Convenience wrapper around `request` with default options.
    pub async fn call(&self, network: &NetworkId, method: &str, params: Value) -> RpcResult<Value> {
        self.request(network, RpcCall::new(method, params), RequestOptions::default())
            .await
    }

    fn plan_for(&self, network: &NetworkId, options: &RequestOptions) -> AttemptPlan {
        let settings = self.registry.timeout_settings(network);
        AttemptPlan {
            attempts_per_endpoint: options.retry_attempts.unwrap_or(settings.retry_attempts).max(1),
            request_timeout: options.timeout.unwrap_or(settings.request_timeout),
            retry_delay: settings.retry_delay,
        }
    }

    /// Probe every endpoint of `network` once, outside the periodic schedule.
    pub async fn check_health(&self, network: &NetworkId) -> usize {
        self.registry.initialize_network(network);
        self.checker.check_network(network).await
    }

    /// Copy of the health records of `network`. Does not mutate state.
    pub fn health_snapshot(&self, network: &NetworkId) -> HashMap<String, HealthRecord> {
        self.tracker.snapshot(network)
    }

    pub fn fallback_order(&self, network: &NetworkId) -> Vec<String> {
        self.tracker.fallback_order(network)
    }

    pub fn best_endpoint(&self, network: &NetworkId) -> Option<String> {
        self.tracker.best_endpoint(network)
    }

    pub fn reset_network(&self, network: &NetworkId) {
        self.tracker.reset_network(network);
    }

    pub fn is_rate_limited(&self, url: &str) -> bool {
        self.tracker.is_rate_limited(url)
    }

    pub fn in_flight(&self) -> Vec<InFlightRequest> {
        self.dispatcher.in_flight()
    }

    /// Free concurrency slots for calls on `network`.
    pub fn available_slots(&self, network: &NetworkId) -> usize {
        self.dispatcher.available_slots(network)
    }

    pub fn registry(&self) -> &EndpointRegistry {
        &self.registry
    }

    pub fn tracker(&self) -> &Arc<HealthTracker> {
        &self.tracker
    }

    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }

    /// Stop the health-check task and refuse further requests. Safe to call repeatedly.
    pub fn destroy(&self) {
        if self.closed.swap(true, Ordering::SeqCst) {
            return;
        }

        self.shutdown.trigger();
        if let Some(task) = self
            .health_task
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take()
        {
            task.abort();
        }
        self.dispatcher.close();
        tracing::info!("RPC client destroyed");
    }
}

impl Drop for RpcClient {
    fn drop(&mut self) {
        self.destroy();
    }
}

impl std::fmt::Debug for RpcClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RpcClient")
            .field("registry", &self.registry)
            .field("dispatcher", &self.dispatcher)
            .field("closed", &self.is_closed())
            .finish()
    }
}
