//! Fallback dispatch of a single logical RPC call.
//!
//! # State Machine
//! ```text
//! SELECT_ENDPOINT ──▶ SEND ──▶ SUCCESS            → record success, return result
//!        ▲              ├────▶ RATE_LIMITED       → mark cooldown, skip endpoint, no delay
//!        │              ├────▶ RETRIABLE_FAILURE  → record failure, BACKOFF (EXHAUSTED if
//!        │              │                             nothing sendable is left)
//!        │              └────▶ FATAL_FAILURE      → return error immediately
//!        └──── BACKOFF ◀┘
//! SELECT_ENDPOINT with nothing left ──▶ EXHAUSTED
//! ```
//!
//! # Design Decisions
//! - The attempt schedule (endpoint × tries) is computed up front from the fallback order
//! - Backoff between attempts is a pure function of the zero-based attempt index
//! - Rate limits are re-checked before and after every backoff, so throttling
//!   seen by concurrent calls is honoured mid-call

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use serde_json::Value;
use tracing::Instrument;
use uuid::Uuid;

use crate::chain::NetworkId;
use crate::config::DispatchConfig;
use crate::dispatch::inflight::{InFlightRegistry, InFlightRequest};
use crate::dispatch::limiter::ConcurrencyLimiter;
use crate::health::HealthTracker;
use crate::observability::metrics;
use crate::resilience::backoff::{apply_jitter, calculate_backoff};
use crate::resilience::retries::{AttemptOutcome, OutcomeClassifier};
use crate::resilience::timeouts::with_timeout;
use crate::rpc::error::{AttemptError, RpcClientError, RpcResult};
use crate::rpc::transport::RpcTransport;
use crate::rpc::types::RpcCall;

/// Client-wide dispatch settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DispatchPolicy {
    pub max_backoff: Duration,
    pub jitter: bool,
    pub max_total_attempts: Option<u32>,
}

impl Default for DispatchPolicy {
    fn default() -> Self {
        Self::from(&DispatchConfig::default())
    }
}

impl From<&DispatchConfig> for DispatchPolicy {
    fn from(config: &DispatchConfig) -> Self {
        Self {
            max_backoff: Duration::from_millis(config.max_backoff_ms),
            jitter: config.jitter,
            max_total_attempts: config.max_total_attempts,
        }
    }
}

/// Per-call attempt settings, resolved from chain settings and caller overrides.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AttemptPlan {
    /// Tries against each endpoint before moving on.
    pub attempts_per_endpoint: u32,
    pub request_timeout: Duration,
    /// Backoff base delay.
    pub retry_delay: Duration,
}

/// Ordered (endpoint, try) pairs for one call.
///
/// Each endpoint appears `attempts_per_endpoint` times in a row, in fallback
/// order, truncated to `max_total` entries when set.
pub fn attempt_schedule(
    candidates: &[String],
    attempts_per_endpoint: u32,
    max_total: Option<u32>,
) -> Vec<&str> {
    let per_endpoint = attempts_per_endpoint.max(1) as usize;
    let mut schedule: Vec<&str> = candidates
        .iter()
        .flat_map(|url| std::iter::repeat(url.as_str()).take(per_endpoint))
        .collect();
    if let Some(max_total) = max_total {
        schedule.truncate(max_total as usize);
    }
    schedule
}

enum Step {
    Select(usize),
    Send(usize),
    Backoff { from: usize, next: usize, delay: Duration },
    Exhausted,
}

/// Bookkeeping for one logical call.
struct CallState {
    attempts: usize,
    last_error: Option<AttemptError>,
    /// Whether any failure was something other than a rate limit.
    saw_failure: bool,
}

impl CallState {
    fn new() -> Self {
        Self {
            attempts: 0,
            last_error: None,
            saw_failure: false,
        }
    }

    fn into_error(self, network: &NetworkId) -> RpcClientError {
        match self.last_error {
            Some(last) if self.saw_failure => RpcClientError::AllEndpointsExhausted {
                network: network.clone(),
                attempts: self.attempts,
                last,
            },
            _ => RpcClientError::RateLimited(network.clone()),
        }
    }
}

/// Executes logical calls against the fallback order.
pub struct RequestDispatcher {
    tracker: Arc<HealthTracker>,
    transport: Arc<dyn RpcTransport>,
    limiter: Arc<ConcurrencyLimiter>,
    in_flight: InFlightRegistry,
    classifier: OutcomeClassifier,
    policy: DispatchPolicy,
    next_id: AtomicU64,
}

impl RequestDispatcher {
    pub fn new(
        tracker: Arc<HealthTracker>,
        transport: Arc<dyn RpcTransport>,
        limiter: Arc<ConcurrencyLimiter>,
        classifier: OutcomeClassifier,
        policy: DispatchPolicy,
    ) -> Self {
        Self {
            tracker,
            transport,
            limiter,
            in_flight: InFlightRegistry::new(),
            classifier,
            policy,
            next_id: AtomicU64::new(1),
        }
    }

    /// Run one logical call to completion.
    pub async fn dispatch(&self, network: &NetworkId, call: &RpcCall, plan: AttemptPlan) -> RpcResult<Value> {
        let call_id = Uuid::new_v4();
        let span = tracing::info_span!(
            "rpc_call",
            call_id = %call_id,
            network = %network,
            method = %call.method
        );
        self.dispatch_inner(call_id, network, call, plan)
            .instrument(span)
            .await
    }

    async fn dispatch_inner(
        &self,
        call_id: Uuid,
        network: &NetworkId,
        call: &RpcCall,
        plan: AttemptPlan,
    ) -> RpcResult<Value> {
        let _permit = self.limiter.acquire(network).await?;
        let _entry = self.in_flight.enter(call_id, network, &call.method);

        let candidates = self.tracker.fallback_order(network);
        if candidates.is_empty() {
            return Err(self.empty_order_error(network));
        }

        let schedule = attempt_schedule(&candidates, plan.attempts_per_endpoint, self.policy.max_total_attempts);
        let mut state = CallState::new();
        let mut step = Step::Select(0);

        loop {
            step = match step {
                Step::Select(from) => match self.select(&schedule, from) {
                    Some(index) => Step::Send(index),
                    None => Step::Exhausted,
                },
                Step::Send(index) => {
                    let url = schedule[index];
                    let attempt = state.attempts;
                    state.attempts += 1;

                    tracing::debug!(endpoint = %url, attempt, "Sending request");
                    let request = call.to_request(self.next_id.fetch_add(1, Ordering::Relaxed));
                    let result = with_timeout(plan.request_timeout, self.transport.send(url, &request)).await;
                    let outcome = self.classifier.classify(result);
                    metrics::record_attempt(network, url, outcome.label());

                    match outcome {
                        AttemptOutcome::Success(value) => {
                            self.tracker.record_outcome(network, url, true);
                            tracing::debug!(endpoint = %url, attempt, "Request succeeded");
                            return Ok(value);
                        }
                        AttemptOutcome::Fatal(error) => {
                            tracing::warn!(endpoint = %url, error = %error, "Request rejected, not retrying");
                            return Err(error.into());
                        }
                        AttemptOutcome::RateLimited(error) => {
                            self.tracker.mark_rate_limited(url);
                            self.tracker.record_outcome(network, url, false);
                            state.last_error = Some(error);
                            Step::Select(index + 1)
                        }
                        AttemptOutcome::Retriable(error) => {
                            tracing::warn!(endpoint = %url, attempt, error = %error, "Attempt failed");
                            self.tracker.record_outcome(network, url, false);
                            state.last_error = Some(error);
                            state.saw_failure = true;

                            // Only wait if something is left to send after the wait.
                            match self.select(&schedule, index + 1) {
                                Some(next) => Step::Backoff {
                                    from: index,
                                    next,
                                    delay: self.backoff_delay(attempt as u32, plan.retry_delay),
                                },
                                None => Step::Exhausted,
                            }
                        }
                    }
                }
                Step::Backoff { from, next, delay } => {
                    if schedule[next] != schedule[from] {
                        tracing::info!(endpoint = %schedule[next], delay = ?delay, "Falling back to next endpoint");
                    } else {
                        tracing::debug!(delay = ?delay, "Retrying endpoint after backoff");
                    }
                    tokio::time::sleep(delay).await;
                    Step::Select(next)
                }
                Step::Exhausted => {
                    let error = state.into_error(network);
                    tracing::warn!(error = %error, "Request failed");
                    return Err(error);
                }
            };
        }
    }

    /// First schedule entry at or after `from` whose endpoint is not rate limited.
    fn select(&self, schedule: &[&str], from: usize) -> Option<usize> {
        (from..schedule.len()).find(|&index| !self.tracker.is_rate_limited(schedule[index]))
    }

    fn backoff_delay(&self, attempt: u32, base: Duration) -> Duration {
        let delay = calculate_backoff(attempt, base, self.policy.max_backoff);
        if self.policy.jitter {
            apply_jitter(delay)
        } else {
            delay
        }
    }

    fn empty_order_error(&self, network: &NetworkId) -> RpcClientError {
        if self.tracker.urls(network).is_empty() {
            tracing::warn!("No endpoints configured");
            RpcClientError::NoEndpointsAvailable(network.clone())
        } else {
            tracing::warn!("Every endpoint is rate limited");
            RpcClientError::RateLimited(network.clone())
        }
    }

    /// Free concurrency slots for calls on `network`.
    pub fn available_slots(&self, network: &NetworkId) -> usize {
        self.limiter.available(network)
    }

    pub fn in_flight(&self) -> Vec<InFlightRequest> {
        self.in_flight.snapshot()
    }

    /// Release queued callers with `Closed` and refuse new slots.
    pub fn close(&self) {
        self.limiter.close();
    }
}

impl std::fmt::Debug for RequestDispatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RequestDispatcher")
            .field("policy", &self.policy)
            .field("max_concurrent", &self.limiter.max_concurrent())
            .field("in_flight", &self.in_flight.len())
            .finish()
    }
}
