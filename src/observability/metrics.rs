//! Metrics collection and exposition.
//!
//! # Metrics
//! - `rpc_requests_total` (counter): logical calls by network, outcome
//! - `rpc_request_duration_seconds` (histogram): logical call latency by network
//! - `rpc_attempts_total` (counter): single attempts by network, endpoint, outcome
//! - `rpc_rate_limited_total` (counter): rate-limit detections by endpoint
//! - `rpc_endpoint_health` (gauge): 1=healthy, 0.5=degraded, 0=unhealthy
//! - `rpc_in_flight_requests` (gauge): calls holding a concurrency slot

use std::net::SocketAddr;

use ::metrics::{counter, gauge, histogram};
use metrics_exporter_prometheus::{BuildError, PrometheusBuilder};
use tokio::time::Instant;

use crate::chain::NetworkId;
use crate::health::HealthStatus;

/// Install the Prometheus recorder and its HTTP scrape listener.
///
/// Must be called from within a Tokio runtime.
pub fn init_metrics(addr: SocketAddr) -> Result<(), BuildError> {
    PrometheusBuilder::new().with_http_listener(addr).install()?;
    tracing::info!(address = %addr, "Prometheus metrics endpoint listening");
    Ok(())
}

pub fn record_request(network: &NetworkId, outcome: &'static str, started: Instant) {
    counter!(
        "rpc_requests_total",
        "network" => network.to_string(),
        "outcome" => outcome
    )
    .increment(1);
    histogram!("rpc_request_duration_seconds", "network" => network.to_string())
        .record(started.elapsed().as_secs_f64());
}

pub fn record_attempt(network: &NetworkId, endpoint: &str, outcome: &'static str) {
    counter!(
        "rpc_attempts_total",
        "network" => network.to_string(),
        "endpoint" => endpoint.to_string(),
        "outcome" => outcome
    )
    .increment(1);
}

pub fn record_rate_limited(endpoint: &str) {
    counter!("rpc_rate_limited_total", "endpoint" => endpoint.to_string()).increment(1);
}

pub fn record_endpoint_health(network: &NetworkId, endpoint: &str, status: HealthStatus) {
    gauge!(
        "rpc_endpoint_health",
        "network" => network.to_string(),
        "endpoint" => endpoint.to_string()
    )
    .set(status.as_gauge());
}

pub fn set_in_flight(count: usize) {
    gauge!("rpc_in_flight_requests").set(count as f64);
}
