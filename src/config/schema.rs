//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the client.
//! All types derive Serde traits for deserialization from config files.

use serde::{Deserialize, Serialize};

use crate::chain::TimeoutSettings;

/// Root configuration for the RPC fallback client.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct ClientConfig {
    /// Request dispatch settings (concurrency, backoff).
    pub dispatch: DispatchConfig,

    /// Endpoint health bookkeeping.
    pub health: HealthConfig,

    /// Periodic endpoint probing.
    pub health_check: HealthCheckConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,

    /// Network definitions with their candidate endpoints.
    pub networks: Vec<NetworkConfig>,
}

/// Whether the concurrency bound is shared by all networks or kept per network.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum ConcurrencyScope {
    #[default]
    Global,
    PerNetwork,
}

/// Dispatch configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct DispatchConfig {
    /// Maximum simultaneously in-flight logical calls.
    pub max_concurrent: usize,

    /// Scope of `max_concurrent`.
    pub scope: ConcurrencyScope,

    /// Upper bound for exponential backoff in milliseconds.
    pub max_backoff_ms: u64,

    /// Add up to 10% random jitter to backoff delays.
    pub jitter: bool,

    /// Optional hard cap on sends per logical call.
    pub max_total_attempts: Option<u32>,
}

impl Default for DispatchConfig {
    fn default() -> Self {
        Self {
            max_concurrent: 5,
            scope: ConcurrencyScope::Global,
            max_backoff_ms: 10_000,
            jitter: false,
            max_total_attempts: None,
        }
    }
}

/// Health tracking configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct HealthConfig {
    /// Consecutive failures before an endpoint is marked unhealthy.
    pub unhealthy_threshold: u32,

    /// Success ratio at or above which a succeeding endpoint is healthy
    /// rather than degraded.
    pub healthy_ratio: f64,

    /// How long a throttled endpoint is excluded from selection.
    pub rate_limit_cooldown_secs: u64,

    /// JSON-RPC error codes that providers use for throttling.
    pub rate_limit_codes: Vec<i64>,
}

impl Default for HealthConfig {
    fn default() -> Self {
        Self {
            unhealthy_threshold: 3,
            healthy_ratio: 0.8,
            rate_limit_cooldown_secs: 300,
            rate_limit_codes: vec![-32005],
        }
    }
}

/// Health check configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct HealthCheckConfig {
    /// Enable periodic probes.
    pub enabled: bool,

    /// Probe interval in seconds.
    pub interval_secs: u64,

    /// Probe timeout in seconds.
    pub timeout_secs: u64,

    /// Cheap read-only JSON-RPC method used as the probe.
    pub method: String,
}

impl Default for HealthCheckConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            interval_secs: 60,
            timeout_secs: 5,
            method: "eth_blockNumber".to_string(),
        }
    }
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,

    /// Enable metrics endpoint.
    pub metrics_enabled: bool,

    /// Metrics endpoint bind address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            metrics_enabled: false,
            metrics_address: "127.0.0.1:9090".to_string(),
        }
    }
}

/// A single network and its candidate endpoints.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct NetworkConfig {
    /// Network identifier (chain id or name).
    pub id: String,

    /// Candidate JSON-RPC endpoints in registration order.
    #[serde(default)]
    pub rpc_urls: Vec<String>,

    /// Per-attempt timeout in milliseconds.
    #[serde(default = "default_request_timeout_ms")]
    pub request_timeout_ms: u64,

    /// Tries per endpoint.
    #[serde(default = "default_retry_attempts")]
    pub retry_attempts: u32,

    /// Backoff base delay in milliseconds.
    #[serde(default = "default_retry_delay_ms")]
    pub retry_delay_ms: u64,
}

fn default_request_timeout_ms() -> u64 {
    10_000
}

fn default_retry_attempts() -> u32 {
    3
}

fn default_retry_delay_ms() -> u64 {
    1_000
}

impl NetworkConfig {
    pub fn new(id: impl Into<String>, rpc_urls: Vec<String>) -> Self {
        Self {
            id: id.into(),
            rpc_urls,
            request_timeout_ms: default_request_timeout_ms(),
            retry_attempts: default_retry_attempts(),
            retry_delay_ms: default_retry_delay_ms(),
        }
    }

    pub fn timeout_settings(&self) -> TimeoutSettings {
        TimeoutSettings::from_millis(self.request_timeout_ms, self.retry_attempts, self.retry_delay_ms)
    }
}
