//! Endpoint health state machine.
//!
//! # States
//! - Healthy: recent outcomes are mostly successful
//! - Degraded: failing occasionally, still ranked by success ratio
//! - Unhealthy: the latest run of consecutive failures reached the threshold
//!
//! # State Transitions
//! ```text
//! any → Unhealthy: consecutive failures >= unhealthy_threshold
//! Unhealthy → Healthy | Degraded: a single success (ratio decides which)
//! Healthy ↔ Degraded: success ratio crosses healthy_ratio
//! ```

use std::time::Duration;

use serde::Serialize;
use tokio::time::Instant;

use crate::config::HealthConfig;

/// Ranking score given to an endpoint that has no recorded outcomes yet.
///
/// Untried endpoints rank alongside perfect ones, so a reset network falls
/// back to registration order.
pub const NEUTRAL_SCORE: f64 = 1.0;

/// Health status of a single endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum HealthStatus {
    Healthy,
    Degraded,
    Unhealthy,
}

impl HealthStatus {
    /// Gauge value exported for dashboards.
    pub fn as_gauge(self) -> f64 {
        match self {
            HealthStatus::Healthy => 1.0,
            HealthStatus::Degraded => 0.5,
            HealthStatus::Unhealthy => 0.0,
        }
    }
}

/// Thresholds governing status transitions and rate-limit cooldowns.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HealthPolicy {
    pub unhealthy_threshold: u32,
    pub healthy_ratio: f64,
    pub rate_limit_cooldown: Duration,
}

impl Default for HealthPolicy {
    fn default() -> Self {
        Self::from(&HealthConfig::default())
    }
}

impl From<&HealthConfig> for HealthPolicy {
    fn from(config: &HealthConfig) -> Self {
        Self {
            unhealthy_threshold: config.unhealthy_threshold.max(1),
            healthy_ratio: config.healthy_ratio,
            rate_limit_cooldown: Duration::from_secs(config.rate_limit_cooldown_secs),
        }
    }
}

/// Reliability record for one (network, endpoint) pair.
#[derive(Debug, Clone, PartialEq)]
pub struct HealthRecord {
    /// Lifetime successes; only cleared by an explicit reset.
    pub success_count: u64,
    /// Lifetime failures; only cleared by an explicit reset.
    pub failure_count: u64,
    /// Length of the current run of failures.
    pub consecutive_failures: u32,
    pub status: HealthStatus,
    /// End of the active rate-limit cooldown, if any.
    pub rate_limited_until: Option<Instant>,
}

impl Default for HealthRecord {
    fn default() -> Self {
        Self {
            success_count: 0,
            failure_count: 0,
            consecutive_failures: 0,
            status: HealthStatus::Healthy,
            rate_limited_until: None,
        }
    }
}

impl HealthRecord {
    /// `success / (success + failure)`, or `None` before any outcome.
    pub fn success_ratio(&self) -> Option<f64> {
        let total = self.success_count + self.failure_count;
        if total == 0 {
            None
        } else {
            Some(self.success_count as f64 / total as f64)
        }
    }

    /// Score used to rank endpoints in the fallback order.
    pub fn score(&self) -> f64 {
        self.success_ratio().unwrap_or(NEUTRAL_SCORE)
    }

    pub(crate) fn record_success(&mut self, policy: &HealthPolicy) {
        self.success_count = self.success_count.saturating_add(1);
        self.consecutive_failures = 0;
        self.status = self.derive_status(policy);
    }

    pub(crate) fn record_failure(&mut self, policy: &HealthPolicy) {
        self.failure_count = self.failure_count.saturating_add(1);
        self.consecutive_failures = self.consecutive_failures.saturating_add(1);
        self.status = self.derive_status(policy);
    }

    fn derive_status(&self, policy: &HealthPolicy) -> HealthStatus {
        if self.consecutive_failures >= policy.unhealthy_threshold {
            HealthStatus::Unhealthy
        } else if self.score() >= policy.healthy_ratio {
            HealthStatus::Healthy
        } else {
            HealthStatus::Degraded
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_three_consecutive_failures_mark_unhealthy() {
        let policy = HealthPolicy::default();
        let mut record = HealthRecord::default();

        record.record_failure(&policy);
        record.record_failure(&policy);
        assert_ne!(record.status, HealthStatus::Unhealthy);

        record.record_failure(&policy);
        assert_eq!(record.status, HealthStatus::Unhealthy);
        assert_eq!(record.failure_count, 3);
    }

    #[test]
    fn test_single_success_leaves_unhealthy() {
        let policy = HealthPolicy::default();
        let mut record = HealthRecord::default();
        for _ in 0..5 {
            record.record_failure(&policy);
        }

        record.record_success(&policy);
        assert_eq!(record.status, HealthStatus::Degraded);
        assert_eq!(record.consecutive_failures, 0);
        assert_eq!(record.failure_count, 5);
    }

    #[test]
    fn test_interleaved_failures_never_reach_threshold() {
        let policy = HealthPolicy::default();
        let mut record = HealthRecord::default();
        for _ in 0..10 {
            record.record_failure(&policy);
            record.record_failure(&policy);
            record.record_success(&policy);
        }
        assert_ne!(record.status, HealthStatus::Unhealthy);
        assert_eq!(record.failure_count, 20);
    }

    #[test]
    fn test_ratio_and_neutral_score() {
        let policy = HealthPolicy::default();
        let mut record = HealthRecord::default();
        assert_eq!(record.success_ratio(), None);
        assert_eq!(record.score(), NEUTRAL_SCORE);

        record.record_success(&policy);
        record.record_failure(&policy);
        assert_eq!(record.success_ratio(), Some(0.5));
    }
}
