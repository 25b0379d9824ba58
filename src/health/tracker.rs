//! Per-endpoint health and rate-limit bookkeeping.
//!
//! # Responsibilities
//! - Hold one `HealthRecord` per (network, endpoint) pair
//! - Track rate-limit cooldowns per endpoint URL
//! - Derive the ranked fallback order on demand
//!
//! # Design Decisions
//! - Pure in-memory state, no I/O
//! - Records live in a `DashMap` so concurrent outcome updates never lose increments
//! - Cooldowns are keyed by URL: a throttled provider is throttled for every network
//! - The fallback order is recomputed on every call, never cached

use std::collections::HashMap;

use dashmap::DashMap;
use tokio::time::Instant;

use crate::chain::NetworkId;
use crate::health::state::{HealthPolicy, HealthRecord, HealthStatus};
use crate::observability::metrics;

#[derive(Debug, Clone)]
struct TrackedEndpoint {
    url: String,
    record: HealthRecord,
}

/// Authoritative record of endpoint reliability.
#[derive(Debug, Default)]
pub struct HealthTracker {
    policy: HealthPolicy,
    /// Endpoints per network, in registration order.
    networks: DashMap<NetworkId, Vec<TrackedEndpoint>>,
    /// Rate-limit cooldown expiry per endpoint URL.
    cooldowns: DashMap<String, Instant>,
}

impl HealthTracker {
    pub fn new(policy: HealthPolicy) -> Self {
        Self {
            policy,
            networks: DashMap::new(),
            cooldowns: DashMap::new(),
        }
    }

    /// Start tracking any of `urls` not yet known for `network`.
    ///
    /// Existing records are left untouched. Returns the number of endpoints added.
    pub fn register(&self, network: &NetworkId, urls: &[String]) -> usize {
        if urls.is_empty() {
            return 0;
        }

        let mut endpoints = self.networks.entry(network.clone()).or_default();
        let mut added = 0;
        for url in urls {
            if !endpoints.iter().any(|e| &e.url == url) {
                endpoints.push(TrackedEndpoint {
                    url: url.clone(),
                    record: HealthRecord::default(),
                });
                added += 1;
            }
        }
        added
    }

    /// Networks with at least one tracked endpoint.
    pub fn networks(&self) -> Vec<NetworkId> {
        let mut ids: Vec<_> = self.networks.iter().map(|e| e.key().clone()).collect();
        ids.sort();
        ids
    }

    /// Tracked endpoint URLs for `network`, in registration order.
    pub fn urls(&self, network: &NetworkId) -> Vec<String> {
        self.networks
            .get(network)
            .map(|endpoints| endpoints.iter().map(|e| e.url.clone()).collect())
            .unwrap_or_default()
    }

    /// Record the outcome of one attempt against an endpoint.
    ///
    /// Returns the endpoint's new status, or `None` if the endpoint is not tracked.
    pub fn record_outcome(&self, network: &NetworkId, url: &str, success: bool) -> Option<HealthStatus> {
        let (previous, current) = {
            let mut endpoints = self.networks.get_mut(network)?;
            let endpoint = endpoints.iter_mut().find(|e| e.url == url)?;
            let previous = endpoint.record.status;
            if success {
                endpoint.record.record_success(&self.policy);
            } else {
                endpoint.record.record_failure(&self.policy);
            }
            (previous, endpoint.record.status)
        };

        if previous != current {
            match current {
                HealthStatus::Unhealthy => tracing::warn!(
                    network = %network,
                    endpoint = %url,
                    from = ?previous,
                    "Endpoint marked unhealthy"
                ),
                _ => tracing::info!(
                    network = %network,
                    endpoint = %url,
                    from = ?previous,
                    to = ?current,
                    "Endpoint health changed"
                ),
            }
        }
        metrics::record_endpoint_health(network, url, current);

        Some(current)
    }

    /// Exclude `url` from selection for the cooldown period, counted from now.
    ///
    /// Re-marking restarts the cooldown; it does not stack.
    pub fn mark_rate_limited(&self, url: &str) {
        let until = Instant::now() + self.policy.rate_limit_cooldown;
        self.cooldowns.insert(url.to_string(), until);
        tracing::warn!(
            endpoint = %url,
            cooldown_secs = self.policy.rate_limit_cooldown.as_secs(),
            "Endpoint rate limited"
        );
        metrics::record_rate_limited(url);
    }

    /// Whether `url` is inside an active cooldown. Expired cooldowns are dropped.
    pub fn is_rate_limited(&self, url: &str) -> bool {
        self.rate_limited_until(url).is_some()
    }

    /// End of the active cooldown for `url`, if any.
    pub fn rate_limited_until(&self, url: &str) -> Option<Instant> {
        let now = Instant::now();
        let until = *self.cooldowns.get(url)?;
        if now < until {
            return Some(until);
        }
        self.cooldowns.remove_if(url, |_, until| now >= *until);
        None
    }

    /// Endpoints of `network` eligible for selection, best first.
    ///
    /// Rate-limited endpoints are excluded. The rest are sorted by descending
    /// success ratio with ties kept in registration order.
    pub fn fallback_order(&self, network: &NetworkId) -> Vec<String> {
        let candidates: Vec<(String, f64)> = match self.networks.get(network) {
            Some(endpoints) => endpoints
                .iter()
                .map(|e| (e.url.clone(), e.record.score()))
                .collect(),
            None => return Vec::new(),
        };

        let mut eligible: Vec<_> = candidates
            .into_iter()
            .filter(|(url, _)| !self.is_rate_limited(url))
            .collect();
        // Stable sort keeps registration order among equal scores.
        eligible.sort_by(|a, b| b.1.total_cmp(&a.1));
        eligible.into_iter().map(|(url, _)| url).collect()
    }

    /// First endpoint of the fallback order.
    pub fn best_endpoint(&self, network: &NetworkId) -> Option<String> {
        self.fallback_order(network).into_iter().next()
    }

    /// Zero every counter and clear every cooldown for `network`.
    pub fn reset_network(&self, network: &NetworkId) {
        let urls = match self.networks.get_mut(network) {
            Some(mut endpoints) => {
                for endpoint in endpoints.iter_mut() {
                    endpoint.record = HealthRecord::default();
                }
                endpoints.iter().map(|e| e.url.clone()).collect::<Vec<_>>()
            }
            None => return,
        };

        for url in &urls {
            self.cooldowns.remove(url);
            metrics::record_endpoint_health(network, url, HealthStatus::Healthy);
        }
        tracing::info!(network = %network, endpoints = urls.len(), "Network health reset");
    }

    /// Copy of every record of `network`, with active cooldowns filled in.
    pub fn snapshot(&self, network: &NetworkId) -> HashMap<String, HealthRecord> {
        let records: Vec<(String, HealthRecord)> = match self.networks.get(network) {
            Some(endpoints) => endpoints
                .iter()
                .map(|e| (e.url.clone(), e.record.clone()))
                .collect(),
            None => return HashMap::new(),
        };

        records
            .into_iter()
            .map(|(url, mut record)| {
                record.rate_limited_until = self.rate_limited_until(&url);
                (url, record)
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::time::Duration;

    fn tracker_with(urls: &[&str]) -> (HealthTracker, NetworkId) {
        let tracker = HealthTracker::new(HealthPolicy::default());
        let network = NetworkId::from("1");
        let urls: Vec<String> = urls.iter().map(|u| u.to_string()).collect();
        tracker.register(&network, &urls);
        (tracker, network)
    }

    #[test]
    fn test_register_is_idempotent() {
        let (tracker, network) = tracker_with(&["http://a", "http://b"]);
        tracker.record_outcome(&network, "http://a", false);

        let added = tracker.register(&network, &["http://a".into(), "http://c".into()]);
        assert_eq!(added, 1);
        assert_eq!(tracker.urls(&network), vec!["http://a", "http://b", "http://c"]);
        assert_eq!(tracker.snapshot(&network)["http://a"].failure_count, 1);
    }

    #[test]
    fn test_order_by_success_ratio() {
        let (tracker, network) = tracker_with(&["http://a", "http://b", "http://c"]);
        tracker.record_outcome(&network, "http://a", false);
        tracker.record_outcome(&network, "http://b", true);
        tracker.record_outcome(&network, "http://b", false);

        assert_eq!(
            tracker.fallback_order(&network),
            vec!["http://c", "http://b", "http://a"]
        );
        assert_eq!(tracker.best_endpoint(&network).as_deref(), Some("http://c"));
    }

    #[test]
    fn test_order_has_no_duplicates_or_strangers() {
        let (tracker, network) = tracker_with(&["http://a", "http://b", "http://a"]);
        tracker.record_outcome(&network, "http://z", true);

        let order = tracker.fallback_order(&network);
        assert_eq!(order, vec!["http://a", "http://b"]);
        assert!(tracker.snapshot(&network).get("http://z").is_none());
    }

    #[test]
    fn test_unknown_network() {
        let tracker = HealthTracker::default();
        let network = NetworkId::from("nope");
        assert!(tracker.fallback_order(&network).is_empty());
        assert!(tracker.best_endpoint(&network).is_none());
        assert!(tracker.record_outcome(&network, "http://a", true).is_none());
    }

    #[test]
    fn test_unhealthy_after_three_failures_and_recovery() {
        let (tracker, network) = tracker_with(&["http://a"]);
        for _ in 0..2 {
            tracker.record_outcome(&network, "http://a", false);
        }
        let status = tracker.record_outcome(&network, "http://a", false);
        assert_eq!(status, Some(HealthStatus::Unhealthy));

        let status = tracker.record_outcome(&network, "http://a", true);
        assert_ne!(status, Some(HealthStatus::Unhealthy));
    }

    #[tokio::test(start_paused = true)]
    async fn test_rate_limit_excludes_until_cooldown_elapses() {
        let (tracker, network) = tracker_with(&["http://a", "http://b"]);

        tracker.mark_rate_limited("http://a");
        assert!(tracker.is_rate_limited("http://a"));
        assert_eq!(tracker.fallback_order(&network), vec!["http://b"]);

        tokio::time::advance(Duration::from_secs(299)).await;
        assert!(tracker.is_rate_limited("http://a"));

        tokio::time::advance(Duration::from_secs(1) + Duration::from_millis(1)).await;
        assert!(!tracker.is_rate_limited("http://a"));
        assert_eq!(tracker.fallback_order(&network), vec!["http://a", "http://b"]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_remarking_restarts_cooldown() {
        let (tracker, _) = tracker_with(&["http://a"]);
        tracker.mark_rate_limited("http://a");
        let first = tracker.rate_limited_until("http://a").unwrap();

        tokio::time::advance(Duration::from_secs(200)).await;
        tracker.mark_rate_limited("http://a");
        let second = tracker.rate_limited_until("http://a").unwrap();

        assert_eq!(second - first, Duration::from_secs(200));
        tokio::time::advance(Duration::from_secs(250)).await;
        assert!(tracker.is_rate_limited("http://a"));
    }

    #[test]
    fn test_reset_restores_registration_order() {
        let (tracker, network) = tracker_with(&["http://a", "http://b", "http://c"]);
        for _ in 0..3 {
            tracker.record_outcome(&network, "http://a", false);
        }
        tracker.record_outcome(&network, "http://c", true);
        tracker.mark_rate_limited("http://b");

        tracker.reset_network(&network);

        assert_eq!(
            tracker.fallback_order(&network),
            vec!["http://a", "http://b", "http://c"]
        );
        let snapshot = tracker.snapshot(&network);
        assert!(snapshot.values().all(|r| *r == HealthRecord::default()));
    }

    #[test]
    fn test_concurrent_updates_lose_nothing() {
        let (tracker, network) = tracker_with(&["http://a"]);
        let tracker = Arc::new(tracker);

        std::thread::scope(|scope| {
            for i in 0..8 {
                let tracker = tracker.clone();
                let network = network.clone();
                scope.spawn(move || {
                    for _ in 0..1_000 {
                        tracker.record_outcome(&network, "http://a", i % 2 == 0);
                    }
                });
            }
        });

        let record = &tracker.snapshot(&network)["http://a"];
        assert_eq!(record.success_count, 4_000);
        assert_eq!(record.failure_count, 4_000);
    }
}
