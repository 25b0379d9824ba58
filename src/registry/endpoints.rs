//! Per-network endpoint lists backed by the chain configuration source.

use std::collections::HashSet;
use std::sync::Arc;

use url::Url;

use crate::chain::{ChainConfigSource, NetworkId, TimeoutSettings};
use crate::health::HealthTracker;

pub struct EndpointRegistry {
    source: Arc<dyn ChainConfigSource>,
    tracker: Arc<HealthTracker>,
}

impl EndpointRegistry {
    pub fn new(source: Arc<dyn ChainConfigSource>, tracker: Arc<HealthTracker>) -> Self {
        Self { source, tracker }
    }

    /// Configured endpoint URLs for `network`, in registration order.
    pub fn get_endpoints(&self, network: &NetworkId) -> Vec<String> {
        let mut seen = HashSet::new();
        self.source
            .endpoints(network)
            .into_iter()
            .filter(|url| match Url::parse(url) {
                Ok(_) => seen.insert(url.clone()),
                Err(e) => {
                    tracing::warn!(network = %network, url = %url, error = %e, "Ignoring invalid RPC URL");
                    false
                }
            })
            .collect()
    }

    pub fn has_endpoints(&self, network: &NetworkId) -> bool {
        !self.get_endpoints(network).is_empty()
    }

    /// Create health records for endpoints not yet tracked. Returns how many were added.
    pub fn initialize_network(&self, network: &NetworkId) -> usize {
        let urls = self.get_endpoints(network);
        let added = self.tracker.register(network, &urls);
        if added > 0 {
            tracing::info!(network = %network, endpoints = added, "Network initialized");
        }
        added
    }

    pub fn timeout_settings(&self, network: &NetworkId) -> TimeoutSettings {
        self.source.timeout_settings(network)
    }
}

impl std::fmt::Debug for EndpointRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EndpointRegistry")
            .field("networks", &self.tracker.networks())
            .finish()
    }
}
