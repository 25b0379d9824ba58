//! Chain configuration sources.

use std::collections::HashMap;

use crate::chain::types::{NetworkId, TimeoutSettings};
use crate::config::NetworkConfig;

/// Supplier of per-network endpoint lists and timing settings.
pub trait ChainConfigSource: Send + Sync {
    /// Candidate endpoint URLs in registration order; empty for unknown networks.
    fn endpoints(&self, network: &NetworkId) -> Vec<String>;

    /// Timing settings for the network.
    fn timeout_settings(&self, network: &NetworkId) -> TimeoutSettings;
}

/// Chain configuration backed by the `[[networks]]` tables of a config file.
#[derive(Debug, Clone, Default)]
pub struct StaticChainConfig {
    networks: HashMap<NetworkId, NetworkConfig>,
}

impl StaticChainConfig {
    pub fn new(networks: Vec<NetworkConfig>) -> Self {
        let networks = networks
            .into_iter()
            .map(|network| (NetworkId::from(network.id.clone()), network))
            .collect();
        Self { networks }
    }

    /// Network ids known to this source.
    pub fn network_ids(&self) -> Vec<NetworkId> {
        let mut ids: Vec<_> = self.networks.keys().cloned().collect();
        ids.sort();
        ids
    }
}

impl ChainConfigSource for StaticChainConfig {
    fn endpoints(&self, network: &NetworkId) -> Vec<String> {
        self.networks
            .get(network)
            .map(|n| n.rpc_urls.clone())
            .unwrap_or_default()
    }

    fn timeout_settings(&self, network: &NetworkId) -> TimeoutSettings {
        self.networks
            .get(network)
            .map(NetworkConfig::timeout_settings)
            .unwrap_or_default()
    }
}
