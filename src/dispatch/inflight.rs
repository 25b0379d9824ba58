//! Registry of currently executing calls.
//!
//! # Design Decisions
//! - Entries are owned by an RAII guard, so every exit path (success,
//!   failure, timeout, cancellation) removes them

use std::sync::Arc;

use dashmap::DashMap;
use tokio::time::Instant;
use uuid::Uuid;

use crate::chain::NetworkId;
use crate::observability::metrics;

/// One executing call.
#[derive(Debug, Clone)]
pub struct InFlightRequest {
    pub id: Uuid,
    pub network: NetworkId,
    pub method: String,
    pub started: Instant,
}

#[derive(Debug, Clone, Default)]
pub struct InFlightRegistry {
    entries: Arc<DashMap<Uuid, InFlightRequest>>,
}

impl InFlightRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a call; it stays registered until the guard is dropped.
    pub fn enter(&self, id: Uuid, network: &NetworkId, method: &str) -> InFlightGuard {
        self.entries.insert(
            id,
            InFlightRequest {
                id,
                network: network.clone(),
                method: method.to_string(),
                started: Instant::now(),
            },
        );
        metrics::set_in_flight(self.entries.len());
        InFlightGuard {
            entries: self.entries.clone(),
            id,
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn snapshot(&self) -> Vec<InFlightRequest> {
        self.entries.iter().map(|e| e.value().clone()).collect()
    }
}

/// Removes its registry entry on drop.
#[derive(Debug)]
pub struct InFlightGuard {
    entries: Arc<DashMap<Uuid, InFlightRequest>>,
    id: Uuid,
}

impl Drop for InFlightGuard {
    fn drop(&mut self) {
        self.entries.remove(&self.id);
        metrics::set_in_flight(self.entries.len());
    }
}
