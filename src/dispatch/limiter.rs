//! Concurrency bound on in-flight calls.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use dashmap::DashMap;
use tokio::sync::{OwnedSemaphorePermit, Semaphore};

use crate::chain::NetworkId;
use crate::config::ConcurrencyScope;
use crate::rpc::error::{RpcClientError, RpcResult};

/// Hands out slots for logical calls; callers beyond the bound wait.
#[derive(Debug)]
pub struct ConcurrencyLimiter {
    scope: ConcurrencyScope,
    max_concurrent: usize,
    global: Arc<Semaphore>,
    per_network: DashMap<NetworkId, Arc<Semaphore>>,
    closed: AtomicBool,
}

impl ConcurrencyLimiter {
    pub fn new(scope: ConcurrencyScope, max_concurrent: usize) -> Self {
        let max_concurrent = max_concurrent.max(1);
        Self {
            scope,
            max_concurrent,
            global: Arc::new(Semaphore::new(max_concurrent)),
            per_network: DashMap::new(),
            closed: AtomicBool::new(false),
        }
    }

    pub fn max_concurrent(&self) -> usize {
        self.max_concurrent
    }

    /// Wait for a slot. The slot is released when the permit is dropped.
    pub async fn acquire(&self, network: &NetworkId) -> RpcResult<OwnedSemaphorePermit> {
        self.semaphore(network)
            .acquire_owned()
            .await
            .map_err(|_| RpcClientError::Closed)
    }

    /// Free slots for calls on `network`.
    pub fn available(&self, network: &NetworkId) -> usize {
        self.semaphore(network).available_permits()
    }

    /// Fail current and future waiters with `Closed`.
    pub fn close(&self) {
        self.closed.store(true, Ordering::SeqCst);
        self.global.close();
        for semaphore in self.per_network.iter() {
            semaphore.close();
        }
    }

    fn semaphore(&self, network: &NetworkId) -> Arc<Semaphore> {
        match self.scope {
            ConcurrencyScope::Global => self.global.clone(),
            ConcurrencyScope::PerNetwork => self
                .per_network
                .entry(network.clone())
                .or_insert_with(|| {
                    let semaphore = Semaphore::new(self.max_concurrent);
                    if self.closed.load(Ordering::SeqCst) {
                        semaphore.close();
                    }
                    Arc::new(semaphore)
                })
                .clone(),
        }
    }
}
