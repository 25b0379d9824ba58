//! Network identifiers and per-network timing settings.

use std::fmt;
use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Identifier of a blockchain network.
///
/// String-backed so that EVM chain ids ("1", "137") and non-EVM names
/// ("solana", "bitcoin") share one key space.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NetworkId(pub String);

impl NetworkId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for NetworkId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for NetworkId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

impl From<String> for NetworkId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

impl From<u64> for NetworkId {
    fn from(chain_id: u64) -> Self {
        Self(chain_id.to_string())
    }
}

/// Timing settings a chain configuration source hands out per network.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimeoutSettings {
    /// Deadline for a single JSON-RPC attempt.
    pub request_timeout: Duration,
    /// Tries per endpoint before falling back to the next one.
    pub retry_attempts: u32,
    /// Base delay for exponential backoff between attempts.
    pub retry_delay: Duration,
}

impl TimeoutSettings {
    pub fn from_millis(request_timeout_ms: u64, retry_attempts: u32, retry_delay_ms: u64) -> Self {
        Self {
            request_timeout: Duration::from_millis(request_timeout_ms),
            retry_attempts,
            retry_delay: Duration::from_millis(retry_delay_ms),
        }
    }
}

impl Default for TimeoutSettings {
    fn default() -> Self {
        Self::from_millis(10_000, 3, 1_000)
    }
}
