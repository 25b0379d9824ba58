//! Error taxonomy surfaced by the client.

use std::time::Duration;

use thiserror::Error;

use crate::chain::NetworkId;

/// Coarse error category, for mapping to user-facing messages.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    NoEndpointsAvailable,
    AllEndpointsExhausted,
    RateLimited,
    Timeout,
    TransportError,
    RpcProtocolError,
    Closed,
}

/// Why a single attempt against one endpoint failed.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum AttemptError {
    #[error("attempt timed out after {0:?}")]
    Timeout(Duration),

    #[error("transport error: {0}")]
    Transport(String),

    #[error("unexpected HTTP status {0}")]
    HttpStatus(u16),

    #[error("invalid response: {0}")]
    InvalidResponse(String),

    #[error("JSON-RPC error {code}: {message}")]
    Rpc { code: i64, message: String },

    #[error("rate limited: {0}")]
    RateLimited(String),
}

impl AttemptError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            AttemptError::Timeout(_) => ErrorKind::Timeout,
            AttemptError::Transport(_)
            | AttemptError::HttpStatus(_)
            | AttemptError::InvalidResponse(_) => ErrorKind::TransportError,
            AttemptError::Rpc { .. } => ErrorKind::RpcProtocolError,
            AttemptError::RateLimited(_) => ErrorKind::RateLimited,
        }
    }
}

/// Errors returned by `RpcClient::request`.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum RpcClientError {
    /// The network has no configured endpoints.
    #[error("no endpoints available for network {0}")]
    NoEndpointsAvailable(NetworkId),

    /// Every scheduled attempt failed.
    #[error("all endpoints exhausted for network {network} after {attempts} attempts: {last}")]
    AllEndpointsExhausted {
        network: NetworkId,
        attempts: usize,
        last: AttemptError,
    },

    /// Every remaining candidate is inside a rate-limit cooldown.
    #[error("all endpoints for network {0} are rate limited")]
    RateLimited(NetworkId),

    /// The caller's deadline elapsed.
    #[error("request timed out after {0:?}")]
    Timeout(Duration),

    #[error("transport error: {0}")]
    Transport(String),

    /// A well-formed JSON-RPC error that retrying cannot fix.
    #[error("JSON-RPC error {code}: {message}")]
    RpcProtocol { code: i64, message: String },

    /// The client was destroyed.
    #[error("RPC client has been destroyed")]
    Closed,
}

impl RpcClientError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            RpcClientError::NoEndpointsAvailable(_) => ErrorKind::NoEndpointsAvailable,
            RpcClientError::AllEndpointsExhausted { .. } => ErrorKind::AllEndpointsExhausted,
            RpcClientError::RateLimited(_) => ErrorKind::RateLimited,
            RpcClientError::Timeout(_) => ErrorKind::Timeout,
            RpcClientError::Transport(_) => ErrorKind::TransportError,
            RpcClientError::RpcProtocol { .. } => ErrorKind::RpcProtocolError,
            RpcClientError::Closed => ErrorKind::Closed,
        }
    }

    /// The last per-attempt failure behind an exhaustion error.
    pub fn last_cause(&self) -> Option<&AttemptError> {
        match self {
            RpcClientError::AllEndpointsExhausted { last, .. } => Some(last),
            _ => None,
        }
    }

    /// Short label used for metrics.
    pub fn label(&self) -> &'static str {
        match self.kind() {
            ErrorKind::NoEndpointsAvailable => "no_endpoints",
            ErrorKind::AllEndpointsExhausted => "exhausted",
            ErrorKind::RateLimited => "rate_limited",
            ErrorKind::Timeout => "timeout",
            ErrorKind::TransportError => "transport_error",
            ErrorKind::RpcProtocolError => "rpc_error",
            ErrorKind::Closed => "closed",
        }
    }
}

impl From<AttemptError> for RpcClientError {
    fn from(error: AttemptError) -> Self {
        match error {
            AttemptError::Timeout(elapsed) => RpcClientError::Timeout(elapsed),
            AttemptError::Rpc { code, message } => RpcClientError::RpcProtocol { code, message },
            other => RpcClientError::Transport(other.to_string()),
        }
    }
}

/// Result type for client operations.
pub type RpcResult<T> = Result<T, RpcClientError>;
