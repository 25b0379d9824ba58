//! Multi-endpoint JSON-RPC client with health-ranked failover.

// Core subsystems
pub mod chain;
pub mod config;
pub mod registry;
pub mod rpc;

// Request execution
pub mod dispatch;
pub mod health;

// Cross-cutting concerns
pub mod lifecycle;
pub mod observability;
pub mod resilience;

pub use chain::{ChainConfigSource, NetworkId, StaticChainConfig, TimeoutSettings};
pub use config::ClientConfig;
pub use health::{HealthRecord, HealthStatus, HealthTracker};
pub use lifecycle::Shutdown;
pub use rpc::{
    ErrorKind, HttpTransport, RequestOptions, RpcCall, RpcClient, RpcClientError, RpcResult,
    RpcTransport,
};
