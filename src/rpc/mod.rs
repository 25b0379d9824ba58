//! JSON-RPC client surface.
//!
//! # Data Flow
//! ```text
//! RpcClient::request(network, call, options)
//!     → EndpointRegistry::initialize_network (lazy)
//!     → RequestDispatcher::dispatch (fallback order, retries, backoff)
//!     → RpcTransport::send (one HTTP POST per attempt)
//!     → OutcomeClassifier → HealthTracker
//! ```

pub mod client;
pub mod error;
pub mod transport;
pub mod types;

pub use client::{RequestOptions, RpcClient};
pub use error::{AttemptError, ErrorKind, RpcClientError, RpcResult};
pub use transport::{HttpReply, HttpTransport, RpcTransport, TransportFailure};
pub use types::{JsonRpcErrorObject, JsonRpcRequest, JsonRpcResponse, RpcCall};
