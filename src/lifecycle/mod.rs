//! Lifecycle management.
//!
//! # Data Flow
//! ```text
//! RpcClient::new → spawn periodic health check (subscribed to Shutdown)
//! RpcClient::destroy → Shutdown::trigger → health loop exits → task aborted
//! ```

pub mod shutdown;

pub use shutdown::Shutdown;
