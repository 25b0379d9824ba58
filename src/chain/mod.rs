//! Chain configuration collaborator.
//!
//! # Data Flow
//! ```text
//! [[networks]] tables (config file)
//!     → source.rs (StaticChainConfig implements ChainConfigSource)
//!     → registry (endpoint URLs per network)
//!     → dispatch (per-request timeout, retry attempts, retry delay)
//! ```
//!
//! # Design Decisions
//! - The client only ever sees the `ChainConfigSource` trait, so applications
//!   can plug in their own chain metadata service
//! - Unknown networks are not an error here: they simply have no endpoints

pub mod source;
pub mod types;

pub use source::{ChainConfigSource, StaticChainConfig};
pub use types::{NetworkId, TimeoutSettings};
