//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! config file (TOML)
//!     → loader.rs (parse & deserialize)
//!     → validation.rs (semantic checks)
//!     → ClientConfig (validated, immutable)
//!     → chain::StaticChainConfig (networks) + RpcClient (dispatch, health)
//! ```
//!
//! # Design Decisions
//! - Config is immutable once loaded; endpoint lists are read-only afterwards
//! - All fields have defaults to allow minimal configs
//! - Validation separates syntactic (serde) from semantic checks

pub mod loader;
pub mod schema;
pub mod validation;

pub use loader::{load_config, parse_config, ConfigError};
pub use schema::{
    ClientConfig, ConcurrencyScope, DispatchConfig, HealthCheckConfig, HealthConfig,
    NetworkConfig, ObservabilityConfig,
};
pub use validation::{validate_config, ValidationError};
