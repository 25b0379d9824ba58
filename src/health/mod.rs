//! Health tracking subsystem.
//!
//! # Data Flow
//! ```text
//! Active health checks (active.rs):
//!     Periodic timer
//!     → Probe each tracked endpoint
//!     → Update tracker.rs
//!
//! Passive health checks (dispatch):
//!     Attempt outcome observed
//!     → tracker.rs record_outcome / mark_rate_limited
//!
//! State machine (state.rs):
//!     Healthy ↔ Degraded → Unhealthy
//!     Consecutive failures drive Unhealthy, one success leaves it
//! ```
//!
//! # Design Decisions
//! - Active and passive outcomes feed the same counters
//! - Health state is per (network, endpoint); rate limits are per endpoint URL
//! - The tracker is an owned, injectable object, not a process-wide singleton

pub mod active;
pub mod state;
pub mod tracker;

pub use active::HealthChecker;
pub use state::{HealthPolicy, HealthRecord, HealthStatus};
pub use tracker::HealthTracker;
