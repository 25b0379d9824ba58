//! Resilience subsystem.
//!
//! # Data Flow
//! ```text
//! Attempt against an endpoint:
//!     → timeouts.rs (enforce per-attempt deadline)
//!     → retries.rs (classify: success / retriable / rate limited / fatal)
//!     → On retriable failure: backoff.rs (exponential delay before next attempt)
//! ```
//!
//! # Design Decisions
//! - Every attempt has a deadline; an elapsed deadline is a retriable failure
//! - Backoff is a pure function of the attempt index
//! - Rate-limited endpoints are skipped without waiting
//! - Malformed requests are fatal and never retried

pub mod backoff;
pub mod retries;
pub mod timeouts;
