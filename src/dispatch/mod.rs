//! Request dispatch subsystem.
//!
//! # Data Flow
//! ```text
//! RpcClient::request
//!     → limiter.rs (wait for a concurrency slot)
//!     → inflight.rs (register the executing call)
//!     → dispatcher.rs (fallback order → attempts → outcome)
//!         → health tracker (record success / failure / rate limit)
//!     → slot and registry entry released on every exit path
//! ```
//!
//! # Design Decisions
//! - Callers beyond the concurrency bound queue instead of failing
//! - The bound is global by default, per network when configured
//! - Per-attempt failures stay inside the dispatcher; only exhaustion surfaces

pub mod dispatcher;
pub mod inflight;
pub mod limiter;

pub use dispatcher::{attempt_schedule, AttemptPlan, DispatchPolicy, RequestDispatcher};
pub use inflight::{InFlightRegistry, InFlightRequest};
pub use limiter::ConcurrencyLimiter;
