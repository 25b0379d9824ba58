//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! Dispatcher, health tracker, facade produce:
//!     → tracing events (one span per logical call, keyed by a UUID call id)
//!     → metrics.rs (counters, gauges, histograms)
//!
//! Consumers:
//!     → logging.rs subscriber (stdout)
//!     → Prometheus scrape endpoint, when enabled
//! ```
//!
//! # Design Decisions
//! - Recording functions are always safe to call; without an installed
//!   recorder the `metrics` facade drops them
//! - The library never installs a subscriber or recorder itself

pub mod logging;
pub mod metrics;

pub use logging::init_logging;
pub use self::metrics::init_metrics;
