//! Endpoint registry.
//!
//! # Responsibilities
//! - Resolve the configured endpoint URLs for a network
//! - Seed health records the first time a network is used
//!
//! # Design Decisions
//! - Never fails: an unknown network simply has no endpoints
//! - Invalid and duplicate URLs are dropped with a warning
//! - Initialization is idempotent and never resets existing health

pub mod endpoints;

pub use endpoints::EndpointRegistry;
