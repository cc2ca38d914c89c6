//! Monitoring for the oracle.
//!
//! # Components
//!
//! - **Metrics**: request, cache and upstream counters
//! - **Health**: concurrent reachability probes for each provider

pub mod health;
pub mod metrics;

pub use health::*;
pub use metrics::*;
