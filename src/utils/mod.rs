//! Utility modules for the oracle.
//!
//! This module contains shared utilities used across the crate:
//! - Constants
//! - Numeric helpers and jitter
//! - Volume formatting
//! - Clock abstraction

pub mod constants;
pub mod format;
pub mod math;
pub mod time;

pub use constants::*;
pub use format::*;
pub use math::*;
pub use time::*;
