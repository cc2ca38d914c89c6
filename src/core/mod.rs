//! Core modules for the oracle.
//!
//! This module contains the fundamental building blocks:
//! - Canonical data model (pairs, readings, source status, stats)
//! - Service configuration

pub mod config;
pub mod types;

pub use config::*;
pub use types::*;
