//! Oracle module for price feeds.
//!
//! This module provides price feed functionality:
//! - Source adapters for CoinGecko, Binance and Coinbase
//! - A TTL cache with stale fallback
//! - Weighted multi-source aggregation and anomaly checks
//! - The [`OracleService`] that ties them together
//!
//! ## Usage
//!
//! ```rust,ignore
//! use kasportal_oracle::oracle::OracleService;
//! use kasportal_oracle::core::OracleConfig;
//!
//! let service = OracleService::new(OracleConfig::default())?;
//! let price = service.get_price_data("KAS/USD").await;
//! ```

pub mod aggregator;
pub mod cache;
pub mod fetchers;
pub mod service;
pub mod sources;

pub use aggregator::{aggregate_prices, validate_price_data, PriceAggregator};
pub use cache::{CacheEntry, PriceCache};
pub use fetchers::*;
pub use service::OracleService;
pub use sources::*;
