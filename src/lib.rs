//! # Kasportal Oracle
//!
//! A multi-source cryptocurrency price oracle. Spot prices come from
//! CoinGecko, Binance and Coinbase, are cached briefly, fall back across
//! sources on failure and can be combined into a single confidence-scored
//! reading.
//!
//! ## Architecture
//!
//! - **Core**: Canonical data model and configuration
//! - **Oracle**: Source adapters, TTL cache, aggregation and the service
//! - **Monitoring**: Provider health probes and request metrics
//! - **CLI**: Operator commands and output formatting
//!
//! ## Example
//!
//! ```rust,ignore
//! use kasportal_oracle::prelude::*;
//!
//! let service = OracleService::new(OracleConfig::default())?;
//!
//! if let Some(kas) = service.get_price_data("KAS/USD").await {
//!     println!("{} = {} ({}% confidence)", kas.pair, kas.price, kas.confidence);
//! }
//! ```

#![forbid(unsafe_code)]
#![warn(
    missing_docs,
    rust_2018_idioms,
    trivial_casts,
    unused_lifetimes,
    unused_qualifications
)]

pub mod cli;
pub mod core;
pub mod error;
pub mod monitoring;
pub mod oracle;
pub mod utils;

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::core::{
        config::{FetchStrategy, OracleConfig},
        types::{DataSourceStatus, FeedStatus, OracleStats, PriceReading, SourceStatus, TradingPair},
    };
    pub use crate::error::{Error, Result};
    pub use crate::monitoring::{
        health::{HealthMonitor, ProbeTarget},
        metrics::OracleMetrics,
    };
    pub use crate::oracle::{
        aggregator::{aggregate_prices, validate_price_data, PriceAggregator},
        service::OracleService,
        sources::{AdapterChain, PriceAdapter, Provider},
    };
    pub use crate::utils::time::{Clock, ManualClock, SystemClock};
}

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
