//! Price source abstraction.
//!
//! A [`PriceAdapter`] turns a canonical pair into one provider request and
//! maps the answer back into a [`PriceReading`]. Adapters are kept in an
//! [`AdapterChain`] whose order is the fallback priority.

use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::core::types::{PriceReading, TradingPair};
use crate::error::Result;

// ═══════════════════════════════════════════════════════════════════════════════
// PROVIDER
// ═══════════════════════════════════════════════════════════════════════════════

/// Upstream price providers known to the oracle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Provider {
    /// CoinGecko aggregated market data
    CoinGecko,
    /// Binance spot exchange
    Binance,
    /// Coinbase Exchange
    Coinbase,
    /// CoinMarketCap (credentials required, health only)
    CoinMarketCap,
    /// Kraken (health only)
    Kraken,
}

impl Provider {
    /// Display name
    pub fn name(&self) -> &'static str {
        match self {
            Provider::CoinGecko => "CoinGecko",
            Provider::Binance => "Binance",
            Provider::Coinbase => "Coinbase",
            Provider::CoinMarketCap => "CoinMarketCap",
            Provider::Kraken => "Kraken",
        }
    }
}

impl fmt::Display for Provider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// ADAPTER TRAIT
// ═══════════════════════════════════════════════════════════════════════════════

/// One upstream price provider
#[async_trait]
pub trait PriceAdapter: Send + Sync {
    /// Provider behind this adapter
    fn provider(&self) -> Provider;

    /// Display name used in logs
    fn name(&self) -> &'static str {
        self.provider().name()
    }

    /// Fetch a reading.
    ///
    /// `Ok(None)` means the provider has nothing for this pair; `Err` means
    /// the request or the response was bad.
    async fn fetch_reading(&self, pair: &TradingPair) -> Result<Option<PriceReading>>;

    /// Fetch a reading, logging and swallowing failures
    async fn fetch(&self, pair: &TradingPair) -> Option<PriceReading> {
        match self.fetch_reading(pair).await {
            Ok(Some(reading)) => Some(reading),
            Ok(None) => {
                tracing::debug!(provider = self.name(), %pair, "no data for pair");
                None
            }
            Err(e) if e.is_recoverable() => {
                tracing::warn!(provider = self.name(), %pair, code = e.code(), error = %e, "price fetch failed");
                None
            }
            Err(e) => {
                tracing::error!(provider = self.name(), %pair, code = e.code(), error = %e, "adapter fault");
                None
            }
        }
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// ADAPTER CHAIN
// ═══════════════════════════════════════════════════════════════════════════════

/// Ordered collection of adapters; earlier entries win
#[derive(Clone, Default)]
pub struct AdapterChain {
    adapters: Vec<Arc<dyn PriceAdapter>>,
}

impl AdapterChain {
    /// Create an empty chain
    pub fn new() -> Self {
        Self::default()
    }

    /// Append an adapter at the lowest priority
    pub fn with(mut self, adapter: Arc<dyn PriceAdapter>) -> Self {
        self.adapters.push(adapter);
        self
    }

    /// Adapter names in priority order
    pub fn names(&self) -> Vec<&'static str> {
        self.adapters.iter().map(|a| a.name()).collect()
    }

    /// Try adapters one at a time, returning the first reading
    pub async fn first_success(&self, pair: &TradingPair) -> Option<PriceReading> {
        self.first_accepted(pair, |_| true).await
    }

    /// Like [`first_success`](Self::first_success), but a reading rejected
    /// by `accept` moves on to the next adapter
    pub async fn first_accepted<F>(&self, pair: &TradingPair, accept: F) -> Option<PriceReading>
    where
        F: Fn(&PriceReading) -> bool + Send + Sync,
    {
        for adapter in &self.adapters {
            let Some(reading) = adapter.fetch(pair).await else {
                continue;
            };

            if accept(&reading) {
                tracing::debug!(provider = adapter.name(), %pair, price = reading.price, "source answered");
                return Some(reading);
            }

            tracing::warn!(provider = adapter.name(), %pair, price = reading.price, "reading rejected");
        }
        None
    }

    /// Query every adapter concurrently; readings come back in chain order
    pub async fn collect_all(&self, pair: &TradingPair) -> Vec<PriceReading> {
        let fetches = self.adapters.iter().map(|adapter| adapter.fetch(pair));

        futures::future::join_all(fetches)
            .await
            .into_iter()
            .flatten()
            .collect()
    }
}

impl fmt::Debug for AdapterChain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AdapterChain")
            .field("adapters", &self.names())
            .finish()
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// STATIC ADAPTER
// ═══════════════════════════════════════════════════════════════════════════════

/// Adapter that serves canned readings; used for tests and offline runs
#[derive(Debug)]
pub struct StaticAdapter {
    provider: Provider,
    price: Option<f64>,
    calls: std::sync::atomic::AtomicU64,
}

impl StaticAdapter {
    /// Adapter that always answers with `price`
    pub fn answering(provider: Provider, price: f64) -> Self {
        Self {
            provider,
            price: Some(price),
            calls: Default::default(),
        }
    }

    /// Adapter that never has data
    pub fn empty(provider: Provider) -> Self {
        Self {
            provider,
            price: None,
            calls: Default::default(),
        }
    }

    /// Number of fetches served so far
    pub fn calls(&self) -> u64 {
        self.calls.load(std::sync::atomic::Ordering::SeqCst)
    }
}

#[async_trait]
impl PriceAdapter for StaticAdapter {
    fn provider(&self) -> Provider {
        self.provider
    }

    async fn fetch_reading(&self, pair: &TradingPair) -> Result<Option<PriceReading>> {
        self.calls.fetch_add(1, std::sync::atomic::Ordering::SeqCst);
        match self.price {
            Some(price) => Ok(Some(PriceReading::new(pair, price)?.with_sources(5))),
            None => Ok(None),
        }
    }
}
