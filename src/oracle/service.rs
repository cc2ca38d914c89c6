//! Oracle service: cached, fallback-aware price lookups.
//!
//! This module ties the pieces together:
//! - Serves readings from a per-symbol TTL cache
//! - On a miss, walks the adapter chain (or aggregates every adapter)
//! - Falls back to the last known reading when every source fails
//! - Collapses concurrent misses for one symbol into a single upstream fetch
//! - Reports provider health and request statistics
//!
//! ## Usage
//!
//! ```rust,ignore
//! use kasportal_oracle::prelude::*;
//!
//! let service = OracleService::new(OracleConfig::default())?;
//!
//! let btc = service.get_price_data("BTC/USD").await;
//! let all = service.get_all_prices().await;
//! let stats = service.get_oracle_stats().await;
//! ```

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use tokio::sync::{watch, Mutex};

use crate::core::config::{FetchStrategy, OracleConfig};
use crate::core::types::{DataSourceStatus, OracleStats, PriceReading, TradingPair};
use crate::error::Result;
use crate::monitoring::health::{count_online, HealthMonitor};
use crate::monitoring::metrics::OracleMetrics;
use crate::oracle::aggregator::PriceAggregator;
use crate::oracle::cache::PriceCache;
use crate::oracle::fetchers::{default_chain, HttpClient};
use crate::oracle::sources::AdapterChain;
use crate::utils::time::{Clock, SystemClock};

// ═══════════════════════════════════════════════════════════════════════════════
// ORACLE SERVICE
// ═══════════════════════════════════════════════════════════════════════════════

/// Result of one upstream round; `None` inside until the round finishes
type Flight = watch::Receiver<Option<Option<PriceReading>>>;

/// Price oracle over an ordered set of source adapters
pub struct OracleService {
    /// Configuration
    config: OracleConfig,
    /// Adapters in fallback order
    chain: AdapterChain,
    /// Reading cache
    cache: PriceCache,
    /// Aggregation and anomaly thresholds
    aggregator: PriceAggregator,
    /// Provider health prober
    health: HealthMonitor,
    /// Request counters
    metrics: Arc<OracleMetrics>,
    /// Time source for cache freshness
    clock: Arc<dyn Clock>,
    /// Upstream rounds in progress, by symbol
    flights: Mutex<HashMap<String, Flight>>,
}

impl OracleService {
    /// Create a service with the live CoinGecko, Binance and Coinbase adapters
    pub fn new(config: OracleConfig) -> Result<Self> {
        config.validate()?;

        let client = HttpClient::new(&config.http)?;
        let chain = default_chain(&client, &config.endpoints);
        let health = HealthMonitor::new(client, config.probes.clone());

        tracing::info!(
            sources = ?chain.names(),
            symbols = config.symbols.len(),
            ttl_ms = config.cache_ttl_ms,
            strategy = ?config.strategy,
            "oracle service ready"
        );

        Ok(Self::from_parts(config, chain, health))
    }

    /// Create from explicit components
    pub fn from_parts(config: OracleConfig, chain: AdapterChain, health: HealthMonitor) -> Self {
        Self {
            cache: PriceCache::new(config.cache_ttl_ms),
            config,
            chain,
            aggregator: PriceAggregator::default(),
            health,
            metrics: Arc::new(OracleMetrics::new()),
            clock: Arc::new(SystemClock),
            flights: Mutex::new(HashMap::new()),
        }
    }

    /// Replace the time source
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// Get configuration
    pub fn config(&self) -> &OracleConfig {
        &self.config
    }

    /// Get metrics collector
    pub fn metrics(&self) -> &Arc<OracleMetrics> {
        &self.metrics
    }

    /// Get the reading cache
    pub fn cache(&self) -> &PriceCache {
        &self.cache
    }

    // ═══════════════════════════════════════════════════════════════════════════
    // PRICE LOOKUPS
    // ═══════════════════════════════════════════════════════════════════════════

    /// Current reading for `symbol` (`BASE/QUOTE` or `BASE-QUOTE`).
    ///
    /// Fresh cache entries are returned without a network call. On a miss
    /// the sources are queried; if they all fail the last known reading is
    /// returned, however old. `None` only when nothing was ever fetched.
    pub async fn get_price_data(&self, symbol: &str) -> Option<PriceReading> {
        self.metrics.requests.increment();

        let pair = match symbol.parse::<TradingPair>() {
            Ok(pair) => pair,
            Err(e) => {
                tracing::warn!(symbol, error = %e, "rejecting symbol");
                return None;
            }
        };

        let reading = self.resolve(&pair).await;
        if reading.is_some() {
            self.metrics.served.increment();
        }
        reading
    }

    /// Readings for every configured symbol, in configured order.
    ///
    /// Symbols with no reading are left out; the batch never fails.
    pub async fn get_all_prices(&self) -> Vec<PriceReading> {
        let lookups = self.config.symbols.iter().map(|symbol| self.get_price_data(symbol));

        futures::future::join_all(lookups)
            .await
            .into_iter()
            .flatten()
            .collect()
    }

    /// Walk the adapter chain and return the first reading
    pub async fn fetch_price_from_sources(&self, pair: &TradingPair) -> Option<PriceReading> {
        let previous = self.previous_price(pair).await;
        self.chain
            .first_accepted(pair, |reading| self.accept(reading, previous))
            .await
    }

    /// Query every adapter concurrently; readings come back in chain order
    pub async fn fetch_from_all_sources(&self, pair: &TradingPair) -> Vec<PriceReading> {
        self.chain.collect_all(pair).await
    }

    /// Query every adapter and aggregate whatever came back
    pub async fn fetch_aggregated(&self, pair: &TradingPair) -> Option<PriceReading> {
        let previous = self.previous_price(pair).await;
        let readings: Vec<PriceReading> = self
            .fetch_from_all_sources(pair)
            .await
            .into_iter()
            .filter(|reading| self.accept(reading, previous))
            .collect();

        self.aggregator.aggregate(&readings)
    }

    async fn resolve(&self, pair: &TradingPair) -> Option<PriceReading> {
        let key = pair.symbol();

        if let Some(reading) = self.cached(&key).await {
            return Some(reading);
        }

        if !self.config.coalesce_requests {
            return self.refresh(pair, &key).await;
        }

        let leader = {
            let mut flights = self.flights.lock().await;

            // A round may have finished between the first check and the lock
            if let Some(reading) = self.cached(&key).await {
                return Some(reading);
            }

            // A closed channel means its leader was dropped mid-round
            let running = flights
                .get(&key)
                .filter(|flight| flight.has_changed().is_ok())
                .cloned();

            if let Some(flight) = running {
                drop(flights);
                return self.follow(pair, &key, flight).await;
            }

            let (leader, flight) = watch::channel(None);
            flights.insert(key.clone(), flight);
            leader
        };

        let outcome = self.refresh(pair, &key).await;

        self.flights.lock().await.remove(&key);
        leader.send_replace(Some(outcome.clone()));

        outcome
    }

    /// Wait for the round another caller is running and take its outcome
    async fn follow(&self, pair: &TradingPair, key: &str, mut flight: Flight) -> Option<PriceReading> {
        tracing::debug!(symbol = key, "joining upstream round in progress");

        let landed = flight
            .wait_for(Option::is_some)
            .await
            .map(|outcome| (*outcome).clone().flatten());

        match landed {
            Ok(reading) => reading,
            Err(_) => self.refresh(pair, key).await,
        }
    }

    async fn cached(&self, key: &str) -> Option<PriceReading> {
        let reading = self.cache.fresh(key, self.clock.now_ms()).await?;
        self.metrics.cache_hits.increment();
        tracing::debug!(symbol = key, "cache hit");
        Some(reading)
    }

    async fn refresh(&self, pair: &TradingPair, key: &str) -> Option<PriceReading> {
        let started = self.metrics.upstream_started();

        let fetched = match self.config.strategy {
            FetchStrategy::FirstSuccess => self.fetch_price_from_sources(pair).await,
            FetchStrategy::Aggregate => self.fetch_aggregated(pair).await,
        };

        self.metrics.upstream_finished(started, fetched.is_some());

        if let Some(reading) = fetched {
            tracing::info!(
                symbol = key,
                price = reading.price,
                confidence = reading.confidence,
                "price updated"
            );
            self.cache.insert(key, reading.clone(), self.clock.now_ms()).await;
            return Some(reading);
        }

        match self.cache.latest(key).await {
            Some(entry) => {
                self.metrics.stale_served.increment();
                tracing::warn!(
                    symbol = key,
                    age_ms = entry.age_ms(self.clock.now_ms()),
                    "all sources failed, serving stale reading"
                );
                Some(entry.reading)
            }
            None => {
                tracing::error!(symbol = key, "all sources failed and nothing is cached");
                None
            }
        }
    }

    async fn previous_price(&self, pair: &TradingPair) -> Option<f64> {
        if !self.config.validate_readings {
            return None;
        }
        self.cache
            .latest(&pair.symbol())
            .await
            .map(|entry| entry.reading.price)
    }

    fn accept(&self, reading: &PriceReading, previous: Option<f64>) -> bool {
        !self.config.validate_readings || self.aggregator.validate(reading, previous)
    }

    // ═══════════════════════════════════════════════════════════════════════════
    // HEALTH & STATS
    // ═══════════════════════════════════════════════════════════════════════════

    /// Probe every configured provider
    pub async fn get_data_sources_status(&self) -> Vec<DataSourceStatus> {
        self.health.check_all().await
    }

    /// Summary statistics from the cache, the counters and a fresh health check
    pub async fn get_oracle_stats(&self) -> OracleStats {
        let sources = self.get_data_sources_status().await;
        let snapshot = self.metrics.snapshot();

        OracleStats {
            total_feeds: self.config.symbols.len(),
            active_feeds: self.cache.len().await,
            average_latency: format!("{:.1}s", snapshot.average_latency_ms.unwrap_or(0.0) / 1000.0),
            uptime: format!("{:.1}%", snapshot.availability_pct()),
            total_requests: format!("{:.1}K", snapshot.requests as f64 / 1000.0),
            active_nodes: count_online(&sources),
            data_providers: sources.len(),
        }
    }
}

impl fmt::Debug for OracleService {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OracleService")
            .field("config", &self.config)
            .field("chain", &self.chain)
            .field("cache", &self.cache)
            .field("health", &self.health)
            .finish_non_exhaustive()
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// TESTS
// ═══════════════════════════════════════════════════════════════════════════════
