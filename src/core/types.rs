//! Canonical oracle data model.
//!
//! Every provider response is mapped into a [`PriceReading`]; health probes
//! produce [`DataSourceStatus`]; the service derives [`OracleStats`].
//! Serialized field names are camelCase to match the JSON the HTTP layer
//! serves (`change24h`, `lastUpdate`, ...).

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::utils::constants::LAST_UPDATE_NOW;
use crate::utils::math::clamp_confidence;

// ═══════════════════════════════════════════════════════════════════════════════
// TRADING PAIR
// ═══════════════════════════════════════════════════════════════════════════════

/// Canonical `BASE/QUOTE` pair, both legs uppercase
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TradingPair {
    /// Base asset (e.g. "BTC")
    pub base: String,
    /// Quote asset (e.g. "USD")
    pub quote: String,
}

impl TradingPair {
    /// Create a pair, normalizing both legs to uppercase
    pub fn new(base: &str, quote: &str) -> Result<Self> {
        let symbol = format!("{}/{}", base, quote);
        let base = Self::normalize_leg(&symbol, base)?;
        let quote = Self::normalize_leg(&symbol, quote)?;
        Ok(Self { base, quote })
    }

    fn normalize_leg(symbol: &str, leg: &str) -> Result<String> {
        let leg = leg.trim();
        if leg.is_empty() {
            return Err(Error::InvalidSymbol {
                symbol: symbol.to_string(),
                reason: "empty asset".into(),
            });
        }
        if !leg.chars().all(|c| c.is_ascii_alphanumeric()) {
            return Err(Error::InvalidSymbol {
                symbol: symbol.to_string(),
                reason: format!("asset {:?} must be alphanumeric", leg),
            });
        }
        Ok(leg.to_ascii_uppercase())
    }

    /// Cache key and display form (`BASE/QUOTE`)
    pub fn symbol(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for TradingPair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.base, self.quote)
    }
}

impl FromStr for TradingPair {
    type Err = Error;

    /// Accepts `BASE/QUOTE` and the URL-safe `BASE-QUOTE`
    fn from_str(s: &str) -> Result<Self> {
        let separator = if s.contains('/') { '/' } else { '-' };
        let mut parts = s.split(separator);

        match (parts.next(), parts.next(), parts.next()) {
            (Some(base), Some(quote), None) => Self::new(base, quote),
            _ => Err(Error::InvalidSymbol {
                symbol: s.to_string(),
                reason: "expected BASE/QUOTE".into(),
            }),
        }
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// FEED STATUS
// ═══════════════════════════════════════════════════════════════════════════════

/// Health of an individual price feed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FeedStatus {
    /// Feed is live
    Active,
    /// Feed is partially available
    Degraded,
    /// Feed is down
    Offline,
}

impl FeedStatus {
    /// Get display string
    pub fn as_str(&self) -> &'static str {
        match self {
            FeedStatus::Active => "active",
            FeedStatus::Degraded => "degraded",
            FeedStatus::Offline => "offline",
        }
    }

    /// Check if this is the `Active` state
    pub fn is_active(&self) -> bool {
        matches!(self, FeedStatus::Active)
    }
}

impl fmt::Display for FeedStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// PRICE READING
// ═══════════════════════════════════════════════════════════════════════════════

/// A single spot price observation for one pair
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PriceReading {
    /// Pair in `BASE/QUOTE` form
    pub pair: String,
    /// Spot price in quote currency, always > 0
    pub price: f64,
    /// Signed 24h change in percent
    pub change_24h: f64,
    /// Formatted 24h volume (e.g. "$2.1M")
    pub volume: String,
    /// Human-readable freshness marker
    pub last_update: String,
    /// Feed status
    pub status: FeedStatus,
    /// Confidence score in [0, 99.9]
    pub confidence: f64,
    /// Number of sub-feeds behind this reading
    pub sources: u32,
}

impl PriceReading {
    /// Create an active reading with no change, no volume and full confidence.
    ///
    /// Fails if `price` is not a positive finite number.
    pub fn new(pair: &TradingPair, price: f64) -> Result<Self> {
        if !price.is_finite() || price <= 0.0 {
            return Err(Error::InvalidPrice {
                pair: pair.to_string(),
                price: price.to_string(),
            });
        }

        Ok(Self {
            pair: pair.to_string(),
            price,
            change_24h: 0.0,
            volume: "$0".to_string(),
            last_update: LAST_UPDATE_NOW.to_string(),
            status: FeedStatus::Active,
            confidence: clamp_confidence(100.0),
            sources: 1,
        })
    }

    /// Set 24h change (percent); non-finite values become 0
    pub fn with_change_24h(mut self, change: f64) -> Self {
        self.change_24h = if change.is_finite() { change } else { 0.0 };
        self
    }

    /// Set formatted volume
    pub fn with_volume(mut self, volume: impl Into<String>) -> Self {
        self.volume = volume.into();
        self
    }

    /// Set status
    pub fn with_status(mut self, status: FeedStatus) -> Self {
        self.status = status;
        self
    }

    /// Set confidence, clamped to [0, 99.9]
    pub fn with_confidence(mut self, confidence: f64) -> Self {
        self.confidence = clamp_confidence(confidence);
        self
    }

    /// Set sub-feed count
    pub fn with_sources(mut self, sources: u32) -> Self {
        self.sources = sources;
        self
    }

    /// Set freshness marker
    pub fn with_last_update(mut self, last_update: impl Into<String>) -> Self {
        self.last_update = last_update.into();
        self
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// DATA SOURCE STATUS
// ═══════════════════════════════════════════════════════════════════════════════

/// Reachability of an upstream provider
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceStatus {
    /// Probe answered
    Online,
    /// Probe failed or timed out
    Degraded,
    /// Not probed (credentials required)
    Offline,
}

impl SourceStatus {
    /// Get display string
    pub fn as_str(&self) -> &'static str {
        match self {
            SourceStatus::Online => "online",
            SourceStatus::Degraded => "degraded",
            SourceStatus::Offline => "offline",
        }
    }
}

impl fmt::Display for SourceStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Result of probing one provider
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DataSourceStatus {
    /// Provider name
    pub name: String,
    /// Probe outcome
    pub status: SourceStatus,
    /// "<n>ms", "timeout" or "N/A"
    pub latency: String,
    /// Reliability estimate in [0, 100]
    pub reliability: f64,
}

// ═══════════════════════════════════════════════════════════════════════════════
// ORACLE STATS
// ═══════════════════════════════════════════════════════════════════════════════

/// Summary statistics for the oracle
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OracleStats {
    /// Number of configured feeds
    pub total_feeds: usize,
    /// Number of symbols currently cached
    pub active_feeds: usize,
    /// Mean upstream fetch latency ("0.8s")
    pub average_latency: String,
    /// Share of requests answered with a reading ("99.9%")
    pub uptime: String,
    /// Requests served, in thousands ("45.2K")
    pub total_requests: String,
    /// Providers currently online
    pub active_nodes: usize,
    /// Providers monitored
    pub data_providers: usize,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn btc_usd() -> TradingPair {
        TradingPair::new("btc", "usd").unwrap()
    }

    #[test]
    fn test_pair_parsing() {
        let pair: TradingPair = "btc/usd".parse().unwrap();
        assert_eq!(pair.base, "BTC");
        assert_eq!(pair.quote, "USD");
        assert_eq!(pair.to_string(), "BTC/USD");

        let dashed: TradingPair = "KAS-USD".parse().unwrap();
        assert_eq!(dashed.symbol(), "KAS/USD");
    }

    #[test]
    fn test_pair_rejects_garbage() {
        assert!("BTC".parse::<TradingPair>().is_err());
        assert!("BTC/".parse::<TradingPair>().is_err());
        assert!("BTC/USD/EUR".parse::<TradingPair>().is_err());
        assert!("B$C/USD".parse::<TradingPair>().is_err());
    }

    #[test]
    fn test_reading_rejects_non_positive_price() {
        assert!(PriceReading::new(&btc_usd(), 0.0).is_err());
        assert!(PriceReading::new(&btc_usd(), -1.0).is_err());
        assert!(PriceReading::new(&btc_usd(), f64::NAN).is_err());
        assert!(PriceReading::new(&btc_usd(), 1.0).is_ok());
    }

    #[test]
    fn test_reading_confidence_is_clamped() {
        let reading = PriceReading::new(&btc_usd(), 100.0).unwrap();
        assert_eq!(reading.confidence, 99.9);

        let reading = reading.with_confidence(250.0);
        assert_eq!(reading.confidence, 99.9);

        let reading = reading.with_confidence(-5.0);
        assert_eq!(reading.confidence, 0.0);
    }

    #[test]
    fn test_reading_json_shape() {
        let reading = PriceReading::new(&btc_usd(), 65_000.0)
            .unwrap()
            .with_change_24h(-1.25)
            .with_volume("$2.1B")
            .with_status(FeedStatus::Degraded);

        let json = serde_json::to_value(&reading).unwrap();
        assert_eq!(json["pair"], "BTC/USD");
        assert_eq!(json["change24h"], -1.25);
        assert_eq!(json["lastUpdate"], "just now");
        assert_eq!(json["status"], "degraded");
    }

    #[test]
    fn test_source_status_json() {
        let status = DataSourceStatus {
            name: "Binance".into(),
            status: SourceStatus::Online,
            latency: "120ms".into(),
            reliability: 98.0,
        };
        let json = serde_json::to_value(&status).unwrap();
        assert_eq!(json["status"], "online");
    }
}
