//! Oracle constants and magic numbers.
//!
//! All oracle-wide constants are defined here for easy auditing and modification.

// ═══════════════════════════════════════════════════════════════════════════════
// CACHE & TRANSPORT
// ═══════════════════════════════════════════════════════════════════════════════

/// Freshness window for cached readings (milliseconds)
pub const DEFAULT_CACHE_TTL_MS: u64 = 5_000;

/// Timeout applied to every outbound HTTP call (milliseconds)
pub const DEFAULT_HTTP_TIMEOUT_MS: u64 = 5_000;

/// User agent sent to upstream providers
pub const DEFAULT_USER_AGENT: &str = "Kasportal-Oracle/1.0";

/// Symbols served by `get_all_prices` unless configured otherwise
pub const DEFAULT_SYMBOLS: &[&str] = &[
    "KAS/USD",
    "BTC/USD",
    "ETH/USD",
    "BNB/USD",
    "MATIC/USD",
    "USDC/USD",
];

/// Value written to `last_update` for freshly fetched readings
pub const LAST_UPDATE_NOW: &str = "just now";

// ═══════════════════════════════════════════════════════════════════════════════
// PROVIDER ENDPOINTS
// ═══════════════════════════════════════════════════════════════════════════════

/// CoinGecko public API base
pub const COINGECKO_API_BASE: &str = "https://api.coingecko.com/api/v3";

/// Binance spot API base
pub const BINANCE_API_BASE: &str = "https://api.binance.com/api/v3";

/// Coinbase Exchange API base
pub const COINBASE_API_BASE: &str = "https://api.exchange.coinbase.com";

/// Kraken public API base
pub const KRAKEN_API_BASE: &str = "https://api.kraken.com/0/public";

// ═══════════════════════════════════════════════════════════════════════════════
// CONFIDENCE & AGGREGATION
// ═══════════════════════════════════════════════════════════════════════════════

/// Upper bound for any confidence score
pub const MAX_CONFIDENCE: f64 = 99.9;

/// Source count at which a reading receives full source weight
pub const FULL_WEIGHT_SOURCES: f64 = 5.0;

/// Weight multiplier for readings that are not `active`
pub const INACTIVE_STATUS_WEIGHT: f64 = 0.5;

/// Maximum relative distance from the mean for sources to count as agreeing
pub const AGREEMENT_TOLERANCE: f64 = 0.01;

/// Confidence multiplier applied when all sources agree
pub const AGREEMENT_CONFIDENCE_BOOST: f64 = 1.5;

// ═══════════════════════════════════════════════════════════════════════════════
// ANOMALY THRESHOLDS
// ═══════════════════════════════════════════════════════════════════════════════

/// 24h change (percent, absolute) above which a reading is anomalous
pub const MAX_CHANGE_24H_PCT: f64 = 50.0;

/// Relative deviation from the historical average above which a reading is anomalous
pub const MAX_HISTORICAL_DEVIATION: f64 = 0.30;

// ═══════════════════════════════════════════════════════════════════════════════
// HEALTH PROBES
// ═══════════════════════════════════════════════════════════════════════════════

/// Reliability floor for a source that answered its probe
pub const ONLINE_RELIABILITY_FLOOR: f64 = 95.0;

/// Reliability ceiling for a source that answered its probe
pub const ONLINE_RELIABILITY_CEILING: f64 = 99.5;

/// Reliability floor for a source whose probe failed
pub const DEGRADED_RELIABILITY_FLOOR: f64 = 85.0;

/// Reliability ceiling for a source whose probe failed
pub const DEGRADED_RELIABILITY_CEILING: f64 = 95.0;
