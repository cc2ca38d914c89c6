//! Oracle configuration.
//!
//! Loaded from a JSON file, then overridden by `KASPORTAL_ORACLE_*`
//! environment variables. Every field has a default so an empty `{}` file
//! is a valid configuration.

use std::path::Path;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::core::types::TradingPair;
use crate::error::{Error, Result};
use crate::monitoring::health::ProbeTarget;
use crate::oracle::fetchers::{EndpointConfig, HttpFetcherConfig};
use crate::utils::constants::{DEFAULT_CACHE_TTL_MS, DEFAULT_SYMBOLS};

/// Environment variable prefix
pub const ENV_PREFIX: &str = "KASPORTAL_ORACLE_";

// ═══════════════════════════════════════════════════════════════════════════════
// FETCH STRATEGY
// ═══════════════════════════════════════════════════════════════════════════════

/// How the service turns adapters into a reading on a cache miss
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FetchStrategy {
    /// Try adapters in priority order, stop at the first reading
    #[default]
    FirstSuccess,
    /// Query every adapter concurrently and aggregate the readings
    Aggregate,
}

impl FromStr for FetchStrategy {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().replace('-', "_").as_str() {
            "first_success" | "first" | "fallback" => Ok(FetchStrategy::FirstSuccess),
            "aggregate" | "all" => Ok(FetchStrategy::Aggregate),
            other => Err(Error::Config(format!("Unknown fetch strategy: {}", other))),
        }
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// ORACLE CONFIGURATION
// ═══════════════════════════════════════════════════════════════════════════════

/// Configuration for the oracle service
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OracleConfig {
    /// Freshness window for cached readings (milliseconds)
    pub cache_ttl_ms: u64,
    /// Symbols served by `get_all_prices`
    pub symbols: Vec<String>,
    /// Cache-miss strategy
    pub strategy: FetchStrategy,
    /// Collapse concurrent fetches of the same symbol into one
    pub coalesce_requests: bool,
    /// Drop readings that fail `validate_price_data` before caching
    pub validate_readings: bool,
    /// HTTP client settings
    pub http: HttpFetcherConfig,
    /// Provider base URLs
    pub endpoints: EndpointConfig,
    /// Health probe targets, in report order
    pub probes: Vec<ProbeTarget>,
}

impl Default for OracleConfig {
    fn default() -> Self {
        Self {
            cache_ttl_ms: DEFAULT_CACHE_TTL_MS,
            symbols: DEFAULT_SYMBOLS.iter().map(|s| s.to_string()).collect(),
            strategy: FetchStrategy::default(),
            coalesce_requests: true,
            validate_readings: false,
            http: HttpFetcherConfig::default(),
            endpoints: EndpointConfig::default(),
            probes: ProbeTarget::defaults(),
        }
    }
}

impl OracleConfig {
    /// Load from a JSON file
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .map_err(|e| Error::Io(format!("{}: {}", path.display(), e)))?;

        serde_json::from_str(&content)
            .map_err(|e| Error::Config(format!("{}: {}", path.display(), e)))
    }

    /// Save to a JSON file
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        let content = serde_json::to_string_pretty(self)
            .map_err(|e| Error::Config(e.to_string()))?;

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        std::fs::write(path, content)?;
        Ok(())
    }

    /// Defaults with environment overrides applied
    pub fn from_env() -> Result<Self> {
        Self::default().with_env_overrides(|key| std::env::var(key).ok())
    }

    /// Apply `KASPORTAL_ORACLE_*` overrides read through `lookup`
    pub fn with_env_overrides<F>(mut self, lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |name: &str| lookup(&format!("{}{}", ENV_PREFIX, name));

        if let Some(ttl) = var("CACHE_TTL_MS") {
            self.cache_ttl_ms = ttl
                .trim()
                .parse()
                .map_err(|_| Error::Config(format!("Invalid cache TTL: {}", ttl)))?;
        }

        if let Some(timeout) = var("TIMEOUT_MS") {
            self.http.timeout_ms = timeout
                .trim()
                .parse()
                .map_err(|_| Error::Config(format!("Invalid timeout: {}", timeout)))?;
        }

        if let Some(symbols) = var("SYMBOLS") {
            self.symbols = symbols
                .split(',')
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(str::to_string)
                .collect();
        }

        if let Some(strategy) = var("STRATEGY") {
            self.strategy = strategy.parse()?;
        }

        Ok(self)
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<()> {
        if self.cache_ttl_ms == 0 {
            return Err(Error::Config("Cache TTL must be greater than 0".into()));
        }

        if self.http.timeout_ms == 0 {
            return Err(Error::Config("Timeout must be greater than 0".into()));
        }

        if self.symbols.is_empty() {
            return Err(Error::Config("At least one symbol is required".into()));
        }

        for symbol in &self.symbols {
            symbol.parse::<TradingPair>()?;
        }

        Ok(())
    }
}
