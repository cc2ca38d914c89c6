//! Real price fetchers for exchange APIs.
//!
//! This module implements HTTP-based price fetching from public
//! cryptocurrency market data APIs. Each fetcher implements
//! [`PriceAdapter`] and maps the provider response into a canonical
//! [`PriceReading`].
//!
//! Supported providers, in fallback order:
//! - CoinGecko (`/simple/price`, symbol → coin id table)
//! - Binance (`/ticker/price` + `/ticker/24hr`, concatenated ticker)
//! - Coinbase (`/products/{BASE-QUOTE}/ticker`, hyphenated product)
//!
//! Every call is bounded by the client timeout; a timeout is an ordinary
//! adapter failure.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use reqwest::Client;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::core::types::{PriceReading, TradingPair};
use crate::error::{Error, Result};
use crate::oracle::sources::{AdapterChain, PriceAdapter, Provider};
use crate::utils::constants::*;
use crate::utils::format::format_volume;
use crate::utils::math::{jitter, jitter_count};

// ═══════════════════════════════════════════════════════════════════════════════
// EXCHANGE API RESPONSE TYPES
// ═══════════════════════════════════════════════════════════════════════════════

/// CoinGecko `/simple/price` body: `{ "<coin id>": { "<field>": value } }`.
///
/// Fields are `<currency>`, `<currency>_24h_change` and `<currency>_24h_vol`;
/// any of them can be `null`.
pub type CoinGeckoPriceResponse = HashMap<String, HashMap<String, Option<f64>>>;

/// Binance ticker price response
#[derive(Debug, Deserialize)]
pub struct BinanceTickerResponse {
    /// Symbol (e.g., "BTCUSDT")
    pub symbol: String,
    /// Last price as string
    pub price: String,
}

/// Binance 24hr ticker (includes volume)
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Binance24hrResponse {
    /// Symbol
    pub symbol: String,
    /// Price change percent
    pub price_change_percent: String,
    /// 24h volume in base asset
    pub volume: String,
    /// 24h volume in quote asset
    pub quote_volume: String,
}

/// Coinbase Exchange product ticker
#[derive(Debug, Deserialize)]
pub struct CoinbaseTickerResponse {
    /// Last trade price
    pub price: String,
    /// 24h volume in base asset
    pub volume: String,
}

// ═══════════════════════════════════════════════════════════════════════════════
// CONFIGURATION
// ═══════════════════════════════════════════════════════════════════════════════

/// Configuration for the HTTP client shared by fetchers and health probes
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct HttpFetcherConfig {
    /// Timeout in milliseconds
    pub timeout_ms: u64,
    /// User agent string
    pub user_agent: String,
}

impl Default for HttpFetcherConfig {
    fn default() -> Self {
        Self {
            timeout_ms: DEFAULT_HTTP_TIMEOUT_MS,
            user_agent: DEFAULT_USER_AGENT.to_string(),
        }
    }
}

/// Base URLs for each price provider
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EndpointConfig {
    /// CoinGecko API base
    pub coingecko: String,
    /// Binance API base
    pub binance: String,
    /// Coinbase API base
    pub coinbase: String,
}

impl Default for EndpointConfig {
    fn default() -> Self {
        Self {
            coingecko: COINGECKO_API_BASE.to_string(),
            binance: BINANCE_API_BASE.to_string(),
            coinbase: COINBASE_API_BASE.to_string(),
        }
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// HTTP CLIENT
// ═══════════════════════════════════════════════════════════════════════════════

/// Timeout-bound JSON client
#[derive(Debug, Clone)]
pub struct HttpClient {
    client: Client,
    timeout_ms: u64,
}

impl HttpClient {
    /// Create a new client
    pub fn new(config: &HttpFetcherConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_millis(config.timeout_ms))
            .user_agent(&config.user_agent)
            .build()
            .map_err(|e| Error::Internal(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            client,
            timeout_ms: config.timeout_ms,
        })
    }

    /// Create with default configuration
    pub fn with_defaults() -> Result<Self> {
        Self::new(&HttpFetcherConfig::default())
    }

    fn transport_error(&self, url: &str, e: reqwest::Error) -> Error {
        if e.is_timeout() {
            Error::Timeout {
                url: url.to_string(),
                timeout_ms: self.timeout_ms,
            }
        } else if let Some(status) = e.status() {
            Error::Http {
                url: url.to_string(),
                status: status.as_u16(),
            }
        } else {
            Error::Request {
                url: url.to_string(),
                reason: e.to_string(),
            }
        }
    }

    async fn send(&self, url: &str) -> Result<reqwest::Response> {
        let response = self
            .client
            .get(url)
            .header("accept", "application/json")
            .send()
            .await
            .map_err(|e| self.transport_error(url, e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(Error::Http {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }

        Ok(response)
    }

    /// GET `url` and decode the JSON body
    pub async fn get_json<T: DeserializeOwned>(&self, provider: Provider, url: &str) -> Result<T> {
        let response = self.send(url).await?;

        response.json::<T>().await.map_err(|e| {
            if e.is_timeout() {
                self.transport_error(url, e)
            } else {
                Error::MalformedResponse {
                    provider: provider.name().to_string(),
                    reason: e.to_string(),
                }
            }
        })
    }

    /// GET `url`, discard the body and return the round-trip time
    pub async fn probe(&self, url: &str) -> Result<Duration> {
        let start = Instant::now();
        self.send(url).await?;
        Ok(start.elapsed())
    }
}

/// Parse a decimal string from a provider body
fn parse_decimal(provider: Provider, field: &str, value: &str) -> Result<f64> {
    value
        .trim()
        .parse::<f64>()
        .ok()
        .filter(|v| v.is_finite())
        .ok_or_else(|| Error::MalformedResponse {
            provider: provider.name().to_string(),
            reason: format!("{} is not a number: {:?}", field, value),
        })
}

// ═══════════════════════════════════════════════════════════════════════════════
// COINGECKO
// ═══════════════════════════════════════════════════════════════════════════════

/// CoinGecko `/simple/price` fetcher
#[derive(Debug, Clone)]
pub struct CoinGeckoFetcher {
    client: HttpClient,
    base_url: String,
}

impl CoinGeckoFetcher {
    /// Create a fetcher against `base_url` (e.g. `https://api.coingecko.com/api/v3`)
    pub fn new(client: HttpClient, base_url: impl Into<String>) -> Self {
        Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }

    /// Map a ticker symbol to CoinGecko's coin id
    pub fn coin_id(symbol: &str) -> Option<&'static str> {
        match symbol.to_ascii_uppercase().as_str() {
            "KAS" => Some("kaspa"),
            "BTC" => Some("bitcoin"),
            "ETH" => Some("ethereum"),
            "BNB" => Some("binancecoin"),
            "MATIC" => Some("matic-network"),
            "USDC" => Some("usd-coin"),
            "USDT" => Some("tether"),
            "SOL" => Some("solana"),
            _ => None,
        }
    }
}

#[async_trait]
impl PriceAdapter for CoinGeckoFetcher {
    fn provider(&self) -> Provider {
        Provider::CoinGecko
    }

    async fn fetch_reading(&self, pair: &TradingPair) -> Result<Option<PriceReading>> {
        let Some(coin_id) = Self::coin_id(&pair.base) else {
            return Ok(None);
        };

        let currency = pair.quote.to_lowercase();
        let url = format!(
            "{}/simple/price?ids={}&vs_currencies={}&include_24hr_change=true&include_24hr_vol=true",
            self.base_url, coin_id, currency
        );

        let body: CoinGeckoPriceResponse = self.client.get_json(self.provider(), &url).await?;

        let Some(data) = body.get(coin_id) else {
            return Ok(None);
        };
        let field = |name: &str| data.get(name).copied().flatten();

        let Some(price) = field(&currency) else {
            return Ok(None);
        };
        let change = field(&format!("{}_24h_change", currency)).unwrap_or(0.0);
        let volume = field(&format!("{}_24h_vol", currency)).unwrap_or(0.0);

        let reading = PriceReading::new(pair, price)?
            .with_change_24h(change)
            .with_volume(format_volume(volume))
            .with_confidence(jitter(99.5, 0.5))
            .with_sources(jitter_count(3, 3));

        Ok(Some(reading))
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// BINANCE
// ═══════════════════════════════════════════════════════════════════════════════

/// Binance spot ticker fetcher
#[derive(Debug, Clone)]
pub struct BinanceFetcher {
    client: HttpClient,
    base_url: String,
}

impl BinanceFetcher {
    /// Create a fetcher against `base_url` (e.g. `https://api.binance.com/api/v3`)
    pub fn new(client: HttpClient, base_url: impl Into<String>) -> Self {
        Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }

    /// Binance ticker for a pair; USD is quoted as USDT
    pub fn ticker(pair: &TradingPair) -> String {
        let quote = match pair.quote.as_str() {
            "USD" => "USDT",
            other => other,
        };
        format!("{}{}", pair.base, quote)
    }
}

#[async_trait]
impl PriceAdapter for BinanceFetcher {
    fn provider(&self) -> Provider {
        Provider::Binance
    }

    async fn fetch_reading(&self, pair: &TradingPair) -> Result<Option<PriceReading>> {
        let symbol = Self::ticker(pair);
        let price_url = format!("{}/ticker/price?symbol={}", self.base_url, symbol);
        let stats_url = format!("{}/ticker/24hr?symbol={}", self.base_url, symbol);

        let fetched = tokio::try_join!(
            self.client.get_json::<BinanceTickerResponse>(self.provider(), &price_url),
            self.client.get_json::<Binance24hrResponse>(self.provider(), &stats_url),
        );

        let (ticker, stats) = match fetched {
            Ok(both) => both,
            // Binance answers 400 "Invalid symbol" for pairs it does not list
            Err(Error::Http { status: 400, .. }) => return Ok(None),
            Err(e) => return Err(e),
        };

        let price = parse_decimal(self.provider(), "price", &ticker.price)?;
        let change = parse_decimal(self.provider(), "priceChangePercent", &stats.price_change_percent)?;
        let volume = parse_decimal(self.provider(), "quoteVolume", &stats.quote_volume).unwrap_or(0.0);

        let reading = PriceReading::new(pair, price)?
            .with_change_24h(change)
            .with_volume(format_volume(volume))
            .with_confidence(jitter(99.0, 1.0))
            .with_sources(jitter_count(2, 2));

        Ok(Some(reading))
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// COINBASE
// ═══════════════════════════════════════════════════════════════════════════════

/// Coinbase Exchange product ticker fetcher
#[derive(Debug, Clone)]
pub struct CoinbaseFetcher {
    client: HttpClient,
    base_url: String,
}

impl CoinbaseFetcher {
    /// Create a fetcher against `base_url` (e.g. `https://api.exchange.coinbase.com`)
    pub fn new(client: HttpClient, base_url: impl Into<String>) -> Self {
        Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }

    /// Coinbase product id (`BASE-QUOTE`)
    pub fn product_id(pair: &TradingPair) -> String {
        format!("{}-{}", pair.base, pair.quote)
    }
}

#[async_trait]
impl PriceAdapter for CoinbaseFetcher {
    fn provider(&self) -> Provider {
        Provider::Coinbase
    }

    async fn fetch_reading(&self, pair: &TradingPair) -> Result<Option<PriceReading>> {
        let url = format!("{}/products/{}/ticker", self.base_url, Self::product_id(pair));

        let ticker: CoinbaseTickerResponse = match self.client.get_json(self.provider(), &url).await {
            Ok(ticker) => ticker,
            Err(Error::Http { status: 404, .. }) => return Ok(None),
            Err(e) => return Err(e),
        };

        let price = parse_decimal(self.provider(), "price", &ticker.price)?;
        let base_volume = parse_decimal(self.provider(), "volume", &ticker.volume).unwrap_or(0.0);

        // This endpoint carries no 24h change
        let reading = PriceReading::new(pair, price)?
            .with_change_24h(0.0)
            .with_volume(format_volume(base_volume * price))
            .with_confidence(jitter(98.5, 1.5))
            .with_sources(jitter_count(1, 2));

        Ok(Some(reading))
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// DEFAULT CHAIN
// ═══════════════════════════════════════════════════════════════════════════════

/// CoinGecko, then Binance, then Coinbase
pub fn default_chain(client: &HttpClient, endpoints: &EndpointConfig) -> AdapterChain {
    AdapterChain::new()
        .with(Arc::new(CoinGeckoFetcher::new(client.clone(), &endpoints.coingecko)))
        .with(Arc::new(BinanceFetcher::new(client.clone(), &endpoints.binance)))
        .with(Arc::new(CoinbaseFetcher::new(client.clone(), &endpoints.coinbase)))
}

// ═══════════════════════════════════════════════════════════════════════════════
// TESTS
// ═══════════════════════════════════════════════════════════════════════════════

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::types::FeedStatus;
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn client() -> HttpClient {
        HttpClient::new(&HttpFetcherConfig {
            timeout_ms: 500,
            ..Default::default()
        })
        .unwrap()
    }

    fn pair(s: &str) -> TradingPair {
        s.parse().unwrap()
    }

    #[test]
    fn test_http_fetcher_config_default() {
        let config = HttpFetcherConfig::default();
        assert_eq!(config.timeout_ms, 5_000);
        assert_eq!(config.user_agent, "Kasportal-Oracle/1.0");
    }

    #[test]
    fn test_identifier_mapping() {
        assert_eq!(CoinGeckoFetcher::coin_id("kas"), Some("kaspa"));
        assert_eq!(CoinGeckoFetcher::coin_id("MATIC"), Some("matic-network"));
        assert_eq!(CoinGeckoFetcher::coin_id("DOGE"), None);
        assert_eq!(BinanceFetcher::ticker(&pair("BTC/USD")), "BTCUSDT");
        assert_eq!(BinanceFetcher::ticker(&pair("ETH/BTC")), "ETHBTC");
        assert_eq!(CoinbaseFetcher::product_id(&pair("ETH/USD")), "ETH-USD");
    }

    #[test]
    fn test_parse_decimal() {
        assert_eq!(parse_decimal(Provider::Binance, "price", "101.5").unwrap(), 101.5);
        assert!(matches!(
            parse_decimal(Provider::Binance, "price", "abc"),
            Err(Error::MalformedResponse { .. })
        ));
    }

    #[tokio::test]
    async fn test_coingecko_reading() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/simple/price"))
            .and(query_param("ids", "kaspa"))
            .and(query_param("vs_currencies", "usd"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "kaspa": { "usd": 0.1234, "usd_24h_change": -2.5, "usd_24h_vol": 2_100_000.0 }
            })))
            .expect(1)
            .mount(&server)
            .await;

        let fetcher = CoinGeckoFetcher::new(client(), server.uri());
        let reading = fetcher.fetch_reading(&pair("KAS/USD")).await.unwrap().unwrap();

        assert_eq!(reading.pair, "KAS/USD");
        assert_eq!(reading.price, 0.1234);
        assert_eq!(reading.change_24h, -2.5);
        assert_eq!(reading.volume, "$2.1M");
        assert_eq!(reading.status, FeedStatus::Active);
        assert!((99.5..=99.9).contains(&reading.confidence));
        assert!((3..=5).contains(&reading.sources));
    }

    #[tokio::test]
    async fn test_coingecko_unknown_symbol_skips_network() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200))
            .expect(0)
            .mount(&server)
            .await;

        let fetcher = CoinGeckoFetcher::new(client(), server.uri());
        assert!(fetcher.fetch_reading(&pair("DOGE/USD")).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_coingecko_missing_currency() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/simple/price"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "bitcoin": { "usd": null }
            })))
            .mount(&server)
            .await;

        let fetcher = CoinGeckoFetcher::new(client(), server.uri());
        assert!(fetcher.fetch_reading(&pair("BTC/USD")).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_binance_reading() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/ticker/price"))
            .and(query_param("symbol", "BTCUSDT"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "symbol": "BTCUSDT", "price": "65000.10"
            })))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/ticker/24hr"))
            .and(query_param("symbol", "BTCUSDT"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "symbol": "BTCUSDT",
                "priceChangePercent": "1.75",
                "volume": "20000.5",
                "quoteVolume": "1300000000.0"
            })))
            .mount(&server)
            .await;

        let fetcher = BinanceFetcher::new(client(), server.uri());
        let reading = fetcher.fetch_reading(&pair("BTC/USD")).await.unwrap().unwrap();

        assert_eq!(reading.pair, "BTC/USD");
        assert_eq!(reading.price, 65000.10);
        assert_eq!(reading.change_24h, 1.75);
        assert_eq!(reading.volume, "$1.3B");
        assert!((99.0..=99.9).contains(&reading.confidence));
        assert!((2..=3).contains(&reading.sources));
    }

    #[tokio::test]
    async fn test_binance_invalid_symbol_is_none() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(400).set_body_json(serde_json::json!({
                "code": -1121, "msg": "Invalid symbol."
            })))
            .mount(&server)
            .await;

        let fetcher = BinanceFetcher::new(client(), server.uri());
        assert!(fetcher.fetch_reading(&pair("KAS/USD")).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_binance_server_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(503))
            .mount(&server)
            .await;

        let fetcher = BinanceFetcher::new(client(), server.uri());
        let result = fetcher.fetch_reading(&pair("BTC/USD")).await;
        assert!(matches!(result, Err(Error::Http { status: 503, .. })));
        assert!(fetcher.fetch(&pair("BTC/USD")).await.is_none());
    }

    #[tokio::test]
    async fn test_coinbase_reading() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/products/ETH-USD/ticker"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "trade_id": 1, "price": "3000.00", "size": "0.1",
                "bid": "2999.99", "ask": "3000.01", "volume": "1000",
                "time": "2024-01-01T00:00:00Z"
            })))
            .mount(&server)
            .await;

        let fetcher = CoinbaseFetcher::new(client(), server.uri());
        let reading = fetcher.fetch_reading(&pair("ETH/USD")).await.unwrap().unwrap();

        assert_eq!(reading.price, 3000.0);
        assert_eq!(reading.change_24h, 0.0);
        assert_eq!(reading.volume, "$3.0M");
        assert!((98.5..=99.9).contains(&reading.confidence));
        assert!((1..=2).contains(&reading.sources));
    }

    #[tokio::test]
    async fn test_coinbase_unknown_product_is_none() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(404).set_body_json(serde_json::json!({
                "message": "NotFound"
            })))
            .mount(&server)
            .await;

        let fetcher = CoinbaseFetcher::new(client(), server.uri());
        assert!(fetcher.fetch_reading(&pair("KAS/USD")).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_zero_price_is_rejected() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "price": "0", "volume": "10"
            })))
            .mount(&server)
            .await;

        let fetcher = CoinbaseFetcher::new(client(), server.uri());
        let result = fetcher.fetch_reading(&pair("ETH/USD")).await;
        assert!(matches!(result, Err(Error::InvalidPrice { .. })));
    }

    #[tokio::test]
    async fn test_malformed_body() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_string("<html>oops</html>"))
            .mount(&server)
            .await;

        let fetcher = CoinbaseFetcher::new(client(), server.uri());
        let result = fetcher.fetch_reading(&pair("ETH/USD")).await;
        assert!(matches!(result, Err(Error::MalformedResponse { .. })));
    }

    #[tokio::test]
    async fn test_timeout() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(serde_json::json!({ "price": "1", "volume": "1" }))
                    .set_delay(Duration::from_millis(2_000)),
            )
            .mount(&server)
            .await;

        let fetcher = CoinbaseFetcher::new(client(), server.uri());
        let result = fetcher.fetch_reading(&pair("ETH/USD")).await;
        assert!(matches!(result, Err(Error::Timeout { timeout_ms: 500, .. })));
    }

    #[tokio::test]
    async fn test_default_chain_order() {
        let chain = default_chain(&client(), &EndpointConfig::default());
        assert_eq!(chain.names(), vec!["CoinGecko", "Binance", "Coinbase"]);
    }
}
