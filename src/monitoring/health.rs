//! Upstream provider health checks.
//!
//! Probes a fixed list of provider endpoints concurrently and reports each
//! one as online, degraded or offline with its latency and a reliability
//! estimate. Results keep the configured order; one slow probe never fails
//! the others.

use serde::{Deserialize, Serialize};

use crate::core::types::{DataSourceStatus, SourceStatus};
use crate::oracle::fetchers::HttpClient;
use crate::oracle::sources::Provider;
use crate::utils::constants::*;
use crate::utils::math::jitter;

/// Latency label for a probe that failed
pub const LATENCY_TIMEOUT: &str = "timeout";

/// Latency label for a provider that was not probed
pub const LATENCY_NOT_APPLICABLE: &str = "N/A";

// ═══════════════════════════════════════════════════════════════════════════════
// PROBE TARGETS
// ═══════════════════════════════════════════════════════════════════════════════

/// One provider endpoint to probe
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProbeTarget {
    /// Provider name as reported
    pub name: String,
    /// Probe URL; `None` means the provider needs credentials and is skipped
    pub url: Option<String>,
}

impl ProbeTarget {
    /// Target with a probe URL
    pub fn new(name: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            url: Some(url.into()),
        }
    }

    /// Target that is never probed
    pub fn unprobed(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            url: None,
        }
    }

    /// Default probe list
    pub fn defaults() -> Vec<Self> {
        vec![
            Self::new(Provider::CoinGecko.name(), format!("{}/ping", COINGECKO_API_BASE)),
            Self::unprobed(Provider::CoinMarketCap.name()),
            Self::new(Provider::Binance.name(), format!("{}/ping", BINANCE_API_BASE)),
            Self::new(Provider::Coinbase.name(), format!("{}/time", COINBASE_API_BASE)),
            Self::new(Provider::Kraken.name(), format!("{}/SystemStatus", KRAKEN_API_BASE)),
        ]
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// HEALTH MONITOR
// ═══════════════════════════════════════════════════════════════════════════════

/// Concurrent prober for a list of targets
#[derive(Debug, Clone)]
pub struct HealthMonitor {
    client: HttpClient,
    targets: Vec<ProbeTarget>,
}

impl HealthMonitor {
    /// Create a monitor over `targets`
    pub fn new(client: HttpClient, targets: Vec<ProbeTarget>) -> Self {
        Self { client, targets }
    }

    /// Probe every target concurrently
    pub async fn check_all(&self) -> Vec<DataSourceStatus> {
        let probes = self.targets.iter().map(|target| self.check(target));
        let results = futures::future::join_all(probes).await;

        let online = count_online(&results);
        tracing::debug!(online, total = results.len(), "health check finished");

        results
    }

    /// Probe a single target
    pub async fn check(&self, target: &ProbeTarget) -> DataSourceStatus {
        let Some(url) = target.url.as_deref() else {
            return DataSourceStatus {
                name: target.name.clone(),
                status: SourceStatus::Offline,
                latency: LATENCY_NOT_APPLICABLE.to_string(),
                reliability: 0.0,
            };
        };

        match self.client.probe(url).await {
            Ok(elapsed) => DataSourceStatus {
                name: target.name.clone(),
                status: SourceStatus::Online,
                latency: format!("{}ms", elapsed.as_millis()),
                reliability: (ONLINE_RELIABILITY_CEILING - jitter(0.0, 2.0)).max(ONLINE_RELIABILITY_FLOOR),
            },
            Err(e) => {
                tracing::warn!(source = %target.name, error = %e, "health probe failed");
                DataSourceStatus {
                    name: target.name.clone(),
                    status: SourceStatus::Degraded,
                    latency: LATENCY_TIMEOUT.to_string(),
                    reliability: (DEGRADED_RELIABILITY_CEILING - jitter(0.0, 10.0))
                        .max(DEGRADED_RELIABILITY_FLOOR),
                }
            }
        }
    }
}

/// Number of sources reporting `Online`
pub fn count_online(statuses: &[DataSourceStatus]) -> usize {
    statuses
        .iter()
        .filter(|s| s.status == SourceStatus::Online)
        .count()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::oracle::fetchers::HttpFetcherConfig;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn client() -> HttpClient {
        HttpClient::new(&HttpFetcherConfig {
            timeout_ms: 500,
            ..Default::default()
        })
        .unwrap()
    }

    #[test]
    fn test_default_targets() {
        let targets = ProbeTarget::defaults();
        let names: Vec<&str> = targets.iter().map(|t| t.name.as_str()).collect();
        assert_eq!(names, vec!["CoinGecko", "CoinMarketCap", "Binance", "Coinbase", "Kraken"]);
        assert!(targets[1].url.is_none());
        assert_eq!(
            targets[0].url.as_deref(),
            Some("https://api.coingecko.com/api/v3/ping")
        );
    }

    #[tokio::test]
    async fn test_unprobed_target_is_offline() {
        let monitor = HealthMonitor::new(client(), vec![ProbeTarget::unprobed("CoinMarketCap")]);
        let results = monitor.check_all().await;

        assert_eq!(
            results,
            vec![DataSourceStatus {
                name: "CoinMarketCap".into(),
                status: SourceStatus::Offline,
                latency: "N/A".into(),
                reliability: 0.0,
            }]
        );
    }

    #[tokio::test]
    async fn test_mixed_probe_results_keep_order() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/ping"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({})))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/broken"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&server)
            .await;

        let monitor = HealthMonitor::new(
            client(),
            vec![
                ProbeTarget::new("Up", format!("{}/ping", server.uri())),
                ProbeTarget::unprobed("Skipped"),
                ProbeTarget::new("Broken", format!("{}/broken", server.uri())),
                ProbeTarget::new("Unreachable", "http://127.0.0.1:1/ping"),
            ],
        );

        let results = monitor.check_all().await;
        let names: Vec<&str> = results.iter().map(|r| r.name.as_str()).collect();
        assert_eq!(names, vec!["Up", "Skipped", "Broken", "Unreachable"]);

        assert_eq!(results[0].status, SourceStatus::Online);
        assert!(results[0].latency.ends_with("ms"));
        assert!((95.0..=99.5).contains(&results[0].reliability));

        assert_eq!(results[1].status, SourceStatus::Offline);

        for degraded in &results[2..] {
            assert_eq!(degraded.status, SourceStatus::Degraded);
            assert_eq!(degraded.latency, "timeout");
            assert!((85.0..=95.0).contains(&degraded.reliability));
        }

        assert_eq!(count_online(&results), 1);
    }

    #[tokio::test]
    async fn test_slow_probe_times_out() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_delay(std::time::Duration::from_secs(2)))
            .mount(&server)
            .await;

        let monitor = HealthMonitor::new(client(), vec![ProbeTarget::new("Slow", server.uri())]);
        let results = monitor.check_all().await;
        assert_eq!(results[0].status, SourceStatus::Degraded);
        assert_eq!(results[0].latency, "timeout");
    }

    #[tokio::test]
    async fn test_probes_run_concurrently() {
        let delay = std::time::Duration::from_millis(250);
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_delay(delay))
            .mount(&server)
            .await;

        let client = HttpClient::new(&HttpFetcherConfig {
            timeout_ms: 2_000,
            ..Default::default()
        })
        .unwrap();
        let targets = (0..4)
            .map(|i| ProbeTarget::new(format!("Slow{}", i), format!("{}/ping/{}", server.uri(), i)))
            .collect();
        let monitor = HealthMonitor::new(client, targets);

        let started = std::time::Instant::now();
        let results = monitor.check_all().await;
        let elapsed = started.elapsed();

        assert_eq!(count_online(&results), 4);
        assert!(elapsed < delay * 2, "probes ran one after another: {:?}", elapsed);
    }
}
