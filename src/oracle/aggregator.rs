//! Price aggregator for combining multiple sources.
//!
//! This module provides:
//! - Weighted averaging of readings for one pair (confidence × source
//!   count × status)
//! - A confidence boost when every source agrees within tolerance
//! - Anomaly checks on individual readings
//!
//! Both entry points are pure; the service decides when to call them.

use serde::{Deserialize, Serialize};

use crate::core::types::{FeedStatus, PriceReading};
use crate::utils::constants::*;
use crate::utils::format::{format_volume, parse_volume};
use crate::utils::math::{all_within_tolerance, clamp_confidence, mean, relative_deviation};

// ═══════════════════════════════════════════════════════════════════════════════
// AGGREGATOR PARAMETERS
// ═══════════════════════════════════════════════════════════════════════════════

/// Aggregation and anomaly thresholds
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PriceAggregator {
    /// Source count at which a reading gets full weight
    pub full_weight_sources: f64,
    /// Weight multiplier for readings that are not active
    pub inactive_weight: f64,
    /// Relative distance from the mean below which sources agree
    pub agreement_tolerance: f64,
    /// Confidence multiplier when all sources agree
    pub agreement_boost: f64,
    /// Largest acceptable absolute 24h change (percent)
    pub max_change_24h: f64,
    /// Largest acceptable deviation from the historical average
    pub max_historical_deviation: f64,
}

impl Default for PriceAggregator {
    fn default() -> Self {
        Self {
            full_weight_sources: FULL_WEIGHT_SOURCES,
            inactive_weight: INACTIVE_STATUS_WEIGHT,
            agreement_tolerance: AGREEMENT_TOLERANCE,
            agreement_boost: AGREEMENT_CONFIDENCE_BOOST,
            max_change_24h: MAX_CHANGE_24H_PCT,
            max_historical_deviation: MAX_HISTORICAL_DEVIATION,
        }
    }
}

impl PriceAggregator {
    /// Create with default thresholds
    pub fn new() -> Self {
        Self::default()
    }

    // ═══════════════════════════════════════════════════════════════════════════
    // AGGREGATION
    // ═══════════════════════════════════════════════════════════════════════════

    /// Trust weight of a single reading
    pub fn weight(&self, reading: &PriceReading) -> f64 {
        let confidence = reading.confidence / 100.0;
        let sources = (reading.sources as f64 / self.full_weight_sources).min(1.0);
        let status = if reading.status.is_active() { 1.0 } else { self.inactive_weight };

        confidence * sources * status
    }

    /// Combine readings of one pair into a single reading.
    ///
    /// Returns `None` for an empty slice and the reading itself for a
    /// single element. If every weight is zero the first reading is
    /// returned unchanged.
    pub fn aggregate(&self, readings: &[PriceReading]) -> Option<PriceReading> {
        let first = readings.first()?;
        if readings.len() == 1 {
            return Some(first.clone());
        }

        let weights: Vec<f64> = readings.iter().map(|r| self.weight(r)).collect();
        let total_weight: f64 = weights.iter().sum();

        if !(total_weight > 0.0) {
            tracing::warn!(pair = %first.pair, count = readings.len(), "all weights are zero, using first reading");
            return Some(first.clone());
        }

        let weighted = |value: fn(&PriceReading) -> f64| {
            readings
                .iter()
                .zip(&weights)
                .map(|(r, w)| value(r) * w)
                .sum::<f64>()
                / total_weight
        };

        let price = weighted(|r| r.price);
        let change_24h = weighted(|r| r.change_24h);

        let volume: f64 = readings.iter().map(|r| parse_volume(&r.volume)).sum();

        let prices: Vec<f64> = readings.iter().map(|r| r.price).collect();
        let confidences: Vec<f64> = readings.iter().map(|r| r.confidence).collect();
        let boost = if all_within_tolerance(&prices, self.agreement_tolerance) {
            self.agreement_boost
        } else {
            1.0
        };
        let confidence = clamp_confidence(mean(&confidences).unwrap_or(0.0) * boost);

        let active = readings.iter().filter(|r| r.status.is_active()).count();
        let status = if active == readings.len() {
            FeedStatus::Active
        } else if active > 0 {
            FeedStatus::Degraded
        } else {
            FeedStatus::Offline
        };

        let sources = readings.iter().map(|r| r.sources).sum();

        tracing::debug!(
            pair = %first.pair,
            count = readings.len(),
            price,
            confidence,
            "aggregated readings"
        );

        Some(PriceReading {
            pair: first.pair.clone(),
            price,
            change_24h,
            volume: format_volume(volume),
            last_update: LAST_UPDATE_NOW.to_string(),
            status,
            confidence,
            sources,
        })
    }

    // ═══════════════════════════════════════════════════════════════════════════
    // VALIDATION
    // ═══════════════════════════════════════════════════════════════════════════

    /// Check a reading for anomalies.
    ///
    /// `historical_average` is ignored unless it is positive.
    pub fn validate(&self, reading: &PriceReading, historical_average: Option<f64>) -> bool {
        if !(reading.price > 0.0) {
            tracing::warn!(pair = %reading.pair, price = reading.price, "non-positive price");
            return false;
        }

        if reading.change_24h.abs() > self.max_change_24h {
            tracing::warn!(
                pair = %reading.pair,
                change_24h = reading.change_24h,
                "extreme 24h change"
            );
            return false;
        }

        if let Some(average) = historical_average.filter(|a| *a > 0.0) {
            let deviation = relative_deviation(reading.price, average);
            if deviation > self.max_historical_deviation {
                tracing::warn!(
                    pair = %reading.pair,
                    price = reading.price,
                    average,
                    deviation_pct = deviation * 100.0,
                    "price deviates from historical average"
                );
                return false;
            }
        }

        true
    }
}

/// Aggregate readings with the default thresholds
pub fn aggregate_prices(readings: &[PriceReading]) -> Option<PriceReading> {
    PriceAggregator::default().aggregate(readings)
}

/// Validate a reading with the default thresholds
pub fn validate_price_data(reading: &PriceReading, historical_average: Option<f64>) -> bool {
    PriceAggregator::default().validate(reading, historical_average)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::types::TradingPair;
    use proptest::prelude::*;

    fn reading(price: f64) -> PriceReading {
        let pair: TradingPair = "BTC/USD".parse().unwrap();
        PriceReading::new(&pair, price).unwrap().with_sources(5)
    }

    #[test]
    fn test_empty_and_single() {
        assert!(aggregate_prices(&[]).is_none());

        let single = reading(123.0).with_status(FeedStatus::Degraded).with_last_update("2m ago");
        assert_eq!(aggregate_prices(&[single.clone()]), Some(single));
    }

    #[test]
    fn test_equal_weights_average() {
        let result = aggregate_prices(&[reading(100.0), reading(102.0)]).unwrap();
        assert!((result.price - 101.0).abs() < 1e-9);
        assert_eq!(result.sources, 10);
        assert_eq!(result.pair, "BTC/USD");
        assert_eq!(result.last_update, "just now");
    }

    #[test]
    fn test_weighting_favours_trusted_readings() {
        let trusted = reading(100.0);
        let weak = reading(200.0).with_sources(1).with_status(FeedStatus::Degraded);

        let result = aggregate_prices(&[trusted, weak]).unwrap();
        // weights 0.999 and 0.0999
        assert!(result.price > 100.0 && result.price < 110.0);
    }

    #[test]
    fn test_agreement_boost() {
        let a = reading(100.0).with_confidence(60.0);
        let b = reading(100.5).with_confidence(60.0);
        let result = aggregate_prices(&[a, b]).unwrap();
        assert!((result.confidence - 90.0).abs() < 1e-9);
    }

    #[test]
    fn test_no_boost_on_disagreement() {
        let a = reading(100.0).with_confidence(60.0);
        let b = reading(105.0).with_confidence(60.0);
        let result = aggregate_prices(&[a, b]).unwrap();
        assert!((result.confidence - 60.0).abs() < 1e-9);
    }

    #[test]
    fn test_boost_is_capped() {
        let result = aggregate_prices(&[reading(100.0), reading(100.0)]).unwrap();
        assert_eq!(result.confidence, 99.9);
    }

    #[test]
    fn test_status_rules() {
        let active = reading(100.0);
        let degraded = reading(100.0).with_status(FeedStatus::Degraded);
        let offline = reading(100.0).with_status(FeedStatus::Offline);

        let all_active = aggregate_prices(&[active.clone(), active.clone()]).unwrap();
        assert_eq!(all_active.status, FeedStatus::Active);

        let mixed = aggregate_prices(&[active, degraded.clone()]).unwrap();
        assert_eq!(mixed.status, FeedStatus::Degraded);

        let none_active = aggregate_prices(&[degraded, offline]).unwrap();
        assert_eq!(none_active.status, FeedStatus::Offline);
    }

    #[test]
    fn test_volume_is_summed() {
        let a = reading(100.0).with_volume("$2.1M");
        let b = reading(100.0).with_volume("$900.0K");
        let result = aggregate_prices(&[a, b]).unwrap();
        assert_eq!(result.volume, "$3.0M");
    }

    #[test]
    fn test_zero_weights_return_first() {
        let a = reading(100.0).with_confidence(0.0).with_change_24h(3.0);
        let b = reading(200.0).with_confidence(0.0);
        assert_eq!(aggregate_prices(&[a.clone(), b]), Some(a));
    }

    #[test]
    fn test_change_is_weighted() {
        let a = reading(100.0).with_change_24h(2.0);
        let b = reading(100.0).with_change_24h(4.0);
        let result = aggregate_prices(&[a, b]).unwrap();
        assert!((result.change_24h - 3.0).abs() < 1e-9);
    }

    #[test]
    fn test_validate_price_data() {
        assert!(validate_price_data(&reading(100.0), None));
        assert!(validate_price_data(&reading(100.0).with_change_24h(-50.0), None));
        assert!(!validate_price_data(&reading(100.0).with_change_24h(50.1), None));
        assert!(!validate_price_data(&reading(100.0).with_change_24h(-75.0), None));

        assert!(validate_price_data(&reading(125.0), Some(100.0)));
        assert!(!validate_price_data(&reading(131.0), Some(100.0)));
        assert!(!validate_price_data(&reading(69.0), Some(100.0)));

        // non-positive averages are ignored
        assert!(validate_price_data(&reading(500.0), Some(0.0)));
    }

    #[test]
    fn test_validate_rejects_non_positive_price() {
        let mut bad = reading(1.0);
        bad.price = 0.0;
        assert!(!validate_price_data(&bad, None));
    }

    fn arb_reading() -> impl Strategy<Value = PriceReading> {
        (
            0.0001f64..1_000_000.0,
            -40.0f64..40.0,
            0.0f64..100.0,
            0u32..8,
            prop_oneof![
                Just(FeedStatus::Active),
                Just(FeedStatus::Degraded),
                Just(FeedStatus::Offline)
            ],
        )
            .prop_map(|(price, change, confidence, sources, status)| {
                reading(price)
                    .with_change_24h(change)
                    .with_confidence(confidence)
                    .with_sources(sources)
                    .with_status(status)
            })
    }

    proptest! {
        #[test]
        fn prop_single_reading_is_identity(r in arb_reading()) {
            prop_assert_eq!(aggregate_prices(&[r.clone()]), Some(r));
        }

        #[test]
        fn prop_price_within_input_range(readings in prop::collection::vec(arb_reading(), 2..6)) {
            let result = aggregate_prices(&readings).unwrap();
            let min = readings.iter().map(|r| r.price).fold(f64::INFINITY, f64::min);
            let max = readings.iter().map(|r| r.price).fold(f64::NEG_INFINITY, f64::max);
            prop_assert!(result.price >= min * (1.0 - 1e-9));
            prop_assert!(result.price <= max * (1.0 + 1e-9));
        }

        #[test]
        fn prop_confidence_is_clamped(readings in prop::collection::vec(arb_reading(), 1..6)) {
            let result = aggregate_prices(&readings).unwrap();
            prop_assert!(result.confidence >= 0.0 && result.confidence <= 99.9);
        }
    }
}
