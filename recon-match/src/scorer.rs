use crate::config::MatchConfig;
use recon_core::Trade;
use rust_decimal::Decimal;

/// How a [`crate::engine::Match`] was ranked: purely by the built-in weighted score, or by an
/// `ExternalScorer` plug-in that exceeded `ml_min_confidence`.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub enum MatchMethod {
    Algorithmic,
    ExternalScorer,
}

impl std::fmt::Display for MatchMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Algorithmic => write!(f, "algorithmic"),
            Self::ExternalScorer => write!(f, "external_scorer"),
        }
    }
}

/// Pluggable ranking scorer. A learned-model enhancer attaches here without disturbing the
/// core algorithmic scoring or the validation gate, which always runs regardless of which
/// scorer produced the winning candidate.
pub trait ExternalScorer: Send + Sync {
    /// Probability in `[0, 1]` that `internal` and `external` are the same economic event.
    fn score(&self, internal: &Trade, external: &Trade) -> f64;
}

/// Ratio of the absolute difference between two decimals to `base`, or `None` if `base` is
/// zero — a zero denominator is treated as an infinite delta rather than propagated as a
/// divide-by-zero.
fn percent_diff(value: Decimal, base: Decimal) -> Option<f64> {
    if base.is_zero() {
        return None;
    }
    let diff = (value - base).abs();
    (diff / base.abs()).try_into().ok()
}

fn clamp01(x: f64) -> f64 {
    x.clamp(0.0, 1.0)
}

/// Raw `[0,1]` proximity score for a percent-difference against a tolerance: `1 - diff/tol`,
/// clamped, or `0.0` if the difference exceeds tolerance or the base is zero.
fn proximity_score(diff_pct: Option<f64>, tolerance_pct: f64) -> f64 {
    match diff_pct {
        Some(diff_pct) if diff_pct <= tolerance_pct => clamp01(1.0 - diff_pct / tolerance_pct),
        _ => 0.0,
    }
}

/// Computes the five raw, per-component scores used by [`algorithmic_score`]. Exposed
/// separately so the classifier and tests can inspect individual components.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct ScoreComponents {
    pub instrument_exact: f64,
    pub counterparty_similarity: f64,
    pub price_proximity: f64,
    pub quantity_proximity: f64,
    pub time_proximity: f64,
}

impl ScoreComponents {
    pub fn compute(internal: &Trade, external: &Trade, config: &MatchConfig) -> Self {
        let instrument_exact = if internal.instrument_id == external.instrument_id {
            1.0
        } else {
            0.0
        };

        let counterparty_similarity = strsim::normalized_levenshtein(
            &internal.counterparty.to_uppercase(),
            &external.counterparty.to_uppercase(),
        );

        let price_tol_pct: f64 = config.price_tolerance_percent.try_into().unwrap_or(0.0);
        let price_proximity = proximity_score(
            percent_diff(external.price, internal.price),
            price_tol_pct,
        );

        let qty_tol_pct: f64 = config.quantity_tolerance_percent.try_into().unwrap_or(0.0);
        let quantity_proximity = proximity_score(
            percent_diff(external.quantity, internal.quantity),
            qty_tol_pct,
        );

        let time_diff_hours =
            (internal.trade_date - external.trade_date).num_seconds().abs() as f64 / 3600.0;
        let time_proximity = if config.time_window_hours > 0 {
            (1.0 - time_diff_hours / config.time_window_hours as f64).max(0.0)
        } else {
            0.0
        };

        Self {
            instrument_exact,
            counterparty_similarity,
            price_proximity,
            quantity_proximity,
            time_proximity,
        }
    }

    /// Weighted average of the five raw scores, normalized by the sum of the weights so a
    /// perfect candidate reaches `1.0` and stays reachable against `min_match_score`.
    pub fn weighted_mean(&self) -> f64 {
        const W_INSTRUMENT: f64 = 1.0;
        const W_COUNTERPARTY: f64 = 0.8;
        const W_PRICE: f64 = 0.9;
        const W_QUANTITY: f64 = 0.9;
        const W_TIME: f64 = 0.6;
        const W_SUM: f64 = W_INSTRUMENT + W_COUNTERPARTY + W_PRICE + W_QUANTITY + W_TIME;

        let weighted_sum = self.instrument_exact * W_INSTRUMENT
            + self.counterparty_similarity * W_COUNTERPARTY
            + self.price_proximity * W_PRICE
            + self.quantity_proximity * W_QUANTITY
            + self.time_proximity * W_TIME;

        weighted_sum / W_SUM
    }
}

/// Convenience wrapper around [`ScoreComponents::compute`] + [`ScoreComponents::weighted_mean`].
pub fn algorithmic_score(internal: &Trade, external: &Trade, config: &MatchConfig) -> f64 {
    ScoreComponents::compute(internal, external, config).weighted_mean()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, Utc};
    use recon_core::{TradeId, TradeSource, TradeStatus};
    use rust_decimal_macros::dec;
    use smol_str::SmolStr;
    use std::collections::BTreeMap;

    fn trade(price: Decimal, quantity: Decimal, counterparty: &str, time: chrono::DateTime<Utc>) -> Trade {
        Trade {
            id: None,
            trade_id: TradeId::from("T"),
            source: TradeSource::BrokerA,
            trade_date: time,
            settlement_date: time.date_naive(),
            instrument_id: SmolStr::new("ABC"),
            instrument_name: None,
            quantity,
            price,
            currency: SmolStr::new("USD"),
            counterparty: counterparty.to_string(),
            account: None,
            status: TradeStatus::Unmatched,
            matched_trade_id: None,
            raw_data: BTreeMap::new(),
        }
    }

    #[test]
    fn identical_trades_score_near_one() {
        let now = Utc::now();
        let a = trade(dec!(10.00), dec!(100), "JPM", now);
        let b = trade(dec!(10.00), dec!(100), "JPM", now);
        let config = MatchConfig::default();

        let score = algorithmic_score(&a, &b, &config);
        assert!((score - 1.0).abs() < 1e-9, "score was {score}");
    }

    #[test]
    fn price_beyond_tolerance_zeroes_component() {
        let now = Utc::now();
        let a = trade(dec!(10.00), dec!(100), "JPM", now);
        let b = trade(dec!(12.00), dec!(100), "JPM", now);
        let config = MatchConfig::default();

        let components = ScoreComponents::compute(&a, &b, &config);
        assert_eq!(components.price_proximity, 0.0);
    }

    #[test]
    fn zero_denominator_treated_as_infinite_delta() {
        let now = Utc::now();
        let a = trade(dec!(0), dec!(100), "JPM", now);
        let b = trade(dec!(10.00), dec!(100), "JPM", now);
        let config = MatchConfig::default();

        let components = ScoreComponents::compute(&a, &b, &config);
        assert_eq!(components.price_proximity, 0.0);
    }

    #[test]
    fn time_at_exactly_window_scores_zero_proximity_but_is_still_a_candidate() {
        let now = Utc::now();
        let a = trade(dec!(10), dec!(100), "JPM", now);
        let b = trade(dec!(10), dec!(100), "JPM", now - Duration::hours(24));
        let config = MatchConfig::default();

        let components = ScoreComponents::compute(&a, &b, &config);
        assert_eq!(components.time_proximity, 0.0);
    }

    #[test]
    fn weighted_mean_divides_by_weight_sum_not_component_count() {
        // All components perfect (1.0) except counterparty similarity exactly 0.5.
        let components = ScoreComponents {
            instrument_exact: 1.0,
            counterparty_similarity: 0.5,
            price_proximity: 1.0,
            quantity_proximity: 1.0,
            time_proximity: 1.0,
        };

        let expected = (1.0 * 1.0 + 0.5 * 0.8 + 1.0 * 0.9 + 1.0 * 0.9 + 1.0 * 0.6) / 4.2;
        assert!((components.weighted_mean() - expected).abs() < 1e-12);
    }

    #[test]
    fn a_perfect_candidate_reaches_the_default_match_threshold() {
        let now = Utc::now();
        let a = trade(dec!(10.00), dec!(100), "JPM", now);
        let b = trade(dec!(10.00), dec!(100), "JPM", now);
        let config = MatchConfig::default();

        let score = algorithmic_score(&a, &b, &config);
        assert!(score >= config.min_match_score, "score {score} below threshold {}", config.min_match_score);
    }
}
