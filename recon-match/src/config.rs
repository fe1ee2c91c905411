use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

/// Tolerances and thresholds that parameterise matching. `#[serde(deny_unknown_fields)]`
/// rejects configuration keys that are not in this table rather than silently ignoring a typo.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize, Serialize)]
#[serde(deny_unknown_fields, default)]
pub struct MatchConfig {
    pub price_tolerance_percent: Decimal,
    pub quantity_tolerance_percent: Decimal,
    pub time_window_hours: i64,
    pub min_match_score: f64,
    /// Minimum confidence an `ExternalScorer` must return before its score is allowed to
    /// override the algorithmic ranking score. Validation gates still apply regardless.
    pub ml_min_confidence: f64,
}

impl Default for MatchConfig {
    fn default() -> Self {
        Self {
            price_tolerance_percent: dec!(0.01),
            quantity_tolerance_percent: dec!(0.001),
            time_window_hours: 24,
            min_match_score: 0.85,
            ml_min_confidence: 0.85,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_unknown_fields() {
        let raw = r#"{ "price_tolerance_percent": "0.02", "bogus_key": 1 }"#;
        let result: Result<MatchConfig, _> = serde_json::from_str(raw);
        assert!(result.is_err());
    }

    #[test]
    fn default_matches_documented_tolerances() {
        let cfg = MatchConfig::default();
        assert_eq!(cfg.price_tolerance_percent, dec!(0.01));
        assert_eq!(cfg.quantity_tolerance_percent, dec!(0.001));
        assert_eq!(cfg.time_window_hours, 24);
        assert_eq!(cfg.min_match_score, 0.85);
    }
}
