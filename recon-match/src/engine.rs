use crate::config::MatchConfig;
use crate::index::ExternalTradeIndex;
use crate::scorer::{algorithmic_score, ExternalScorer, MatchMethod};
use chrono::{DateTime, Utc};
use recon_core::{Break, BreakType, RecordId, Trade};
use rust_decimal::Decimal;
use std::collections::BTreeSet;
use std::sync::Arc;
use tracing::{debug, trace};

/// One committed pairing between an internal trade and an external trade, identified by their
/// positions in the slices passed to [`MatchingEngine::match_trades`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MatchOutcome {
    pub internal_index: usize,
    pub external_index: usize,
    pub score: f64,
    pub method: MatchMethod,
}

/// Result of one [`MatchingEngine::match_trades`] call: which trades paired up, which were left
/// over, and the breaks raised either for a missing counterpart or a field disagreement within
/// a pair.
#[derive(Debug, Default)]
pub struct MatchOutput {
    pub matched: Vec<MatchOutcome>,
    pub unmatched_internal: Vec<usize>,
    pub unmatched_external: Vec<usize>,
    pub breaks: Vec<Break>,
}

/// Candidate generation, scoring, the validation gate and greedy single-pass pairing.
///
/// One instance is built per run; its `ExternalTradeIndex` is scoped to that run's external
/// trades and is never reused across trade dates.
pub struct MatchingEngine {
    config: MatchConfig,
    external_scorer: Option<Arc<dyn ExternalScorer>>,
}

impl std::fmt::Debug for MatchingEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MatchingEngine")
            .field("config", &self.config)
            .field("external_scorer", &self.external_scorer.is_some())
            .finish()
    }
}

impl MatchingEngine {
    pub fn new(config: MatchConfig) -> Self {
        Self {
            config,
            external_scorer: None,
        }
    }

    pub fn with_external_scorer(mut self, scorer: Arc<dyn ExternalScorer>) -> Self {
        self.external_scorer = Some(scorer);
        self
    }

    /// Pair every internal trade against at most one external trade. Every internal trade is
    /// visited exactly once, in slice order; once an external trade is claimed it is never
    /// offered to a later internal trade. This is a greedy, deterministic, single-pass
    /// algorithm, not a global optimum over all possible pairings.
    pub fn match_trades(&self, internal: &[Trade], external: &[Trade], now: DateTime<Utc>) -> MatchOutput {
        let index = ExternalTradeIndex::build(external);
        let mut claimed_external: BTreeSet<usize> = BTreeSet::new();
        let mut output = MatchOutput::default();

        for (internal_position, internal_trade) in internal.iter().enumerate() {
            match self.best_candidate(internal_trade, external, &index, &claimed_external) {
                Some((external_position, score, method)) => {
                    claimed_external.insert(external_position);
                    trace!(
                        internal_trade_id = %internal_trade.trade_id,
                        external_trade_id = %external[external_position].trade_id,
                        score,
                        method = %method,
                        "paired trades"
                    );
                    output.breaks.extend(self.reinspect_pair(
                        internal_trade,
                        &external[external_position],
                        now,
                    ));
                    output.matched.push(MatchOutcome {
                        internal_index: internal_position,
                        external_index: external_position,
                        score,
                        method,
                    });
                }
                None => {
                    output.unmatched_internal.push(internal_position);
                }
            }
        }

        for (external_position, _) in external.iter().enumerate() {
            if !claimed_external.contains(&external_position) {
                output.unmatched_external.push(external_position);
            }
        }

        for &position in &output.unmatched_internal {
            let trade = &internal[position];
            if let Some(id) = trade.id {
                output
                    .breaks
                    .push(Break::new_missing(BreakType::MissingExternalTrade, id, now));
            }
        }
        for &position in &output.unmatched_external {
            let trade = &external[position];
            if let Some(id) = trade.id {
                output
                    .breaks
                    .push(Break::new_missing(BreakType::MissingInternalTrade, id, now));
            }
        }

        debug!(
            matched = output.matched.len(),
            unmatched_internal = output.unmatched_internal.len(),
            unmatched_external = output.unmatched_external.len(),
            breaks = output.breaks.len(),
            "match pass complete"
        );

        output
    }

    /// Finds the best still-unclaimed external candidate for `internal`, applying the time
    /// window, the validation gate, and the minimum score threshold. Ties are broken by smaller
    /// time delta, then smaller price delta, then lexicographic external `trade_id` — this
    /// ordering must stay stable for the engine's determinism guarantee to hold.
    fn best_candidate(
        &self,
        internal: &Trade,
        external: &[Trade],
        index: &ExternalTradeIndex,
        claimed: &BTreeSet<usize>,
    ) -> Option<(usize, f64, MatchMethod)> {
        let mut best: Option<(usize, f64, MatchMethod)> = None;

        for position in index.candidate_positions(internal) {
            if claimed.contains(&position) {
                continue;
            }
            let candidate = &external[position];

            if internal.validate_match(candidate).is_err() {
                continue;
            }

            let time_delta_hours =
                (internal.trade_date - candidate.trade_date).num_seconds().abs() as f64 / 3600.0;
            if time_delta_hours > self.config.time_window_hours as f64 {
                continue;
            }

            let (score, method) = self.score_pair(internal, candidate);
            if score < self.config.min_match_score {
                continue;
            }

            let price_delta = (candidate.price - internal.price).abs();
            let candidate_key = (time_delta_hours, price_delta, candidate.trade_id.0.clone());

            let is_better = match &best {
                None => true,
                Some((best_position, best_score, _)) => {
                    if score > *best_score {
                        true
                    } else if score < *best_score {
                        false
                    } else {
                        let best_trade = &external[*best_position];
                        let best_time_delta = (internal.trade_date - best_trade.trade_date)
                            .num_seconds()
                            .abs() as f64
                            / 3600.0;
                        let best_price_delta = (best_trade.price - internal.price).abs();
                        let best_key =
                            (best_time_delta, best_price_delta, best_trade.trade_id.0.clone());
                        candidate_key < best_key
                    }
                }
            };

            if is_better {
                best = Some((position, score, method));
            }
        }

        best
    }

    fn score_pair(&self, internal: &Trade, external: &Trade) -> (f64, MatchMethod) {
        if let Some(scorer) = &self.external_scorer {
            let confidence = scorer.score(internal, external);
            if confidence >= self.config.ml_min_confidence {
                return (confidence, MatchMethod::ExternalScorer);
            }
        }
        (algorithmic_score(internal, external, &self.config), MatchMethod::Algorithmic)
    }

    /// After a pair has been committed, re-inspects every field the data model tracks and
    /// raises one break per field that disagrees beyond tolerance. A pair can raise more than
    /// one break.
    fn reinspect_pair(&self, internal: &Trade, external: &Trade, now: DateTime<Utc>) -> Vec<Break> {
        let (Some(internal_ref), Some(external_ref)) = (internal.id, external.id) else {
            return Vec::new();
        };

        let mut breaks = Vec::new();

        if let Some((expected, actual, difference)) =
            self.price_mismatch(internal.price, external.price)
        {
            breaks.push(Break::new_mismatch(
                BreakType::PriceMismatch,
                internal_ref,
                external_ref,
                Some(expected),
                Some(actual),
                Some(difference),
                now,
            ));
        }

        if let Some((expected, actual, difference)) =
            self.quantity_mismatch(internal.quantity, external.quantity)
        {
            breaks.push(Break::new_mismatch(
                BreakType::QuantityMismatch,
                internal_ref,
                external_ref,
                Some(expected),
                Some(actual),
                Some(difference),
                now,
            ));
        }

        if internal.settlement_date != external.settlement_date {
            breaks.push(Break::new_mismatch(
                BreakType::SettlementDateMismatch,
                internal_ref,
                external_ref,
                None,
                None,
                None,
                now,
            ));
        }

        if !internal
            .counterparty
            .eq_ignore_ascii_case(&external.counterparty)
        {
            breaks.push(Break::new_mismatch(
                BreakType::CounterpartyMismatch,
                internal_ref,
                external_ref,
                None,
                None,
                None,
                now,
            ));
        }

        if let (Some(internal_account), Some(external_account)) =
            (&internal.account, &external.account)
        {
            if internal_account != external_account {
                breaks.push(Break::new_mismatch(
                    BreakType::AccountMismatch,
                    internal_ref,
                    external_ref,
                    None,
                    None,
                    None,
                    now,
                ));
            }
        }

        if internal.currency != external.currency {
            breaks.push(Break::new_mismatch(
                BreakType::CurrencyMismatch,
                internal_ref,
                external_ref,
                None,
                None,
                None,
                now,
            ));
        }

        breaks
    }

    /// `Some((expected, actual, difference))` when the price disagreement exceeds the percent
    /// tolerance. A zero internal price is an automatic mismatch, since a percentage against a
    /// zero base is undefined.
    fn price_mismatch(&self, internal: Decimal, external: Decimal) -> Option<(Decimal, Decimal, Decimal)> {
        let difference = external - internal;
        if internal.is_zero() {
            return if difference.is_zero() {
                None
            } else {
                Some((internal, external, difference))
            };
        }
        let percent = difference.abs() / internal.abs();
        if percent <= self.config.price_tolerance_percent {
            return None;
        }
        Some((internal, external, difference))
    }

    fn quantity_mismatch(&self, internal: Decimal, external: Decimal) -> Option<(Decimal, Decimal, Decimal)> {
        let difference = external - internal;
        if internal.is_zero() {
            return if difference.is_zero() {
                None
            } else {
                Some((internal, external, difference))
            };
        }
        let percent = difference.abs() / internal.abs();
        if percent <= self.config.quantity_tolerance_percent {
            return None;
        }
        Some((internal, external, difference))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use recon_core::{TradeId, TradeSource, TradeStatus};
    use rust_decimal_macros::dec;
    use smol_str::SmolStr;
    use std::collections::BTreeMap;

    fn trade(
        id: RecordId,
        trade_id: &str,
        source: TradeSource,
        instrument_id: &str,
        price: Decimal,
        quantity: Decimal,
        counterparty: &str,
        time: DateTime<Utc>,
    ) -> Trade {
        Trade {
            id: Some(id),
            trade_id: TradeId::from(trade_id),
            source,
            trade_date: time,
            settlement_date: time.date_naive(),
            instrument_id: SmolStr::new(instrument_id),
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
    fn matches_identical_trade_with_no_breaks() {
        let now = Utc::now();
        let internal = vec![trade(
            RecordId::random(),
            "T1",
            TradeSource::Internal,
            "ABC",
            dec!(10),
            dec!(100),
            "JPM",
            now,
        )];
        let external = vec![trade(
            RecordId::random(),
            "T1",
            TradeSource::BrokerA,
            "ABC",
            dec!(10),
            dec!(100),
            "JPM",
            now,
        )];

        let engine = MatchingEngine::new(MatchConfig::default());
        let output = engine.match_trades(&internal, &external, now);

        assert_eq!(output.matched.len(), 1);
        assert!(output.unmatched_internal.is_empty());
        assert!(output.unmatched_external.is_empty());
        assert!(output.breaks.is_empty());
    }

    #[test]
    fn price_mismatch_beyond_tolerance_raises_break_but_still_pairs() {
        let now = Utc::now();
        let internal = vec![trade(
            RecordId::random(),
            "T1",
            TradeSource::Internal,
            "ABC",
            dec!(10.00),
            dec!(100),
            "JPM",
            now,
        )];
        let external = vec![trade(
            RecordId::random(),
            "T1",
            TradeSource::BrokerA,
            "ABC",
            dec!(10.50),
            dec!(100),
            "JPM",
            now,
        )];

        // Score will fall below min_match_score due to the price delta, so lower it to force
        // a pairing and exercise the re-inspection path in isolation.
        let mut config = MatchConfig::default();
        config.min_match_score = 0.0;
        let engine = MatchingEngine::new(config);
        let output = engine.match_trades(&internal, &external, now);

        assert_eq!(output.matched.len(), 1);
        assert!(output
            .breaks
            .iter()
            .any(|b| b.break_type == BreakType::PriceMismatch));
    }

    #[test]
    fn unmatched_internal_raises_missing_external_break() {
        let now = Utc::now();
        let internal = vec![trade(
            RecordId::random(),
            "T1",
            TradeSource::Internal,
            "ABC",
            dec!(10),
            dec!(100),
            "JPM",
            now,
        )];
        let external: Vec<Trade> = vec![];

        let engine = MatchingEngine::new(MatchConfig::default());
        let output = engine.match_trades(&internal, &external, now);

        assert_eq!(output.unmatched_internal, vec![0]);
        assert_eq!(output.breaks.len(), 1);
        assert_eq!(output.breaks[0].break_type, BreakType::MissingExternalTrade);
    }

    #[test]
    fn unmatched_external_raises_missing_internal_break() {
        let now = Utc::now();
        let internal: Vec<Trade> = vec![];
        let external = vec![trade(
            RecordId::random(),
            "T1",
            TradeSource::BrokerA,
            "ABC",
            dec!(10),
            dec!(100),
            "JPM",
            now,
        )];

        let engine = MatchingEngine::new(MatchConfig::default());
        let output = engine.match_trades(&internal, &external, now);

        assert_eq!(output.unmatched_external, vec![0]);
        assert_eq!(output.breaks[0].break_type, BreakType::MissingInternalTrade);
    }

    #[test]
    fn greedy_pass_never_double_claims_an_external_trade() {
        let now = Utc::now();
        let shared_external = trade(
            RecordId::random(),
            "SHARED",
            TradeSource::BrokerA,
            "ABC",
            dec!(10),
            dec!(100),
            "JPM",
            now,
        );
        let internal = vec![
            trade(
                RecordId::random(),
                "SHARED",
                TradeSource::Internal,
                "ABC",
                dec!(10),
                dec!(100),
                "JPM",
                now,
            ),
            trade(
                RecordId::random(),
                "SHARED",
                TradeSource::Internal,
                "ABC",
                dec!(10),
                dec!(100),
                "JPM",
                now,
            ),
        ];
        let external = vec![shared_external];

        let engine = MatchingEngine::new(MatchConfig::default());
        let output = engine.match_trades(&internal, &external, now);

        assert_eq!(output.matched.len(), 1);
        assert_eq!(output.unmatched_internal, vec![1]);
    }

    #[test]
    fn currency_mismatch_raises_break_independent_of_other_fields() {
        let now = Utc::now();
        let mut internal_trade = trade(
            RecordId::random(),
            "T1",
            TradeSource::Internal,
            "ABC",
            dec!(10),
            dec!(100),
            "JPM",
            now,
        );
        internal_trade.currency = SmolStr::new("USD");
        let mut external_trade = trade(
            RecordId::random(),
            "T1",
            TradeSource::BrokerA,
            "ABC",
            dec!(10),
            dec!(100),
            "JPM",
            now,
        );
        external_trade.currency = SmolStr::new("EUR");

        let engine = MatchingEngine::new(MatchConfig::default());
        let output = engine.match_trades(&[internal_trade], &[external_trade], now);

        assert_eq!(output.matched.len(), 1);
        assert!(output
            .breaks
            .iter()
            .any(|b| b.break_type == BreakType::CurrencyMismatch));
    }
}
