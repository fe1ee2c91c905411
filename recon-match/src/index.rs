use fnv::FnvHashMap;
use recon_core::Trade;

/// Multi-key lookup index over one run's external trades.
///
/// Built fresh for each matching-engine invocation and never shared across runs. Every external
/// trade is inserted under three keys — `instrument_id`, `instrument_id/counterparty`, and
/// `trade_id` — so a candidate internal trade can be found however it happens to agree with its
/// counterpart.
#[derive(Debug, Default)]
pub struct ExternalTradeIndex {
    by_key: FnvHashMap<String, Vec<usize>>,
}

impl ExternalTradeIndex {
    /// Build an index over `external`, where each `Vec<usize>` entry is a position into that
    /// same slice.
    pub fn build(external: &[Trade]) -> Self {
        let mut by_key: FnvHashMap<String, Vec<usize>> = FnvHashMap::default();

        for (position, trade) in external.iter().enumerate() {
            for key in Self::keys_for(trade) {
                by_key.entry(key).or_default().push(position);
            }
        }

        Self { by_key }
    }

    fn keys_for(trade: &Trade) -> [String; 3] {
        [
            trade.instrument_id.to_string(),
            format!("{}/{}", trade.instrument_id, trade.counterparty),
            trade.trade_id.0.to_string(),
        ]
    }

    /// Positions of every external trade that shares at least one key with `internal`,
    /// deduplicated. Order is the order keys were probed in (instrument, instrument/cpty, id),
    /// then insertion order within a key's bucket — this is what gives the matcher its
    /// determinism guarantee for tie-breaking.
    pub fn candidate_positions(&self, internal: &Trade) -> Vec<usize> {
        let mut seen = std::collections::BTreeSet::new();
        let mut ordered = Vec::new();

        for key in Self::keys_for(internal) {
            if let Some(positions) = self.by_key.get(&key) {
                for &position in positions {
                    if seen.insert(position) {
                        ordered.push(position);
                    }
                }
            }
        }

        ordered
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use recon_core::{TradeId, TradeSource, TradeStatus};
    use rust_decimal_macros::dec;
    use smol_str::SmolStr;
    use std::collections::BTreeMap;

    fn trade(trade_id: &str, instrument_id: &str, counterparty: &str) -> Trade {
        Trade {
            id: None,
            trade_id: TradeId::from(trade_id),
            source: TradeSource::BrokerA,
            trade_date: Utc::now(),
            settlement_date: Utc::now().date_naive(),
            instrument_id: SmolStr::new(instrument_id),
            instrument_name: None,
            quantity: dec!(100),
            price: dec!(10),
            currency: SmolStr::new("USD"),
            counterparty: counterparty.to_string(),
            account: None,
            status: TradeStatus::Unmatched,
            matched_trade_id: None,
            raw_data: BTreeMap::new(),
        }
    }

    #[test]
    fn finds_candidate_by_instrument_id() {
        let external = vec![trade("E1", "ABC", "JPM")];
        let index = ExternalTradeIndex::build(&external);

        let internal = trade("I1", "ABC", "DIFFERENT_NAME");
        assert_eq!(index.candidate_positions(&internal), vec![0]);
    }

    #[test]
    fn finds_candidate_by_trade_id_when_instrument_differs() {
        let external = vec![trade("SHARED", "XYZ", "GS")];
        let index = ExternalTradeIndex::build(&external);

        let internal = trade("SHARED", "ABC", "JPM");
        assert_eq!(index.candidate_positions(&internal), vec![0]);
    }

    #[test]
    fn deduplicates_across_keys() {
        let external = vec![trade("SHARED", "ABC", "JPM")];
        let index = ExternalTradeIndex::build(&external);

        // Internal trade shares instrument_id, instrument/counterparty AND trade_id with the
        // single external trade - it must appear exactly once.
        let internal = trade("SHARED", "ABC", "JPM");
        assert_eq!(index.candidate_positions(&internal), vec![0]);
    }

    #[test]
    fn no_match_returns_empty() {
        let external = vec![trade("E1", "ABC", "JPM")];
        let index = ExternalTradeIndex::build(&external);

        let internal = trade("I1", "ZZZ", "UNRELATED");
        assert!(index.candidate_positions(&internal).is_empty());
    }
}
