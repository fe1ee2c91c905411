use crate::{AgingBuckets, Storage};
use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use recon_core::{Break, BreakStatus, ReconError, ReconciliationRun, RecordId, Severity, Trade, TradeStatus};
use std::collections::HashMap;
use tokio::sync::Mutex;

/// `Mutex`-guarded `HashMap`s behind the [`Storage`] trait. No persistence across process
/// restarts; suitable for tests and as the default for small deployments.
#[derive(Debug, Default)]
pub struct InMemoryStorage {
    trades: Mutex<HashMap<RecordId, Trade>>,
    breaks: Mutex<HashMap<RecordId, Break>>,
    runs: Mutex<HashMap<RecordId, ReconciliationRun>>,
    runs_by_date: Mutex<HashMap<NaiveDate, Vec<RecordId>>>,
}

impl InMemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl Storage for InMemoryStorage {
    async fn save_trade(&self, mut trade: Trade) -> Result<RecordId, ReconError> {
        let id = RecordId::random();
        trade.id = Some(id);
        self.trades.lock().await.insert(id, trade);
        Ok(id)
    }

    async fn update_trade_status(
        &self,
        id: RecordId,
        status: TradeStatus,
        matched_trade_id: Option<RecordId>,
    ) -> Result<(), ReconError> {
        let mut trades = self.trades.lock().await;
        let trade = trades
            .get_mut(&id)
            .ok_or_else(|| ReconError::Persistence(format!("no trade with id {id}")))?;
        trade.status = status;
        trade.matched_trade_id = matched_trade_id;
        Ok(())
    }

    async fn save_break(&self, mut break_: Break) -> Result<RecordId, ReconError> {
        let id = RecordId::random();
        break_.id = Some(id);
        self.breaks.lock().await.insert(id, break_);
        Ok(id)
    }

    async fn update_break(&self, break_: Break) -> Result<(), ReconError> {
        let id = break_
            .id
            .ok_or_else(|| ReconError::Persistence("cannot update a break with no id".to_string()))?;
        let mut breaks = self.breaks.lock().await;
        if !breaks.contains_key(&id) {
            return Err(ReconError::Persistence(format!("no break with id {id}")));
        }
        breaks.insert(id, break_);
        Ok(())
    }

    async fn create_run(&self, trade_date: NaiveDate, started_at: DateTime<Utc>) -> Result<RecordId, ReconError> {
        let mut run = ReconciliationRun::new(trade_date, started_at);
        let id = RecordId::random();
        run.id = Some(id);
        self.runs.lock().await.insert(id, run);
        self.runs_by_date.lock().await.entry(trade_date).or_default().push(id);
        Ok(id)
    }

    async fn update_run(&self, run: ReconciliationRun) -> Result<(), ReconError> {
        let id = run
            .id
            .ok_or_else(|| ReconError::Persistence("cannot update a run with no id".to_string()))?;
        let mut runs = self.runs.lock().await;
        if !runs.contains_key(&id) {
            return Err(ReconError::Persistence(format!("no run with id {id}")));
        }
        runs.insert(id, run);
        Ok(())
    }

    async fn find_run_by_date(&self, trade_date: NaiveDate) -> Result<Option<ReconciliationRun>, ReconError> {
        let runs_by_date = self.runs_by_date.lock().await;
        let Some(ids) = runs_by_date.get(&trade_date) else {
            return Ok(None);
        };
        let runs = self.runs.lock().await;
        Ok(ids.last().and_then(|id| runs.get(id)).cloned())
    }

    async fn counts_by_break_status(&self) -> Result<HashMap<BreakStatus, usize>, ReconError> {
        let breaks = self.breaks.lock().await;
        let mut counts = HashMap::new();
        for break_ in breaks.values() {
            *counts.entry(break_.status).or_insert(0) += 1;
        }
        Ok(counts)
    }

    async fn counts_by_severity(&self) -> Result<HashMap<Severity, usize>, ReconError> {
        let breaks = self.breaks.lock().await;
        let mut counts = HashMap::new();
        for break_ in breaks.values() {
            *counts.entry(break_.severity).or_insert(0) += 1;
        }
        Ok(counts)
    }

    async fn aging_buckets(&self, now: DateTime<Utc>) -> Result<AgingBuckets, ReconError> {
        let breaks = self.breaks.lock().await;
        let mut buckets = AgingBuckets::default();
        for break_ in breaks.values().filter(|b| !b.status.is_resolved()) {
            let age_hours = break_.age(now).num_hours();
            if age_hours < 24 {
                buckets.hours_0_to_24 += 1;
            } else if age_hours < 48 {
                buckets.hours_24_to_48 += 1;
            } else {
                buckets.hours_48_plus += 1;
            }
        }
        Ok(buckets)
    }

    async fn top_counterparties_by_break_count(&self, n: usize) -> Result<Vec<(String, usize)>, ReconError> {
        let breaks = self.breaks.lock().await;
        let trades = self.trades.lock().await;
        let mut counts: HashMap<String, usize> = HashMap::new();
        for break_ in breaks.values() {
            if let Some(trade) = trades.get(&break_.trade_ref) {
                *counts.entry(trade.counterparty.clone()).or_insert(0) += 1;
            }
        }
        let mut ranked: Vec<(String, usize)> = counts.into_iter().collect();
        ranked.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
        ranked.truncate(n);
        Ok(ranked)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use recon_core::{BreakType, TradeId, TradeSource};
    use rust_decimal_macros::dec;
    use smol_str::SmolStr;
    use std::collections::BTreeMap;

    fn trade(counterparty: &str) -> Trade {
        Trade {
            id: None,
            trade_id: TradeId::from("T1"),
            source: TradeSource::Internal,
            trade_date: Utc::now(),
            settlement_date: Utc::now().date_naive(),
            instrument_id: SmolStr::new("ABC"),
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

    #[tokio::test]
    async fn save_trade_assigns_id_and_round_trips_status_update() {
        let storage = InMemoryStorage::new();
        let id = storage.save_trade(trade("JPM")).await.unwrap();
        storage
            .update_trade_status(id, TradeStatus::Matched, None)
            .await
            .unwrap();

        let trades = storage.trades.lock().await;
        assert_eq!(trades.get(&id).unwrap().status, TradeStatus::Matched);
    }

    #[tokio::test]
    async fn find_run_by_date_returns_most_recently_created() {
        let storage = InMemoryStorage::new();
        let date = Utc::now().date_naive();
        let started_at = Utc::now();
        let first = storage.create_run(date, started_at).await.unwrap();
        let second = storage.create_run(date, started_at).await.unwrap();

        let found = storage.find_run_by_date(date).await.unwrap().unwrap();
        assert_eq!(found.id, Some(second));
        assert_ne!(found.id, Some(first));
    }

    #[tokio::test]
    async fn top_counterparties_orders_by_count_then_name() {
        let storage = InMemoryStorage::new();
        let jpm_id = storage.save_trade(trade("JPM")).await.unwrap();
        let gs_id = storage.save_trade(trade("GS")).await.unwrap();

        for _ in 0..3 {
            storage
                .save_break(Break {
                    id: None,
                    break_type: BreakType::PriceMismatch,
                    severity: Severity::Low,
                    trade_ref: jpm_id,
                    matched_trade_ref: None,
                    expected_value: None,
                    actual_value: None,
                    difference: None,
                    root_cause_category: None,
                    sla_hours: 48,
                    priority_score: 10,
                    auto_resolvable: false,
                    status: BreakStatus::Open,
                    created_at: Utc::now(),
                    resolved_at: None,
                    resolution_notes: None,
                })
                .await
                .unwrap();
        }
        storage
            .save_break(Break {
                id: None,
                break_type: BreakType::PriceMismatch,
                severity: Severity::Low,
                trade_ref: gs_id,
                matched_trade_ref: None,
                expected_value: None,
                actual_value: None,
                difference: None,
                root_cause_category: None,
                sla_hours: 48,
                priority_score: 10,
                auto_resolvable: false,
                status: BreakStatus::Open,
                created_at: Utc::now(),
                resolved_at: None,
                resolution_notes: None,
            })
            .await
            .unwrap();

        let ranked = storage.top_counterparties_by_break_count(5).await.unwrap();
        assert_eq!(ranked[0], ("JPM".to_string(), 3));
        assert_eq!(ranked[1], ("GS".to_string(), 1));
    }
}
