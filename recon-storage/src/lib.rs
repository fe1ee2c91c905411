#![warn(
    unused,
    clippy::cognitive_complexity,
    unused_crate_dependencies,
    unused_extern_crates,
    clippy::unused_self,
    clippy::useless_let_if_seq,
    missing_debug_implementations,
    rust_2018_idioms
)]

//! # Recon-Storage
//! The durable-state interface the orchestrator and every reporting consumer go through, plus
//! an in-memory reference implementation for tests and small deployments.

mod memory;

pub use memory::InMemoryStorage;

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use recon_core::{Break, BreakStatus, ReconError, ReconciliationRun, RecordId, Severity, Trade, TradeStatus};
use std::collections::HashMap;

/// Break counts bucketed by age, used by the aging report.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AgingBuckets {
    pub hours_0_to_24: usize,
    pub hours_24_to_48: usize,
    pub hours_48_plus: usize,
}

/// Durable state for trades, breaks and runs. Passed explicitly to every component that needs
/// it; there is no module-level session or global connection.
#[async_trait]
pub trait Storage: Send + Sync {
    async fn save_trade(&self, trade: Trade) -> Result<RecordId, ReconError>;
    async fn update_trade_status(
        &self,
        id: RecordId,
        status: TradeStatus,
        matched_trade_id: Option<RecordId>,
    ) -> Result<(), ReconError>;

    async fn save_break(&self, break_: Break) -> Result<RecordId, ReconError>;
    async fn update_break(&self, break_: Break) -> Result<(), ReconError>;

    async fn create_run(&self, trade_date: NaiveDate, started_at: DateTime<Utc>) -> Result<RecordId, ReconError>;
    async fn update_run(&self, run: ReconciliationRun) -> Result<(), ReconError>;
    async fn find_run_by_date(&self, trade_date: NaiveDate) -> Result<Option<ReconciliationRun>, ReconError>;

    async fn counts_by_break_status(&self) -> Result<HashMap<BreakStatus, usize>, ReconError>;
    async fn counts_by_severity(&self) -> Result<HashMap<Severity, usize>, ReconError>;
    async fn aging_buckets(&self, now: DateTime<Utc>) -> Result<AgingBuckets, ReconError>;
    async fn top_counterparties_by_break_count(&self, n: usize) -> Result<Vec<(String, usize)>, ReconError>;
}
