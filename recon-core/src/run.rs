use crate::trade::RecordId;
use chrono::{DateTime, NaiveDate, Utc};
use derive_more::Display;
use serde::{Deserialize, Serialize};
use std::time::Duration;

pub type RunId = RecordId;

#[derive(
    Debug, Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash, Default, Deserialize, Serialize, Display,
)]
#[serde(rename_all = "snake_case")]
pub enum RunStatus {
    #[default]
    Running,
    Completed,
    Failed,
    /// Not part of the lifecycle a run transitions through itself; assigned retroactively to a
    /// prior run when a `force_rerun` supersedes it for the same `trade_date`.
    Superseded,
}

/// One execution of the reconciliation pipeline for a given `trade_date`.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct ReconciliationRun {
    pub id: Option<RunId>,
    pub trade_date: NaiveDate,
    pub status: RunStatus,
    pub started_at: DateTime<Utc>,
    pub duration: Option<Duration>,
    pub error_message: Option<String>,

    pub total_internal_trades: u64,
    pub total_external_trades: u64,
    pub matched_trades: u64,
    pub new_breaks: u64,
    pub auto_resolved_breaks: u64,

    /// Per-row normalisation failures accumulated across every feed ingested this run.
    pub parse_warnings: Vec<String>,
}

impl ReconciliationRun {
    pub fn new(trade_date: NaiveDate, started_at: DateTime<Utc>) -> Self {
        Self {
            id: None,
            trade_date,
            status: RunStatus::Running,
            started_at,
            duration: None,
            error_message: None,
            total_internal_trades: 0,
            total_external_trades: 0,
            matched_trades: 0,
            new_breaks: 0,
            auto_resolved_breaks: 0,
            parse_warnings: Vec::new(),
        }
    }

    pub fn complete(&mut self, now: DateTime<Utc>) {
        self.status = RunStatus::Completed;
        self.duration = (now - self.started_at).to_std().ok();
    }

    pub fn fail(&mut self, now: DateTime<Utc>, message: impl Into<String>) {
        self.status = RunStatus::Failed;
        self.error_message = Some(message.into());
        self.duration = (now - self.started_at).to_std().ok();
    }
}
