use crate::trade::RecordId;
use chrono::{DateTime, Utc};
use derive_more::Display;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Alias kept distinct from [`RecordId`] purely for readability at call sites.
pub type BreakId = RecordId;

/// Discrepancy kind raised by the matching engine or the per-field re-inspection pass.
#[derive(
    Debug, Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash, Deserialize, Serialize, Display,
)]
#[serde(rename_all = "snake_case")]
pub enum BreakType {
    MissingExternalTrade,
    MissingInternalTrade,
    PriceMismatch,
    QuantityMismatch,
    SettlementDateMismatch,
    CounterpartyMismatch,
    AccountMismatch,
    CurrencyMismatch,
}

impl BreakType {
    /// `MISSING_*` breaks never carry a `matched_trade_ref`; everything else does.
    pub fn is_missing_side(&self) -> bool {
        matches!(
            self,
            Self::MissingExternalTrade | Self::MissingInternalTrade
        )
    }
}

#[derive(
    Debug, Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash, Deserialize, Serialize, Display,
)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    Low,
    Medium,
    High,
    Critical,
}

impl Severity {
    /// SLA budget in hours, keyed by severity.
    pub fn sla_hours(&self) -> u32 {
        match self {
            Self::Critical => 2,
            Self::High => 4,
            Self::Medium => 24,
            Self::Low => 48,
        }
    }

    /// Base priority score contribution before age/notional adjustments.
    pub fn base_priority_score(&self) -> i64 {
        match self {
            Self::Critical => 1000,
            Self::High => 500,
            Self::Medium => 100,
            Self::Low => 10,
        }
    }
}

/// Classifier-assigned explanation for why a break occurred.
#[derive(
    Debug, Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash, Deserialize, Serialize, Display,
)]
#[serde(rename_all = "snake_case")]
pub enum RootCauseCategory {
    LateBooking,
    BrokerFeedIssue,
    InternalBookingError,
    DataEntryError,
    RoundingDifference,
    PartialFill,
    Unknown,
}

/// Workflow status of a [`Break`].
#[derive(
    Debug, Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash, Default, Deserialize, Serialize, Display,
)]
#[serde(rename_all = "kebab-case")]
pub enum BreakStatus {
    #[default]
    Open,
    Assigned,
    InProgress,
    PendingResponse,
    Resolved,
    Escalated,
    Closed,
    /// Distinguishes a rule-fired closure from a manual one in reporting; treated identically
    /// to `Resolved` for the `resolved_at` invariant.
    AutoResolved,
}

impl BreakStatus {
    pub fn is_resolved(&self) -> bool {
        matches!(self, Self::Resolved | Self::Closed | Self::AutoResolved)
    }
}

/// A discrepancy involving one or two trades.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct Break {
    pub id: Option<BreakId>,
    pub break_type: BreakType,
    pub severity: Severity,
    pub trade_ref: RecordId,
    pub matched_trade_ref: Option<RecordId>,
    pub expected_value: Option<Decimal>,
    pub actual_value: Option<Decimal>,
    pub difference: Option<Decimal>,
    pub root_cause_category: Option<RootCauseCategory>,
    pub sla_hours: u32,
    pub priority_score: i64,
    pub auto_resolvable: bool,
    pub status: BreakStatus,
    pub created_at: DateTime<Utc>,
    pub resolved_at: Option<DateTime<Utc>>,
    pub resolution_notes: Option<String>,
}

impl Break {
    /// Construct a freshly-raised, unclassified break for a missing-side trade. Severity
    /// defaults to `High` per the matcher's validation-gate rejection; the classifier may
    /// later escalate it.
    pub fn new_missing(
        break_type: BreakType,
        trade_ref: RecordId,
        now: DateTime<Utc>,
    ) -> Self {
        debug_assert!(break_type.is_missing_side());
        Self {
            id: None,
            break_type,
            severity: Severity::High,
            trade_ref,
            matched_trade_ref: None,
            expected_value: None,
            actual_value: None,
            difference: None,
            root_cause_category: None,
            sla_hours: Severity::High.sla_hours(),
            priority_score: Severity::High.base_priority_score(),
            auto_resolvable: false,
            status: BreakStatus::Open,
            created_at: now,
            resolved_at: None,
            resolution_notes: None,
        }
    }

    /// Construct a freshly-raised break between two matched trades, pre-classification.
    pub fn new_mismatch(
        break_type: BreakType,
        trade_ref: RecordId,
        matched_trade_ref: RecordId,
        expected_value: Option<Decimal>,
        actual_value: Option<Decimal>,
        difference: Option<Decimal>,
        now: DateTime<Utc>,
    ) -> Self {
        debug_assert!(!break_type.is_missing_side());
        Self {
            id: None,
            break_type,
            severity: Severity::Medium,
            trade_ref,
            matched_trade_ref: Some(matched_trade_ref),
            expected_value,
            actual_value,
            difference,
            root_cause_category: None,
            sla_hours: Severity::Medium.sla_hours(),
            priority_score: Severity::Medium.base_priority_score(),
            auto_resolvable: false,
            status: BreakStatus::Open,
            created_at: now,
            resolved_at: None,
            resolution_notes: None,
        }
    }

    pub fn age(&self, now: DateTime<Utc>) -> chrono::Duration {
        now - self.created_at
    }
}
