use crate::error::ReconError;
use chrono::{DateTime, NaiveDate, Utc};
use derive_more::Display;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use smol_str::SmolStr;
use std::collections::BTreeMap;

/// Internal, storage-assigned surrogate identifier for a [`Trade`], [`Break`](crate::Break) or
/// [`ReconciliationRun`](crate::run::ReconciliationRun).
///
/// Distinct from [`TradeId`], which is the source-assigned identifier and is *not* globally
/// unique across [`TradeSource`]s.
#[derive(
    Debug, Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash, Deserialize, Serialize, Display,
)]
pub struct RecordId(pub uuid::Uuid);

impl RecordId {
    pub fn random() -> Self {
        Self(uuid::Uuid::new_v4())
    }
}

/// Source-assigned identifier for a [`Trade`].
///
/// Not globally unique: the same `TradeId` string may independently be assigned by the
/// internal platform and by a counterparty for unrelated trades.
#[derive(
    Debug, Clone, Eq, PartialEq, Ord, PartialOrd, Hash, Deserialize, Serialize, Display,
)]
pub struct TradeId<T = SmolStr>(pub T);

impl<T> TradeId<T> {
    pub fn new(id: T) -> Self {
        Self(id)
    }
}

impl From<&str> for TradeId {
    fn from(value: &str) -> Self {
        Self(SmolStr::new(value))
    }
}

impl From<String> for TradeId {
    fn from(value: String) -> Self {
        Self(SmolStr::new(value))
    }
}

/// Enumerated origin of a [`Trade`] record.
///
/// `Other` retains any source not known ahead of time (eg/ a custodian onboarded after this
/// enum was last extended) rather than rejecting the feed outright.
#[derive(
    Debug, Clone, Eq, PartialEq, Ord, PartialOrd, Hash, Deserialize, Serialize, Display,
)]
#[serde(rename_all = "snake_case")]
pub enum TradeSource {
    Internal,
    #[serde(rename = "broker_a")]
    BrokerA,
    #[serde(rename = "broker_b")]
    BrokerB,
    Custodian,
    Other(SmolStr),
}

impl TradeSource {
    /// Internal trades are the "book of record" side; every other source is external and is
    /// reconciled against it.
    pub fn is_internal(&self) -> bool {
        matches!(self, Self::Internal)
    }
}

/// Lifecycle status of a [`Trade`], assigned by the pipeline rather than supplied by a feed.
#[derive(
    Debug, Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash, Default, Deserialize, Serialize, Display,
)]
#[serde(rename_all = "snake_case")]
pub enum TradeStatus {
    #[default]
    Unmatched,
    Matched,
    Break,
    Investigating,
    Resolved,
}

/// One economic transaction as observed by one side (internal platform or external
/// counterparty/custodian).
///
/// Immutable except for `status` and `matched_trade_id`, both of which are only ever written
/// by the matching engine once a pairing decision has been made.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct Trade {
    /// Storage-assigned surrogate id. `None` until the trade has been persisted.
    pub id: Option<RecordId>,
    pub trade_id: TradeId,
    pub source: TradeSource,
    pub trade_date: DateTime<Utc>,
    pub settlement_date: NaiveDate,
    pub instrument_id: SmolStr,
    pub instrument_name: Option<String>,
    /// Signed: positive is buy, negative is sell.
    pub quantity: Decimal,
    pub price: Decimal,
    pub currency: SmolStr,
    pub counterparty: String,
    pub account: Option<SmolStr>,
    pub status: TradeStatus,
    pub matched_trade_id: Option<RecordId>,
    /// Opaque original payload, retained for audit. Only feed adapters interpret its shape.
    pub raw_data: BTreeMap<String, String>,
}

impl Trade {
    /// Notional value of the trade: `price * |quantity|`.
    pub fn notional(&self) -> Decimal {
        self.price * self.quantity.abs()
    }

    /// Validate the invariants from the data model: `price > 0`, `quantity != 0`, and
    /// `settlement_date >= trade_date`. The settlement-date check is advisory only — callers
    /// downgrade it to a warning rather than rejecting the row, per ingestion policy.
    pub fn validate(&self) -> Result<(), ReconError> {
        if self.price <= Decimal::ZERO {
            return Err(ReconError::Validation(format!(
                "trade {} has non-positive price {}",
                self.trade_id, self.price
            )));
        }
        if self.quantity.is_zero() {
            return Err(ReconError::Validation(format!(
                "trade {} has zero quantity",
                self.trade_id
            )));
        }
        Ok(())
    }

    /// `true` if `settlement_date` precedes `trade_date` — a violation that is only ever
    /// surfaced as a [`crate::error::ReconError::ParseWarning`], never rejected.
    pub fn has_settlement_before_trade(&self) -> bool {
        self.settlement_date < self.trade_date.date_naive()
    }

    /// Validates the cross-reference invariant: if `matched_trade_id` is set, `other` must be
    /// a different source than `self`.
    pub fn validate_match(&self, other: &Trade) -> Result<(), ReconError> {
        if self.source == other.source {
            return Err(ReconError::Validation(format!(
                "trade {} cannot be matched against trade {} from the same source {}",
                self.trade_id, other.trade_id, self.source
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn trade(source: TradeSource, price: Decimal, quantity: Decimal) -> Trade {
        Trade {
            id: None,
            trade_id: TradeId::from("T1"),
            source,
            trade_date: Utc::now(),
            settlement_date: Utc::now().date_naive(),
            instrument_id: SmolStr::new("ABC"),
            instrument_name: None,
            quantity,
            price,
            currency: SmolStr::new("USD"),
            counterparty: "JPM".to_string(),
            account: None,
            status: TradeStatus::Unmatched,
            matched_trade_id: None,
            raw_data: BTreeMap::new(),
        }
    }

    #[test]
    fn validate_rejects_non_positive_price() {
        let t = trade(TradeSource::Internal, dec!(0), dec!(100));
        assert!(t.validate().is_err());
    }

    #[test]
    fn validate_rejects_zero_quantity() {
        let t = trade(TradeSource::Internal, dec!(10), dec!(0));
        assert!(t.validate().is_err());
    }

    #[test]
    fn validate_accepts_well_formed_trade() {
        let t = trade(TradeSource::Internal, dec!(10), dec!(100));
        assert!(t.validate().is_ok());
    }

    #[test]
    fn validate_match_rejects_same_source() {
        let a = trade(TradeSource::Internal, dec!(10), dec!(100));
        let b = trade(TradeSource::Internal, dec!(10), dec!(100));
        assert!(a.validate_match(&b).is_err());
    }

    #[test]
    fn validate_match_accepts_different_source() {
        let a = trade(TradeSource::Internal, dec!(10), dec!(100));
        let b = trade(TradeSource::BrokerA, dec!(10), dec!(100));
        assert!(a.validate_match(&b).is_ok());
    }

    #[test]
    fn notional_uses_absolute_quantity() {
        let t = trade(TradeSource::Internal, dec!(10), dec!(-50));
        assert_eq!(t.notional(), dec!(500));
    }
}
