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

//! # Recon-Classify
//! Assigns severity, root cause, an auto-resolvable flag, an SLA budget and a priority score
//! to a raw [`Break`] produced by the matching engine.
//!
//! Classification is a pure function of the break plus the trade(s) it references — it never
//! touches storage or the network.

use chrono::{DateTime, Timelike, Utc};
use recon_core::{Break, BreakType, RootCauseCategory, Severity, Trade};
use rust_decimal::Decimal;

/// Classifies `break_` in place using `subject` (the trade named by `trade_ref`) and
/// `counterpart` (the trade named by `matched_trade_ref`, when present).
///
/// Late bookings are detected against `subject.trade_date` converted to UTC; the canonical
/// trade record carries no exchange-calendar reference that would support a venue-local
/// cutoff instead.
pub fn classify(break_: &mut Break, subject: &Trade, counterpart: Option<&Trade>, now: DateTime<Utc>) {
    let severity = severity_of(break_.break_type, break_.difference, subject, counterpart);
    let root_cause = root_cause_of(break_.break_type, subject, break_.difference);
    let auto_resolvable = is_auto_resolvable(severity, break_.break_type, root_cause, break_.difference);

    break_.severity = severity;
    break_.root_cause_category = Some(root_cause);
    break_.auto_resolvable = auto_resolvable;
    break_.sla_hours = severity.sla_hours();
    break_.priority_score = priority_score(severity, break_.age(now), subject.notional());
}

fn severity_of(
    break_type: BreakType,
    difference: Option<Decimal>,
    subject: &Trade,
    counterpart: Option<&Trade>,
) -> Severity {
    if break_type.is_missing_side() {
        return Severity::Critical;
    }
    if break_type == BreakType::CurrencyMismatch {
        return Severity::Critical;
    }
    if matches!(break_type, BreakType::PriceMismatch | BreakType::QuantityMismatch) {
        return severity_from_impact(break_type, difference, subject, counterpart);
    }
    match break_type {
        BreakType::SettlementDateMismatch => Severity::Medium,
        BreakType::CounterpartyMismatch | BreakType::AccountMismatch => Severity::High,
        _ => Severity::Low,
    }
}

/// Impact = `|difference| * counterpart quantity` for a price mismatch, or
/// `|difference| * counterpart price` for a quantity mismatch — the unit that turns a per-unit
/// difference into a monetary amount.
fn severity_from_impact(
    break_type: BreakType,
    difference: Option<Decimal>,
    subject: &Trade,
    counterpart: Option<&Trade>,
) -> Severity {
    let Some(difference) = difference else {
        return Severity::Low;
    };
    let other_side = counterpart.unwrap_or(subject);
    let impact = match break_type {
        BreakType::PriceMismatch => difference.abs() * other_side.quantity.abs(),
        BreakType::QuantityMismatch => difference.abs() * other_side.price.abs(),
        _ => difference.abs(),
    };

    if impact > Decimal::from(100_000) {
        Severity::Critical
    } else if impact > Decimal::from(10_000) {
        Severity::High
    } else if impact > Decimal::from(1_000) {
        Severity::Medium
    } else {
        Severity::Low
    }
}

fn root_cause_of(break_type: BreakType, subject: &Trade, difference: Option<Decimal>) -> RootCauseCategory {
    match break_type {
        BreakType::MissingExternalTrade => {
            if subject.trade_date.hour() >= 16 {
                RootCauseCategory::LateBooking
            } else {
                RootCauseCategory::BrokerFeedIssue
            }
        }
        BreakType::MissingInternalTrade => RootCauseCategory::InternalBookingError,
        BreakType::PriceMismatch => {
            let percent = difference
                .map(|d| {
                    if subject.price.is_zero() {
                        f64::INFINITY
                    } else {
                        (d.abs() / subject.price.abs()).try_into().unwrap_or(f64::INFINITY)
                    }
                })
                .unwrap_or(0.0);
            if percent > 0.1 {
                RootCauseCategory::DataEntryError
            } else {
                RootCauseCategory::RoundingDifference
            }
        }
        BreakType::QuantityMismatch => RootCauseCategory::PartialFill,
        _ => RootCauseCategory::Unknown,
    }
}

fn is_auto_resolvable(
    severity: Severity,
    break_type: BreakType,
    root_cause: RootCauseCategory,
    difference: Option<Decimal>,
) -> bool {
    if !matches!(severity, Severity::Low | Severity::Medium) {
        return false;
    }
    let small_difference = difference.map(|d| d.abs() < Decimal::new(1, 2)).unwrap_or(false);
    break_type == BreakType::SettlementDateMismatch
        || root_cause == RootCauseCategory::RoundingDifference
        || small_difference
}

fn priority_score(severity: Severity, age: chrono::Duration, notional: Decimal) -> i64 {
    let age_hours = age.num_seconds().max(0) / 3600;
    let notional_bonus = if notional > Decimal::from(1_000_000) {
        200
    } else if notional > Decimal::from(100_000) {
        100
    } else {
        0
    };
    severity.base_priority_score() + 10 * age_hours + notional_bonus
}

#[cfg(test)]
mod tests {
    use super::*;
    use recon_core::{BreakStatus, RecordId, TradeId, TradeSource, TradeStatus};
    use rust_decimal_macros::dec;
    use smol_str::SmolStr;
    use std::collections::BTreeMap;

    fn trade(price: Decimal, quantity: Decimal, trade_date: DateTime<Utc>) -> Trade {
        Trade {
            id: Some(RecordId::random()),
            trade_id: TradeId::from("T1"),
            source: TradeSource::Internal,
            trade_date,
            settlement_date: trade_date.date_naive(),
            instrument_id: SmolStr::new("ABC"),
            instrument_name: None,
            quantity,
            price,
            currency: SmolStr::new("USD"),
            counterparty: "JPM".to_string(),
            account: None,
            status: TradeStatus::Matched,
            matched_trade_id: None,
            raw_data: BTreeMap::new(),
        }
    }

    fn mismatch_break(break_type: BreakType, difference: Decimal) -> Break {
        Break {
            id: None,
            break_type,
            severity: Severity::Low,
            trade_ref: RecordId::random(),
            matched_trade_ref: Some(RecordId::random()),
            expected_value: None,
            actual_value: None,
            difference: Some(difference),
            root_cause_category: None,
            sla_hours: 0,
            priority_score: 0,
            auto_resolvable: false,
            status: BreakStatus::Open,
            created_at: Utc::now(),
            resolved_at: None,
            resolution_notes: None,
        }
    }

    #[test]
    fn missing_side_is_always_critical() {
        let now = Utc::now();
        let mut b = mismatch_break(BreakType::MissingExternalTrade, Decimal::ZERO);
        let subject = trade(dec!(10), dec!(100), now);
        classify(&mut b, &subject, None, now);
        assert_eq!(b.severity, Severity::Critical);
    }

    #[test]
    fn large_price_impact_is_critical() {
        let now = Utc::now();
        let mut b = mismatch_break(BreakType::PriceMismatch, dec!(2000));
        let subject = trade(dec!(10), dec!(1000), now);
        classify(&mut b, &subject, None, now);
        assert_eq!(b.severity, Severity::Critical);
    }

    #[test]
    fn tiny_price_impact_is_low_and_auto_resolvable() {
        let now = Utc::now();
        let mut b = mismatch_break(BreakType::PriceMismatch, dec!(0.001));
        let subject = trade(dec!(10), dec!(100), now);
        classify(&mut b, &subject, None, now);
        assert_eq!(b.severity, Severity::Low);
        assert_eq!(b.root_cause_category, Some(RootCauseCategory::RoundingDifference));
        assert!(b.auto_resolvable);
    }

    #[test]
    fn late_booking_after_four_pm_utc() {
        let now = Utc::now();
        let late = now.date_naive().and_hms_opt(16, 30, 0).unwrap().and_utc();
        let mut b = mismatch_break(BreakType::MissingExternalTrade, Decimal::ZERO);
        let subject = trade(dec!(10), dec!(100), late);
        classify(&mut b, &subject, None, now);
        assert_eq!(b.root_cause_category, Some(RootCauseCategory::LateBooking));
    }

    #[test]
    fn settlement_date_mismatch_is_auto_resolvable_regardless_of_difference() {
        let now = Utc::now();
        let mut b = mismatch_break(BreakType::SettlementDateMismatch, Decimal::ZERO);
        b.difference = None;
        let subject = trade(dec!(10), dec!(100), now);
        classify(&mut b, &subject, None, now);
        assert_eq!(b.severity, Severity::Medium);
        assert!(b.auto_resolvable);
    }

    #[test]
    fn priority_score_adds_age_and_notional_bonus() {
        let created = Utc::now() - chrono::Duration::hours(5);
        let mut b = mismatch_break(BreakType::QuantityMismatch, dec!(1));
        b.created_at = created;
        let subject = trade(dec!(100), dec!(20_000), Utc::now());
        classify(&mut b, &subject, None, Utc::now());
        // severity low (impact = 1 * 100 = 100) -> base 10, + 10*5 age, + notional bonus
        // notional = 100 * 20000 = 2,000,000 -> bonus 200
        assert_eq!(b.priority_score, 10 + 50 + 200);
    }
}
