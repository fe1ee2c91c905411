use crate::alias::AliasTable;
use recon_core::{Break, BreakType, ReconError, Trade};
use rust_decimal::Decimal;

/// What an [`AutoResolver`](crate::AutoResolver) rule does once its predicate fires.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub enum RuleAction {
    AcceptExternal,
    AcceptInternal,
    UpdateMapping,
    Amend,
}

/// The predicate half of a rule, expressed as a tagged variant rather than a closure so rules
/// stay serializable and reviewable as plain data.
#[derive(Debug, Clone, PartialEq)]
pub enum RuleKind {
    SettlementDateWithinDays(i64),
    PriceDifferenceAtMost(Decimal),
    QuantityDifferenceBelow(Decimal),
    CounterpartyAlias,
}

#[derive(Debug, Clone)]
pub struct Rule {
    pub name: String,
    pub kind: RuleKind,
    pub action: RuleAction,
    pub reason: String,
}

/// Evaluates one rule's predicate against a break and the trade(s) it references.
pub(crate) fn evaluate(
    kind: &RuleKind,
    break_: &Break,
    subject: &Trade,
    counterpart: Option<&Trade>,
    aliases: &AliasTable,
) -> Result<bool, ReconError> {
    match kind {
        RuleKind::SettlementDateWithinDays(max_days) => {
            if break_.break_type != BreakType::SettlementDateMismatch {
                return Ok(false);
            }
            let counterpart = require_counterpart(break_, counterpart)?;
            let delta = (subject.settlement_date - counterpart.settlement_date)
                .num_days()
                .abs();
            Ok(delta <= *max_days)
        }
        RuleKind::PriceDifferenceAtMost(tolerance) => {
            if break_.break_type != BreakType::PriceMismatch {
                return Ok(false);
            }
            Ok(break_.difference.is_some_and(|d| d.abs() <= *tolerance))
        }
        RuleKind::QuantityDifferenceBelow(tolerance) => {
            if break_.break_type != BreakType::QuantityMismatch {
                return Ok(false);
            }
            Ok(break_.difference.is_some_and(|d| d.abs() < *tolerance))
        }
        RuleKind::CounterpartyAlias => {
            if break_.break_type != BreakType::CounterpartyMismatch {
                return Ok(false);
            }
            let counterpart = require_counterpart(break_, counterpart)?;
            Ok(aliases.are_aliases(&subject.counterparty, &counterpart.counterparty))
        }
    }
}

fn require_counterpart<'a>(
    break_: &Break,
    counterpart: Option<&'a Trade>,
) -> Result<&'a Trade, ReconError> {
    counterpart.ok_or_else(|| ReconError::RuleEvaluation {
        rule: break_.break_type.to_string(),
        message: "rule requires a matched counterpart trade, found none".to_string(),
    })
}
