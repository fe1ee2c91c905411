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

//! # Recon-Resolve
//! Declarative auto-resolution of classified breaks against an ordered list of tagged-variant
//! rules. Rules are data, not closures over external state, so they serialize and review like
//! any other configuration.

mod alias;
mod rule;

pub use alias::AliasTable;
pub use rule::{Rule, RuleAction, RuleKind};

use chrono::{DateTime, Utc};
use recon_core::{Break, BreakId, BreakStatus, Trade};
use rust_decimal_macros::dec;
use tracing::warn;

/// One break plus the trade(s) it references, borrowed for the duration of one resolution
/// attempt.
pub struct ResolutionInput<'a> {
    pub break_: &'a mut Break,
    pub subject: &'a Trade,
    pub counterpart: Option<&'a Trade>,
}

/// Record of one rule firing, appended to a run's resolutions list.
#[derive(Debug, Clone, PartialEq)]
pub struct Resolution {
    pub break_id: Option<BreakId>,
    pub rule_name: String,
    pub action: RuleAction,
    pub reason: String,
    pub timestamp: DateTime<Utc>,
}

/// Outcome of one [`AutoResolver::batch_auto_resolve`] call.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BatchResult {
    pub total: usize,
    pub auto_resolved: usize,
    pub failed: usize,
    pub resolutions: Vec<Resolution>,
}

/// Ordered rule list plus the alias table rule 4 consults. Read-only for the duration of a run.
#[derive(Debug, Clone)]
pub struct AutoResolver {
    rules: Vec<Rule>,
    aliases: AliasTable,
}

impl AutoResolver {
    pub fn new(rules: Vec<Rule>, aliases: AliasTable) -> Self {
        Self { rules, aliases }
    }

    /// The four rules every deployment starts with.
    pub fn with_builtin_rules(aliases: AliasTable) -> Self {
        Self::new(
            vec![
                Rule {
                    name: "settlement_date_within_one_day".to_string(),
                    kind: RuleKind::SettlementDateWithinDays(1),
                    action: RuleAction::AcceptExternal,
                    reason: "settlement dates differ by at most one day".to_string(),
                },
                Rule {
                    name: "price_difference_at_most_one_cent".to_string(),
                    kind: RuleKind::PriceDifferenceAtMost(dec!(0.01)),
                    action: RuleAction::AcceptExternal,
                    reason: "price difference is within one cent".to_string(),
                },
                Rule {
                    name: "quantity_difference_below_one_cent".to_string(),
                    kind: RuleKind::QuantityDifferenceBelow(dec!(0.01)),
                    action: RuleAction::AcceptInternal,
                    reason: "quantity difference is negligible".to_string(),
                },
                Rule {
                    name: "counterparty_known_alias".to_string(),
                    kind: RuleKind::CounterpartyAlias,
                    action: RuleAction::UpdateMapping,
                    reason: "counterparty names are known aliases of each other".to_string(),
                },
            ],
            aliases,
        )
    }

    /// Evaluates rules in order against one break and fires the first whose predicate returns
    /// `true`. A predicate that errors is logged and treated as `false`; evaluation continues
    /// with the next rule.
    pub fn resolve_one(
        &self,
        input: &mut ResolutionInput<'_>,
        now: DateTime<Utc>,
    ) -> Option<Resolution> {
        for rule in &self.rules {
            let outcome = rule::evaluate(
                &rule.kind,
                input.break_,
                input.subject,
                input.counterpart,
                &self.aliases,
            );
            match outcome {
                Ok(true) => {
                    input.break_.status = BreakStatus::AutoResolved;
                    input.break_.resolved_at = Some(now);
                    input.break_.resolution_notes = Some(rule.reason.clone());
                    return Some(Resolution {
                        break_id: input.break_.id,
                        rule_name: rule.name.clone(),
                        action: rule.action,
                        reason: rule.reason.clone(),
                        timestamp: now,
                    });
                }
                Ok(false) => continue,
                Err(error) => {
                    warn!(rule = %rule.name, %error, "rule predicate raised; treating as false");
                    continue;
                }
            }
        }
        None
    }

    /// Evaluates every break in `inputs` whose `auto_resolvable` flag is set and whose status is
    /// not already resolved. Calling this twice on the same inputs produces no new fires the
    /// second time, since a resolved break's status excludes it from further evaluation.
    pub fn batch_auto_resolve(
        &self,
        inputs: &mut [ResolutionInput<'_>],
        now: DateTime<Utc>,
    ) -> BatchResult {
        let mut result = BatchResult::default();

        for input in inputs.iter_mut() {
            if !input.break_.auto_resolvable || input.break_.status.is_resolved() {
                continue;
            }
            result.total += 1;
            match self.resolve_one(input, now) {
                Some(resolution) => {
                    result.auto_resolved += 1;
                    result.resolutions.push(resolution);
                }
                None => result.failed += 1,
            }
        }

        result
    }
}
