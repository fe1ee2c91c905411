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

//! # Recon-Patterns
//! Clusters related open breaks and produces a summary + recommendation for each cluster.
//!
//! Operates entirely over in-memory collections — no data-frame or clustering-crate dependency
//! — since the break collection for one run is small enough for plain iterator map-reduces.

mod dbscan;
mod hash;

use chrono::{DateTime, Utc};
use recon_core::{Break, BreakType, RootCauseCategory, Severity, Trade};
use std::collections::HashMap;

/// Minimum number of open breaks required before clustering runs at all.
const MIN_BREAKS_FOR_DETECTION: usize = 5;
const EPSILON: f64 = 0.5;
const MIN_POINTS: usize = 3;
const HASH_MODULUS: u64 = 9_973; // a prime comfortably larger than any realistic distinct-value count

/// One break plus the trade it references, the minimal context pattern detection needs.
pub struct PatternInput<'a> {
    pub break_: &'a Break,
    pub subject: &'a Trade,
}

/// Summary of one cluster of related breaks.
#[derive(Debug, Clone, PartialEq)]
pub struct PatternSummary {
    pub common_counterparty: String,
    pub common_break_type: BreakType,
    pub common_root_cause: Option<RootCauseCategory>,
    pub member_count: usize,
    pub total_monetary_impact: rust_decimal::Decimal,
    pub first_occurrence: DateTime<Utc>,
    pub last_occurrence: DateTime<Utc>,
    pub severity: Severity,
    pub recommendation: String,
}

fn feature_vector(input: &PatternInput<'_>) -> [f64; 6] {
    [
        hash::stable_hash_mod(&input.subject.counterparty.to_uppercase(), HASH_MODULUS) as f64,
        hash::stable_hash_mod(&input.subject.instrument_id, HASH_MODULUS) as f64,
        hash::stable_hash_mod(&input.break_.break_type.to_string(), HASH_MODULUS) as f64,
        input.break_.priority_score as f64,
        input.subject.price.try_into().unwrap_or(0.0),
        input.subject.quantity.try_into().unwrap_or(0.0),
    ]
}

fn standard_normalize(vectors: &[[f64; 6]]) -> Vec<Vec<f64>> {
    let n = vectors.len() as f64;
    let dims = 6;
    let mut means = vec![0.0; dims];
    let mut std_devs = vec![0.0; dims];

    for vector in vectors {
        for (d, value) in vector.iter().enumerate() {
            means[d] += value / n;
        }
    }
    for vector in vectors {
        for (d, value) in vector.iter().enumerate() {
            std_devs[d] += (value - means[d]).powi(2) / n;
        }
    }
    for std_dev in &mut std_devs {
        *std_dev = std_dev.sqrt();
    }

    vectors
        .iter()
        .map(|vector| {
            vector
                .iter()
                .enumerate()
                .map(|(d, value)| {
                    if std_devs[d] == 0.0 {
                        0.0
                    } else {
                        (value - means[d]) / std_devs[d]
                    }
                })
                .collect()
        })
        .collect()
}

fn plurality<T: Eq + std::hash::Hash + Clone>(items: impl Iterator<Item = T>) -> Option<T> {
    let mut counts: HashMap<T, usize> = HashMap::new();
    for item in items {
        *counts.entry(item).or_insert(0) += 1;
    }
    counts.into_iter().max_by_key(|(_, count)| *count).map(|(item, _)| item)
}

fn recommendation_for(root_cause: Option<RootCauseCategory>) -> String {
    match root_cause {
        Some(RootCauseCategory::LateBooking) => {
            "Review the affected desk's end-of-day booking cutoff against the feed's timestamp."
        }
        Some(RootCauseCategory::BrokerFeedIssue) => {
            "Contact the counterparty to confirm their feed is reporting trades promptly."
        }
        Some(RootCauseCategory::InternalBookingError) => {
            "Audit the internal booking workflow for the affected instrument or desk."
        }
        Some(RootCauseCategory::DataEntryError) => {
            "Spot-check manual entry for the affected counterparty; consider a validation rule."
        }
        Some(RootCauseCategory::RoundingDifference) => {
            "Likely safe to tighten the price tolerance rather than investigate individually."
        }
        Some(RootCauseCategory::PartialFill) => {
            "Confirm whether partial fills are being reported as separate legs by this counterparty."
        }
        Some(RootCauseCategory::Unknown) | None => {
            "No fixed-cause recommendation available; route to manual investigation."
        }
    }
    .to_string()
}

/// Clusters `inputs` and emits one [`PatternSummary`] per non-noise cluster of at least three
/// members. Returns an empty vector when fewer than five breaks are supplied.
pub fn detect_patterns(inputs: &[PatternInput<'_>]) -> Vec<PatternSummary> {
    if inputs.len() < MIN_BREAKS_FOR_DETECTION {
        return Vec::new();
    }

    let raw_vectors: Vec<[f64; 6]> = inputs.iter().map(feature_vector).collect();
    let normalized = standard_normalize(&raw_vectors);
    let labels = dbscan::cluster(&normalized, EPSILON, MIN_POINTS);

    let mut members_by_cluster: HashMap<usize, Vec<usize>> = HashMap::new();
    for (index, label) in labels.iter().enumerate() {
        if let dbscan::Label::Cluster(id) = label {
            members_by_cluster.entry(*id).or_default().push(index);
        }
    }

    let mut summaries: Vec<PatternSummary> = members_by_cluster
        .into_values()
        .filter(|members| members.len() >= MIN_POINTS)
        .map(|members| summarize(&members, inputs))
        .collect();

    summaries.sort_by(|a, b| b.member_count.cmp(&a.member_count));
    summaries
}

fn summarize(members: &[usize], inputs: &[PatternInput<'_>]) -> PatternSummary {
    let common_counterparty = plurality(
        members
            .iter()
            .map(|&i| inputs[i].subject.counterparty.to_uppercase()),
    )
    .unwrap_or_default();

    let common_break_type = plurality(members.iter().map(|&i| inputs[i].break_.break_type))
        .expect("at least one member");

    let common_root_cause = plurality(members.iter().map(|&i| inputs[i].break_.root_cause_category));

    let total_monetary_impact = members
        .iter()
        .map(|&i| {
            inputs[i]
                .break_
                .difference
                .map(|d| d.abs() * inputs[i].subject.quantity.abs())
                .unwrap_or_default()
        })
        .sum();

    let first_occurrence = members
        .iter()
        .map(|&i| inputs[i].break_.created_at)
        .min()
        .expect("at least one member");
    let last_occurrence = members
        .iter()
        .map(|&i| inputs[i].break_.created_at)
        .max()
        .expect("at least one member");

    let severity = if members.len() > 10 { Severity::High } else { Severity::Medium };

    PatternSummary {
        common_counterparty,
        common_break_type,
        common_root_cause,
        member_count: members.len(),
        total_monetary_impact,
        first_occurrence,
        last_occurrence,
        severity,
        recommendation: recommendation_for(common_root_cause),
    }
}
