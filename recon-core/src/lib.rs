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
#![allow(clippy::too_many_arguments)]

//! # Recon-Core
//! Canonical data structures shared by every stage of the reconciliation pipeline: the
//! [`Trade`](trade::Trade) normalised from a feed, the [`Break`](break_::Break) raised when two
//! trades disagree, and the [`ReconciliationRun`](run::ReconciliationRun) record that tracks one
//! day's execution of the pipeline.
//!
//! Feed adapters are the only code permitted to see raw per-source payloads; everything
//! downstream of normalisation operates exclusively on the types in this crate.

/// [`Trade`](trade::Trade) and related identifiers, sources and statuses.
pub mod trade;

/// [`Break`](break_::Break) and its classification fields.
pub mod break_;

/// [`ReconciliationRun`](run::ReconciliationRun), the per-day execution record.
pub mod run;

/// Error taxonomy shared across the pipeline.
pub mod error;

pub use break_::{Break, BreakId, BreakStatus, BreakType, RootCauseCategory, Severity};
pub use error::ReconError;
pub use run::{ReconciliationRun, RunId, RunStatus};
pub use trade::{RecordId, Trade, TradeId, TradeSource, TradeStatus};
