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

//! # Recon-Match
//! Candidate generation, scoring, validation and greedy pairing between one trade date's
//! internal trades and its external counterparts.
//!
//! [`engine::MatchingEngine`] is the single entry point. It performs one pass over the
//! internal trades, deterministically, and never revisits a pairing once made.

pub mod config;
pub mod engine;
pub mod index;
pub mod scorer;

pub use config::MatchConfig;
pub use engine::{MatchOutput, MatchingEngine};
pub use scorer::{ExternalScorer, MatchMethod, ScoreComponents};
