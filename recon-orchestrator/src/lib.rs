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

//! # Recon-Orchestrator
//! Sequences one trading day's reconciliation run: ingest, persist, match, classify,
//! auto-resolve, hand off unresolved breaks, detect patterns, close the run.
//!
//! [`orchestrator::Orchestrator::run_daily_reconciliation`] is the single public operation.
//! Everything else in this crate exists to support that one call: the cooperative
//! [`cancellation::CancellationToken`] it observes between steps, the
//! [`collaborator::WorkflowCollaborator`] it hands unresolved breaks to, and the
//! [`config::OrchestratorConfig`] that bounds its ingestion concurrency.

pub mod cancellation;
pub mod collaborator;
pub mod config;
pub mod orchestrator;

pub use cancellation::CancellationToken;
pub use collaborator::{Case, CaseStatus, InMemoryCollaborator, WorkflowCollaborator};
pub use config::OrchestratorConfig;
pub use orchestrator::{Orchestrator, RunResult};
