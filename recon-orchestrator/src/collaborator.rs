use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use recon_core::{Break, BreakId, ReconError};
use std::sync::Mutex;
use tracing::{info, warn};
use uuid::Uuid;

/// Workflow status of a [`Case`], independent of the [`recon_core::BreakStatus`] of the break it
/// tracks.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum CaseStatus {
    Open,
    Escalated,
    Resolved,
}

/// One unit of work handed to a human or downstream system for an unresolved break.
#[derive(Debug, Clone, PartialEq)]
pub struct Case {
    pub id: Uuid,
    pub break_id: Option<BreakId>,
    pub status: CaseStatus,
    pub sla_deadline: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
}

/// External workflow/notification system consumed at the end of a run for every break the
/// auto-resolver left unresolved. Implementations own notification delivery; this trait only
/// describes case lifecycle.
#[async_trait]
pub trait WorkflowCollaborator: Send + Sync {
    async fn create_case(&self, break_: &Break) -> Result<Case, ReconError>;
    async fn escalate(&self, case_id: Uuid, reason: &str, to: &str) -> Result<(), ReconError>;
    async fn resolve(&self, case_id: Uuid, resolution: &str, user: &str) -> Result<(), ReconError>;
    async fn check_sla_breaches(&self) -> Result<Vec<Case>, ReconError>;
}

/// Reference implementation that logs every lifecycle transition via `tracing` and never
/// attempts delivery. Exists so the orchestrator and its tests do not depend on an unimplemented
/// trait object; an HTTP- or email-backed collaborator is a separate concern.
#[derive(Debug, Default)]
pub struct InMemoryCollaborator {
    cases: Mutex<Vec<Case>>,
}

impl InMemoryCollaborator {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl WorkflowCollaborator for InMemoryCollaborator {
    async fn create_case(&self, break_: &Break) -> Result<Case, ReconError> {
        let case = Case {
            id: Uuid::new_v4(),
            break_id: break_.id,
            status: CaseStatus::Open,
            sla_deadline: break_.created_at + Duration::hours(i64::from(break_.sla_hours)),
            created_at: break_.created_at,
        };
        info!(case_id = %case.id, break_id = ?break_.id, severity = %break_.severity, "case created");
        self.cases.lock().expect("collaborator mutex poisoned").push(case.clone());
        Ok(case)
    }

    async fn escalate(&self, case_id: Uuid, reason: &str, to: &str) -> Result<(), ReconError> {
        let mut cases = self.cases.lock().expect("collaborator mutex poisoned");
        let case = cases
            .iter_mut()
            .find(|c| c.id == case_id)
            .ok_or_else(|| ReconError::Persistence(format!("no case with id {case_id}")))?;
        case.status = CaseStatus::Escalated;
        warn!(%case_id, reason, to, "case escalated");
        Ok(())
    }

    async fn resolve(&self, case_id: Uuid, resolution: &str, user: &str) -> Result<(), ReconError> {
        let mut cases = self.cases.lock().expect("collaborator mutex poisoned");
        let case = cases
            .iter_mut()
            .find(|c| c.id == case_id)
            .ok_or_else(|| ReconError::Persistence(format!("no case with id {case_id}")))?;
        case.status = CaseStatus::Resolved;
        info!(%case_id, resolution, user, "case resolved");
        Ok(())
    }

    async fn check_sla_breaches(&self) -> Result<Vec<Case>, ReconError> {
        let now = Utc::now();
        let cases = self.cases.lock().expect("collaborator mutex poisoned");
        let breached: Vec<Case> = cases
            .iter()
            .filter(|c| c.status != CaseStatus::Resolved && c.sla_deadline < now)
            .cloned()
            .collect();
        if !breached.is_empty() {
            warn!(count = breached.len(), "cases past SLA deadline");
        }
        Ok(breached)
    }
}
