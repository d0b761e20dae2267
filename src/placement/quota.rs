//! Capacity gates for both entry paths. Counts are aggregate scans over
//! current state; callers must hold the owning company's lock across the
//! check and the mutation it guards.

use super::domain::{ApplicationStatus, Company, CompanyId, InvitationStatus, Job, JobId};
use super::store::PlacementState;

/// Raised when a capacity check fails inside the lock scope. The enclosing
/// operation rolls back with no partial effect.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CapacityError {
    #[error("job {job} has reached its application quota of {quota}")]
    JobQuotaFull { job: JobId, quota: u32 },
    #[error("company {company} has reached its interview quota of {quota}")]
    CompanyQuotaReached { company: CompanyId, quota: u32 },
    #[error("job {job} has reached its invitation cap of {cap}")]
    InvitationCapFull { job: JobId, cap: u32 },
}

/// The two ways into the pipeline, each carrying its own admission gate:
/// direct applications are hard-capped by the job quota, invitations by the
/// softer additive headroom checked at invite time only.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryPath {
    Application,
    Invitation { headroom: u32 },
}

impl EntryPath {
    pub(crate) fn check_admission(
        self,
        state: &PlacementState,
        job: &Job,
    ) -> Result<(), CapacityError> {
        match self {
            EntryPath::Application => {
                if QuotaGuard::job_applications(state, &job.id) >= job.quota {
                    return Err(CapacityError::JobQuotaFull {
                        job: job.id.clone(),
                        quota: job.quota,
                    });
                }
                Ok(())
            }
            EntryPath::Invitation { headroom } => {
                let occupied = QuotaGuard::pending_invitations(state, &job.id)
                    + QuotaGuard::accepted_applications(state, &job.id);
                let cap = job.quota + headroom;
                if occupied >= cap {
                    return Err(CapacityError::InvitationCapFull {
                        job: job.id.clone(),
                        cap,
                    });
                }
                Ok(())
            }
        }
    }
}

/// Recomputed quota arithmetic over the shared tables.
pub struct QuotaGuard;

impl QuotaGuard {
    /// Interviews currently holding a unit of the company's global quota.
    pub fn accepted_interviews(state: &PlacementState, company_id: &CompanyId) -> u32 {
        state
            .interviews
            .values()
            .filter(|interview| {
                &interview.company_id == company_id && interview.status.occupies_quota()
            })
            .count() as u32
    }

    /// All application rows for the job, any status; the apply-time gate.
    pub fn job_applications(state: &PlacementState, job_id: &JobId) -> u32 {
        state
            .applications
            .values()
            .filter(|app| &app.job_id == job_id)
            .count() as u32
    }

    /// Applications for the job that have been accepted.
    pub fn accepted_applications(state: &PlacementState, job_id: &JobId) -> u32 {
        state
            .applications
            .values()
            .filter(|app| &app.job_id == job_id && app.status == ApplicationStatus::Accepted)
            .count() as u32
    }

    /// Invitations for the job still awaiting an answer.
    pub fn pending_invitations(state: &PlacementState, job_id: &JobId) -> u32 {
        state
            .invitations
            .values()
            .filter(|invitation| {
                &invitation.job_id == job_id && invitation.status == InvitationStatus::Pending
            })
            .count() as u32
    }

    /// Gate an acceptance against the company quota. Returns the recomputed
    /// count so the caller can detect the exact saturation point for the
    /// cascade.
    pub(crate) fn check_company_quota(
        state: &PlacementState,
        company: &Company,
    ) -> Result<u32, CapacityError> {
        let accepted = Self::accepted_interviews(state, &company.id);
        if accepted >= company.global_quota {
            return Err(CapacityError::CompanyQuotaReached {
                company: company.id.clone(),
                quota: company.global_quota,
            });
        }
        Ok(accepted)
    }
}
