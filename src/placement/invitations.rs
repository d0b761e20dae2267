//! Company-initiated entry path. Shares the slot finder with the application
//! pipeline but is capped by the softer additive headroom, checked at invite
//! time only: acceptance is deliberately not re-gated by the hard job quota.

use tracing::info;

use super::domain::{
    Application, ApplicationSource, ApplicationStatus, CompanyId, Interview, InterviewStatus,
    Invitation, InvitationId, InvitationStatus, JobId, StudentId,
};
use super::quota::EntryPath;
use super::repository::{InterviewSummary, Notification, NotificationKind, Notifier};
use super::service::{now, PlacementError, PlacementService};

impl<N> PlacementService<N>
where
    N: Notifier + 'static,
{
    /// Invite a student to interview for a job. No token is consumed on
    /// either side.
    pub fn invite_student(
        &self,
        company_id: &CompanyId,
        student_id: &StudentId,
        job_id: &JobId,
    ) -> Result<InvitationId, PlacementError> {
        self.store().read(|state| {
            let job = state
                .job(job_id)
                .ok_or_else(|| PlacementError::UnknownJob(job_id.clone()))?;
            if &job.company_id != company_id {
                return Err(PlacementError::Unauthorized);
            }
            if !job.is_active {
                return Err(PlacementError::JobInactive(job_id.clone()));
            }
            state
                .student(student_id)
                .ok_or_else(|| PlacementError::UnknownStudent(student_id.clone()))?;
            Ok(())
        })?;

        let company_lock = self.store().company_lock(company_id);
        let _company_guard = company_lock.lock();

        let job_title = self.store().read(|state| {
            let job = state
                .job(job_id)
                .ok_or_else(|| PlacementError::UnknownJob(job_id.clone()))?;
            if !job.is_active {
                return Err(PlacementError::JobInactive(job_id.clone()));
            }
            if state.application_for_pair(student_id, job_id).is_some() {
                return Err(PlacementError::AlreadyApplied {
                    student: student_id.clone(),
                    job: job_id.clone(),
                });
            }
            if state.invitation_for_pair(student_id, job_id).is_some() {
                return Err(PlacementError::AlreadyInvited {
                    student: student_id.clone(),
                    job: job_id.clone(),
                });
            }
            EntryPath::Invitation {
                headroom: self.invitation_headroom(),
            }
            .check_admission(state, job)?;
            Ok(job.title.clone())
        })?;

        let invitation_id = self.store().next_invitation_id();
        let invitation = Invitation {
            id: invitation_id.clone(),
            company_id: company_id.clone(),
            student_id: student_id.clone(),
            job_id: job_id.clone(),
            status: InvitationStatus::Pending,
            message: "We would like to meet you.".to_string(),
            created_at: now(),
        };
        self.store().apply(|state| {
            state.invitations.insert(invitation.id.clone(), invitation);
        });

        info!(%company_id, %student_id, %job_id, invitation = %invitation_id, "student invited");
        self.send(Notification {
            user_id: student_id.0.clone(),
            kind: NotificationKind::Invitation,
            title: "New invitation".to_string(),
            message: format!("A company invites you to interview for \"{job_title}\"."),
            related_id: Some(invitation_id.0.clone()),
        });

        Ok(invitation_id)
    }

    /// Accept a pending invitation: the application is created directly in
    /// accepted form, skipping PENDING and the token ledger entirely, and the
    /// interview is booked in the same commit.
    pub fn accept_invitation(
        &self,
        invitation_id: &InvitationId,
        student_id: &StudentId,
    ) -> Result<InterviewSummary, PlacementError> {
        let company_id = self.store().read(|state| {
            let invitation = state
                .invitation(invitation_id)
                .ok_or_else(|| PlacementError::UnknownInvitation(invitation_id.clone()))?;
            if &invitation.student_id != student_id {
                return Err(PlacementError::Unauthorized);
            }
            Ok(invitation.company_id.clone())
        })?;

        let company_lock = self.store().company_lock(&company_id);
        let _company_guard = company_lock.lock();
        let student_lock = self.store().student_lock(student_id);
        let _student_guard = student_lock.lock();

        let (job_id, job_title, room, slot) = self.store().read(|state| {
            let invitation = state
                .invitation(invitation_id)
                .ok_or_else(|| PlacementError::UnknownInvitation(invitation_id.clone()))?;
            if invitation.status != InvitationStatus::Pending {
                return Err(PlacementError::AlreadyProcessed);
            }
            let job = state
                .job(&invitation.job_id)
                .ok_or_else(|| PlacementError::UnknownJob(invitation.job_id.clone()))?;
            let company = state
                .company(&company_id)
                .ok_or_else(|| PlacementError::UnknownCompany(company_id.clone()))?;

            let window = self.finder().window();
            let slot = self.finder().find(
                &state.company_busy(&company_id, window),
                &state.student_busy(student_id, window),
            )?;
            Ok((
                job.id.clone(),
                job.title.clone(),
                super::calendar::SlotFinder::room_for(company),
                slot,
            ))
        })?;

        let application_id = self.store().next_application_id();
        let interview_id = self.store().next_interview_id();
        let application = Application {
            id: application_id.clone(),
            job_id,
            student_id: student_id.clone(),
            status: ApplicationStatus::Accepted,
            source: ApplicationSource::Invitation,
            created_at: now(),
        };
        let interview = Interview {
            id: interview_id.clone(),
            company_id: company_id.clone(),
            student_id: student_id.clone(),
            application_id: application_id.clone(),
            title: format!("Interview: {job_title} (via invitation)"),
            date_time: slot,
            room: room.clone(),
            status: InterviewStatus::Accepted,
            source: ApplicationSource::Invitation,
        };
        self.store().apply(|state| {
            state.applications.insert(application.id.clone(), application);
            state.interviews.insert(interview.id.clone(), interview);
            if let Some(invitation) = state.invitations.get_mut(invitation_id) {
                invitation.status = InvitationStatus::Accepted;
            }
        });

        info!(invitation = %invitation_id, %student_id, slot = %slot, "invitation accepted");
        self.send(Notification {
            user_id: company_id.0.clone(),
            kind: NotificationKind::Info,
            title: "Invitation accepted".to_string(),
            message: "The candidate accepted your invitation. The interview is scheduled."
                .to_string(),
            related_id: Some(interview_id.0.clone()),
        });

        Ok(InterviewSummary {
            id: interview_id,
            date_time: slot,
            room,
        })
    }

    /// Decline a pending invitation. No ledger effect.
    pub fn reject_invitation(
        &self,
        invitation_id: &InvitationId,
        student_id: &StudentId,
    ) -> Result<(), PlacementError> {
        let company_id = self.store().read(|state| {
            let invitation = state
                .invitation(invitation_id)
                .ok_or_else(|| PlacementError::UnknownInvitation(invitation_id.clone()))?;
            if &invitation.student_id != student_id {
                return Err(PlacementError::Unauthorized);
            }
            Ok(invitation.company_id.clone())
        })?;

        let company_lock = self.store().company_lock(&company_id);
        let _company_guard = company_lock.lock();

        self.store().read(|state| {
            let invitation = state
                .invitation(invitation_id)
                .ok_or_else(|| PlacementError::UnknownInvitation(invitation_id.clone()))?;
            if invitation.status != InvitationStatus::Pending {
                return Err(PlacementError::AlreadyProcessed);
            }
            Ok(())
        })?;
        self.store().apply(|state| {
            if let Some(invitation) = state.invitations.get_mut(invitation_id) {
                invitation.status = InvitationStatus::Rejected;
            }
        });

        info!(invitation = %invitation_id, %student_id, "invitation rejected");
        Ok(())
    }

    /// Current snapshot of one invitation row.
    pub fn invitation(&self, id: &InvitationId) -> Result<Invitation, PlacementError> {
        self.store().read(|state| {
            state
                .invitation(id)
                .cloned()
                .ok_or_else(|| PlacementError::UnknownInvitation(id.clone()))
        })
    }
}
