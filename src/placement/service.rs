use std::sync::Arc;

use chrono::{NaiveDateTime, Utc};
use tracing::{info, warn};

use crate::config::{AppConfig, ConfigError};

use super::calendar::{ScheduleWindow, SlotError, SlotFinder};
use super::domain::{
    Application, ApplicationId, ApplicationSource, ApplicationStatus, Company, CompanyId, Decision,
    Interview, InterviewId, InterviewStatus, InvitationId, Job, JobId, Student, StudentId,
    TokenBalances,
};
use super::ledger::{self, LedgerError, LedgerMutation, LedgerReason, TokenLedgerEntry};
use super::quota::{CapacityError, EntryPath, QuotaGuard};
use super::repository::{
    ApplicationReceipt, DecisionOutcome, InterviewSummary, Notification, NotificationKind,
    Notifier, StoreError,
};
use super::store::MemoryStore;

/// Error raised by the placement service.
#[derive(Debug, thiserror::Error)]
pub enum PlacementError {
    #[error(transparent)]
    Ledger(#[from] LedgerError),
    #[error(transparent)]
    Capacity(#[from] CapacityError),
    #[error(transparent)]
    Slot(#[from] SlotError),
    #[error(transparent)]
    Store(#[from] StoreError),
    #[error("unknown company {0}")]
    UnknownCompany(CompanyId),
    #[error("unknown student {0}")]
    UnknownStudent(StudentId),
    #[error("unknown job {0}")]
    UnknownJob(JobId),
    #[error("unknown application {0}")]
    UnknownApplication(ApplicationId),
    #[error("unknown interview {0}")]
    UnknownInterview(InterviewId),
    #[error("unknown invitation {0}")]
    UnknownInvitation(InvitationId),
    #[error("job {0} is not accepting applications")]
    JobInactive(JobId),
    #[error("student {student} already has an application or invitation for job {job}")]
    Duplicate { student: StudentId, job: JobId },
    #[error("student {student} has already applied to job {job}")]
    AlreadyApplied { student: StudentId, job: JobId },
    #[error("student {student} has already been invited to job {job}")]
    AlreadyInvited { student: StudentId, job: JobId },
    #[error("caller does not own the targeted record")]
    Unauthorized,
    #[error("the record was already processed")]
    AlreadyProcessed,
    #[error("interview cannot move from {from:?} to {to:?}")]
    InterviewTransition {
        from: InterviewStatus,
        to: InterviewStatus,
    },
}

/// Service owning the application lifecycle. Composes the quota guard, the
/// slot finder, and the token ledger over one shared store; every public
/// operation is a bounded, all-or-nothing unit of work.
pub struct PlacementService<N> {
    store: Arc<MemoryStore>,
    notifier: Arc<N>,
    finder: SlotFinder,
    invitation_headroom: u32,
    initial_tokens: u32,
}

impl<N> PlacementService<N>
where
    N: Notifier + 'static,
{
    pub fn new(
        store: Arc<MemoryStore>,
        notifier: Arc<N>,
        config: &AppConfig,
    ) -> Result<Self, ConfigError> {
        let window = ScheduleWindow::new(&config.schedule)?;
        Ok(Self {
            store,
            notifier,
            finder: SlotFinder::new(window),
            invitation_headroom: config.policy.invitation_headroom,
            initial_tokens: config.policy.initial_tokens,
        })
    }

    pub fn window(&self) -> &ScheduleWindow {
        self.finder.window()
    }

    pub(super) fn store(&self) -> &MemoryStore {
        &self.store
    }

    pub(super) fn finder(&self) -> &SlotFinder {
        &self.finder
    }

    pub(super) fn invitation_headroom(&self) -> u32 {
        self.invitation_headroom
    }

    // --- registration & seeding ---

    /// Register a company taking part in the drive.
    pub fn register_company(&self, company: Company) -> Result<(), PlacementError> {
        self.store.apply(|state| {
            if state.companies.contains_key(&company.id) {
                return Err(StoreError::Conflict);
            }
            state.companies.insert(company.id.clone(), company);
            Ok(())
        })?;
        Ok(())
    }

    /// Register a student and grant the initial token allocation. The grant
    /// is a ledger entry like any other, so balances replay from zero.
    pub fn register_student(
        &self,
        id: StudentId,
        full_name: impl Into<String>,
    ) -> Result<(), PlacementError> {
        let grant = ledger::grant(TokenBalances::default(), self.initial_tokens);
        let entry = self.entry(&id, &grant);
        self.store.apply(|state| {
            if state.students.contains_key(&id) {
                return Err(StoreError::Conflict);
            }
            state.students.insert(
                id.clone(),
                Student {
                    id: id.clone(),
                    full_name: full_name.into(),
                    tokens: grant.balances,
                },
            );
            state.ledger.push(entry);
            Ok(())
        })?;
        Ok(())
    }

    /// Publish a job for a registered company.
    pub fn post_job(
        &self,
        company_id: &CompanyId,
        title: impl Into<String>,
        quota: u32,
    ) -> Result<JobId, PlacementError> {
        let job_id = self.store.next_job_id();
        let job = Job {
            id: job_id.clone(),
            company_id: company_id.clone(),
            title: title.into(),
            quota,
            is_active: true,
        };
        self.store.apply(|state| {
            if !state.companies.contains_key(company_id) {
                return Err(PlacementError::UnknownCompany(company_id.clone()));
            }
            state.jobs.insert(job.id.clone(), job);
            Ok(())
        })?;
        Ok(job_id)
    }

    /// Open or close a job for new applications.
    pub fn set_job_active(
        &self,
        job_id: &JobId,
        company_id: &CompanyId,
        active: bool,
    ) -> Result<(), PlacementError> {
        let owner = self.store.read(|state| {
            state
                .job(job_id)
                .map(|job| job.company_id.clone())
                .ok_or_else(|| PlacementError::UnknownJob(job_id.clone()))
        })?;
        if &owner != company_id {
            return Err(PlacementError::Unauthorized);
        }

        let company_lock = self.store.company_lock(company_id);
        let _company_guard = company_lock.lock();

        self.store.apply(|state| {
            if let Some(job) = state.jobs.get_mut(job_id) {
                job.is_active = active;
            }
        });
        Ok(())
    }

    // --- application pipeline ---

    /// File a direct application: consumes one token, creates a PENDING row.
    pub fn apply_to_job(
        &self,
        student_id: &StudentId,
        job_id: &JobId,
    ) -> Result<ApplicationReceipt, PlacementError> {
        // Cheap validation before any lock is taken.
        let company_id = self.store.read(|state| {
            let job = state
                .job(job_id)
                .ok_or_else(|| PlacementError::UnknownJob(job_id.clone()))?;
            if !job.is_active {
                return Err(PlacementError::JobInactive(job_id.clone()));
            }
            state
                .student(student_id)
                .ok_or_else(|| PlacementError::UnknownStudent(student_id.clone()))?;
            Ok(job.company_id.clone())
        })?;

        // Job quota contention is serialized by the owning company's lock;
        // the token row by the student's. Company before student, always.
        let company_lock = self.store.company_lock(&company_id);
        let _company_guard = company_lock.lock();
        let student_lock = self.store.student_lock(student_id);
        let _student_guard = student_lock.lock();

        let (job_title, student_name, consume) = self.store.read(|state| {
            let job = state
                .job(job_id)
                .ok_or_else(|| PlacementError::UnknownJob(job_id.clone()))?;
            if !job.is_active {
                return Err(PlacementError::JobInactive(job_id.clone()));
            }
            if state.application_for_pair(student_id, job_id).is_some()
                || state.invitation_for_pair(student_id, job_id).is_some()
            {
                return Err(PlacementError::Duplicate {
                    student: student_id.clone(),
                    job: job_id.clone(),
                });
            }
            EntryPath::Application.check_admission(state, job)?;
            let student = state
                .student(student_id)
                .ok_or_else(|| PlacementError::UnknownStudent(student_id.clone()))?;
            let consume = ledger::consume(student.tokens)?;
            Ok((job.title.clone(), student.full_name.clone(), consume))
        })?;

        let application_id = self.store.next_application_id();
        let entry = self.entry(student_id, &consume);
        let application = Application {
            id: application_id.clone(),
            job_id: job_id.clone(),
            student_id: student_id.clone(),
            status: ApplicationStatus::Pending,
            source: ApplicationSource::Direct,
            created_at: now(),
        };
        self.store.apply(|state| {
            if let Some(student) = state.students.get_mut(student_id) {
                student.tokens = consume.balances;
            }
            state.ledger.push(entry);
            state.applications.insert(application.id.clone(), application);
        });

        info!(%student_id, %job_id, application = %application_id, "application filed");
        self.send(Notification {
            user_id: company_id.0.clone(),
            kind: NotificationKind::Application,
            title: "New application".to_string(),
            message: format!("{student_name} applied for \"{job_title}\"."),
            related_id: Some(application_id.0.clone()),
        });

        Ok(ApplicationReceipt {
            application_id,
            status: ApplicationStatus::Pending,
            tokens_remaining: consume.balances.remaining,
        })
    }

    /// Decide a pending application. Acceptance books an interview slot and,
    /// when it saturates the company quota, closes every other pending
    /// application for the company in the same commit.
    pub fn decide_application(
        &self,
        application_id: &ApplicationId,
        company_id: &CompanyId,
        decision: Decision,
    ) -> Result<DecisionOutcome, PlacementError> {
        let student_id = self.store.read(|state| {
            let app = state
                .application(application_id)
                .ok_or_else(|| PlacementError::UnknownApplication(application_id.clone()))?;
            let job = state
                .job(&app.job_id)
                .ok_or_else(|| PlacementError::UnknownJob(app.job_id.clone()))?;
            if &job.company_id != company_id {
                return Err(PlacementError::Unauthorized);
            }
            if app.status.is_terminal() {
                return Err(PlacementError::AlreadyProcessed);
            }
            Ok(app.student_id.clone())
        })?;

        let company_lock = self.store.company_lock(company_id);
        let _company_guard = company_lock.lock();
        let student_lock = self.store.student_lock(&student_id);
        let _student_guard = student_lock.lock();

        match decision {
            Decision::Accept => self.accept_locked(application_id, company_id, &student_id),
            Decision::Reject | Decision::Cancel => {
                self.close_locked(application_id, &student_id, decision.target_status())
            }
        }
    }

    /// The ACCEPTED transition, entered with the company and student locks
    /// held. Re-checks everything against current state, stages the full
    /// mutation set (interview, ledger settle, cascade), then commits once.
    fn accept_locked(
        &self,
        application_id: &ApplicationId,
        company_id: &CompanyId,
        student_id: &StudentId,
    ) -> Result<DecisionOutcome, PlacementError> {
        let staged = self.store.read(|state| {
            let app = state
                .application(application_id)
                .ok_or_else(|| PlacementError::UnknownApplication(application_id.clone()))?;
            if app.status.is_terminal() {
                return Err(PlacementError::AlreadyProcessed);
            }
            let job = state
                .job(&app.job_id)
                .ok_or_else(|| PlacementError::UnknownJob(app.job_id.clone()))?;
            let company = state
                .company(company_id)
                .ok_or_else(|| PlacementError::UnknownCompany(company_id.clone()))?;
            let student = state
                .student(student_id)
                .ok_or_else(|| PlacementError::UnknownStudent(student_id.clone()))?;

            // Recompute the accepted count under the lock; a losing
            // concurrent acceptance observes the exhausted quota here.
            let accepted = QuotaGuard::check_company_quota(state, company)?;

            let window = self.finder.window();
            let slot = self.finder.find(
                &state.company_busy(company_id, window),
                &state.student_busy(student_id, window),
            )?;

            let settle = ledger::engage_to_consumed(student.tokens)?;

            // Saturation: this acceptance fills the last quota unit, so every
            // other pending application of the company closes with a refund,
            // atomically with the acceptance itself.
            let cascade = if accepted + 1 == company.global_quota {
                self.stage_cascade(state, application_id, company_id, student_id, settle.balances)?
            } else {
                Vec::new()
            };

            Ok(StagedAccept {
                job_title: job.title.clone(),
                company_name: company.name.clone(),
                source: app.source,
                slot,
                room: SlotFinder::room_for(company),
                settle,
                cascade,
            })
        })?;

        let interview_id = self.store.next_interview_id();
        let settle_entry = self.entry(student_id, &staged.settle);
        let cascade_entries: Vec<TokenLedgerEntry> = staged
            .cascade
            .iter()
            .map(|item| TokenLedgerEntry {
                id: self.store.next_ledger_entry_id(),
                student_id: item.student_id.clone(),
                amount: 0,
                reason: LedgerReason::QuotaRefund,
                created_at: now(),
            })
            .collect();
        let interview = Interview {
            id: interview_id.clone(),
            company_id: company_id.clone(),
            student_id: student_id.clone(),
            application_id: application_id.clone(),
            title: format!("Interview: {}", staged.job_title),
            date_time: staged.slot,
            room: staged.room.clone(),
            status: InterviewStatus::Accepted,
            source: staged.source,
        };

        self.store.apply(|state| {
            if let Some(app) = state.applications.get_mut(application_id) {
                app.status = ApplicationStatus::Accepted;
            }
            state.interviews.insert(interview.id.clone(), interview);
            if let Some(student) = state.students.get_mut(student_id) {
                student.tokens = staged.settle.balances;
            }
            state.ledger.push(settle_entry);
            for (item, entry) in staged.cascade.iter().zip(cascade_entries) {
                if let Some(app) = state.applications.get_mut(&item.application_id) {
                    app.status = ApplicationStatus::RejectedQuota;
                }
                if let Some(student) = state.students.get_mut(&item.student_id) {
                    student.tokens = item.balances;
                }
                state.ledger.push(entry);
            }
        });

        info!(
            application = %application_id,
            company = %company_id,
            slot = %staged.slot,
            closed = staged.cascade.len(),
            "application accepted"
        );

        self.send(Notification {
            user_id: student_id.0.clone(),
            kind: NotificationKind::Application,
            title: "Application accepted".to_string(),
            message: format!(
                "{} accepted your application for \"{}\".",
                staged.company_name, staged.job_title
            ),
            related_id: Some(application_id.0.clone()),
        });
        self.send(Notification {
            user_id: student_id.0.clone(),
            kind: NotificationKind::Interview,
            title: "Interview scheduled".to_string(),
            message: format!(
                "Interview on {} in {}.",
                staged.slot.format("%Y-%m-%d %H:%M"),
                staged.room
            ),
            related_id: Some(interview_id.0.clone()),
        });
        for item in &staged.cascade {
            self.send(Notification {
                user_id: item.student_id.0.clone(),
                kind: NotificationKind::Error,
                title: "Offer closed".to_string(),
                message: format!(
                    "\"{}\" has filled its interview quota. Your token was refunded.",
                    item.job_title
                ),
                related_id: Some(item.application_id.0.clone()),
            });
        }

        Ok(DecisionOutcome {
            application_id: application_id.clone(),
            status: ApplicationStatus::Accepted,
            interview: Some(InterviewSummary {
                id: interview_id,
                date_time: staged.slot,
                room: staged.room,
            }),
            closed_applications: staged
                .cascade
                .into_iter()
                .map(|item| item.application_id)
                .collect(),
        })
    }

    /// Stage the quota cascade: every other pending application for any job
    /// of the company moves to REJECTED_QUOTA and its student gets one token
    /// back. Balances chain per student, so several closures for the same
    /// student refund correctly.
    fn stage_cascade(
        &self,
        state: &super::store::PlacementState,
        accepted_application: &ApplicationId,
        company_id: &CompanyId,
        accepted_student: &StudentId,
        accepted_balances: TokenBalances,
    ) -> Result<Vec<StagedCascade>, PlacementError> {
        let mut running: std::collections::BTreeMap<StudentId, TokenBalances> =
            std::collections::BTreeMap::new();
        running.insert(accepted_student.clone(), accepted_balances);

        let mut cascade = Vec::new();
        for app in state.pending_applications_for_company(company_id) {
            if &app.id == accepted_application {
                continue;
            }
            let current = match running.get(&app.student_id) {
                Some(balances) => *balances,
                None => {
                    state
                        .student(&app.student_id)
                        .ok_or_else(|| PlacementError::UnknownStudent(app.student_id.clone()))?
                        .tokens
                }
            };
            let refund = ledger::refund(current, 1, LedgerReason::QuotaRefund)?;
            running.insert(app.student_id.clone(), refund.balances);
            cascade.push(StagedCascade {
                application_id: app.id.clone(),
                student_id: app.student_id.clone(),
                balances: refund.balances,
                job_title: state
                    .job(&app.job_id)
                    .map(|job| job.title.clone())
                    .unwrap_or_else(|| "Offer".to_string()),
            });
        }
        Ok(cascade)
    }

    /// The REJECTED/CANCELLED transition, entered with both locks held.
    /// Forfeits the engaged token: it is not returned to `remaining`, unlike
    /// withdrawal. See DESIGN.md before changing either side.
    fn close_locked(
        &self,
        application_id: &ApplicationId,
        student_id: &StudentId,
        status: ApplicationStatus,
    ) -> Result<DecisionOutcome, PlacementError> {
        let forfeit = self.store.read(|state| {
            let app = state
                .application(application_id)
                .ok_or_else(|| PlacementError::UnknownApplication(application_id.clone()))?;
            if app.status.is_terminal() {
                return Err(PlacementError::AlreadyProcessed);
            }
            let student = state
                .student(student_id)
                .ok_or_else(|| PlacementError::UnknownStudent(student_id.clone()))?;
            Ok(ledger::forfeit(student.tokens)?)
        })?;

        let entry = self.entry(student_id, &forfeit);
        self.store.apply(|state| {
            if let Some(app) = state.applications.get_mut(application_id) {
                app.status = status;
            }
            if let Some(student) = state.students.get_mut(student_id) {
                student.tokens = forfeit.balances;
            }
            state.ledger.push(entry);
        });

        info!(application = %application_id, status = status.label(), "application closed");
        Ok(DecisionOutcome {
            application_id: application_id.clone(),
            status,
            interview: None,
            closed_applications: Vec::new(),
        })
    }

    /// Withdraw a still-pending application: deletes the row and returns the
    /// engaged token to `remaining`. No interview can exist for it.
    pub fn withdraw_application(
        &self,
        application_id: &ApplicationId,
        student_id: &StudentId,
    ) -> Result<(), PlacementError> {
        let company_id = self.store.read(|state| {
            let app = state
                .application(application_id)
                .ok_or_else(|| PlacementError::UnknownApplication(application_id.clone()))?;
            if &app.student_id != student_id {
                return Err(PlacementError::Unauthorized);
            }
            if app.status.is_terminal() {
                return Err(PlacementError::AlreadyProcessed);
            }
            let job = state
                .job(&app.job_id)
                .ok_or_else(|| PlacementError::UnknownJob(app.job_id.clone()))?;
            Ok(job.company_id.clone())
        })?;

        let company_lock = self.store.company_lock(&company_id);
        let _company_guard = company_lock.lock();
        let student_lock = self.store.student_lock(student_id);
        let _student_guard = student_lock.lock();

        let (job_title, student_name, refund) = self.store.read(|state| {
            let app = state
                .application(application_id)
                .ok_or_else(|| PlacementError::UnknownApplication(application_id.clone()))?;
            if app.status.is_terminal() {
                return Err(PlacementError::AlreadyProcessed);
            }
            let job = state
                .job(&app.job_id)
                .ok_or_else(|| PlacementError::UnknownJob(app.job_id.clone()))?;
            let student = state
                .student(student_id)
                .ok_or_else(|| PlacementError::UnknownStudent(student_id.clone()))?;
            let refund = ledger::refund(student.tokens, 1, LedgerReason::WithdrawalRefund)?;
            Ok((job.title.clone(), student.full_name.clone(), refund))
        })?;

        let entry = self.entry(student_id, &refund);
        self.store.apply(|state| {
            state.applications.remove(application_id);
            if let Some(student) = state.students.get_mut(student_id) {
                student.tokens = refund.balances;
            }
            state.ledger.push(entry);
        });

        info!(application = %application_id, %student_id, "application withdrawn");
        self.send(Notification {
            user_id: company_id.0.clone(),
            kind: NotificationKind::Application,
            title: "Application withdrawn".to_string(),
            message: format!("{student_name} withdrew their application for \"{job_title}\"."),
            related_id: Some(application_id.0.clone()),
        });
        Ok(())
    }

    // --- interview lifecycle ---

    /// Student-side check-in on the day of the interview.
    pub fn check_in(
        &self,
        interview_id: &InterviewId,
        student_id: &StudentId,
    ) -> Result<(), PlacementError> {
        let (company_id, title) = self.store.read(|state| {
            let interview = state
                .interview(interview_id)
                .ok_or_else(|| PlacementError::UnknownInterview(interview_id.clone()))?;
            if &interview.student_id != student_id {
                return Err(PlacementError::Unauthorized);
            }
            Ok((interview.company_id.clone(), interview.title.clone()))
        })?;

        let company_lock = self.store.company_lock(&company_id);
        let _company_guard = company_lock.lock();

        self.transition_interview_locked(interview_id, InterviewStatus::CheckedIn)?;

        self.send(Notification {
            user_id: company_id.0.clone(),
            kind: NotificationKind::Info,
            title: "Candidate present".to_string(),
            message: format!("The candidate for {title} has checked in."),
            related_id: Some(interview_id.0.clone()),
        });
        Ok(())
    }

    /// Company-side interview transition (complete or cancel). Cancelling
    /// frees the slot for later bookings.
    pub fn set_interview_status(
        &self,
        interview_id: &InterviewId,
        company_id: &CompanyId,
        status: InterviewStatus,
    ) -> Result<(), PlacementError> {
        let owner = self.store.read(|state| {
            state
                .interview(interview_id)
                .map(|interview| interview.company_id.clone())
                .ok_or_else(|| PlacementError::UnknownInterview(interview_id.clone()))
        })?;
        if &owner != company_id {
            return Err(PlacementError::Unauthorized);
        }

        let company_lock = self.store.company_lock(company_id);
        let _company_guard = company_lock.lock();

        self.transition_interview_locked(interview_id, status)
    }

    fn transition_interview_locked(
        &self,
        interview_id: &InterviewId,
        to: InterviewStatus,
    ) -> Result<(), PlacementError> {
        let from = self.store.read(|state| {
            state
                .interview(interview_id)
                .map(|interview| interview.status)
                .ok_or_else(|| PlacementError::UnknownInterview(interview_id.clone()))
        })?;
        if !from.can_transition(to) {
            return Err(PlacementError::InterviewTransition { from, to });
        }
        self.store.apply(|state| {
            if let Some(interview) = state.interviews.get_mut(interview_id) {
                interview.status = to;
            }
        });
        info!(interview = %interview_id, from = from.label(), to = to.label(), "interview transition");
        Ok(())
    }

    // --- queries ---

    /// A student's ledger, newest first.
    pub fn token_history(
        &self,
        student_id: &StudentId,
    ) -> Result<Vec<TokenLedgerEntry>, PlacementError> {
        self.store.read(|state| {
            state
                .student(student_id)
                .ok_or_else(|| PlacementError::UnknownStudent(student_id.clone()))?;
            let mut entries: Vec<TokenLedgerEntry> = state
                .ledger_for(student_id)
                .into_iter()
                .cloned()
                .collect();
            entries.reverse();
            Ok(entries)
        })
    }

    /// Cached token balances for a student.
    pub fn student_tokens(&self, student_id: &StudentId) -> Result<TokenBalances, PlacementError> {
        self.store.read(|state| {
            state
                .student(student_id)
                .map(|student| student.tokens)
                .ok_or_else(|| PlacementError::UnknownStudent(student_id.clone()))
        })
    }

    /// Current snapshot of one application row.
    pub fn application(&self, id: &ApplicationId) -> Result<Application, PlacementError> {
        self.store.read(|state| {
            state
                .application(id)
                .cloned()
                .ok_or_else(|| PlacementError::UnknownApplication(id.clone()))
        })
    }

    /// A student's interviews ordered by slot time.
    pub fn student_schedule(&self, student_id: &StudentId) -> Vec<Interview> {
        self.store.read(|state| {
            let mut interviews: Vec<Interview> = state
                .interviews
                .values()
                .filter(|interview| &interview.student_id == student_id)
                .cloned()
                .collect();
            interviews.sort_by_key(|interview| interview.date_time);
            interviews
        })
    }

    /// A company's interviews ordered by slot time.
    pub fn company_schedule(&self, company_id: &CompanyId) -> Vec<Interview> {
        self.store.read(|state| {
            let mut interviews: Vec<Interview> = state
                .interviews
                .values()
                .filter(|interview| &interview.company_id == company_id)
                .cloned()
                .collect();
            interviews.sort_by_key(|interview| interview.date_time);
            interviews
        })
    }

    // --- shared plumbing ---

    pub(super) fn entry(&self, student_id: &StudentId, mutation: &LedgerMutation) -> TokenLedgerEntry {
        TokenLedgerEntry {
            id: self.store.next_ledger_entry_id(),
            student_id: student_id.clone(),
            amount: mutation.amount,
            reason: mutation.reason,
            created_at: now(),
        }
    }

    /// Notifications are delivered after commit and are best-effort: a
    /// transport failure must not fail an operation that already committed.
    pub(super) fn send(&self, notification: Notification) {
        if let Err(err) = self.notifier.notify(notification) {
            warn!(error = %err, "notification delivery failed");
        }
    }
}

struct StagedAccept {
    job_title: String,
    company_name: String,
    source: ApplicationSource,
    slot: NaiveDateTime,
    room: String,
    settle: LedgerMutation,
    cascade: Vec<StagedCascade>,
}

struct StagedCascade {
    application_id: ApplicationId,
    student_id: StudentId,
    balances: TokenBalances,
    job_title: String,
}

pub(super) fn now() -> NaiveDateTime {
    Utc::now().naive_utc()
}
