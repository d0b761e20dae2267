//! In-process rendering of the relational store: one shared state behind a
//! read/write lock, plus the registry of keyed aggregate mutexes standing in
//! for row locks.
//!
//! The discipline is lock-then-read-then-decide: an operation acquires the
//! aggregate locks it needs (company before student, always), re-reads state
//! under the read lock, stages its mutations, and applies them as a single
//! infallible closure under the write lock. Aggregates are only ever mutated
//! by holders of their lock, so staged reads stay valid until commit; a
//! failure before commit leaves no partial effect.

use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use chrono::NaiveDateTime;
use parking_lot::{Mutex, RwLock};

use super::calendar::ScheduleWindow;
use super::domain::{
    Application, ApplicationId, ApplicationStatus, Company, CompanyId, Interview, InterviewId,
    Invitation, InvitationId, Job, JobId, Student, StudentId,
};
use super::ledger::TokenLedgerEntry;

/// Whole-drive state. Quota counts are always recomputed from these tables
/// inside a lock scope, never cached.
#[derive(Debug, Default)]
pub struct PlacementState {
    pub companies: BTreeMap<CompanyId, Company>,
    pub jobs: BTreeMap<JobId, Job>,
    pub students: BTreeMap<StudentId, Student>,
    pub applications: BTreeMap<ApplicationId, Application>,
    pub interviews: BTreeMap<InterviewId, Interview>,
    pub invitations: BTreeMap<InvitationId, Invitation>,
    pub ledger: Vec<TokenLedgerEntry>,
}

impl PlacementState {
    pub fn company(&self, id: &CompanyId) -> Option<&Company> {
        self.companies.get(id)
    }

    pub fn job(&self, id: &JobId) -> Option<&Job> {
        self.jobs.get(id)
    }

    pub fn student(&self, id: &StudentId) -> Option<&Student> {
        self.students.get(id)
    }

    pub fn application(&self, id: &ApplicationId) -> Option<&Application> {
        self.applications.get(id)
    }

    pub fn interview(&self, id: &InterviewId) -> Option<&Interview> {
        self.interviews.get(id)
    }

    pub fn invitation(&self, id: &InvitationId) -> Option<&Invitation> {
        self.invitations.get(id)
    }

    /// Any application row for the (student, job) pair, regardless of status.
    pub fn application_for_pair(
        &self,
        student_id: &StudentId,
        job_id: &JobId,
    ) -> Option<&Application> {
        self.applications
            .values()
            .find(|app| &app.student_id == student_id && &app.job_id == job_id)
    }

    /// Any invitation row for the (student, job) pair, regardless of status.
    pub fn invitation_for_pair(
        &self,
        student_id: &StudentId,
        job_id: &JobId,
    ) -> Option<&Invitation> {
        self.invitations
            .values()
            .find(|invitation| {
                &invitation.student_id == student_id && &invitation.job_id == job_id
            })
    }

    /// Timestamps of the company's slot-holding interviews inside the window.
    pub fn company_busy(
        &self,
        company_id: &CompanyId,
        window: &ScheduleWindow,
    ) -> HashSet<NaiveDateTime> {
        self.interviews
            .values()
            .filter(|interview| {
                &interview.company_id == company_id
                    && interview.status.occupies_slot()
                    && window.contains(interview.date_time)
            })
            .map(|interview| interview.date_time)
            .collect()
    }

    /// Timestamps of the student's slot-holding interviews inside the window.
    pub fn student_busy(
        &self,
        student_id: &StudentId,
        window: &ScheduleWindow,
    ) -> HashSet<NaiveDateTime> {
        self.interviews
            .values()
            .filter(|interview| {
                &interview.student_id == student_id
                    && interview.status.occupies_slot()
                    && window.contains(interview.date_time)
            })
            .map(|interview| interview.date_time)
            .collect()
    }

    /// Pending applications across every job of the company, in stable id
    /// order. Feeds the quota cascade.
    pub fn pending_applications_for_company(&self, company_id: &CompanyId) -> Vec<&Application> {
        self.applications
            .values()
            .filter(|app| {
                app.status == ApplicationStatus::Pending
                    && self
                        .jobs
                        .get(&app.job_id)
                        .is_some_and(|job| &job.company_id == company_id)
            })
            .collect()
    }

    /// Ledger entries for one student, oldest first.
    pub fn ledger_for(&self, student_id: &StudentId) -> Vec<&TokenLedgerEntry> {
        self.ledger
            .iter()
            .filter(|entry| &entry.student_id == student_id)
            .collect()
    }
}

#[derive(Default)]
struct AggregateLocks {
    companies: Mutex<HashMap<CompanyId, Arc<Mutex<()>>>>,
    students: Mutex<HashMap<StudentId, Arc<Mutex<()>>>>,
}

impl AggregateLocks {
    fn company(&self, id: &CompanyId) -> Arc<Mutex<()>> {
        self.companies
            .lock()
            .entry(id.clone())
            .or_default()
            .clone()
    }

    fn student(&self, id: &StudentId) -> Arc<Mutex<()>> {
        self.students.lock().entry(id.clone()).or_default().clone()
    }
}

#[derive(Default)]
struct Sequences {
    jobs: AtomicU64,
    applications: AtomicU64,
    interviews: AtomicU64,
    invitations: AtomicU64,
    ledger: AtomicU64,
}

fn next(sequence: &AtomicU64) -> u64 {
    sequence.fetch_add(1, Ordering::Relaxed) + 1
}

/// The shared store. Cheap to clone behind an `Arc`; every request-handling
/// worker operates on the same instance.
#[derive(Default)]
pub struct MemoryStore {
    state: RwLock<PlacementState>,
    locks: AggregateLocks,
    sequences: Sequences,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Run a read-only closure against current state.
    pub fn read<T>(&self, f: impl FnOnce(&PlacementState) -> T) -> T {
        f(&self.state.read())
    }

    /// Commit a staged mutation. The closure runs under the exclusive write
    /// lock and must not fail partway: stage all fallible work before calling
    /// this, or check-and-return before the first mutation inside it.
    pub(crate) fn apply<T>(&self, f: impl FnOnce(&mut PlacementState) -> T) -> T {
        f(&mut self.state.write())
    }

    /// Exclusive lease on the company aggregate: its quota counters, its
    /// interview calendar, and the applications/invitations to its jobs.
    pub(crate) fn company_lock(&self, id: &CompanyId) -> Arc<Mutex<()>> {
        self.locks.company(id)
    }

    /// Exclusive lease on the student aggregate: the token row and the
    /// student's own calendar.
    pub(crate) fn student_lock(&self, id: &StudentId) -> Arc<Mutex<()>> {
        self.locks.student(id)
    }

    pub(crate) fn next_job_id(&self) -> JobId {
        JobId(format!("job-{:06}", next(&self.sequences.jobs)))
    }

    pub(crate) fn next_application_id(&self) -> ApplicationId {
        ApplicationId(format!("app-{:06}", next(&self.sequences.applications)))
    }

    pub(crate) fn next_interview_id(&self) -> InterviewId {
        InterviewId(format!("ivw-{:06}", next(&self.sequences.interviews)))
    }

    pub(crate) fn next_invitation_id(&self) -> InvitationId {
        InvitationId(format!("inv-{:06}", next(&self.sequences.invitations)))
    }

    pub(crate) fn next_ledger_entry_id(&self) -> String {
        format!("tok-{:06}", next(&self.sequences.ledger))
    }
}
