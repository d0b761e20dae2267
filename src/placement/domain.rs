use std::fmt;

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

/// Identifier wrapper for companies; shared with the user directory.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct CompanyId(pub String);

/// Identifier wrapper for students; shared with the user directory.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct StudentId(pub String);

/// Identifier wrapper for job postings.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct JobId(pub String);

/// Identifier wrapper for applications.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ApplicationId(pub String);

/// Identifier wrapper for scheduled interviews.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct InterviewId(pub String);

/// Identifier wrapper for company-initiated invitations.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct InvitationId(pub String);

impl fmt::Display for CompanyId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl fmt::Display for StudentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl fmt::Display for JobId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl fmt::Display for ApplicationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl fmt::Display for InterviewId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl fmt::Display for InvitationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A company taking part in the placement drive. `global_quota` caps the
/// accepted interviews across all of its jobs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Company {
    pub id: CompanyId,
    pub name: String,
    pub global_quota: u32,
}

/// A job posting. `quota` caps how many applications the job will take in.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Job {
    pub id: JobId,
    pub company_id: CompanyId,
    pub title: String,
    pub quota: u32,
    pub is_active: bool,
}

/// A registered student. The token fields cache the ledger balance and must
/// always match a replay of the student's ledger entries.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Student {
    pub id: StudentId,
    pub full_name: String,
    pub tokens: TokenBalances,
}

/// Cached token buckets for one student.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenBalances {
    pub remaining: u32,
    pub engaged: u32,
    pub consumed: u32,
}

impl TokenBalances {
    pub fn total(&self) -> i64 {
        i64::from(self.remaining) + i64::from(self.engaged) + i64::from(self.consumed)
    }
}

/// How an application entered the pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ApplicationSource {
    Direct,
    Invitation,
}

impl ApplicationSource {
    pub const fn label(self) -> &'static str {
        match self {
            ApplicationSource::Direct => "direct",
            ApplicationSource::Invitation => "invitation",
        }
    }
}

/// Lifecycle of an application. Transitions are forward-only: `Pending` is
/// the single non-terminal state, and withdrawal deletes the row instead of
/// adding a status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ApplicationStatus {
    Pending,
    Accepted,
    Rejected,
    RejectedQuota,
    Cancelled,
}

impl ApplicationStatus {
    pub const fn label(self) -> &'static str {
        match self {
            ApplicationStatus::Pending => "pending",
            ApplicationStatus::Accepted => "accepted",
            ApplicationStatus::Rejected => "rejected",
            ApplicationStatus::RejectedQuota => "rejected_quota",
            ApplicationStatus::Cancelled => "cancelled",
        }
    }

    pub const fn is_terminal(self) -> bool {
        !matches!(self, ApplicationStatus::Pending)
    }

    pub const fn can_transition(self, to: ApplicationStatus) -> bool {
        matches!(self, ApplicationStatus::Pending) && to.is_terminal()
    }
}

/// One (student, job) application row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Application {
    pub id: ApplicationId,
    pub job_id: JobId,
    pub student_id: StudentId,
    pub status: ApplicationStatus,
    pub source: ApplicationSource,
    pub created_at: NaiveDateTime,
}

/// Company-side verdict on a pending application.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Decision {
    Accept,
    Reject,
    Cancel,
}

impl Decision {
    pub const fn target_status(self) -> ApplicationStatus {
        match self {
            Decision::Accept => ApplicationStatus::Accepted,
            Decision::Reject => ApplicationStatus::Rejected,
            Decision::Cancel => ApplicationStatus::Cancelled,
        }
    }
}

/// Lifecycle of a booked interview. `CheckedIn` is a sub-state of `Accepted`
/// and keeps occupying both the quota and the slot; only `Cancelled` frees
/// them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InterviewStatus {
    Accepted,
    CheckedIn,
    Completed,
    Cancelled,
}

impl InterviewStatus {
    pub const fn label(self) -> &'static str {
        match self {
            InterviewStatus::Accepted => "accepted",
            InterviewStatus::CheckedIn => "checked_in",
            InterviewStatus::Completed => "completed",
            InterviewStatus::Cancelled => "cancelled",
        }
    }

    pub const fn occupies_slot(self) -> bool {
        !matches!(self, InterviewStatus::Cancelled)
    }

    pub const fn occupies_quota(self) -> bool {
        matches!(
            self,
            InterviewStatus::Accepted | InterviewStatus::CheckedIn | InterviewStatus::Completed
        )
    }

    pub const fn can_transition(self, to: InterviewStatus) -> bool {
        match self {
            InterviewStatus::Accepted => matches!(
                to,
                InterviewStatus::CheckedIn | InterviewStatus::Completed | InterviewStatus::Cancelled
            ),
            InterviewStatus::CheckedIn => {
                matches!(to, InterviewStatus::Completed | InterviewStatus::Cancelled)
            }
            InterviewStatus::Completed | InterviewStatus::Cancelled => false,
        }
    }
}

/// A booked interview slot. Created exclusively when an application reaches
/// `Accepted`; never created for pending or rejected applications.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Interview {
    pub id: InterviewId,
    pub company_id: CompanyId,
    pub student_id: StudentId,
    pub application_id: ApplicationId,
    pub title: String,
    pub date_time: NaiveDateTime,
    pub room: String,
    pub status: InterviewStatus,
    pub source: ApplicationSource,
}

/// Lifecycle of an invitation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InvitationStatus {
    Pending,
    Accepted,
    Rejected,
}

impl InvitationStatus {
    pub const fn label(self) -> &'static str {
        match self {
            InvitationStatus::Pending => "pending",
            InvitationStatus::Accepted => "accepted",
            InvitationStatus::Rejected => "rejected",
        }
    }
}

/// A company-initiated entry into the pipeline for a (student, job) pair.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Invitation {
    pub id: InvitationId,
    pub company_id: CompanyId,
    pub student_id: StudentId,
    pub job_id: JobId,
    pub status: InvitationStatus,
    pub message: String,
    pub created_at: NaiveDateTime,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn application_transitions_are_forward_only() {
        for terminal in [
            ApplicationStatus::Accepted,
            ApplicationStatus::Rejected,
            ApplicationStatus::RejectedQuota,
            ApplicationStatus::Cancelled,
        ] {
            assert!(ApplicationStatus::Pending.can_transition(terminal));
            assert!(!terminal.can_transition(ApplicationStatus::Pending));
            assert!(!terminal.can_transition(ApplicationStatus::Accepted));
        }
        assert!(!ApplicationStatus::Pending.can_transition(ApplicationStatus::Pending));
    }

    #[test]
    fn cancelled_interviews_release_slot_and_quota() {
        assert!(!InterviewStatus::Cancelled.occupies_slot());
        assert!(!InterviewStatus::Cancelled.occupies_quota());
        for held in [
            InterviewStatus::Accepted,
            InterviewStatus::CheckedIn,
            InterviewStatus::Completed,
        ] {
            assert!(held.occupies_slot());
            assert!(held.occupies_quota());
        }
    }

    #[test]
    fn interview_transitions_stop_at_terminal_states() {
        assert!(InterviewStatus::Accepted.can_transition(InterviewStatus::CheckedIn));
        assert!(InterviewStatus::CheckedIn.can_transition(InterviewStatus::Completed));
        assert!(!InterviewStatus::Completed.can_transition(InterviewStatus::Cancelled));
        assert!(!InterviewStatus::Cancelled.can_transition(InterviewStatus::Accepted));
    }

    #[test]
    fn statuses_serialize_as_snake_case() {
        assert_eq!(
            serde_json::to_value(ApplicationStatus::RejectedQuota).expect("serializes"),
            serde_json::json!("rejected_quota")
        );
        assert_eq!(
            serde_json::to_value(InterviewStatus::CheckedIn).expect("serializes"),
            serde_json::json!("checked_in")
        );
        assert_eq!(
            serde_json::to_value(ApplicationSource::Invitation).expect("serializes"),
            serde_json::json!("invitation")
        );
    }
}
