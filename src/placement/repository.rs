use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use super::domain::{ApplicationId, ApplicationStatus, InterviewId};

/// Outbound notification seam. Content rendering and delivery (mail, push,
/// in-app feed) live with the caller; the engine only emits typed payloads.
pub trait Notifier: Send + Sync {
    fn notify(&self, notification: Notification) -> Result<(), NotifyError>;
}

/// One notification addressed to a user of the surrounding platform.
/// Companies and students share the platform's user id namespace.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notification {
    pub user_id: String,
    pub kind: NotificationKind,
    pub title: String,
    pub message: String,
    pub related_id: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NotificationKind {
    Application,
    Interview,
    Invitation,
    Info,
    Success,
    Error,
}

impl NotificationKind {
    pub const fn label(self) -> &'static str {
        match self {
            NotificationKind::Application => "application",
            NotificationKind::Interview => "interview",
            NotificationKind::Invitation => "invitation",
            NotificationKind::Info => "info",
            NotificationKind::Success => "success",
            NotificationKind::Error => "error",
        }
    }
}

/// Notification dispatch error.
#[derive(Debug, thiserror::Error)]
pub enum NotifyError {
    #[error("notification transport unavailable: {0}")]
    Transport(String),
}

/// Error enumeration for store failures.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum StoreError {
    #[error("record already exists")]
    Conflict,
    #[error("record not found")]
    NotFound,
    #[error("store unavailable: {0}")]
    Unavailable(String),
}

/// Returned by `apply_to_job`: the new pending application and the caller's
/// post-consumption token balance.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ApplicationReceipt {
    pub application_id: ApplicationId,
    pub status: ApplicationStatus,
    pub tokens_remaining: u32,
}

/// Slim interview view handed back to callers after a booking.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct InterviewSummary {
    pub id: InterviewId,
    pub date_time: NaiveDateTime,
    pub room: String,
}

/// Returned by `decide_application`: the final status, the interview if the
/// decision booked one, and every application the quota cascade closed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DecisionOutcome {
    pub application_id: ApplicationId,
    pub status: ApplicationStatus,
    pub interview: Option<InterviewSummary>,
    pub closed_applications: Vec<ApplicationId>,
}
