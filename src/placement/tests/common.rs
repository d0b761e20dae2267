use std::sync::{Arc, Mutex};

use chrono::{NaiveDate, NaiveDateTime, NaiveTime};

use crate::config::{AppConfig, PlacementPolicy, ScheduleConfig, TelemetryConfig};
use crate::placement::domain::{Company, CompanyId, JobId, StudentId};
use crate::placement::ledger;
use crate::placement::repository::{Notification, Notifier, NotifyError};
use crate::placement::service::PlacementService;
use crate::placement::store::MemoryStore;

pub(super) fn app_config() -> AppConfig {
    AppConfig {
        schedule: ScheduleConfig::default(),
        policy: PlacementPolicy::default(),
        telemetry: TelemetryConfig {
            log_level: "info".to_string(),
        },
    }
}

/// One day, 08:00-09:00, 20-minute slots: three slots per company, so slot
/// exhaustion is cheap to reach in tests.
pub(super) fn tiny_window_config() -> AppConfig {
    AppConfig {
        schedule: ScheduleConfig {
            window_start: NaiveDate::from_ymd_opt(2026, 2, 15).expect("valid"),
            window_days: 1,
            day_start: NaiveTime::from_hms_opt(8, 0, 0).expect("valid"),
            day_end: NaiveTime::from_hms_opt(9, 0, 0).expect("valid"),
            slot_minutes: 20,
        },
        ..app_config()
    }
}

pub(super) fn build_service() -> (
    PlacementService<MemoryNotifier>,
    Arc<MemoryStore>,
    Arc<MemoryNotifier>,
) {
    build_service_with(&app_config())
}

pub(super) fn build_service_with(
    config: &AppConfig,
) -> (
    PlacementService<MemoryNotifier>,
    Arc<MemoryStore>,
    Arc<MemoryNotifier>,
) {
    let store = Arc::new(MemoryStore::new());
    let notifier = Arc::new(MemoryNotifier::default());
    let service = PlacementService::new(store.clone(), notifier.clone(), config)
        .expect("config is valid");
    (service, store, notifier)
}

pub(super) fn company<N: Notifier + 'static>(
    service: &PlacementService<N>,
    name: &str,
    global_quota: u32,
) -> CompanyId {
    let id = CompanyId(format!("co-{}", name.to_lowercase()));
    service
        .register_company(Company {
            id: id.clone(),
            name: name.to_string(),
            global_quota,
        })
        .expect("company registers");
    id
}

pub(super) fn student<N: Notifier + 'static>(service: &PlacementService<N>, key: &str) -> StudentId {
    let id = StudentId(format!("stu-{key}"));
    service
        .register_student(id.clone(), format!("Student {key}"))
        .expect("student registers");
    id
}

pub(super) fn job<N: Notifier + 'static>(
    service: &PlacementService<N>,
    company_id: &CompanyId,
    title: &str,
    quota: u32,
) -> JobId {
    service
        .post_job(company_id, title, quota)
        .expect("job posts")
}

pub(super) fn slot_at(day: u32, hour: u32, minute: u32) -> NaiveDateTime {
    NaiveDate::from_ymd_opt(2026, 2, day)
        .expect("valid day")
        .and_hms_opt(hour, minute, 0)
        .expect("valid time")
}

/// The core auditing property: cached buckets must equal a replay of the
/// student's ledger, and the bucket sum must equal the entry amounts.
pub(super) fn assert_ledger_consistent(store: &MemoryStore, student_id: &StudentId) {
    store.read(|state| {
        let student = state.student(student_id).expect("student exists");
        let entries = state.ledger_for(student_id);
        let replayed = ledger::replay(entries.iter().copied());
        assert_eq!(
            replayed, student.tokens,
            "cached balances diverge from ledger replay for {student_id}"
        );
        let entry_sum: i64 = entries.iter().map(|entry| entry.amount).sum();
        assert_eq!(
            student.tokens.total(),
            entry_sum,
            "bucket sum diverges from ledger entry sum for {student_id}"
        );
    });
}

#[derive(Default, Clone)]
pub(super) struct MemoryNotifier {
    events: Arc<Mutex<Vec<Notification>>>,
}

impl MemoryNotifier {
    pub(super) fn events(&self) -> Vec<Notification> {
        self.events.lock().expect("notifier mutex poisoned").clone()
    }

    pub(super) fn events_for(&self, user_id: &str) -> Vec<Notification> {
        self.events()
            .into_iter()
            .filter(|event| event.user_id == user_id)
            .collect()
    }
}

impl Notifier for MemoryNotifier {
    fn notify(&self, notification: Notification) -> Result<(), NotifyError> {
        self.events
            .lock()
            .expect("notifier mutex poisoned")
            .push(notification);
        Ok(())
    }
}

pub(super) struct FailingNotifier;

impl Notifier for FailingNotifier {
    fn notify(&self, _notification: Notification) -> Result<(), NotifyError> {
        Err(NotifyError::Transport("gateway offline".to_string()))
    }
}
