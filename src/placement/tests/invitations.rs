use super::common::*;
use crate::placement::calendar::SlotError;
use crate::placement::domain::{
    ApplicationSource, ApplicationStatus, Decision, InvitationStatus, TokenBalances,
};
use crate::placement::quota::CapacityError;
use crate::placement::repository::NotificationKind;
use crate::placement::service::PlacementError;

#[test]
fn inviting_creates_a_pending_invitation_without_spending_tokens() {
    let (service, store, notifier) = build_service();
    let company_id = company(&service, "Acme", 5);
    let job_id = job(&service, &company_id, "Network Intern", 3);
    let student_id = student(&service, "amina");

    let invitation_id = service
        .invite_student(&company_id, &student_id, &job_id)
        .expect("invitation goes through");

    let invitation = service.invitation(&invitation_id).expect("row exists");
    assert_eq!(invitation.status, InvitationStatus::Pending);
    assert_eq!(
        service.student_tokens(&student_id).expect("student"),
        TokenBalances {
            remaining: 5,
            engaged: 0,
            consumed: 0
        }
    );
    store.read(|state| assert!(state.ledger.len() == 1, "only the initial grant is logged"));

    let student_events = notifier.events_for("stu-amina");
    assert_eq!(student_events.len(), 1);
    assert_eq!(student_events[0].kind, NotificationKind::Invitation);
}

#[test]
fn inviting_rejects_duplicates_in_either_direction() {
    let (service, _, _) = build_service();
    let company_id = company(&service, "Acme", 5);
    let job_a = job(&service, &company_id, "Network Intern", 3);
    let job_b = job(&service, &company_id, "Data Intern", 3);
    let student_id = student(&service, "amina");

    service
        .apply_to_job(&student_id, &job_a)
        .expect("application");
    assert!(matches!(
        service.invite_student(&company_id, &student_id, &job_a),
        Err(PlacementError::AlreadyApplied { .. })
    ));

    service
        .invite_student(&company_id, &student_id, &job_b)
        .expect("first invitation");
    assert!(matches!(
        service.invite_student(&company_id, &student_id, &job_b),
        Err(PlacementError::AlreadyInvited { .. })
    ));
}

#[test]
fn invitations_are_capped_at_quota_plus_headroom() {
    let mut config = app_config();
    config.policy.invitation_headroom = 2;
    let (service, _, _) = build_service_with(&config);
    let company_id = company(&service, "Acme", 5);
    let job_id = job(&service, &company_id, "Network Intern", 1);

    for key in ["a", "b", "c"] {
        let student_id = student(&service, key);
        service
            .invite_student(&company_id, &student_id, &job_id)
            .expect("under the cap");
    }

    let fourth = student(&service, "d");
    match service.invite_student(&company_id, &fourth, &job_id) {
        Err(PlacementError::Capacity(CapacityError::InvitationCapFull { cap: 3, .. })) => {}
        other => panic!("expected invitation cap error, got {other:?}"),
    }
}

#[test]
fn accepted_applications_count_against_the_invitation_cap() {
    let mut config = app_config();
    config.policy.invitation_headroom = 1;
    let (service, _, _) = build_service_with(&config);
    let company_id = company(&service, "Acme", 5);
    let job_id = job(&service, &company_id, "Network Intern", 1);

    let applicant = student(&service, "amina");
    let receipt = service
        .apply_to_job(&applicant, &job_id)
        .expect("application");
    service
        .decide_application(&receipt.application_id, &company_id, Decision::Accept)
        .expect("acceptance");

    // cap = quota 1 + headroom 1; the accepted application occupies one unit.
    let invitee = student(&service, "bilal");
    service
        .invite_student(&company_id, &invitee, &job_id)
        .expect("one unit left");
    let third = student(&service, "chaltu");
    assert!(matches!(
        service.invite_student(&company_id, &third, &job_id),
        Err(PlacementError::Capacity(CapacityError::InvitationCapFull { .. }))
    ));
}

#[test]
fn accepting_an_invitation_books_without_touching_the_ledger() {
    let (service, store, notifier) = build_service();
    let company_id = company(&service, "Acme", 5);
    let job_id = job(&service, &company_id, "Network Intern", 3);
    let student_id = student(&service, "amina");
    let invitation_id = service
        .invite_student(&company_id, &student_id, &job_id)
        .expect("invitation");

    let summary = service
        .accept_invitation(&invitation_id, &student_id)
        .expect("acceptance succeeds");
    assert_eq!(summary.date_time, slot_at(15, 8, 0));
    assert_eq!(summary.room, "Room Acme");

    let invitation = service.invitation(&invitation_id).expect("row exists");
    assert_eq!(invitation.status, InvitationStatus::Accepted);

    store.read(|state| {
        assert_eq!(state.applications.len(), 1);
        let application = state.applications.values().next().expect("application row");
        assert_eq!(application.status, ApplicationStatus::Accepted);
        assert_eq!(application.source, ApplicationSource::Invitation);
        assert_eq!(state.interviews.len(), 1);
        assert_eq!(state.ledger.len(), 1, "no entry beyond the initial grant");
    });
    assert_eq!(
        service.student_tokens(&student_id).expect("student"),
        TokenBalances {
            remaining: 5,
            engaged: 0,
            consumed: 0
        }
    );

    assert!(notifier
        .events_for("co-acme")
        .iter()
        .any(|event| event.title == "Invitation accepted"));
}

#[test]
fn accepting_twice_reports_already_processed_and_books_nothing_new() {
    let (service, store, _) = build_service();
    let company_id = company(&service, "Acme", 5);
    let job_id = job(&service, &company_id, "Network Intern", 3);
    let student_id = student(&service, "amina");
    let invitation_id = service
        .invite_student(&company_id, &student_id, &job_id)
        .expect("invitation");

    service
        .accept_invitation(&invitation_id, &student_id)
        .expect("first acceptance");
    assert!(matches!(
        service.accept_invitation(&invitation_id, &student_id),
        Err(PlacementError::AlreadyProcessed)
    ));

    store.read(|state| {
        assert_eq!(state.applications.len(), 1);
        assert_eq!(state.interviews.len(), 1);
    });
}

#[test]
fn invitation_acceptance_bypasses_the_hard_job_quota() {
    let (service, store, _) = build_service();
    let company_id = company(&service, "Acme", 5);
    let job_id = job(&service, &company_id, "Network Intern", 1);

    // Fill the job quota through the application path.
    let applicant = student(&service, "amina");
    let receipt = service
        .apply_to_job(&applicant, &job_id)
        .expect("application");
    service
        .decide_application(&receipt.application_id, &company_id, Decision::Accept)
        .expect("acceptance");

    // The invitation path is gated only by the soft cap at invite time, so
    // acceptance still succeeds with the job quota exhausted.
    let invitee = student(&service, "bilal");
    let invitation_id = service
        .invite_student(&company_id, &invitee, &job_id)
        .expect("soft cap has headroom");
    let summary = service
        .accept_invitation(&invitation_id, &invitee)
        .expect("not re-gated by the job quota");
    assert_eq!(summary.date_time, slot_at(15, 8, 20));

    store.read(|state| {
        let accepted = state
            .applications
            .values()
            .filter(|app| app.status == ApplicationStatus::Accepted)
            .count();
        assert_eq!(accepted, 2, "one per entry path");
    });
}

#[test]
fn acceptance_without_a_free_slot_leaves_the_invitation_pending() {
    let (service, _, _) = build_service_with(&tiny_window_config());
    let company_id = company(&service, "Acme", 10);
    let job_id = job(&service, &company_id, "Network Intern", 10);

    for key in ["a", "b", "c"] {
        let student_id = student(&service, key);
        let invitation_id = service
            .invite_student(&company_id, &student_id, &job_id)
            .expect("invitation");
        service
            .accept_invitation(&invitation_id, &student_id)
            .expect("slots remain");
    }

    let fourth = student(&service, "d");
    let invitation_id = service
        .invite_student(&company_id, &fourth, &job_id)
        .expect("invitation");
    match service.accept_invitation(&invitation_id, &fourth) {
        Err(PlacementError::Slot(SlotError::NoSlotAvailable)) => {}
        other => panic!("expected slot exhaustion, got {other:?}"),
    }
    assert_eq!(
        service.invitation(&invitation_id).expect("row intact").status,
        InvitationStatus::Pending
    );
}

#[test]
fn rejecting_an_invitation_has_no_ledger_effect() {
    let (service, store, _) = build_service();
    let company_id = company(&service, "Acme", 5);
    let job_id = job(&service, &company_id, "Network Intern", 3);
    let student_id = student(&service, "amina");
    let invitation_id = service
        .invite_student(&company_id, &student_id, &job_id)
        .expect("invitation");

    service
        .reject_invitation(&invitation_id, &student_id)
        .expect("rejection succeeds");
    assert_eq!(
        service.invitation(&invitation_id).expect("row exists").status,
        InvitationStatus::Rejected
    );
    assert!(matches!(
        service.reject_invitation(&invitation_id, &student_id),
        Err(PlacementError::AlreadyProcessed)
    ));
    store.read(|state| assert_eq!(state.ledger.len(), 1));
    assert_ledger_consistent(&store, &student_id);
}

#[test]
fn invitations_are_owner_only() {
    let (service, _, _) = build_service();
    let company_id = company(&service, "Acme", 5);
    let other_company = company(&service, "Globex", 5);
    let job_id = job(&service, &company_id, "Network Intern", 3);
    let student_id = student(&service, "amina");
    let stranger = student(&service, "bilal");

    assert!(matches!(
        service.invite_student(&other_company, &student_id, &job_id),
        Err(PlacementError::Unauthorized)
    ));

    let invitation_id = service
        .invite_student(&company_id, &student_id, &job_id)
        .expect("invitation");
    assert!(matches!(
        service.accept_invitation(&invitation_id, &stranger),
        Err(PlacementError::Unauthorized)
    ));
    assert!(matches!(
        service.reject_invitation(&invitation_id, &stranger),
        Err(PlacementError::Unauthorized)
    ));
}
