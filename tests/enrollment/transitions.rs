use super::store_harness::{program, temp_store};
use campuslink::error::MentorshipError;
use campuslink::mentorship::MentorshipService;
use campuslink::model::{Actor, EnrollmentStatus, Role};
use campuslink::store::ProgramStore;

fn owner() -> Actor {
    Actor::new("mentor-1", Role::Alumni)
}

fn participant() -> Actor {
    Actor::new("s1", Role::Student)
}

async fn service_with_enrollment() -> (tempfile::TempDir, MentorshipService) {
    let (tmp, store) = temp_store();
    store.insert_program(&program("p1", "mentor-1", 2)).await.unwrap();
    store.insert_program(&program("p2", "mentor-2", 2)).await.unwrap();
    let service = MentorshipService::new(store);
    service.enroll("s1", "p1").await.unwrap();
    (tmp, service)
}

#[tokio::test]
async fn completing_frees_the_student_to_enroll_elsewhere() {
    let (_tmp, service) = service_with_enrollment().await;

    let enrollment = service
        .set_status(&owner(), "p1", "s1", EnrollmentStatus::Completed)
        .await
        .unwrap();
    assert_eq!(enrollment.status, EnrollmentStatus::Completed);

    // The global slot is released immediately.
    let view = service.enroll("s1", "p2").await.unwrap();
    assert!(view.is_enrolled);
}

#[tokio::test]
async fn withdrawing_frees_the_student_too() {
    let (_tmp, service) = service_with_enrollment().await;

    service
        .set_status(&participant(), "p1", "s1", EnrollmentStatus::Withdrawn)
        .await
        .unwrap();
    assert!(service.enroll("s1", "p2").await.is_ok());
}

#[tokio::test]
async fn history_is_retained_after_a_transition() {
    let (_tmp, service) = service_with_enrollment().await;

    service
        .set_status(&owner(), "p1", "s1", EnrollmentStatus::Withdrawn)
        .await
        .unwrap();
    service.enroll("s1", "p1").await.unwrap();

    // One withdrawn row, one active row.
    assert_eq!(service.active_enrollment_count("p1").await.unwrap(), 1);
    let view = service.enrolled_program("s1").await.unwrap().unwrap();
    assert_eq!(view.program.id, "p1");
}

#[tokio::test]
async fn only_active_enrollments_can_transition() {
    let (_tmp, service) = service_with_enrollment().await;

    service
        .set_status(&owner(), "p1", "s1", EnrollmentStatus::Completed)
        .await
        .unwrap();
    let err = service
        .set_status(&owner(), "p1", "s1", EnrollmentStatus::Withdrawn)
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        MentorshipError::InvalidTransition {
            from: EnrollmentStatus::Completed,
            to: EnrollmentStatus::Withdrawn,
        }
    ));
}

#[tokio::test]
async fn reactivating_is_never_a_valid_transition() {
    let (_tmp, service) = service_with_enrollment().await;

    let err = service
        .set_status(&owner(), "p1", "s1", EnrollmentStatus::Active)
        .await
        .unwrap_err();
    assert!(matches!(err, MentorshipError::InvalidTransition { .. }));
}

#[tokio::test]
async fn transition_without_any_enrollment_is_not_found() {
    let (_tmp, service) = service_with_enrollment().await;

    let err = service
        .set_status(&owner(), "p1", "s-unknown", EnrollmentStatus::Completed)
        .await
        .unwrap_err();
    assert!(matches!(err, MentorshipError::NotEnrolled { .. }));
}

#[tokio::test]
async fn only_the_owner_or_the_participant_may_transition() {
    let (_tmp, service) = service_with_enrollment().await;

    let stranger = Actor::new("s-other", Role::Student);
    let err = service
        .set_status(&stranger, "p1", "s1", EnrollmentStatus::Completed)
        .await
        .unwrap_err();
    assert!(matches!(err, MentorshipError::NotPermitted));

    // The participant may withdraw themself.
    assert!(service
        .set_status(&participant(), "p1", "s1", EnrollmentStatus::Withdrawn)
        .await
        .is_ok());
}
