use super::store_harness::{program, temp_store};
use campuslink::error::MentorshipError;
use campuslink::mentorship::MentorshipService;
use campuslink::store::ProgramStore;

#[tokio::test]
async fn enrolling_in_an_unknown_program_is_not_found() {
    let (_tmp, store) = temp_store();
    let service = MentorshipService::new(store);

    let err = service.enroll("s1", "ghost").await.unwrap_err();
    assert!(matches!(err, MentorshipError::ProgramNotFound(id) if id == "ghost"));
}

#[tokio::test]
async fn enrolling_in_an_inactive_program_is_rejected() {
    let (_tmp, store) = temp_store();
    let mut p = program("p1", "mentor-1", 5);
    p.is_active = false;
    store.insert_program(&p).await.unwrap();
    let service = MentorshipService::new(store);

    let err = service.enroll("s1", "p1").await.unwrap_err();
    assert!(matches!(err, MentorshipError::ProgramInactive(_)));
}

#[tokio::test]
async fn successful_enrollment_returns_the_updated_projection() {
    let (_tmp, store) = temp_store();
    store.insert_program(&program("p1", "mentor-1", 3)).await.unwrap();
    let service = MentorshipService::new(store);

    let view = service.enroll("s1", "p1").await.unwrap();
    assert_eq!(view.active_enrollments, 1);
    assert_eq!(view.available_slots, 2);
    assert!(view.is_enrolled);
    assert!(!view.is_full);
}

#[tokio::test]
async fn double_enrollment_in_the_same_program_is_a_conflict() {
    let (_tmp, store) = temp_store();
    store.insert_program(&program("p1", "mentor-1", 5)).await.unwrap();
    let service = MentorshipService::new(store);

    service.enroll("s1", "p1").await.unwrap();
    let err = service.enroll("s1", "p1").await.unwrap_err();
    assert!(matches!(err, MentorshipError::AlreadyEnrolledInProgram));
}

#[tokio::test]
async fn an_active_enrollment_anywhere_blocks_enrolling_elsewhere() {
    let (_tmp, store) = temp_store();
    store.insert_program(&program("p1", "mentor-1", 5)).await.unwrap();
    // Plenty of room in p2; the rejection is about the student, not p2.
    store.insert_program(&program("p2", "mentor-2", 100)).await.unwrap();
    let service = MentorshipService::new(store);

    service.enroll("s1", "p1").await.unwrap();
    let err = service.enroll("s1", "p2").await.unwrap_err();
    assert!(matches!(err, MentorshipError::AlreadyEnrolledElsewhere));
}

#[tokio::test]
async fn a_full_program_rejects_further_enrollment() {
    let (_tmp, store) = temp_store();
    store.insert_program(&program("p1", "mentor-1", 1)).await.unwrap();
    let service = MentorshipService::new(store);

    service.enroll("s1", "p1").await.unwrap();
    let err = service.enroll("s2", "p1").await.unwrap_err();
    assert!(matches!(err, MentorshipError::ProgramFull(_)));
}

#[tokio::test]
async fn derived_queries_track_occupancy() {
    let (_tmp, store) = temp_store();
    store.insert_program(&program("p1", "mentor-1", 2)).await.unwrap();
    let service = MentorshipService::new(store);

    assert_eq!(service.active_enrollment_count("p1").await.unwrap(), 0);
    assert!(!service.is_full("p1").await.unwrap());
    assert!(!service.is_enrolled("p1", "s1").await.unwrap());

    service.enroll("s1", "p1").await.unwrap();
    service.enroll("s2", "p1").await.unwrap();

    assert_eq!(service.active_enrollment_count("p1").await.unwrap(), 2);
    assert!(service.is_full("p1").await.unwrap());
    assert!(service.is_enrolled("p1", "s1").await.unwrap());

    let mine = service.enrolled_program("s1").await.unwrap().unwrap();
    assert_eq!(mine.program.id, "p1");
    assert!(service.enrolled_program("s3").await.unwrap().is_none());
}
