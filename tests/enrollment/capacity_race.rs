use super::store_harness::{program, temp_store};
use campuslink::error::MentorshipError;
use campuslink::mentorship::MentorshipService;
use campuslink::store::{ProgramStore, SqliteStore};
use std::sync::Arc;

async fn race<F>(make_service: F) -> Vec<Result<(), MentorshipError>>
where
    F: Fn() -> (MentorshipService, String, String),
{
    let mut tasks = Vec::new();
    for _ in 0..2 {
        let (service, student_id, program_id) = make_service();
        tasks.push(tokio::spawn(async move {
            service
                .enroll(&student_id, &program_id)
                .await
                .map(|_| ())
        }));
    }
    let mut outcomes = Vec::new();
    for task in tasks {
        outcomes.push(task.await.unwrap());
    }
    outcomes
}

#[tokio::test(flavor = "multi_thread")]
async fn capacity_one_admits_exactly_one_of_two_concurrent_students() {
    let (_tmp, store) = temp_store();
    store.insert_program(&program("p1", "mentor-1", 1)).await.unwrap();

    let students = std::sync::Mutex::new(vec!["s1".to_string(), "s2".to_string()]);
    let outcomes = race(|| {
        let student = students.lock().unwrap().pop().unwrap();
        (
            MentorshipService::new(store.clone()),
            student,
            "p1".to_string(),
        )
    })
    .await;

    let successes = outcomes.iter().filter(|o| o.is_ok()).count();
    assert_eq!(successes, 1, "exactly one enrollment may win");
    let loser = outcomes.into_iter().find(Result::is_err).unwrap().unwrap_err();
    assert!(matches!(loser, MentorshipError::ProgramFull(_)));

    assert_eq!(active_count(&store, "p1").await, 1);
}

#[tokio::test(flavor = "multi_thread")]
async fn one_student_racing_two_programs_lands_in_exactly_one() {
    let (_tmp, store) = temp_store();
    store.insert_program(&program("p1", "mentor-1", 5)).await.unwrap();
    store.insert_program(&program("p2", "mentor-2", 5)).await.unwrap();

    let programs = std::sync::Mutex::new(vec!["p1".to_string(), "p2".to_string()]);
    let outcomes = race(|| {
        let program_id = programs.lock().unwrap().pop().unwrap();
        (
            MentorshipService::new(store.clone()),
            "s1".to_string(),
            program_id,
        )
    })
    .await;

    let successes = outcomes.iter().filter(|o| o.is_ok()).count();
    assert_eq!(successes, 1, "the one-program rule admits a single win");
    let loser = outcomes.into_iter().find(Result::is_err).unwrap().unwrap_err();
    assert!(matches!(loser, MentorshipError::AlreadyEnrolledElsewhere));

    let active = store.active_enrollment("s1").await.unwrap();
    assert!(active.is_some());
    assert_eq!(
        active_count(&store, "p1").await + active_count(&store, "p2").await,
        1
    );
}

async fn active_count(store: &Arc<SqliteStore>, program_id: &str) -> usize {
    store
        .enrollments_for_program(program_id)
        .await
        .unwrap()
        .iter()
        .filter(|e| e.status == campuslink::model::EnrollmentStatus::Active)
        .count()
}
