use super::store_harness::temp_store;
use campuslink::model::SkillMatchRecord;
use campuslink::store::MatchStore;
use chrono::Utc;

fn record(percentage: f64, matched: &[&str]) -> SkillMatchRecord {
    SkillMatchRecord {
        student_id: "s1".to_string(),
        job_id: "j1".to_string(),
        matched_skills: matched.iter().map(ToString::to_string).collect(),
        match_percentage: percentage,
        total_job_skills: 4,
        student_matching_skills_count: u32::try_from(matched.len()).unwrap(),
        updated_at: Utc::now(),
    }
}

#[tokio::test]
async fn writing_the_same_pair_twice_leaves_one_row_with_later_values() {
    let (_tmp, store) = temp_store();

    store.upsert_match(&record(25.0, &["rust"])).await.unwrap();
    store
        .upsert_match(&record(50.0, &["rust", "sql"]))
        .await
        .unwrap();

    let rows = store.matches_for_student("s1", 0.0).await.unwrap();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].match_percentage, 50.0);
    assert_eq!(rows[0].matched_skills, vec!["rust", "sql"]);
}

#[tokio::test]
async fn identical_rewrites_are_idempotent() {
    let (_tmp, store) = temp_store();
    let rec = record(75.0, &["rust", "sql", "go"]);

    store.upsert_match(&rec).await.unwrap();
    store.upsert_match(&rec).await.unwrap();

    let found = store.find_match("s1", "j1").await.unwrap().unwrap();
    assert_eq!(found.match_percentage, 75.0);
    assert_eq!(store.matches_for_student("s1", 0.0).await.unwrap().len(), 1);
}

#[tokio::test]
async fn concurrent_recomputation_of_one_pair_keeps_a_single_row() {
    let (_tmp, store) = temp_store();

    let mut tasks = Vec::new();
    for pct in [10.0, 20.0, 30.0, 40.0] {
        let store = store.clone();
        tasks.push(tokio::spawn(async move {
            store.upsert_match(&record(pct, &["rust"])).await
        }));
    }
    for task in tasks {
        task.await.unwrap().unwrap();
    }

    assert_eq!(store.matches_for_student("s1", 0.0).await.unwrap().len(), 1);
}
