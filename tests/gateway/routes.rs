use super::store_harness::{program, student, temp_store};
use campuslink::config::Config;
use campuslink::gateway::{router, AppState};
use campuslink::store::{ProgramStore, SqliteStore, UserStore};
use reqwest::StatusCode;
use std::net::SocketAddr;
use std::sync::Arc;
use tempfile::TempDir;

async fn serve(tmp: &TempDir, store: Arc<SqliteStore>) -> SocketAddr {
    let config = Config::load_from(tmp.path()).expect("config");
    let app = router(AppState::new(store, &config));
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("bind");
    let addr = listener.local_addr().expect("local addr");
    tokio::spawn(async move {
        axum::serve(listener, app).await.expect("serve");
    });
    addr
}

#[tokio::test]
async fn health_is_public() {
    let (tmp, store) = temp_store();
    let addr = serve(&tmp, store).await;

    let res = reqwest::get(format!("http://{addr}/health")).await.unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let body: serde_json::Value = res.json().await.unwrap();
    assert_eq!(body["status"], "ok");
}

#[tokio::test]
async fn domain_failures_map_onto_status_codes() {
    let (tmp, store) = temp_store();
    store.insert_program(&program("p1", "mentor-1", 1)).await.unwrap();
    store.upsert_user(&student("s-blank", &[])).await.unwrap();
    let addr = serve(&tmp, store).await;
    let client = reqwest::Client::new();

    // Unknown student -> 404
    let res = client
        .post(format!("http://{addr}/api/matches/students/ghost/recompute"))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::NOT_FOUND);

    // Empty skill profile -> 400
    let res = client
        .post(format!("http://{addr}/api/matches/students/s-blank/recompute"))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);

    // Enroll without upstream identity -> 401
    let res = client
        .post(format!("http://{addr}/api/mentorship/programs/p1/enroll"))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);

    // First enrollment wins, the duplicate is a conflict.
    let enroll = |id: &str| {
        client
            .post(format!("http://{addr}/api/mentorship/programs/p1/enroll"))
            .header("X-Actor-Id", id.to_string())
            .header("X-Actor-Role", "student")
            .send()
    };
    assert_eq!(enroll("s1").await.unwrap().status(), StatusCode::OK);
    assert_eq!(enroll("s1").await.unwrap().status(), StatusCode::CONFLICT);
    // Capacity 1: the next student hits 409 too.
    assert_eq!(enroll("s2").await.unwrap().status(), StatusCode::CONFLICT);

    // Unknown program -> 404
    let res = client
        .post(format!("http://{addr}/api/mentorship/programs/ghost/enroll"))
        .header("X-Actor-Id", "s3")
        .header("X-Actor-Role", "student")
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn search_validation_happens_at_the_edge() {
    let (tmp, store) = temp_store();
    let addr = serve(&tmp, store).await;
    let client = reqwest::Client::new();

    let res = client
        .get(format!("http://{addr}/api/search?query="))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);

    let res = client
        .get(format!("http://{addr}/api/search?query=x&scope=galaxies"))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);

    let res = client
        .get(format!("http://{addr}/api/search?query=nobody-here"))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let body: serde_json::Value = res.json().await.unwrap();
    assert_eq!(body["total_results"], 0);
    assert!(body["results"]["students"].as_array().unwrap().is_empty());
}

#[tokio::test]
async fn program_lifecycle_over_http() {
    let (tmp, store) = temp_store();
    let addr = serve(&tmp, store).await;
    let client = reqwest::Client::new();

    let res = client
        .post(format!("http://{addr}/api/mentorship/programs"))
        .header("X-Actor-Id", "mentor-1")
        .header("X-Actor-Role", "alumni")
        .json(&serde_json::json!({
            "title": "Rust mentoring",
            "description": "Weekly pairing",
            "capacity": 2,
            "topics": ["rust"],
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::CREATED);
    let body: serde_json::Value = res.json().await.unwrap();
    let program_id = body["program"]["id"].as_str().unwrap().to_string();

    let res = client
        .post(format!(
            "http://{addr}/api/mentorship/programs/{program_id}/enroll"
        ))
        .header("X-Actor-Id", "s1")
        .header("X-Actor-Role", "student")
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let body: serde_json::Value = res.json().await.unwrap();
    assert_eq!(body["program"]["active_enrollments"], 1);
    assert_eq!(body["program"]["is_enrolled"], true);

    let res = client
        .get(format!("http://{addr}/api/mentorship/my-program"))
        .header("X-Actor-Id", "s1")
        .header("X-Actor-Role", "student")
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);

    // Completing over HTTP frees the slot.
    let res = client
        .put(format!(
            "http://{addr}/api/mentorship/programs/{program_id}/enrollments/s1"
        ))
        .header("X-Actor-Id", "mentor-1")
        .header("X-Actor-Role", "alumni")
        .json(&serde_json::json!({ "status": "completed" }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);

    let res = client
        .get(format!("http://{addr}/api/mentorship/my-program"))
        .header("X-Actor-Id", "s1")
        .header("X-Actor-Role", "student")
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::NOT_FOUND);
}
