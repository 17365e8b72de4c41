//! Axum HTTP surface over the domain services.
//!
//! Handlers only translate: extract the actor and parameters, call the
//! core operation, map its typed error onto a status code. Body limits
//! and per-request timeouts follow the gateway config. Authentication
//! happens upstream; the resolved identity arrives in `X-Actor-Id` /
//! `X-Actor-Role` headers.

mod handlers;

use crate::config::Config;
use crate::matching::MatchEngine;
use crate::mentorship::MentorshipService;
use crate::search::SearchAggregator;
use crate::store::SqliteStore;
use anyhow::Result;
use axum::{
    http::StatusCode,
    routing::{get, post, put},
    Router,
};
use handlers::{
    handle_add_content, handle_create_program, handle_enroll, handle_health,
    handle_job_candidates, handle_list_content, handle_list_programs, handle_my_program,
    handle_pair_match, handle_program_details, handle_recompute, handle_search,
    handle_set_enrollment_status, handle_student_matches, handle_update_program,
};
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tower_http::cors::CorsLayer;
use tower_http::limit::RequestBodyLimitLayer;
use tower_http::timeout::TimeoutLayer;

/// Shared state for all axum handlers
#[derive(Clone)]
pub struct AppState {
    pub matching: Arc<MatchEngine>,
    pub mentorship: Arc<MentorshipService>,
    pub search: Arc<SearchAggregator>,
    pub default_search_limit: u32,
    pub max_search_limit: u32,
}

impl AppState {
    pub fn new(store: Arc<SqliteStore>, config: &Config) -> Self {
        Self {
            matching: Arc::new(MatchEngine::new(store.clone())),
            mentorship: Arc::new(MentorshipService::new(store.clone())),
            search: Arc::new(SearchAggregator::new(store.clone(), store)),
            default_search_limit: config.search.default_limit,
            max_search_limit: config.search.max_limit,
        }
    }
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(handle_health))
        // ── Skill matching ───────────────────────────────────────
        .route(
            "/api/matches/students/{student_id}/recompute",
            post(handle_recompute),
        )
        .route("/api/matches/students/{student_id}", get(handle_student_matches))
        .route(
            "/api/matches/jobs/{job_id}/candidates",
            get(handle_job_candidates),
        )
        .route(
            "/api/matches/students/{student_id}/jobs/{job_id}",
            get(handle_pair_match),
        )
        // ── Mentorship ───────────────────────────────────────────
        .route(
            "/api/mentorship/programs",
            get(handle_list_programs).post(handle_create_program),
        )
        .route(
            "/api/mentorship/programs/{program_id}",
            get(handle_program_details).put(handle_update_program),
        )
        .route(
            "/api/mentorship/programs/{program_id}/enroll",
            post(handle_enroll),
        )
        .route(
            "/api/mentorship/programs/{program_id}/enrollments/{student_id}",
            put(handle_set_enrollment_status),
        )
        .route("/api/mentorship/my-program", get(handle_my_program))
        .route(
            "/api/mentorship/programs/{program_id}/content",
            get(handle_list_content).post(handle_add_content),
        )
        // ── Search ───────────────────────────────────────────────
        .route("/api/search", get(handle_search))
        .with_state(state)
}

/// Bind and serve until the task is cancelled.
pub async fn run_gateway(config: &Config, state: AppState) -> Result<()> {
    let addr: SocketAddr = format!("{}:{}", config.gateway.host, config.gateway.port).parse()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    let actual = listener.local_addr()?;

    let mut app = router(state)
        .layer(RequestBodyLimitLayer::new(config.gateway.max_body_bytes))
        .layer(TimeoutLayer::with_status_code(
            StatusCode::REQUEST_TIMEOUT,
            Duration::from_secs(config.gateway.request_timeout_secs),
        ));

    if !config.gateway.cors_origins.is_empty() {
        let origins: Vec<_> = config
            .gateway
            .cors_origins
            .iter()
            .filter_map(|o| o.parse().ok())
            .collect();
        app = app.layer(
            CorsLayer::new()
                .allow_origin(origins)
                .allow_methods([
                    axum::http::Method::GET,
                    axum::http::Method::POST,
                    axum::http::Method::PUT,
                ])
                .allow_headers([axum::http::header::CONTENT_TYPE]),
        );
    }

    tracing::info!("gateway listening on http://{actual}");
    axum::serve(listener, app).await?;
    Ok(())
}
