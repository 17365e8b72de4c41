use super::AppState;
use crate::error::{MatchError, MentorshipError, SearchError};
use crate::mentorship::{ContentDraft, ProgramDraft, ProgramPatch};
use crate::model::{Actor, ContentKind, EnrollmentStatus, Role};
use crate::search::SearchScope;
use crate::store::ProgramFilter;
use axum::{
    extract::{Path, Query, State},
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Json, Response},
};
use serde::Deserialize;
use serde_json::json;

// ── Error translation ────────────────────────────────────────────

/// A domain failure flattened to a status code and user-facing message.
pub(super) struct ApiError {
    status: StatusCode,
    message: String,
}

impl ApiError {
    fn new(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
        }
    }

    fn bad_request(message: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, message)
    }

    fn unauthorized() -> Self {
        Self::new(
            StatusCode::UNAUTHORIZED,
            "missing or invalid actor identity",
        )
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = json!({ "success": false, "message": self.message });
        (self.status, Json(body)).into_response()
    }
}

impl From<MatchError> for ApiError {
    fn from(err: MatchError) -> Self {
        let status = match &err {
            MatchError::StudentNotFound(_) | MatchError::JobNotFound(_) => StatusCode::NOT_FOUND,
            MatchError::NoSkillsListed(_) => StatusCode::BAD_REQUEST,
            MatchError::Store(_) => StatusCode::SERVICE_UNAVAILABLE,
        };
        Self::new(status, err.to_string())
    }
}

impl From<MentorshipError> for ApiError {
    fn from(err: MentorshipError) -> Self {
        let status = match &err {
            MentorshipError::ProgramNotFound(_) | MentorshipError::NotEnrolled { .. } => {
                StatusCode::NOT_FOUND
            }
            MentorshipError::AlreadyEnrolledInProgram
            | MentorshipError::AlreadyEnrolledElsewhere
            | MentorshipError::ProgramFull(_)
            | MentorshipError::InvalidTransition { .. } => StatusCode::CONFLICT,
            MentorshipError::NotPermitted => StatusCode::FORBIDDEN,
            MentorshipError::ProgramInactive(_)
            | MentorshipError::InvalidProgram(_)
            | MentorshipError::InvalidContent(_) => StatusCode::BAD_REQUEST,
            MentorshipError::Store(_) => StatusCode::SERVICE_UNAVAILABLE,
        };
        Self::new(status, err.to_string())
    }
}

impl From<SearchError> for ApiError {
    fn from(err: SearchError) -> Self {
        match err {
            SearchError::EmptyQuery => Self::bad_request(err.to_string()),
        }
    }
}

/// Resolve the upstream-authenticated caller from headers.
fn actor_from_headers(headers: &HeaderMap) -> Result<Actor, ApiError> {
    let id = headers
        .get("X-Actor-Id")
        .and_then(|v| v.to_str().ok())
        .filter(|v| !v.is_empty())
        .ok_or_else(ApiError::unauthorized)?;
    let role = headers
        .get("X-Actor-Role")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.parse::<Role>().ok())
        .ok_or_else(ApiError::unauthorized)?;
    Ok(Actor::new(id, role))
}

// ── Health ───────────────────────────────────────────────────────

pub(super) async fn handle_health() -> impl IntoResponse {
    Json(json!({ "status": "ok" }))
}

// ── Skill matching ───────────────────────────────────────────────

#[derive(Deserialize)]
pub(super) struct MinMatchQuery {
    #[serde(default)]
    min_match: f64,
}

pub(super) async fn handle_recompute(
    State(state): State<AppState>,
    Path(student_id): Path<String>,
) -> Result<Response, ApiError> {
    let report = state.matching.recompute_for_student(&student_id).await?;
    Ok(Json(json!({
        "success": true,
        "student_id": report.student_id,
        "student_skills": report.student_skills,
        "total_jobs": report.total_jobs,
        "matches": report.matches,
    }))
    .into_response())
}

pub(super) async fn handle_student_matches(
    State(state): State<AppState>,
    Path(student_id): Path<String>,
    Query(query): Query<MinMatchQuery>,
) -> Result<Response, ApiError> {
    let matches = state
        .matching
        .matches_for_student(&student_id, query.min_match)
        .await?;
    Ok(Json(json!({
        "success": true,
        "student_id": student_id,
        "total_matches": matches.len(),
        "matches": matches,
    }))
    .into_response())
}

pub(super) async fn handle_job_candidates(
    State(state): State<AppState>,
    Path(job_id): Path<String>,
    Query(query): Query<MinMatchQuery>,
) -> Result<Response, ApiError> {
    let matches = state
        .matching
        .candidates_for_job(&job_id, query.min_match)
        .await?;
    Ok(Json(json!({
        "success": true,
        "job_id": job_id,
        "total_candidates": matches.len(),
        "matches": matches,
    }))
    .into_response())
}

pub(super) async fn handle_pair_match(
    State(state): State<AppState>,
    Path((student_id, job_id)): Path<(String, String)>,
) -> Result<Response, ApiError> {
    let pair = state.matching.match_for_pair(&student_id, &job_id).await?;
    Ok(Json(json!({ "success": true, "match": pair })).into_response())
}

// ── Mentorship ───────────────────────────────────────────────────

pub(super) async fn handle_create_program(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(draft): Json<ProgramDraft>,
) -> Result<Response, ApiError> {
    let actor = actor_from_headers(&headers)?;
    let program = state.mentorship.create_program(&actor, draft).await?;
    Ok((
        StatusCode::CREATED,
        Json(json!({ "success": true, "program": program })),
    )
        .into_response())
}

#[derive(Deserialize)]
pub(super) struct ProgramListQuery {
    #[serde(default = "default_page")]
    page: u32,
    #[serde(default = "default_page_limit")]
    limit: u32,
    #[serde(default)]
    search: Option<String>,
    #[serde(default)]
    topic: Option<String>,
    #[serde(default)]
    max_cost: Option<f64>,
    /// `mine=true` lists the caller's own programs, inactive included.
    #[serde(default)]
    mine: bool,
    /// Admin-only: `status=inactive` or `status=all` widens visibility.
    #[serde(default)]
    status: Option<String>,
}

fn default_page() -> u32 {
    1
}

fn default_page_limit() -> u32 {
    10
}

const MAX_PAGE_LIMIT: u32 = 100;

pub(super) async fn handle_list_programs(
    State(state): State<AppState>,
    headers: HeaderMap,
    Query(query): Query<ProgramListQuery>,
) -> Result<Response, ApiError> {
    let actor = actor_from_headers(&headers)?;

    let mut filter = ProgramFilter {
        active_only: true,
        search: query.search,
        topic: query.topic,
        max_cost: query.max_cost,
        page: query.page.max(1),
        limit: query.limit.clamp(1, MAX_PAGE_LIMIT),
        ..ProgramFilter::default()
    };
    if query.mine {
        filter.owner_id = Some(actor.id.clone());
        filter.active_only = false;
    } else if actor.role == Role::Admin {
        filter.active_only = !matches!(query.status.as_deref(), Some("inactive" | "all"));
    }

    let listing = state.mentorship.list_programs(&actor, filter).await?;
    Ok(Json(json!({
        "success": true,
        "count": listing.count,
        "total": listing.total,
        "page": listing.page,
        "pages": listing.pages,
        "programs": listing.programs,
    }))
    .into_response())
}

pub(super) async fn handle_program_details(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(program_id): Path<String>,
) -> Result<Response, ApiError> {
    let actor = actor_from_headers(&headers)?;
    let program = state.mentorship.program_details(&actor, &program_id).await?;
    Ok(Json(json!({ "success": true, "program": program })).into_response())
}

pub(super) async fn handle_update_program(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(program_id): Path<String>,
    Json(patch): Json<ProgramPatch>,
) -> Result<Response, ApiError> {
    let actor = actor_from_headers(&headers)?;
    let program = state
        .mentorship
        .update_program(&actor, &program_id, patch)
        .await?;
    Ok(Json(json!({ "success": true, "program": program })).into_response())
}

pub(super) async fn handle_enroll(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(program_id): Path<String>,
) -> Result<Response, ApiError> {
    let actor = actor_from_headers(&headers)?;
    let program = state.mentorship.enroll(&actor.id, &program_id).await?;
    Ok(Json(json!({
        "success": true,
        "message": "successfully enrolled in mentorship program",
        "program": program,
    }))
    .into_response())
}

#[derive(Deserialize)]
pub(super) struct StatusBody {
    status: String,
}

pub(super) async fn handle_set_enrollment_status(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path((program_id, student_id)): Path<(String, String)>,
    Json(body): Json<StatusBody>,
) -> Result<Response, ApiError> {
    let actor = actor_from_headers(&headers)?;
    let status = body
        .status
        .parse::<EnrollmentStatus>()
        .map_err(|_| ApiError::bad_request(format!("unknown status: {}", body.status)))?;
    let enrollment = state
        .mentorship
        .set_status(&actor, &program_id, &student_id, status)
        .await?;
    Ok(Json(json!({ "success": true, "enrollment": enrollment })).into_response())
}

pub(super) async fn handle_my_program(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Response, ApiError> {
    let actor = actor_from_headers(&headers)?;
    match state.mentorship.enrolled_program(&actor.id).await? {
        Some(program) => {
            Ok(Json(json!({ "success": true, "program": program })).into_response())
        }
        None => Ok((
            StatusCode::NOT_FOUND,
            Json(json!({
                "success": false,
                "message": "no active mentorship program found",
            })),
        )
            .into_response()),
    }
}

#[derive(Deserialize)]
pub(super) struct ContentQuery {
    #[serde(default)]
    kind: Option<String>,
}

pub(super) async fn handle_add_content(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(program_id): Path<String>,
    Json(draft): Json<ContentDraft>,
) -> Result<Response, ApiError> {
    let actor = actor_from_headers(&headers)?;
    let content = state
        .mentorship
        .add_content(&actor, &program_id, draft)
        .await?;
    Ok((
        StatusCode::CREATED,
        Json(json!({ "success": true, "content": content })),
    )
        .into_response())
}

pub(super) async fn handle_list_content(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(program_id): Path<String>,
    Query(query): Query<ContentQuery>,
) -> Result<Response, ApiError> {
    let actor = actor_from_headers(&headers)?;
    let kind = match query.kind {
        Some(raw) => Some(
            raw.parse::<ContentKind>()
                .map_err(|_| ApiError::bad_request(format!("unknown content kind: {raw}")))?,
        ),
        None => None,
    };
    let content = state
        .mentorship
        .list_content(&actor, &program_id, kind)
        .await?;
    Ok(Json(json!({
        "success": true,
        "count": content.len(),
        "content": content,
    }))
    .into_response())
}

// ── Search ───────────────────────────────────────────────────────

#[derive(Deserialize)]
pub(super) struct SearchQuery {
    #[serde(default)]
    query: String,
    #[serde(default)]
    scope: Option<String>,
    #[serde(default)]
    limit: Option<u32>,
}

pub(super) async fn handle_search(
    State(state): State<AppState>,
    Query(params): Query<SearchQuery>,
) -> Result<Response, ApiError> {
    let scope = match params.scope.as_deref() {
        None | Some("") => SearchScope::All,
        Some(raw) => raw
            .parse::<SearchScope>()
            .map_err(|_| ApiError::bad_request(format!("unknown search scope: {raw}")))?,
    };
    let limit = params
        .limit
        .unwrap_or(state.default_search_limit)
        .clamp(1, state.max_search_limit);

    let results = state.search.search(&params.query, scope, limit).await?;
    Ok(Json(json!({
        "success": true,
        "query": results.query,
        "total_results": results.total_results,
        "results": {
            "students": results.students,
            "alumni": results.alumni,
            "employers": results.employers,
            "companies": results.companies,
        },
    }))
    .into_response())
}
