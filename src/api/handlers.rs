//! API request handlers

use crate::recruitment::*;
use crate::store::{Stats, StoreError, SyncStore, SyncSummary};
use crate::Config;
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Shared server state
pub struct ServerState {
    pub store: Arc<SyncStore>,
    pub config: Arc<Config>,
}

/// Shared handler state
pub type SwaproState = Arc<ServerState>;

type ApiResult<T> = Result<T, AppError>;

// ============================================================================
// Health check
// ============================================================================

/// Health check response
#[derive(Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub listeners: usize,
    pub stream_clients: usize,
    pub event_capacity: usize,
    pub sync_delay_ms: u64,
}

pub async fn health(State(state): State<SwaproState>) -> Json<HealthResponse> {
    let bus = state.store.bus();
    let listeners: usize = crate::events::Topic::ALL
        .iter()
        .map(|t| bus.listener_count(*t))
        .sum();
    Json(HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        listeners,
        stream_clients: bus.stream_count(),
        event_capacity: state.config.event_capacity,
        sync_delay_ms: state.config.sync_delay_ms,
    })
}

// ============================================================================
// Jobs
// ============================================================================

pub async fn list_jobs(State(state): State<SwaproState>) -> Json<Vec<Job>> {
    Json(state.store.get_jobs())
}

pub async fn create_job(
    State(state): State<SwaproState>,
    Json(req): Json<CreateJobRequest>,
) -> ApiResult<(StatusCode, Json<Job>)> {
    if req.title.trim().is_empty() {
        return Err(AppError::BadRequest("title is required".into()));
    }
    let job = state.store.add_job(req.into_job())?;
    Ok((StatusCode::CREATED, Json(job)))
}

pub async fn get_job(
    State(state): State<SwaproState>,
    Path(id): Path<String>,
) -> ApiResult<Json<Job>> {
    state
        .store
        .get_job(&id)
        .map(Json)
        .ok_or_else(|| StoreError::not_found::<Job>(id).into())
}

pub async fn update_job(
    State(state): State<SwaproState>,
    Path(id): Path<String>,
    Json(req): Json<UpdateJobRequest>,
) -> ApiResult<Json<Job>> {
    Ok(Json(state.store.update_job(&id, req)?))
}

pub async fn delete_job(
    State(state): State<SwaproState>,
    Path(id): Path<String>,
) -> ApiResult<StatusCode> {
    state.store.delete_job(&id)?;
    Ok(StatusCode::NO_CONTENT)
}

// ============================================================================
// Candidates
// ============================================================================

pub async fn list_candidates(State(state): State<SwaproState>) -> Json<Vec<Candidate>> {
    Json(state.store.get_candidates())
}

pub async fn create_candidate(
    State(state): State<SwaproState>,
    Json(req): Json<CreateCandidateRequest>,
) -> ApiResult<(StatusCode, Json<Candidate>)> {
    let candidate = state.store.add_candidate(req.into_candidate())?;
    Ok((StatusCode::CREATED, Json(candidate)))
}

pub async fn get_candidate(
    State(state): State<SwaproState>,
    Path(id): Path<String>,
) -> ApiResult<Json<Candidate>> {
    state
        .store
        .get_candidate(&id)
        .map(Json)
        .ok_or_else(|| StoreError::not_found::<Candidate>(id).into())
}

pub async fn update_candidate(
    State(state): State<SwaproState>,
    Path(id): Path<String>,
    Json(req): Json<UpdateCandidateRequest>,
) -> ApiResult<Json<Candidate>> {
    Ok(Json(state.store.update_candidate(&id, req)?))
}

pub async fn candidate_applications(
    State(state): State<SwaproState>,
    Path(id): Path<String>,
) -> Json<Vec<Application>> {
    Json(state.store.get_applications_by_candidate(&id))
}

pub async fn candidate_interviews(
    State(state): State<SwaproState>,
    Path(id): Path<String>,
) -> Json<Vec<Interview>> {
    Json(state.store.get_interviews_by_candidate(&id))
}

// ============================================================================
// Documents
// ============================================================================

pub async fn list_documents(
    State(state): State<SwaproState>,
    Path(candidate_id): Path<String>,
) -> Json<Vec<Document>> {
    Json(state.store.get_documents(&candidate_id))
}

pub async fn create_document(
    State(state): State<SwaproState>,
    Path(candidate_id): Path<String>,
    Json(req): Json<CreateDocumentRequest>,
) -> ApiResult<(StatusCode, Json<Document>)> {
    let document = state.store.add_document(req.into_document(candidate_id))?;
    Ok((StatusCode::CREATED, Json(document)))
}

pub async fn update_document(
    State(state): State<SwaproState>,
    Path((candidate_id, document_id)): Path<(String, String)>,
    Json(req): Json<UpdateDocumentRequest>,
) -> ApiResult<Json<Document>> {
    Ok(Json(
        state.store.update_document(&candidate_id, &document_id, req)?,
    ))
}

// ============================================================================
// Applications
// ============================================================================

/// Query filters for listing applications
#[derive(Debug, Deserialize, Default)]
pub struct ApplicationQuery {
    pub candidate_id: Option<String>,
    pub job_id: Option<String>,
}

pub async fn list_applications(
    State(state): State<SwaproState>,
    Query(query): Query<ApplicationQuery>,
) -> Json<Vec<Application>> {
    let applications = match (&query.candidate_id, &query.job_id) {
        (Some(candidate_id), Some(job_id)) => {
            let mut mine = state.store.get_applications_by_candidate(candidate_id);
            mine.retain(|a| &a.job_id == job_id);
            mine
        }
        (Some(candidate_id), None) => state.store.get_applications_by_candidate(candidate_id),
        (None, Some(job_id)) => state.store.get_applications_by_job(job_id),
        (None, None) => state.store.get_applications(),
    };
    Json(applications)
}

pub async fn create_application(
    State(state): State<SwaproState>,
    Json(req): Json<CreateApplicationRequest>,
) -> ApiResult<(StatusCode, Json<Application>)> {
    let application = state.store.add_application(req.into_application())?;
    Ok((StatusCode::CREATED, Json(application)))
}

pub async fn get_application(
    State(state): State<SwaproState>,
    Path(id): Path<String>,
) -> ApiResult<Json<Application>> {
    state
        .store
        .get_application(&id)
        .map(Json)
        .ok_or_else(|| StoreError::not_found::<Application>(id).into())
}

pub async fn update_application(
    State(state): State<SwaproState>,
    Path(id): Path<String>,
    Json(req): Json<UpdateApplicationRequest>,
) -> ApiResult<Json<Application>> {
    Ok(Json(state.store.update_application(&id, req)?))
}

// ============================================================================
// Messages
// ============================================================================

pub async fn list_messages(
    State(state): State<SwaproState>,
    Path(application_id): Path<String>,
) -> Json<Vec<Message>> {
    Json(state.store.get_messages(&application_id))
}

pub async fn create_message(
    State(state): State<SwaproState>,
    Path(application_id): Path<String>,
    Json(req): Json<CreateMessageRequest>,
) -> ApiResult<(StatusCode, Json<Message>)> {
    if req.content.trim().is_empty() {
        return Err(AppError::BadRequest("message content is empty".into()));
    }
    let message = state.store.add_message(req.into_message(application_id))?;
    Ok((StatusCode::CREATED, Json(message)))
}

/// Request body for marking a thread as read
#[derive(Debug, Deserialize)]
pub struct MarkReadRequest {
    pub reader_id: String,
}

/// Number of records changed by a bulk operation
#[derive(Debug, Serialize)]
pub struct UpdatedCount {
    pub updated: usize,
}

pub async fn mark_messages_read(
    State(state): State<SwaproState>,
    Path(application_id): Path<String>,
    Json(req): Json<MarkReadRequest>,
) -> ApiResult<Json<UpdatedCount>> {
    let updated = state
        .store
        .mark_messages_as_read(&application_id, &req.reader_id)?;
    Ok(Json(UpdatedCount { updated }))
}

// ============================================================================
// Interviews
// ============================================================================

#[derive(Debug, Deserialize, Default)]
pub struct InterviewQuery {
    pub candidate_id: Option<String>,
}

pub async fn list_interviews(
    State(state): State<SwaproState>,
    Query(query): Query<InterviewQuery>,
) -> Json<Vec<Interview>> {
    match query.candidate_id {
        Some(candidate_id) => Json(state.store.get_interviews_by_candidate(&candidate_id)),
        None => Json(state.store.get_interviews()),
    }
}

/// Schedule an interview. The candidate defaults to the application's.
pub async fn create_interview(
    State(state): State<SwaproState>,
    Json(req): Json<CreateInterviewRequest>,
) -> ApiResult<(StatusCode, Json<Interview>)> {
    let candidate_id = match &req.candidate_id {
        Some(id) => id.clone(),
        None => state
            .store
            .get_application(&req.application_id)
            .map(|a| a.candidate_id)
            .ok_or_else(|| StoreError::not_found::<Application>(&req.application_id))?,
    };
    let interview = state.store.add_interview(req.into_interview(candidate_id))?;
    Ok((StatusCode::CREATED, Json(interview)))
}

pub async fn get_interview(
    State(state): State<SwaproState>,
    Path(id): Path<String>,
) -> ApiResult<Json<Interview>> {
    state
        .store
        .get_interview(&id)
        .map(Json)
        .ok_or_else(|| StoreError::not_found::<Interview>(id).into())
}

pub async fn update_interview(
    State(state): State<SwaproState>,
    Path(id): Path<String>,
    Json(req): Json<UpdateInterviewRequest>,
) -> ApiResult<Json<Interview>> {
    Ok(Json(state.store.update_interview(&id, req)?))
}

// ============================================================================
// Notifications
// ============================================================================

pub async fn list_notifications(
    State(state): State<SwaproState>,
    Path(user_id): Path<String>,
) -> Json<Vec<Notification>> {
    Json(state.store.get_notifications(&user_id))
}

#[derive(Debug, Serialize)]
pub struct UnreadCount {
    pub count: usize,
}

pub async fn unread_count(
    State(state): State<SwaproState>,
    Path(user_id): Path<String>,
) -> Json<UnreadCount> {
    Json(UnreadCount {
        count: state.store.get_unread_notification_count(&user_id),
    })
}

pub async fn mark_all_notifications_read(
    State(state): State<SwaproState>,
    Path(user_id): Path<String>,
) -> Json<UpdatedCount> {
    Json(UpdatedCount {
        updated: state.store.mark_all_notifications_as_read(&user_id),
    })
}

pub async fn mark_notification_read(
    State(state): State<SwaproState>,
    Path((user_id, notification_id)): Path<(String, String)>,
) -> ApiResult<Json<Notification>> {
    Ok(Json(
        state
            .store
            .mark_notification_as_read(&user_id, &notification_id)?,
    ))
}

// ============================================================================
// Stats & sync
// ============================================================================

#[derive(Debug, Deserialize)]
pub struct StatsQuery {
    pub role: Role,
    pub user_id: Option<String>,
}

pub async fn get_stats(
    State(state): State<SwaproState>,
    Query(query): Query<StatsQuery>,
) -> ApiResult<Json<Stats>> {
    Ok(Json(
        state.store.get_stats(query.role, query.user_id.as_deref())?,
    ))
}

pub async fn trigger_sync(State(state): State<SwaproState>) -> ApiResult<Json<SyncSummary>> {
    Ok(Json(state.store.sync_with_backend().await?))
}

// ============================================================================
// Error handling
// ============================================================================

/// Application error type
#[derive(Debug)]
pub enum AppError {
    Internal(anyhow::Error),
    NotFound(String),
    BadRequest(String),
    Conflict(String),
}

impl IntoResponse for AppError {
    fn into_response(self) -> axum::response::Response {
        let (status, message) = match self {
            AppError::Internal(e) => (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()),
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, msg),
            AppError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            AppError::Conflict(msg) => (StatusCode::CONFLICT, msg),
        };

        let body = Json(serde_json::json!({
            "error": message
        }));

        (status, body).into_response()
    }
}

impl From<anyhow::Error> for AppError {
    fn from(err: anyhow::Error) -> Self {
        AppError::Internal(err)
    }
}

impl From<StoreError> for AppError {
    fn from(err: StoreError) -> Self {
        let message = err.to_string();
        match err {
            StoreError::NotFound { .. } => AppError::NotFound(message),
            StoreError::InvalidTransition { .. } => AppError::Conflict(message),
            StoreError::Validation(_) => AppError::BadRequest(message),
        }
    }
}
