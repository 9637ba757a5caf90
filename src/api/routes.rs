//! API route definitions

use super::handlers::{self, SwaproState};
use super::ws_handlers;
use axum::{
    routing::{get, post},
    Router,
};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

/// Create the API router
pub fn create_router(state: SwaproState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        // Health check
        .route("/health", get(handlers::health))
        // ====================================================================
        // Jobs
        // ====================================================================
        .route(
            "/api/jobs",
            get(handlers::list_jobs).post(handlers::create_job),
        )
        .route(
            "/api/jobs/{id}",
            get(handlers::get_job)
                .patch(handlers::update_job)
                .delete(handlers::delete_job),
        )
        // ====================================================================
        // Candidates & documents
        // ====================================================================
        .route(
            "/api/candidates",
            get(handlers::list_candidates).post(handlers::create_candidate),
        )
        .route(
            "/api/candidates/{id}",
            get(handlers::get_candidate).patch(handlers::update_candidate),
        )
        .route(
            "/api/candidates/{id}/applications",
            get(handlers::candidate_applications),
        )
        .route(
            "/api/candidates/{id}/interviews",
            get(handlers::candidate_interviews),
        )
        .route(
            "/api/candidates/{id}/documents",
            get(handlers::list_documents).post(handlers::create_document),
        )
        .route(
            "/api/candidates/{id}/documents/{document_id}",
            axum::routing::patch(handlers::update_document),
        )
        // ====================================================================
        // Applications & messages
        // ====================================================================
        .route(
            "/api/applications",
            get(handlers::list_applications).post(handlers::create_application),
        )
        .route(
            "/api/applications/{id}",
            get(handlers::get_application).patch(handlers::update_application),
        )
        .route(
            "/api/applications/{id}/messages",
            get(handlers::list_messages).post(handlers::create_message),
        )
        .route(
            "/api/applications/{id}/messages/read",
            post(handlers::mark_messages_read),
        )
        // ====================================================================
        // Interviews
        // ====================================================================
        .route(
            "/api/interviews",
            get(handlers::list_interviews).post(handlers::create_interview),
        )
        .route(
            "/api/interviews/{id}",
            get(handlers::get_interview).patch(handlers::update_interview),
        )
        // ====================================================================
        // Notifications
        // ====================================================================
        .route(
            "/api/users/{id}/notifications",
            get(handlers::list_notifications),
        )
        .route(
            "/api/users/{id}/notifications/unread-count",
            get(handlers::unread_count),
        )
        .route(
            "/api/users/{id}/notifications/read-all",
            post(handlers::mark_all_notifications_read),
        )
        .route(
            "/api/users/{id}/notifications/{notification_id}/read",
            post(handlers::mark_notification_read),
        )
        // ====================================================================
        // Stats, sync & events
        // ====================================================================
        .route("/api/stats", get(handlers::get_stats))
        .route("/api/sync", post(handlers::trigger_sync))
        .route("/ws/events", get(ws_handlers::ws_events))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}
