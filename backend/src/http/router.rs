//! Router configuration for the HTTP API.
//!
//! This module sets up all routes, middleware (CORS, compression, tracing,
//! security headers), and creates the axum router ready for serving.

use axum::{
    extract::DefaultBodyLimit,
    http::{header, HeaderValue},
    routing::{delete, get, post},
    Router,
};
use tower_http::{
    compression::CompressionLayer,
    cors::{Any, CorsLayer},
    set_header::SetResponseHeaderLayer,
    trace::TraceLayer,
};

use super::handlers;
use super::state::AppState;

/// Create the main application router with all routes and middleware.
pub fn create_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let api_v1 = Router::new()
        // Timetables
        .route(
            "/timetables",
            get(handlers::list_timetables).post(handlers::create_timetable),
        )
        .route("/timetables/active", get(handlers::get_active_timetable))
        .route("/timetables/import", post(handlers::import_timetable))
        .route(
            "/timetables/{id}",
            get(handlers::get_timetable)
                .put(handlers::update_timetable)
                .delete(handlers::delete_timetable),
        )
        .route("/timetables/{id}/activate", post(handlers::activate_timetable))
        .route("/timetables/{id}/duplicate", post(handlers::duplicate_timetable))
        .route("/timetables/{id}/share", post(handlers::share_timetable))
        .route("/shared/{token}", get(handlers::get_shared_timetable))
        .route("/timetables/{id}/week", get(handlers::get_week_view))
        .route("/timetables/{id}/statistics", get(handlers::get_statistics))
        // Courses
        .route(
            "/timetables/{id}/courses",
            get(handlers::list_courses).post(handlers::create_course),
        )
        .route(
            "/courses/{id}",
            get(handlers::get_course)
                .put(handlers::update_course)
                .delete(handlers::delete_course),
        )
        // Comments
        .route(
            "/courses/{id}/comments",
            get(handlers::list_comments).post(handlers::add_comment),
        )
        .route("/comments/{id}", delete(handlers::delete_comment))
        // Conflicts
        .route("/timetables/{id}/conflicts", get(handlers::list_conflicts))
        .route(
            "/timetables/{id}/conflicts/detect",
            post(handlers::detect_conflicts),
        )
        .route("/conflicts/{id}/resolve", post(handlers::resolve_conflict))
        // Notifications
        .route(
            "/notifications",
            get(handlers::list_notifications).post(handlers::create_notification),
        )
        .route("/notifications/{id}/read", post(handlers::mark_notification_read))
        .route("/notifications/{id}", delete(handlers::delete_notification))
        .route("/timetables/{id}/reminders", post(handlers::generate_reminders))
        // Import / export
        .route("/timetables/{id}/export", get(handlers::export_timetable))
        .route("/export/formats", get(handlers::list_export_formats));

    let body_limit = state.body_limit_bytes;

    Router::new()
        .route("/health", get(handlers::health_check))
        .route("/ping", get(handlers::ping))
        .nest("/v1", api_v1)
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(CompressionLayer::new())
        .layer(SetResponseHeaderLayer::overriding(
            header::X_CONTENT_TYPE_OPTIONS,
            HeaderValue::from_static("nosniff"),
        ))
        .layer(SetResponseHeaderLayer::overriding(
            header::X_FRAME_OPTIONS,
            HeaderValue::from_static("DENY"),
        ))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}
