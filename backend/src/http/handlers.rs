//! HTTP request handlers.
//!
//! Each handler extracts path/query/body, delegates to the service layer and
//! serializes the result. Course mutations go through services that rerun
//! conflict detection before returning.

use axum::{
    extract::{rejection::JsonRejection, Path, Query, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    Json,
};

use super::dto::*;
use super::error::AppError;
use super::state::AppState;
use crate::api::{
    CommentId, ConflictId, Course, CourseComment, CourseId, CoursePatch, DetectionReport,
    NewComment, NewCourse, NewNotification, NewTimetable, Notification, NotificationId,
    StoredConflict, Timetable, TimetableDetail, TimetableId, TimetablePatch, TimetableStatistics,
    WeekView,
};
use crate::db::services as db_services;
use crate::services::{self, ExportFormat, ImportOutcome};

/// Result type for handlers.
pub type HandlerResult<T> = Result<Json<T>, AppError>;

type Created<T> = Result<(StatusCode, Json<T>), AppError>;

/// Accept a missing body (no JSON content type) as `T::default()`.
fn optional_body<T: Default>(payload: Result<Json<T>, JsonRejection>) -> Result<T, AppError> {
    match payload {
        Ok(Json(body)) => Ok(body),
        Err(JsonRejection::MissingJsonContentType(_)) => Ok(T::default()),
        Err(rejection) => Err(rejection.into()),
    }
}

// =============================================================================
// Health
// =============================================================================

/// GET /health
pub async fn health_check(State(state): State<AppState>) -> (StatusCode, Json<HealthResponse>) {
    let healthy = db_services::health_check(state.repository.as_ref())
        .await
        .unwrap_or(false);
    let status = if healthy {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };
    let body = HealthResponse {
        status: if healthy { "healthy" } else { "unhealthy" }.to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        repository: if healthy { "ok" } else { "unavailable" }.to_string(),
    };
    (status, Json(body))
}

/// GET /ping
pub async fn ping() -> Json<MessageResponse> {
    Json(MessageResponse {
        message: "pong".to_string(),
    })
}

// =============================================================================
// Timetables
// =============================================================================

/// GET /v1/timetables
pub async fn list_timetables(State(state): State<AppState>) -> HandlerResult<TimetableListResponse> {
    let timetables = db_services::list_timetables(state.repository.as_ref()).await?;
    let total = timetables.len();
    Ok(Json(TimetableListResponse { timetables, total }))
}

/// POST /v1/timetables
pub async fn create_timetable(
    State(state): State<AppState>,
    payload: Result<Json<NewTimetable>, JsonRejection>,
) -> Created<Timetable> {
    let Json(timetable) = payload?;
    let created = db_services::create_timetable(state.repository.as_ref(), timetable).await?;
    Ok((StatusCode::CREATED, Json(created)))
}

/// GET /v1/timetables/active
pub async fn get_active_timetable(State(state): State<AppState>) -> HandlerResult<TimetableDetail> {
    let detail = db_services::get_active_timetable(state.repository.as_ref()).await?;
    Ok(Json(detail))
}

/// GET /v1/timetables/{id}
pub async fn get_timetable(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> HandlerResult<TimetableDetail> {
    let detail =
        db_services::get_timetable_detail(state.repository.as_ref(), TimetableId::new(id)).await?;
    Ok(Json(detail))
}

/// PUT /v1/timetables/{id}
pub async fn update_timetable(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    payload: Result<Json<TimetablePatch>, JsonRejection>,
) -> HandlerResult<Timetable> {
    let Json(patch) = payload?;
    let updated =
        db_services::update_timetable(state.repository.as_ref(), TimetableId::new(id), patch)
            .await?;
    Ok(Json(updated))
}

/// DELETE /v1/timetables/{id}
pub async fn delete_timetable(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<StatusCode, AppError> {
    db_services::delete_timetable(state.repository.as_ref(), TimetableId::new(id)).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// POST /v1/timetables/{id}/activate
pub async fn activate_timetable(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> HandlerResult<Timetable> {
    let timetable =
        db_services::activate_timetable(state.repository.as_ref(), TimetableId::new(id)).await?;
    Ok(Json(timetable))
}

/// POST /v1/timetables/{id}/duplicate
///
/// The body is optional; an empty request keeps the default copy name.
pub async fn duplicate_timetable(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    payload: Result<Json<DuplicateRequest>, JsonRejection>,
) -> Created<TimetableDetail> {
    let name = optional_body(payload)?.name;
    let copy =
        db_services::duplicate_timetable(state.repository.as_ref(), TimetableId::new(id), name)
            .await?;
    Ok((StatusCode::CREATED, Json(copy)))
}

/// POST /v1/timetables/{id}/share
pub async fn share_timetable(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> HandlerResult<ShareResponse> {
    let timetable =
        db_services::share_timetable(state.repository.as_ref(), TimetableId::new(id)).await?;
    let share_token = timetable
        .share_token
        .ok_or_else(|| AppError::Internal("share token was not assigned".to_string()))?;
    Ok(Json(ShareResponse {
        share_url: format!("/v1/shared/{}", share_token),
        share_token,
    }))
}

/// GET /v1/shared/{token}
pub async fn get_shared_timetable(
    State(state): State<AppState>,
    Path(token): Path<String>,
) -> HandlerResult<TimetableDetail> {
    let detail = db_services::get_shared_timetable(state.repository.as_ref(), &token).await?;
    Ok(Json(detail))
}

/// GET /v1/timetables/{id}/week
pub async fn get_week_view(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> HandlerResult<WeekView> {
    let view = services::week_view(state.repository.as_ref(), TimetableId::new(id)).await?;
    Ok(Json(view))
}

/// GET /v1/timetables/{id}/statistics
pub async fn get_statistics(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> HandlerResult<TimetableStatistics> {
    let stats =
        services::timetable_statistics(state.repository.as_ref(), TimetableId::new(id)).await?;
    Ok(Json(stats))
}

// =============================================================================
// Courses
// =============================================================================

/// GET /v1/timetables/{id}/courses
pub async fn list_courses(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> HandlerResult<Vec<Course>> {
    let repo = state.repository.as_ref();
    let timetable_id = TimetableId::new(id);
    db_services::get_timetable(repo, timetable_id).await?;
    Ok(Json(db_services::list_courses(repo, timetable_id).await?))
}

/// POST /v1/timetables/{id}/courses
pub async fn create_course(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    payload: Result<Json<NewCourse>, JsonRejection>,
) -> Created<Course> {
    let Json(course) = payload?;
    let created =
        db_services::create_course(state.repository.as_ref(), TimetableId::new(id), course)
            .await?;
    Ok((StatusCode::CREATED, Json(created)))
}

/// GET /v1/courses/{id}
pub async fn get_course(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> HandlerResult<Course> {
    let course = db_services::get_course(state.repository.as_ref(), CourseId::new(id)).await?;
    Ok(Json(course))
}

/// PUT /v1/courses/{id}
pub async fn update_course(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    payload: Result<Json<CoursePatch>, JsonRejection>,
) -> HandlerResult<Course> {
    let Json(patch) = payload?;
    let updated =
        db_services::update_course(state.repository.as_ref(), CourseId::new(id), patch).await?;
    Ok(Json(updated))
}

/// DELETE /v1/courses/{id}
pub async fn delete_course(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<StatusCode, AppError> {
    db_services::delete_course(state.repository.as_ref(), CourseId::new(id)).await?;
    Ok(StatusCode::NO_CONTENT)
}

// =============================================================================
// Comments
// =============================================================================

/// GET /v1/courses/{id}/comments
pub async fn list_comments(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> HandlerResult<Vec<CourseComment>> {
    let comments = db_services::list_comments(state.repository.as_ref(), CourseId::new(id)).await?;
    Ok(Json(comments))
}

/// POST /v1/courses/{id}/comments
pub async fn add_comment(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    payload: Result<Json<NewComment>, JsonRejection>,
) -> Created<CourseComment> {
    let Json(comment) = payload?;
    let created =
        db_services::add_comment(state.repository.as_ref(), CourseId::new(id), comment).await?;
    Ok((StatusCode::CREATED, Json(created)))
}

/// DELETE /v1/comments/{id}
pub async fn delete_comment(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<StatusCode, AppError> {
    db_services::delete_comment(state.repository.as_ref(), CommentId::new(id)).await?;
    Ok(StatusCode::NO_CONTENT)
}

// =============================================================================
// Conflicts
// =============================================================================

/// GET /v1/timetables/{id}/conflicts
pub async fn list_conflicts(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Query(query): Query<ConflictQuery>,
) -> HandlerResult<ConflictListResponse> {
    let repo = state.repository.as_ref();
    let timetable_id = TimetableId::new(id);
    db_services::get_timetable(repo, timetable_id).await?;
    let conflicts = db_services::list_conflicts(repo, timetable_id, query.include_resolved).await?;
    let total = conflicts.len();
    Ok(Json(ConflictListResponse { conflicts, total }))
}

/// POST /v1/timetables/{id}/conflicts/detect
pub async fn detect_conflicts(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> HandlerResult<DetectionReport> {
    let report =
        db_services::recompute_conflicts(state.repository.as_ref(), TimetableId::new(id)).await?;
    Ok(Json(report))
}

/// POST /v1/conflicts/{id}/resolve
pub async fn resolve_conflict(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> HandlerResult<StoredConflict> {
    let conflict =
        db_services::resolve_conflict(state.repository.as_ref(), ConflictId::new(id)).await?;
    Ok(Json(conflict))
}

// =============================================================================
// Notifications
// =============================================================================

/// GET /v1/notifications
pub async fn list_notifications(
    State(state): State<AppState>,
    Query(query): Query<NotificationQuery>,
) -> HandlerResult<Vec<Notification>> {
    let notifications =
        db_services::list_notifications(state.repository.as_ref(), query.unread_only).await?;
    Ok(Json(notifications))
}

/// POST /v1/notifications
pub async fn create_notification(
    State(state): State<AppState>,
    payload: Result<Json<NewNotification>, JsonRejection>,
) -> Created<Notification> {
    let Json(notification) = payload?;
    let created = db_services::create_notification(state.repository.as_ref(), notification).await?;
    Ok((StatusCode::CREATED, Json(created)))
}

/// POST /v1/notifications/{id}/read
pub async fn mark_notification_read(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> HandlerResult<Notification> {
    let notification =
        db_services::mark_notification_read(state.repository.as_ref(), NotificationId::new(id))
            .await?;
    Ok(Json(notification))
}

/// DELETE /v1/notifications/{id}
pub async fn delete_notification(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<StatusCode, AppError> {
    db_services::delete_notification(state.repository.as_ref(), NotificationId::new(id)).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// POST /v1/timetables/{id}/reminders
pub async fn generate_reminders(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    payload: Result<Json<ReminderRequest>, JsonRejection>,
) -> HandlerResult<ReminderResponse> {
    let horizon = optional_body(payload)?
        .horizon_minutes
        .unwrap_or(state.reminder_horizon_minutes);
    let notifications = services::generate_reminders(
        state.repository.as_ref(),
        TimetableId::new(id),
        db_services::local_now(),
        horizon,
    )
    .await?;
    Ok(Json(ReminderResponse {
        created: notifications.len(),
        notifications,
    }))
}

// =============================================================================
// Import / Export
// =============================================================================

/// GET /v1/export/formats
pub async fn list_export_formats() -> Json<Vec<services::transfer::FormatInfo>> {
    Json(services::export_formats())
}

/// GET /v1/timetables/{id}/export
///
/// Defaults to JSON when `format` is omitted.
pub async fn export_timetable(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Query(query): Query<ExportQuery>,
) -> Result<Response, AppError> {
    let format = match query.format.as_deref() {
        Some(raw) => raw.parse::<ExportFormat>()?,
        None => ExportFormat::Json,
    };
    let payload =
        services::export_timetable(state.repository.as_ref(), TimetableId::new(id), format)
            .await?;
    let disposition = format!("attachment; filename=\"{}\"", payload.filename);
    Ok((
        [
            (header::CONTENT_TYPE, payload.content_type.to_string()),
            (header::CONTENT_DISPOSITION, disposition),
        ],
        payload.body,
    )
        .into_response())
}

/// POST /v1/timetables/import
pub async fn import_timetable(
    State(state): State<AppState>,
    payload: Result<Json<ImportRequest>, JsonRejection>,
) -> Created<ImportOutcome> {
    let Json(request) = payload?;
    let format = request.format.parse::<ExportFormat>()?;
    let outcome = services::import_timetable(
        state.repository.as_ref(),
        format,
        &request.content,
        request.name,
        request.target_timetable_id,
    )
    .await?;
    Ok((StatusCode::CREATED, Json(outcome)))
}
