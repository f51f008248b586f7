//! High-level service layer.
//!
//! Repository-agnostic operations holding the business rules: input
//! validation, the one-active-timetable rule, and conflict recomputation after
//! every course mutation. Functions accept any [`FullRepository`], including
//! `&dyn FullRepository` taken from the HTTP state.
//!
//! Every operation that changes the courses of a timetable acquires
//! [`TimetableRepository::lock_timetable`] and keeps it until the new conflict
//! set has been written, so concurrent requests against the same timetable
//! cannot interleave their replace-all writes.

use chrono::{Local, NaiveDateTime};
use log::{debug, info, warn};

use super::repository::{
    CommentRepository, ConflictRepository, CourseRepository, ErrorContext, FullRepository,
    NotificationRepository, RepositoryError, RepositoryResult, TimetableRepository,
};
use crate::algorithms::conflicts::{detect_conflicts, DetectionReport};
use crate::api::{CommentId, ConflictId, CourseId, NotificationId, TimetableId};
use crate::models::{
    Course, CourseComment, CoursePatch, NewComment, NewCourse, NewNotification, NewTimetable,
    Notification, StoredConflict, Timetable, TimetableDetail, TimetablePatch,
};

// ==================== Validation ====================

fn require_text(value: &str, field: &str, operation: &str) -> RepositoryResult<()> {
    if value.trim().is_empty() {
        return Err(RepositoryError::validation_with_context(
            format!("{} must not be blank", field),
            ErrorContext::new(operation).with_details(field),
        ));
    }
    Ok(())
}

fn validate_course_times(course: &Course, operation: &str) -> RepositoryResult<()> {
    if course.start_time >= course.end_time {
        return Err(RepositoryError::validation_with_context(
            format!(
                "start_time {} must be before end_time {}",
                course.start_time, course.end_time
            ),
            ErrorContext::new(operation)
                .with_entity("course")
                .with_entity_id(course.id),
        ));
    }
    Ok(())
}

fn validate_new_course(course: &NewCourse, operation: &str) -> RepositoryResult<()> {
    require_text(&course.name, "name", operation)?;
    if course.start_time >= course.end_time {
        return Err(RepositoryError::validation_with_context(
            format!(
                "start_time {} must be before end_time {}",
                course.start_time, course.end_time
            ),
            ErrorContext::new(operation).with_entity("course"),
        ));
    }
    Ok(())
}

// ==================== Health ====================

/// Pass-through to the repository's health check.
pub async fn health_check<R: FullRepository + ?Sized>(repo: &R) -> RepositoryResult<bool> {
    repo.health_check().await
}

// ==================== Conflicts ====================

/// Run the detector over the current courses and replace the stored set.
///
/// The caller must hold the timetable lock.
async fn recompute_locked<R: FullRepository + ?Sized>(
    repo: &R,
    timetable_id: TimetableId,
) -> RepositoryResult<DetectionReport> {
    let blocks = repo.load_blocks(timetable_id).await?;
    let report = detect_conflicts(&blocks).map_err(|e| {
        RepositoryError::from(e).with_operation(format!("recompute_conflicts({})", timetable_id))
    })?;

    if report.skipped > 0 {
        warn!(
            "Skipped {} malformed course block(s) in timetable {}",
            report.skipped, timetable_id
        );
    }

    repo.replace_conflicts(timetable_id, &report.conflicts)
        .await?;
    debug!(
        "Timetable {}: {} block(s), {} conflict(s)",
        timetable_id,
        blocks.len(),
        report.conflicts.len()
    );
    Ok(report)
}

/// Force a detection run for a timetable.
///
/// Replace-all semantics: previously stored conflicts, including their
/// `resolved` flags, are discarded.
pub async fn recompute_conflicts<R: FullRepository + ?Sized>(
    repo: &R,
    timetable_id: TimetableId,
) -> RepositoryResult<DetectionReport> {
    let _lock = repo.lock_timetable(timetable_id).await?;
    repo.get_timetable(timetable_id).await?;
    let report = recompute_locked(repo, timetable_id).await?;
    info!(
        "Detected {} conflict(s) in timetable {}",
        report.conflicts.len(),
        timetable_id
    );
    Ok(report)
}

pub async fn list_conflicts<R: FullRepository + ?Sized>(
    repo: &R,
    timetable_id: TimetableId,
    include_resolved: bool,
) -> RepositoryResult<Vec<StoredConflict>> {
    repo.list_conflicts(timetable_id, include_resolved).await
}

pub async fn resolve_conflict<R: FullRepository + ?Sized>(
    repo: &R,
    conflict_id: ConflictId,
) -> RepositoryResult<StoredConflict> {
    let conflict = repo.resolve_conflict(conflict_id).await?;
    info!("Marked conflict {} as resolved", conflict_id);
    Ok(conflict)
}

// ==================== Timetables ====================

pub async fn create_timetable<R: FullRepository + ?Sized>(
    repo: &R,
    timetable: NewTimetable,
) -> RepositoryResult<Timetable> {
    require_text(&timetable.name, "name", "create_timetable")?;
    let timetable = repo.create_timetable(timetable).await?;
    info!("Created timetable {} ('{}')", timetable.id, timetable.name);
    Ok(timetable)
}

pub async fn list_timetables<R: FullRepository + ?Sized>(
    repo: &R,
) -> RepositoryResult<Vec<Timetable>> {
    repo.list_timetables().await
}

pub async fn get_timetable<R: FullRepository + ?Sized>(
    repo: &R,
    timetable_id: TimetableId,
) -> RepositoryResult<Timetable> {
    repo.get_timetable(timetable_id).await
}

/// A timetable together with its courses.
pub async fn get_timetable_detail<R: FullRepository + ?Sized>(
    repo: &R,
    timetable_id: TimetableId,
) -> RepositoryResult<TimetableDetail> {
    let timetable = repo.get_timetable(timetable_id).await?;
    let courses = repo.list_courses(timetable_id).await?;
    Ok(TimetableDetail { timetable, courses })
}

/// Apply a partial update. Setting `is_active` deactivates the others.
pub async fn update_timetable<R: FullRepository + ?Sized>(
    repo: &R,
    timetable_id: TimetableId,
    patch: TimetablePatch,
) -> RepositoryResult<Timetable> {
    if let Some(name) = &patch.name {
        require_text(name, "name", "update_timetable")?;
    }
    let mut timetable = repo.get_timetable(timetable_id).await?;
    patch.apply(&mut timetable);
    repo.update_timetable(timetable).await
}

/// Delete a timetable and everything that belongs to it.
///
/// The last remaining timetable cannot be deleted.
pub async fn delete_timetable<R: FullRepository + ?Sized>(
    repo: &R,
    timetable_id: TimetableId,
) -> RepositoryResult<()> {
    let _lock = repo.lock_timetable(timetable_id).await?;
    repo.delete_timetable(timetable_id).await?;
    info!("Deleted timetable {}", timetable_id);
    Ok(())
}

pub async fn activate_timetable<R: FullRepository + ?Sized>(
    repo: &R,
    timetable_id: TimetableId,
) -> RepositoryResult<Timetable> {
    let timetable = repo.set_active_timetable(timetable_id).await?;
    info!("Activated timetable {}", timetable_id);
    Ok(timetable)
}

/// The active timetable with its courses.
///
/// When none is active the first timetable is activated and returned.
pub async fn get_active_timetable<R: FullRepository + ?Sized>(
    repo: &R,
) -> RepositoryResult<TimetableDetail> {
    let timetables = repo.list_timetables().await?;
    let active = match timetables.iter().find(|t| t.is_active) {
        Some(active) => active.clone(),
        None => {
            let first = timetables.first().ok_or_else(|| {
                RepositoryError::not_found_with_context(
                    "No timetable exists",
                    ErrorContext::new("get_active_timetable").with_entity("timetable"),
                )
            })?;
            debug!("No active timetable; falling back to {}", first.id);
            repo.set_active_timetable(first.id).await?
        }
    };
    let courses = repo.list_courses(active.id).await?;
    Ok(TimetableDetail {
        timetable: active,
        courses,
    })
}

/// Copy a timetable and its courses into a new, inactive timetable.
///
/// Comments are not copied. Conflicts are detected afresh on the copy.
pub async fn duplicate_timetable<R: FullRepository + ?Sized>(
    repo: &R,
    timetable_id: TimetableId,
    name: Option<String>,
) -> RepositoryResult<TimetableDetail> {
    let source = repo.get_timetable(timetable_id).await?;
    let courses = repo.list_courses(timetable_id).await?;

    let name = match name {
        Some(name) => {
            require_text(&name, "name", "duplicate_timetable")?;
            name
        }
        None => format!("{} (Copy)", source.name),
    };
    let copy = repo
        .create_timetable(NewTimetable {
            name,
            description: source.description.clone(),
            semester: source.semester.clone(),
            year: source.year,
            color_theme: Some(source.color_theme.clone()),
            is_active: false,
        })
        .await?;

    let _lock = repo.lock_timetable(copy.id).await?;
    let mut copied = Vec::with_capacity(courses.len());
    for course in &courses {
        copied.push(repo.insert_course(copy.id, NewCourse::from(course)).await?);
    }
    recompute_locked(repo, copy.id).await?;
    info!(
        "Duplicated timetable {} into {} ({} course(s))",
        timetable_id,
        copy.id,
        copied.len()
    );
    let courses = repo.list_courses(copy.id).await?;
    Ok(TimetableDetail {
        timetable: copy,
        courses,
    })
}

/// Assign a share token (keeping an existing one) and return the timetable.
pub async fn share_timetable<R: FullRepository + ?Sized>(
    repo: &R,
    timetable_id: TimetableId,
) -> RepositoryResult<Timetable> {
    let timetable = repo.get_timetable(timetable_id).await?;
    if timetable.share_token.is_some() {
        return Ok(timetable);
    }
    let token = uuid::Uuid::new_v4().simple().to_string();
    let timetable = repo.set_share_token(timetable_id, token).await?;
    info!("Shared timetable {}", timetable_id);
    Ok(timetable)
}

pub async fn get_shared_timetable<R: FullRepository + ?Sized>(
    repo: &R,
    token: &str,
) -> RepositoryResult<TimetableDetail> {
    let timetable = repo.find_by_share_token(token).await?;
    let courses = repo.list_courses(timetable.id).await?;
    Ok(TimetableDetail { timetable, courses })
}

// ==================== Courses ====================

pub async fn get_course<R: FullRepository + ?Sized>(
    repo: &R,
    course_id: CourseId,
) -> RepositoryResult<Course> {
    repo.get_course(course_id).await
}

pub async fn list_courses<R: FullRepository + ?Sized>(
    repo: &R,
    timetable_id: TimetableId,
) -> RepositoryResult<Vec<Course>> {
    repo.list_courses(timetable_id).await
}

/// Add a course and recompute the timetable's conflicts.
pub async fn create_course<R: FullRepository + ?Sized>(
    repo: &R,
    timetable_id: TimetableId,
    course: NewCourse,
) -> RepositoryResult<Course> {
    validate_new_course(&course, "create_course")?;
    let _lock = repo.lock_timetable(timetable_id).await?;
    let course = repo.insert_course(timetable_id, course).await?;
    let report = recompute_locked(repo, timetable_id).await?;
    info!(
        "Created course {} in timetable {} ({} conflict(s))",
        course.id,
        timetable_id,
        report.conflicts.len()
    );
    Ok(course)
}

/// Apply a partial update to a course and recompute conflicts.
///
/// The patched course is validated as a whole, so moving only `end_time`
/// before the existing `start_time` is rejected.
pub async fn update_course<R: FullRepository + ?Sized>(
    repo: &R,
    course_id: CourseId,
    patch: CoursePatch,
) -> RepositoryResult<Course> {
    if let Some(name) = &patch.name {
        require_text(name, "name", "update_course")?;
    }
    let timetable_id = repo.get_course(course_id).await?.timetable_id;
    let _lock = repo.lock_timetable(timetable_id).await?;

    // Re-read under the lock.
    let mut course = repo.get_course(course_id).await?;
    patch.apply(&mut course);
    validate_course_times(&course, "update_course")?;

    let course = repo.update_course(course).await?;
    recompute_locked(repo, timetable_id).await?;
    info!("Updated course {}", course_id);
    Ok(course)
}

/// Delete a course and recompute conflicts.
pub async fn delete_course<R: FullRepository + ?Sized>(
    repo: &R,
    course_id: CourseId,
) -> RepositoryResult<()> {
    let timetable_id = repo.get_course(course_id).await?.timetable_id;
    let _lock = repo.lock_timetable(timetable_id).await?;
    repo.delete_course(course_id).await?;
    recompute_locked(repo, timetable_id).await?;
    info!("Deleted course {} from timetable {}", course_id, timetable_id);
    Ok(())
}

/// Append several courses to a timetable with a single detection run.
///
/// Used by the import pipeline. Every course is validated before any is
/// stored.
pub async fn add_courses<R: FullRepository + ?Sized>(
    repo: &R,
    timetable_id: TimetableId,
    courses: Vec<NewCourse>,
) -> RepositoryResult<(Vec<Course>, DetectionReport)> {
    for course in &courses {
        validate_new_course(course, "add_courses")?;
    }
    let _lock = repo.lock_timetable(timetable_id).await?;
    repo.get_timetable(timetable_id).await?;
    let mut stored = Vec::with_capacity(courses.len());
    for course in courses {
        stored.push(repo.insert_course(timetable_id, course).await?);
    }
    let report = recompute_locked(repo, timetable_id).await?;
    info!(
        "Added {} course(s) to timetable {} ({} conflict(s))",
        stored.len(),
        timetable_id,
        report.conflicts.len()
    );
    Ok((stored, report))
}

// ==================== Comments ====================

pub async fn add_comment<R: FullRepository + ?Sized>(
    repo: &R,
    course_id: CourseId,
    comment: NewComment,
) -> RepositoryResult<CourseComment> {
    require_text(&comment.comment, "comment", "add_comment")?;
    repo.insert_comment(course_id, comment).await
}

pub async fn list_comments<R: FullRepository + ?Sized>(
    repo: &R,
    course_id: CourseId,
) -> RepositoryResult<Vec<CourseComment>> {
    repo.list_comments(course_id).await
}

pub async fn delete_comment<R: FullRepository + ?Sized>(
    repo: &R,
    comment_id: CommentId,
) -> RepositoryResult<()> {
    repo.delete_comment(comment_id).await
}

// ==================== Notifications ====================

/// Current local wall-clock time, the reference for `notify_time`.
pub fn local_now() -> NaiveDateTime {
    Local::now().naive_local()
}

pub async fn create_notification<R: FullRepository + ?Sized>(
    repo: &R,
    mut notification: NewNotification,
) -> RepositoryResult<Notification> {
    require_text(&notification.title, "title", "create_notification")?;
    require_text(&notification.message, "message", "create_notification")?;
    if notification.notify_time.is_none() {
        notification.notify_time = Some(local_now());
    }
    repo.insert_notification(notification).await
}

pub async fn list_notifications<R: FullRepository + ?Sized>(
    repo: &R,
    unread_only: bool,
) -> RepositoryResult<Vec<Notification>> {
    repo.list_notifications(unread_only).await
}

pub async fn mark_notification_read<R: FullRepository + ?Sized>(
    repo: &R,
    notification_id: NotificationId,
) -> RepositoryResult<Notification> {
    repo.mark_notification_read(notification_id).await
}

pub async fn delete_notification<R: FullRepository + ?Sized>(
    repo: &R,
    notification_id: NotificationId,
) -> RepositoryResult<()> {
    repo.delete_notification(notification_id).await
}
