//! Repository traits for abstracting persistence.
//!
//! The traits are split by aggregate: timetables, courses, conflicts,
//! comments and notifications. [`FullRepository`] bundles them so the service
//! layer and HTTP state can hold a single `Arc<dyn FullRepository>`.
//!
//! # Thread Safety
//! Implementations must be `Send + Sync`. Each method is atomic with respect
//! to the store; multi-step operations that must not interleave per timetable
//! take [`TimetableRepository::lock_timetable`] first.

pub mod error;

use async_trait::async_trait;
use chrono::NaiveDateTime;
use tokio::sync::OwnedMutexGuard;

pub use error::{ErrorContext, RepositoryError, RepositoryResult};

use crate::algorithms::conflicts::CourseBlock;
use crate::api::{CommentId, ConflictId, CourseId, NotificationId, TimetableId};
use crate::models::{
    Conflict, Course, CourseComment, NewComment, NewCourse, NewNotification, NewTimetable,
    Notification, StoredConflict, Timetable,
};

/// Guard held while a timetable is being mutated and its conflicts recomputed.
pub type TimetableLock = OwnedMutexGuard<()>;

#[async_trait]
pub trait TimetableRepository: Send + Sync {
    /// Check if the store is reachable.
    ///
    /// # Returns
    /// - `Ok(true)` if healthy
    /// - `Ok(false)` if unhealthy but no error occurred
    async fn health_check(&self) -> RepositoryResult<bool>;

    /// Acquire the per-timetable write lock.
    ///
    /// Holders are serialized per timetable id; different timetables do not
    /// contend. The guard is released on drop.
    async fn lock_timetable(&self, timetable_id: TimetableId) -> RepositoryResult<TimetableLock>;

    /// Store a new timetable and assign its id.
    ///
    /// When `timetable.is_active` is set every other timetable is deactivated
    /// in the same write.
    async fn create_timetable(&self, timetable: NewTimetable) -> RepositoryResult<Timetable>;

    /// # Returns
    /// * `Err(RepositoryError::NotFound)` - If the timetable doesn't exist
    async fn get_timetable(&self, timetable_id: TimetableId) -> RepositoryResult<Timetable>;

    /// All timetables ordered by id.
    async fn list_timetables(&self) -> RepositoryResult<Vec<Timetable>>;

    /// Overwrite a stored timetable and bump `updated_at`.
    async fn update_timetable(&self, timetable: Timetable) -> RepositoryResult<Timetable>;

    /// Delete a timetable with its courses, their comments and its conflicts.
    ///
    /// Refuses with a validation error when it is the last stored timetable.
    /// The count check and the removal happen atomically.
    async fn delete_timetable(&self, timetable_id: TimetableId) -> RepositoryResult<()>;

    /// Make `timetable_id` the only active timetable.
    async fn set_active_timetable(&self, timetable_id: TimetableId)
        -> RepositoryResult<Timetable>;

    async fn set_share_token(
        &self,
        timetable_id: TimetableId,
        token: String,
    ) -> RepositoryResult<Timetable>;

    async fn find_by_share_token(&self, token: &str) -> RepositoryResult<Timetable>;
}

#[async_trait]
pub trait CourseRepository: Send + Sync {
    /// # Returns
    /// * `Err(RepositoryError::NotFound)` - If the timetable doesn't exist
    async fn insert_course(
        &self,
        timetable_id: TimetableId,
        course: NewCourse,
    ) -> RepositoryResult<Course>;

    async fn get_course(&self, course_id: CourseId) -> RepositoryResult<Course>;

    /// Courses of one timetable, ordered by day, then start time, then id.
    async fn list_courses(&self, timetable_id: TimetableId) -> RepositoryResult<Vec<Course>>;

    /// Overwrite a stored course and bump `updated_at`.
    async fn update_course(&self, course: Course) -> RepositoryResult<Course>;

    /// Delete a course and its comments. Notifications referring to it keep
    /// existing with `course_id` cleared.
    async fn delete_course(&self, course_id: CourseId) -> RepositoryResult<Course>;
}

#[async_trait]
pub trait ConflictRepository: Send + Sync {
    /// The detector's view of a timetable's courses.
    async fn load_blocks(&self, timetable_id: TimetableId) -> RepositoryResult<Vec<CourseBlock>>;

    /// Atomically discard the timetable's stored conflicts and insert `conflicts`.
    ///
    /// Newly inserted records start unresolved.
    async fn replace_conflicts(
        &self,
        timetable_id: TimetableId,
        conflicts: &[Conflict],
    ) -> RepositoryResult<Vec<StoredConflict>>;

    /// Stored conflicts ordered by `(course_a, course_b)`.
    async fn list_conflicts(
        &self,
        timetable_id: TimetableId,
        include_resolved: bool,
    ) -> RepositoryResult<Vec<StoredConflict>>;

    async fn resolve_conflict(&self, conflict_id: ConflictId) -> RepositoryResult<StoredConflict>;
}

#[async_trait]
pub trait CommentRepository: Send + Sync {
    async fn insert_comment(
        &self,
        course_id: CourseId,
        comment: NewComment,
    ) -> RepositoryResult<CourseComment>;

    /// Comments of one course, oldest first.
    async fn list_comments(&self, course_id: CourseId) -> RepositoryResult<Vec<CourseComment>>;

    async fn delete_comment(&self, comment_id: CommentId) -> RepositoryResult<()>;
}

#[async_trait]
pub trait NotificationRepository: Send + Sync {
    /// Store a notification. A missing `notify_time` must have been filled in
    /// by the caller; the repository falls back to the current local time.
    async fn insert_notification(
        &self,
        notification: NewNotification,
    ) -> RepositoryResult<Notification>;

    /// Notifications ordered by `notify_time`, then id.
    async fn list_notifications(&self, unread_only: bool) -> RepositoryResult<Vec<Notification>>;

    async fn mark_notification_read(
        &self,
        notification_id: NotificationId,
    ) -> RepositoryResult<Notification>;

    async fn delete_notification(&self, notification_id: NotificationId) -> RepositoryResult<()>;

    /// Is there already a notification for `course_id` at exactly `notify_time`?
    async fn has_notification_at(
        &self,
        course_id: CourseId,
        notify_time: NaiveDateTime,
    ) -> RepositoryResult<bool>;
}

/// Everything the service layer needs from a store.
pub trait FullRepository:
    TimetableRepository
    + CourseRepository
    + ConflictRepository
    + CommentRepository
    + NotificationRepository
{
}

impl<T> FullRepository for T where
    T: TimetableRepository
        + CourseRepository
        + ConflictRepository
        + CommentRepository
        + NotificationRepository
{
}
