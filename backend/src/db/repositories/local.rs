//! In-memory local repository implementation.
//!
//! All data lives in `HashMap`s behind a single `parking_lot::RwLock`, which
//! makes every repository call atomic. Per-timetable async locks are kept in
//! a separate map so that holding one never blocks reads.

use async_trait::async_trait;
use chrono::{Local, NaiveDateTime, Utc};
use parking_lot::{Mutex, RwLock};
use std::collections::HashMap;
use std::sync::Arc;

use crate::algorithms::conflicts::CourseBlock;
use crate::api::{CommentId, ConflictId, CourseId, NotificationId, TimetableId};
use crate::db::repository::*;
use crate::models::{
    Conflict, Course, CourseComment, NewComment, NewCourse, NewNotification, NewTimetable,
    Notification, StoredConflict, Timetable,
};

/// In-memory local repository.
///
/// Cloning is cheap and clones share the same store.
///
/// # Example
/// ```
/// use splan::db::repositories::LocalRepository;
/// use splan::db::repository::TimetableRepository;
/// use splan::models::NewTimetable;
///
/// let rt = tokio::runtime::Runtime::new().unwrap();
/// rt.block_on(async {
///     let repo = LocalRepository::new();
///     repo.create_timetable(NewTimetable::named("Winter")).await.unwrap();
///     assert_eq!(repo.list_timetables().await.unwrap().len(), 1);
/// });
/// ```
#[derive(Clone)]
pub struct LocalRepository {
    data: Arc<RwLock<LocalData>>,
    locks: Arc<Mutex<HashMap<TimetableId, Arc<tokio::sync::Mutex<()>>>>>,
}

struct LocalData {
    timetables: HashMap<TimetableId, Timetable>,
    courses: HashMap<CourseId, Course>,
    conflicts: HashMap<ConflictId, StoredConflict>,
    comments: HashMap<CommentId, CourseComment>,
    notifications: HashMap<NotificationId, Notification>,

    // ID counters
    next_timetable_id: i64,
    next_course_id: i64,
    next_conflict_id: i64,
    next_comment_id: i64,
    next_notification_id: i64,

    // Connection health
    is_healthy: bool,
}

impl Default for LocalData {
    fn default() -> Self {
        Self {
            timetables: HashMap::new(),
            courses: HashMap::new(),
            conflicts: HashMap::new(),
            comments: HashMap::new(),
            notifications: HashMap::new(),
            next_timetable_id: 1,
            next_course_id: 1,
            next_conflict_id: 1,
            next_comment_id: 1,
            next_notification_id: 1,
            is_healthy: true,
        }
    }
}

fn next_id(counter: &mut i64) -> i64 {
    let id = *counter;
    *counter += 1;
    id
}

fn timetable_not_found(operation: &str, timetable_id: TimetableId) -> RepositoryError {
    RepositoryError::not_found_with_context(
        format!("Timetable {} not found", timetable_id),
        ErrorContext::new(operation)
            .with_entity("timetable")
            .with_entity_id(timetable_id),
    )
}

fn course_not_found(operation: &str, course_id: CourseId) -> RepositoryError {
    RepositoryError::not_found_with_context(
        format!("Course {} not found", course_id),
        ErrorContext::new(operation)
            .with_entity("course")
            .with_entity_id(course_id),
    )
}

impl LocalData {
    fn deactivate_all_except(&mut self, keep: TimetableId) {
        for timetable in self.timetables.values_mut() {
            if timetable.id != keep && timetable.is_active {
                timetable.is_active = false;
                timetable.updated_at = Utc::now();
            }
        }
    }

    fn remove_course_cascade(&mut self, course_id: CourseId) -> Option<Course> {
        let course = self.courses.remove(&course_id)?;
        self.comments.retain(|_, comment| comment.course_id != course_id);
        for notification in self.notifications.values_mut() {
            if notification.course_id == Some(course_id) {
                notification.course_id = None;
            }
        }
        Some(course)
    }
}

impl LocalRepository {
    /// Create a new empty local repository.
    pub fn new() -> Self {
        Self {
            data: Arc::new(RwLock::new(LocalData::default())),
            locks: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    /// Set the health status for testing connection failures.
    pub fn set_healthy(&self, healthy: bool) {
        self.data.write().is_healthy = healthy;
    }

    /// Clear all data from the repository, keeping the health flag.
    pub fn clear(&self) {
        let mut data = self.data.write();
        *data = LocalData {
            is_healthy: data.is_healthy,
            ..Default::default()
        };
        self.locks.lock().clear();
    }

    pub fn timetable_count(&self) -> usize {
        self.data.read().timetables.len()
    }

    pub fn course_count(&self) -> usize {
        self.data.read().courses.len()
    }

    pub fn comment_count(&self) -> usize {
        self.data.read().comments.len()
    }

    /// Number of per-timetable lock entries currently kept.
    pub fn lock_entry_count(&self) -> usize {
        self.locks.lock().len()
    }

    pub fn has_timetable(&self, timetable_id: TimetableId) -> bool {
        self.data.read().timetables.contains_key(&timetable_id)
    }

    /// Helper to check health and return error if unhealthy.
    fn check_health(&self) -> RepositoryResult<()> {
        if !self.data.read().is_healthy {
            return Err(RepositoryError::connection("Repository is not healthy"));
        }
        Ok(())
    }
}

impl Default for LocalRepository {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl TimetableRepository for LocalRepository {
    async fn health_check(&self) -> RepositoryResult<bool> {
        Ok(self.data.read().is_healthy)
    }

    async fn lock_timetable(&self, timetable_id: TimetableId) -> RepositoryResult<TimetableLock> {
        self.check_health()?;
        if !self.has_timetable(timetable_id) {
            return Err(timetable_not_found("lock_timetable", timetable_id));
        }
        let mutex = {
            let mut locks = self.locks.lock();
            // Entries nobody holds or waits on are only referenced by the map.
            locks.retain(|_, m| Arc::strong_count(m) > 1);
            locks
                .entry(timetable_id)
                .or_insert_with(|| Arc::new(tokio::sync::Mutex::new(())))
                .clone()
        };
        Ok(mutex.lock_owned().await)
    }

    async fn create_timetable(&self, timetable: NewTimetable) -> RepositoryResult<Timetable> {
        self.check_health()?;
        let mut data = self.data.write();
        let id = TimetableId::new(next_id(&mut data.next_timetable_id));
        let timetable = timetable.into_timetable(id, Utc::now());
        if timetable.is_active {
            data.deactivate_all_except(id);
        }
        data.timetables.insert(id, timetable.clone());
        Ok(timetable)
    }

    async fn get_timetable(&self, timetable_id: TimetableId) -> RepositoryResult<Timetable> {
        self.check_health()?;
        self.data
            .read()
            .timetables
            .get(&timetable_id)
            .cloned()
            .ok_or_else(|| timetable_not_found("get_timetable", timetable_id))
    }

    async fn list_timetables(&self) -> RepositoryResult<Vec<Timetable>> {
        self.check_health()?;
        let mut timetables: Vec<Timetable> =
            self.data.read().timetables.values().cloned().collect();
        timetables.sort_by_key(|t| t.id);
        Ok(timetables)
    }

    async fn update_timetable(&self, mut timetable: Timetable) -> RepositoryResult<Timetable> {
        self.check_health()?;
        let mut data = self.data.write();
        if !data.timetables.contains_key(&timetable.id) {
            return Err(timetable_not_found("update_timetable", timetable.id));
        }
        timetable.updated_at = Utc::now();
        if timetable.is_active {
            data.deactivate_all_except(timetable.id);
        }
        data.timetables.insert(timetable.id, timetable.clone());
        Ok(timetable)
    }

    async fn delete_timetable(&self, timetable_id: TimetableId) -> RepositoryResult<()> {
        self.check_health()?;
        let mut data = self.data.write();
        if !data.timetables.contains_key(&timetable_id) {
            return Err(timetable_not_found("delete_timetable", timetable_id));
        }
        if data.timetables.len() <= 1 {
            return Err(RepositoryError::validation_with_context(
                "Cannot delete the last timetable",
                ErrorContext::new("delete_timetable")
                    .with_entity("timetable")
                    .with_entity_id(timetable_id),
            ));
        }
        data.timetables.remove(&timetable_id);
        self.locks.lock().remove(&timetable_id);
        let course_ids: Vec<CourseId> = data
            .courses
            .values()
            .filter(|c| c.timetable_id == timetable_id)
            .map(|c| c.id)
            .collect();
        for course_id in course_ids {
            data.remove_course_cascade(course_id);
        }
        data.conflicts.retain(|_, c| c.timetable_id != timetable_id);
        Ok(())
    }

    async fn set_active_timetable(
        &self,
        timetable_id: TimetableId,
    ) -> RepositoryResult<Timetable> {
        self.check_health()?;
        let mut data = self.data.write();
        if !data.timetables.contains_key(&timetable_id) {
            return Err(timetable_not_found("set_active_timetable", timetable_id));
        }
        data.deactivate_all_except(timetable_id);
        let timetable = data
            .timetables
            .get_mut(&timetable_id)
            .ok_or_else(|| timetable_not_found("set_active_timetable", timetable_id))?;
        if !timetable.is_active {
            timetable.is_active = true;
            timetable.updated_at = Utc::now();
        }
        Ok(timetable.clone())
    }

    async fn set_share_token(
        &self,
        timetable_id: TimetableId,
        token: String,
    ) -> RepositoryResult<Timetable> {
        self.check_health()?;
        let mut data = self.data.write();
        let timetable = data
            .timetables
            .get_mut(&timetable_id)
            .ok_or_else(|| timetable_not_found("set_share_token", timetable_id))?;
        timetable.share_token = Some(token);
        timetable.updated_at = Utc::now();
        Ok(timetable.clone())
    }

    async fn find_by_share_token(&self, token: &str) -> RepositoryResult<Timetable> {
        self.check_health()?;
        self.data
            .read()
            .timetables
            .values()
            .find(|t| t.share_token.as_deref() == Some(token))
            .cloned()
            .ok_or_else(|| {
                RepositoryError::not_found_with_context(
                    "Shared timetable not found",
                    ErrorContext::new("find_by_share_token").with_entity("timetable"),
                )
            })
    }
}

#[async_trait]
impl CourseRepository for LocalRepository {
    async fn insert_course(
        &self,
        timetable_id: TimetableId,
        course: NewCourse,
    ) -> RepositoryResult<Course> {
        self.check_health()?;
        let mut data = self.data.write();
        if !data.timetables.contains_key(&timetable_id) {
            return Err(timetable_not_found("insert_course", timetable_id));
        }
        let id = CourseId::new(next_id(&mut data.next_course_id));
        let course = course.into_course(id, timetable_id, Utc::now());
        data.courses.insert(id, course.clone());
        Ok(course)
    }

    async fn get_course(&self, course_id: CourseId) -> RepositoryResult<Course> {
        self.check_health()?;
        self.data
            .read()
            .courses
            .get(&course_id)
            .cloned()
            .ok_or_else(|| course_not_found("get_course", course_id))
    }

    async fn list_courses(&self, timetable_id: TimetableId) -> RepositoryResult<Vec<Course>> {
        self.check_health()?;
        let data = self.data.read();
        if !data.timetables.contains_key(&timetable_id) {
            return Err(timetable_not_found("list_courses", timetable_id));
        }
        let mut courses: Vec<Course> = data
            .courses
            .values()
            .filter(|c| c.timetable_id == timetable_id)
            .cloned()
            .collect();
        courses.sort_by_key(|c| (c.day_of_week, c.start_time, c.id));
        Ok(courses)
    }

    async fn update_course(&self, mut course: Course) -> RepositoryResult<Course> {
        self.check_health()?;
        let mut data = self.data.write();
        if !data.courses.contains_key(&course.id) {
            return Err(course_not_found("update_course", course.id));
        }
        course.updated_at = Utc::now();
        data.courses.insert(course.id, course.clone());
        Ok(course)
    }

    async fn delete_course(&self, course_id: CourseId) -> RepositoryResult<Course> {
        self.check_health()?;
        self.data
            .write()
            .remove_course_cascade(course_id)
            .ok_or_else(|| course_not_found("delete_course", course_id))
    }
}

#[async_trait]
impl ConflictRepository for LocalRepository {
    async fn load_blocks(&self, timetable_id: TimetableId) -> RepositoryResult<Vec<CourseBlock>> {
        self.check_health()?;
        let data = self.data.read();
        if !data.timetables.contains_key(&timetable_id) {
            return Err(timetable_not_found("load_blocks", timetable_id));
        }
        let mut blocks: Vec<CourseBlock> = data
            .courses
            .values()
            .filter(|c| c.timetable_id == timetable_id)
            .map(CourseBlock::from)
            .collect();
        blocks.sort_by_key(|b| b.id);
        Ok(blocks)
    }

    async fn replace_conflicts(
        &self,
        timetable_id: TimetableId,
        conflicts: &[Conflict],
    ) -> RepositoryResult<Vec<StoredConflict>> {
        self.check_health()?;
        let mut data = self.data.write();
        if !data.timetables.contains_key(&timetable_id) {
            return Err(timetable_not_found("replace_conflicts", timetable_id));
        }
        data.conflicts.retain(|_, c| c.timetable_id != timetable_id);

        let now = Utc::now();
        let mut stored = Vec::with_capacity(conflicts.len());
        for conflict in conflicts {
            let id = ConflictId::new(next_id(&mut data.next_conflict_id));
            let record = StoredConflict::new(id, timetable_id, conflict.clone(), now);
            data.conflicts.insert(id, record.clone());
            stored.push(record);
        }
        Ok(stored)
    }

    async fn list_conflicts(
        &self,
        timetable_id: TimetableId,
        include_resolved: bool,
    ) -> RepositoryResult<Vec<StoredConflict>> {
        self.check_health()?;
        let data = self.data.read();
        if !data.timetables.contains_key(&timetable_id) {
            return Err(timetable_not_found("list_conflicts", timetable_id));
        }
        let mut conflicts: Vec<StoredConflict> = data
            .conflicts
            .values()
            .filter(|c| c.timetable_id == timetable_id && (include_resolved || !c.resolved))
            .cloned()
            .collect();
        conflicts.sort_by_key(|c| (c.conflict.course_a, c.conflict.course_b, c.id));
        Ok(conflicts)
    }

    async fn resolve_conflict(&self, conflict_id: ConflictId) -> RepositoryResult<StoredConflict> {
        self.check_health()?;
        let mut data = self.data.write();
        let conflict = data.conflicts.get_mut(&conflict_id).ok_or_else(|| {
            RepositoryError::not_found_with_context(
                format!("Conflict {} not found", conflict_id),
                ErrorContext::new("resolve_conflict")
                    .with_entity("conflict")
                    .with_entity_id(conflict_id),
            )
        })?;
        conflict.resolved = true;
        Ok(conflict.clone())
    }
}

#[async_trait]
impl CommentRepository for LocalRepository {
    async fn insert_comment(
        &self,
        course_id: CourseId,
        comment: NewComment,
    ) -> RepositoryResult<CourseComment> {
        self.check_health()?;
        let mut data = self.data.write();
        if !data.courses.contains_key(&course_id) {
            return Err(course_not_found("insert_comment", course_id));
        }
        let id = CommentId::new(next_id(&mut data.next_comment_id));
        let comment = CourseComment {
            id,
            course_id,
            comment: comment.comment.trim().to_string(),
            comment_type: comment.comment_type,
            is_private: comment.is_private,
            created_at: Utc::now(),
        };
        data.comments.insert(id, comment.clone());
        Ok(comment)
    }

    async fn list_comments(&self, course_id: CourseId) -> RepositoryResult<Vec<CourseComment>> {
        self.check_health()?;
        let data = self.data.read();
        if !data.courses.contains_key(&course_id) {
            return Err(course_not_found("list_comments", course_id));
        }
        let mut comments: Vec<CourseComment> = data
            .comments
            .values()
            .filter(|c| c.course_id == course_id)
            .cloned()
            .collect();
        comments.sort_by_key(|c| (c.created_at, c.id));
        Ok(comments)
    }

    async fn delete_comment(&self, comment_id: CommentId) -> RepositoryResult<()> {
        self.check_health()?;
        self.data
            .write()
            .comments
            .remove(&comment_id)
            .map(|_| ())
            .ok_or_else(|| {
                RepositoryError::not_found_with_context(
                    format!("Comment {} not found", comment_id),
                    ErrorContext::new("delete_comment")
                        .with_entity("comment")
                        .with_entity_id(comment_id),
                )
            })
    }
}

fn notification_not_found(operation: &str, notification_id: NotificationId) -> RepositoryError {
    RepositoryError::not_found_with_context(
        format!("Notification {} not found", notification_id),
        ErrorContext::new(operation)
            .with_entity("notification")
            .with_entity_id(notification_id),
    )
}

#[async_trait]
impl NotificationRepository for LocalRepository {
    async fn insert_notification(
        &self,
        notification: NewNotification,
    ) -> RepositoryResult<Notification> {
        self.check_health()?;
        let mut data = self.data.write();
        if let Some(course_id) = notification.course_id {
            if !data.courses.contains_key(&course_id) {
                return Err(course_not_found("insert_notification", course_id));
            }
        }
        let id = NotificationId::new(next_id(&mut data.next_notification_id));
        let notification = Notification {
            id,
            course_id: notification.course_id,
            title: notification.title,
            message: notification.message,
            notification_type: notification.notification_type,
            notify_time: notification
                .notify_time
                .unwrap_or_else(|| Local::now().naive_local()),
            is_sent: false,
            is_read: false,
            created_at: Utc::now(),
        };
        data.notifications.insert(id, notification.clone());
        Ok(notification)
    }

    async fn list_notifications(&self, unread_only: bool) -> RepositoryResult<Vec<Notification>> {
        self.check_health()?;
        let mut notifications: Vec<Notification> = self
            .data
            .read()
            .notifications
            .values()
            .filter(|n| !unread_only || !n.is_read)
            .cloned()
            .collect();
        notifications.sort_by_key(|n| (n.notify_time, n.id));
        Ok(notifications)
    }

    async fn mark_notification_read(
        &self,
        notification_id: NotificationId,
    ) -> RepositoryResult<Notification> {
        self.check_health()?;
        let mut data = self.data.write();
        let notification = data
            .notifications
            .get_mut(&notification_id)
            .ok_or_else(|| notification_not_found("mark_notification_read", notification_id))?;
        notification.is_read = true;
        Ok(notification.clone())
    }

    async fn delete_notification(&self, notification_id: NotificationId) -> RepositoryResult<()> {
        self.check_health()?;
        self.data
            .write()
            .notifications
            .remove(&notification_id)
            .map(|_| ())
            .ok_or_else(|| notification_not_found("delete_notification", notification_id))
    }

    async fn has_notification_at(
        &self,
        course_id: CourseId,
        notify_time: NaiveDateTime,
    ) -> RepositoryResult<bool> {
        self.check_health()?;
        Ok(self
            .data
            .read()
            .notifications
            .values()
            .any(|n| n.course_id == Some(course_id) && n.notify_time == notify_time))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{ClockTime, ConflictKind, DayOfWeek, Severity};

    fn course(name: &str, day: DayOfWeek, start: &str, end: &str) -> NewCourse {
        NewCourse::new(
            name,
            day,
            ClockTime::parse(start).unwrap(),
            ClockTime::parse(end).unwrap(),
        )
    }

    fn conflict(a: CourseId, b: CourseId) -> Conflict {
        Conflict {
            course_a: a,
            course_b: b,
            kind: ConflictKind::TimeOverlap,
            severity: Severity::High,
            description: "overlap".into(),
            shared_room: None,
        }
    }

    #[tokio::test]
    async fn test_health_check() {
        let repo = LocalRepository::new();
        assert!(repo.health_check().await.unwrap());
        repo.set_healthy(false);
        assert!(!repo.health_check().await.unwrap());
        let err = repo.list_timetables().await.unwrap_err();
        assert!(matches!(err, RepositoryError::ConnectionError { .. }));
    }

    #[tokio::test]
    async fn test_ids_are_monotonic() {
        let repo = LocalRepository::new();
        let a = repo.create_timetable(NewTimetable::named("A")).await.unwrap();
        let b = repo.create_timetable(NewTimetable::named("B")).await.unwrap();
        assert_eq!(a.id, TimetableId::new(1));
        assert_eq!(b.id, TimetableId::new(2));
    }

    #[tokio::test]
    async fn test_only_one_active_timetable() {
        let repo = LocalRepository::new();
        let mut first = NewTimetable::named("First");
        first.is_active = true;
        let first = repo.create_timetable(first).await.unwrap();
        let second = repo.create_timetable(NewTimetable::named("Second")).await.unwrap();

        repo.set_active_timetable(second.id).await.unwrap();
        assert!(!repo.get_timetable(first.id).await.unwrap().is_active);
        assert!(repo.get_timetable(second.id).await.unwrap().is_active);
    }

    #[tokio::test]
    async fn test_courses_sorted_by_day_and_start() {
        let repo = LocalRepository::new();
        let t = repo.create_timetable(NewTimetable::named("T")).await.unwrap();
        repo.insert_course(t.id, course("Late", DayOfWeek::MONDAY, "14:00", "15:00"))
            .await
            .unwrap();
        repo.insert_course(t.id, course("Tue", DayOfWeek::TUESDAY, "08:00", "09:00"))
            .await
            .unwrap();
        repo.insert_course(t.id, course("Early", DayOfWeek::MONDAY, "08:00", "09:00"))
            .await
            .unwrap();
        let names: Vec<String> = repo
            .list_courses(t.id)
            .await
            .unwrap()
            .into_iter()
            .map(|c| c.name)
            .collect();
        assert_eq!(names, vec!["Early", "Late", "Tue"]);
    }

    #[tokio::test]
    async fn test_insert_course_requires_timetable() {
        let repo = LocalRepository::new();
        let err = repo
            .insert_course(
                TimetableId::new(99),
                course("X", DayOfWeek::MONDAY, "08:00", "09:00"),
            )
            .await
            .unwrap_err();
        assert!(err.is_not_found());
        assert_eq!(err.context().entity.as_deref(), Some("timetable"));
    }

    #[tokio::test]
    async fn test_replace_conflicts_discards_previous_records() {
        let repo = LocalRepository::new();
        let t = repo.create_timetable(NewTimetable::named("T")).await.unwrap();
        let stored = repo
            .replace_conflicts(t.id, &[conflict(CourseId::new(1), CourseId::new(2))])
            .await
            .unwrap();
        repo.resolve_conflict(stored[0].id).await.unwrap();
        assert!(repo.list_conflicts(t.id, false).await.unwrap().is_empty());
        assert_eq!(repo.list_conflicts(t.id, true).await.unwrap().len(), 1);

        repo.replace_conflicts(t.id, &[conflict(CourseId::new(1), CourseId::new(2))])
            .await
            .unwrap();
        let all = repo.list_conflicts(t.id, true).await.unwrap();
        assert_eq!(all.len(), 1);
        assert!(!all[0].resolved);
    }

    #[tokio::test]
    async fn test_delete_course_cascades() {
        let repo = LocalRepository::new();
        let t = repo.create_timetable(NewTimetable::named("T")).await.unwrap();
        let c = repo
            .insert_course(t.id, course("C", DayOfWeek::FRIDAY, "10:00", "11:00"))
            .await
            .unwrap();
        repo.insert_comment(c.id, NewComment::new("bring laptop"))
            .await
            .unwrap();
        let n = repo
            .insert_notification(NewNotification {
                course_id: Some(c.id),
                title: "t".into(),
                message: "m".into(),
                notification_type: Default::default(),
                notify_time: None,
            })
            .await
            .unwrap();

        repo.delete_course(c.id).await.unwrap();
        assert_eq!(repo.comment_count(), 0);
        let notifications = repo.list_notifications(false).await.unwrap();
        assert_eq!(notifications[0].id, n.id);
        assert_eq!(notifications[0].course_id, None);
    }

    #[tokio::test]
    async fn test_delete_timetable_cascades() {
        let repo = LocalRepository::new();
        let t = repo.create_timetable(NewTimetable::named("T")).await.unwrap();
        let keep = repo.create_timetable(NewTimetable::named("Keep")).await.unwrap();
        let c = repo
            .insert_course(t.id, course("C", DayOfWeek::FRIDAY, "10:00", "11:00"))
            .await
            .unwrap();
        repo.insert_course(keep.id, course("K", DayOfWeek::FRIDAY, "10:00", "11:00"))
            .await
            .unwrap();
        repo.insert_comment(c.id, NewComment::new("note")).await.unwrap();
        repo.replace_conflicts(t.id, &[conflict(CourseId::new(1), CourseId::new(3))])
            .await
            .unwrap();

        repo.delete_timetable(t.id).await.unwrap();
        assert!(!repo.has_timetable(t.id));
        assert_eq!(repo.course_count(), 1);
        assert_eq!(repo.comment_count(), 0);
        assert!(repo.data.read().conflicts.is_empty());
    }

    #[tokio::test]
    async fn test_share_token_lookup() {
        let repo = LocalRepository::new();
        let t = repo.create_timetable(NewTimetable::named("T")).await.unwrap();
        repo.set_share_token(t.id, "abc".into()).await.unwrap();
        assert_eq!(repo.find_by_share_token("abc").await.unwrap().id, t.id);
        assert!(repo.find_by_share_token("nope").await.unwrap_err().is_not_found());
    }

    #[tokio::test]
    async fn test_timetable_lock_serializes_holders() {
        let repo = LocalRepository::new();
        let id = repo.create_timetable(NewTimetable::named("A")).await.unwrap().id;
        let unrelated = repo.create_timetable(NewTimetable::named("B")).await.unwrap().id;
        let guard = repo.lock_timetable(id).await.unwrap();

        let other = repo.clone();
        let waiter = tokio::spawn(async move { other.lock_timetable(id).await.map(|_| ()) });
        tokio::task::yield_now().await;
        assert!(!waiter.is_finished());

        // A different timetable is not blocked.
        let _unrelated = repo.lock_timetable(unrelated).await.unwrap();

        drop(guard);
        waiter.await.unwrap().unwrap();
    }

    #[tokio::test]
    async fn test_lock_requires_existing_timetable() {
        let repo = LocalRepository::new();
        for raw in 1..=200 {
            let err = repo.lock_timetable(TimetableId::new(raw)).await.unwrap_err();
            assert!(err.is_not_found());
        }
        assert_eq!(repo.lock_entry_count(), 0);
    }

    #[tokio::test]
    async fn test_idle_lock_entries_are_dropped() {
        let repo = LocalRepository::new();
        let a = repo.create_timetable(NewTimetable::named("A")).await.unwrap();
        let b = repo.create_timetable(NewTimetable::named("B")).await.unwrap();
        let c = repo.create_timetable(NewTimetable::named("C")).await.unwrap();

        drop(repo.lock_timetable(a.id).await.unwrap());
        drop(repo.lock_timetable(b.id).await.unwrap());
        let held = repo.lock_timetable(c.id).await.unwrap();
        assert_eq!(repo.lock_entry_count(), 1);

        drop(held);
        repo.delete_timetable(c.id).await.unwrap();
        assert_eq!(repo.lock_entry_count(), 0);
    }

    #[tokio::test]
    async fn test_delete_refuses_last_timetable() {
        let repo = LocalRepository::new();
        let only = repo.create_timetable(NewTimetable::named("Only")).await.unwrap();
        let err = repo.delete_timetable(only.id).await.unwrap_err();
        assert!(matches!(err, RepositoryError::ValidationError { .. }));
        assert!(repo.has_timetable(only.id));
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_deletes_keep_one_timetable() {
        for _ in 0..50 {
            let repo = LocalRepository::new();
            let a = repo.create_timetable(NewTimetable::named("A")).await.unwrap();
            let b = repo.create_timetable(NewTimetable::named("B")).await.unwrap();

            let (left, right) = (repo.clone(), repo.clone());
            let first = tokio::spawn(async move { left.delete_timetable(a.id).await });
            let second = tokio::spawn(async move { right.delete_timetable(b.id).await });
            let results = [first.await.unwrap(), second.await.unwrap()];

            assert_eq!(results.iter().filter(|r| r.is_ok()).count(), 1);
            assert_eq!(repo.timetable_count(), 1);
        }
    }

    #[tokio::test]
    async fn test_clear_resets_counters() {
        let repo = LocalRepository::new();
        repo.create_timetable(NewTimetable::named("A")).await.unwrap();
        repo.clear();
        assert_eq!(repo.timetable_count(), 0);
        let again = repo.create_timetable(NewTimetable::named("B")).await.unwrap();
        assert_eq!(again.id, TimetableId::new(1));
    }
}
