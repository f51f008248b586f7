//! Reminder notifications for upcoming courses.
//!
//! Courses repeat weekly, so the reminder for a course always refers to its
//! next occurrence after "now". Times are local wall-clock values.

use chrono::{Datelike, Duration, NaiveDateTime};
use log::{debug, info};

use crate::api::{CourseId, TimetableId};
use crate::db::repository::{
    CourseRepository, FullRepository, NotificationRepository, RepositoryResult,
    TimetableRepository,
};
use crate::models::{ClockTime, Course, DayOfWeek, NewNotification, Notification, NotificationKind};

/// A reminder that should be stored, computed without touching the store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlannedReminder {
    pub course_id: CourseId,
    pub starts_at: NaiveDateTime,
    pub notify_time: NaiveDateTime,
    pub title: String,
    pub message: String,
}

impl PlannedReminder {
    fn into_notification(self) -> NewNotification {
        NewNotification {
            course_id: Some(self.course_id),
            title: self.title,
            message: self.message,
            notification_type: NotificationKind::CourseStart,
            notify_time: Some(self.notify_time),
        }
    }
}

/// First start of a weekly course strictly after `now`.
pub fn next_occurrence(day: DayOfWeek, start: ClockTime, now: NaiveDateTime) -> NaiveDateTime {
    let today = now.weekday().num_days_from_monday() as i64;
    let days_ahead = (i64::from(day.index()) - today).rem_euclid(7);
    let candidate = (now.date() + Duration::days(days_ahead)).and_time(start.to_naive_time());
    if candidate > now {
        candidate
    } else {
        candidate + Duration::days(7)
    }
}

/// Plan the reminder for `course`, if one falls inside `[now, now + horizon]`.
///
/// Returns `None` when reminders are disabled for the course or the reminder
/// time is already past or beyond the horizon.
pub fn plan_reminder(
    course: &Course,
    now: NaiveDateTime,
    horizon_minutes: u32,
) -> Option<PlannedReminder> {
    if !course.reminder_enabled {
        return None;
    }
    let starts_at = next_occurrence(course.day_of_week, course.start_time, now);
    let notify_time = starts_at - Duration::minutes(i64::from(course.reminder_minutes));
    let horizon_end = now + Duration::minutes(i64::from(horizon_minutes));
    if notify_time < now || notify_time > horizon_end {
        return None;
    }

    let mut message = format!(
        "{} starts in {} minutes",
        course.name, course.reminder_minutes
    );
    if let Some(room) = course.room.as_deref().map(str::trim).filter(|r| !r.is_empty()) {
        message.push_str(&format!(" in room {}", room));
    }

    Some(PlannedReminder {
        course_id: course.id,
        starts_at,
        notify_time,
        title: format!("Reminder: {}", course.name),
        message,
    })
}

/// Create reminder notifications for a timetable's courses.
///
/// A reminder already stored for the same course at the same `notify_time`
/// is not created again, so repeated calls are idempotent.
///
/// # Returns
/// The notifications created by this call.
pub async fn generate_reminders<R: FullRepository + ?Sized>(
    repo: &R,
    timetable_id: TimetableId,
    now: NaiveDateTime,
    horizon_minutes: u32,
) -> RepositoryResult<Vec<Notification>> {
    repo.get_timetable(timetable_id).await?;
    let courses = repo.list_courses(timetable_id).await?;

    let mut created = Vec::new();
    for course in &courses {
        let Some(planned) = plan_reminder(course, now, horizon_minutes) else {
            continue;
        };
        if repo
            .has_notification_at(planned.course_id, planned.notify_time)
            .await?
        {
            debug!(
                "Reminder for course {} at {} already exists",
                planned.course_id, planned.notify_time
            );
            continue;
        }
        created.push(repo.insert_notification(planned.into_notification()).await?);
    }

    info!(
        "Generated {} reminder(s) for timetable {}",
        created.len(),
        timetable_id
    );
    Ok(created)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::repositories::LocalRepository;
    use crate::db::services;
    use crate::models::{NewCourse, NewTimetable};
    use chrono::NaiveDate;

    // 2024-10-14 is a Monday.
    fn at(day: u32, hour: u32, minute: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 10, day)
            .unwrap()
            .and_hms_opt(hour, minute, 0)
            .unwrap()
    }

    fn clock(s: &str) -> ClockTime {
        ClockTime::parse(s).unwrap()
    }

    #[test]
    fn test_next_occurrence_later_today() {
        let next = next_occurrence(DayOfWeek::MONDAY, clock("10:00"), at(14, 9, 0));
        assert_eq!(next, at(14, 10, 0));
    }

    #[test]
    fn test_next_occurrence_is_strictly_after_now() {
        let next = next_occurrence(DayOfWeek::MONDAY, clock("10:00"), at(14, 10, 0));
        assert_eq!(next, at(21, 10, 0));
    }

    #[test]
    fn test_next_occurrence_later_this_week() {
        let next = next_occurrence(DayOfWeek::THURSDAY, clock("08:15"), at(14, 12, 0));
        assert_eq!(next, at(17, 8, 15));
    }

    #[test]
    fn test_next_occurrence_wraps_to_next_week() {
        // Sunday 2024-10-20, asking for Monday.
        let next = next_occurrence(DayOfWeek::MONDAY, clock("08:00"), at(20, 18, 0));
        assert_eq!(next, at(21, 8, 0));
    }

    fn course(reminder_enabled: bool, room: Option<&str>) -> Course {
        let mut new = NewCourse::new("Analysis", DayOfWeek::MONDAY, clock("10:00"), clock("11:30"));
        new.reminder_enabled = reminder_enabled;
        new.reminder_minutes = 15;
        new.room = room.map(str::to_string);
        new.into_course(CourseId::new(1), TimetableId::new(1), chrono::Utc::now())
    }

    #[test]
    fn test_plan_reminder_message() {
        let planned = plan_reminder(&course(true, Some("H 1")), at(14, 9, 0), 1440).unwrap();
        assert_eq!(planned.notify_time, at(14, 9, 45));
        assert_eq!(planned.title, "Reminder: Analysis");
        assert_eq!(planned.message, "Analysis starts in 15 minutes in room H 1");

        let planned = plan_reminder(&course(true, None), at(14, 9, 0), 1440).unwrap();
        assert_eq!(planned.message, "Analysis starts in 15 minutes");
    }

    #[test]
    fn test_plan_reminder_respects_flag_past_and_horizon() {
        assert!(plan_reminder(&course(false, None), at(14, 9, 0), 1440).is_none());
        // Reminder time 09:45 already passed.
        assert!(plan_reminder(&course(true, None), at(14, 9, 50), 1440).is_none());
        // Next occurrence a week out, beyond a one-day horizon.
        assert!(plan_reminder(&course(true, None), at(14, 11, 0), 1440).is_none());
        // Horizon boundary is inclusive.
        assert!(plan_reminder(&course(true, None), at(14, 9, 0), 45).is_some());
        assert!(plan_reminder(&course(true, None), at(14, 9, 0), 44).is_none());
    }

    #[tokio::test]
    async fn test_generate_reminders_is_idempotent() {
        let repo = LocalRepository::new();
        let tid = services::create_timetable(&repo, NewTimetable::named("T"))
            .await
            .unwrap()
            .id;
        let mut with_reminder =
            NewCourse::new("Analysis", DayOfWeek::MONDAY, clock("10:00"), clock("11:30"));
        with_reminder.reminder_enabled = true;
        services::create_course(&repo, tid, with_reminder).await.unwrap();
        services::create_course(
            &repo,
            tid,
            NewCourse::new("Quiet", DayOfWeek::MONDAY, clock("12:00"), clock("13:00")),
        )
        .await
        .unwrap();

        let created = generate_reminders(&repo, tid, at(14, 9, 0), 1440).await.unwrap();
        assert_eq!(created.len(), 1);
        assert_eq!(created[0].notification_type, NotificationKind::CourseStart);
        assert_eq!(created[0].notify_time, at(14, 9, 45));

        let again = generate_reminders(&repo, tid, at(14, 9, 5), 1440).await.unwrap();
        assert!(again.is_empty());
        assert_eq!(services::list_notifications(&repo, false).await.unwrap().len(), 1);
    }
}
