mod support;

use splan::api::{ConflictKind, CourseId, CoursePatch, DayOfWeek, NewTimetable, Severity};
use splan::db::repository::RepositoryError;
use splan::db::services;
use splan::services::{timetable_statistics, week_view};

use support::{clock, course, monday_courses, repo_with_timetable};

#[tokio::test]
async fn test_conflicts_follow_course_mutations() {
    let (repo, tid) = repo_with_timetable("Winter").await;
    let (courses, report) = services::add_courses(&repo, tid, monday_courses())
        .await
        .unwrap();
    assert_eq!(courses.len(), 3);
    assert_eq!(report.conflicts.len(), 1);

    let stored = services::list_conflicts(&repo, tid, false).await.unwrap();
    assert_eq!(stored.len(), 1);
    let conflict = &stored[0].conflict;
    assert_eq!(conflict.kind, ConflictKind::TimeOverlap);
    assert_eq!(conflict.severity, Severity::High);
    assert_eq!(conflict.shared_room.as_deref(), Some("H1"));
    assert_eq!(
        stored[0].kinds,
        vec![ConflictKind::TimeOverlap, ConflictKind::RoomConflict]
    );

    // Moving the second lecture to Tuesday clears the conflict.
    let moved = CoursePatch {
        day_of_week: Some(DayOfWeek::TUESDAY),
        ..Default::default()
    };
    services::update_course(&repo, courses[1].id, moved).await.unwrap();
    assert!(services::list_conflicts(&repo, tid, false).await.unwrap().is_empty());

    // Extending the first lecture into the seminar creates a new one.
    let extended = CoursePatch {
        end_time: Some(clock("11:00")),
        ..Default::default()
    };
    services::update_course(&repo, courses[0].id, extended).await.unwrap();
    let stored = services::list_conflicts(&repo, tid, false).await.unwrap();
    assert_eq!(stored.len(), 1);
    assert_eq!(stored[0].conflict.course_a, courses[0].id);
    assert_eq!(stored[0].conflict.course_b, courses[2].id);
    assert!(stored[0].conflict.shared_room.is_none());

    services::delete_course(&repo, courses[2].id).await.unwrap();
    assert!(services::list_conflicts(&repo, tid, false).await.unwrap().is_empty());
}

#[tokio::test]
async fn test_resolved_flag_resets_on_next_run() {
    let (repo, tid) = repo_with_timetable("Winter").await;
    services::add_courses(&repo, tid, monday_courses()).await.unwrap();
    let stored = services::list_conflicts(&repo, tid, false).await.unwrap();

    let resolved = services::resolve_conflict(&repo, stored[0].id).await.unwrap();
    assert!(resolved.resolved);
    assert!(services::list_conflicts(&repo, tid, false).await.unwrap().is_empty());
    assert_eq!(services::list_conflicts(&repo, tid, true).await.unwrap().len(), 1);

    let report = services::recompute_conflicts(&repo, tid).await.unwrap();
    assert_eq!(report.conflicts.len(), 1);
    let stored = services::list_conflicts(&repo, tid, false).await.unwrap();
    assert_eq!(stored.len(), 1);
    assert!(!stored[0].resolved);
}

#[tokio::test]
async fn test_back_to_back_courses_never_conflict() {
    let (repo, tid) = repo_with_timetable("Winter").await;
    let courses = vec![
        course("A", DayOfWeek::WEDNESDAY, "08:00", "09:00").with_room("R1"),
        course("B", DayOfWeek::WEDNESDAY, "09:00", "10:00").with_room("R1"),
        course("C", DayOfWeek::WEDNESDAY, "10:00", "11:00").with_room("R1"),
    ];
    let (_, report) = services::add_courses(&repo, tid, courses).await.unwrap();
    assert!(report.is_clean());
    assert_eq!(report.skipped, 0);
}

#[tokio::test]
async fn test_duplicate_runs_detection_on_copy() {
    let (repo, tid) = repo_with_timetable("Winter").await;
    services::add_courses(&repo, tid, monday_courses()).await.unwrap();

    let copy = services::duplicate_timetable(&repo, tid, None).await.unwrap();
    assert_eq!(copy.timetable.name, "Winter (Copy)");
    assert!(!copy.timetable.is_active);
    assert_eq!(copy.courses.len(), 3);

    let copied = services::list_conflicts(&repo, copy.timetable.id, false)
        .await
        .unwrap();
    assert_eq!(copied.len(), 1);
    assert!(copied[0].conflict.involves(copy.courses[0].id));
    assert!(!copied[0].conflict.involves(CourseId::new(1)));
}

#[tokio::test]
async fn test_share_token_is_stable() {
    let (repo, tid) = repo_with_timetable("Winter").await;
    let first = services::share_timetable(&repo, tid).await.unwrap();
    let token = first.share_token.clone().unwrap();
    assert_eq!(token.len(), 32);

    let second = services::share_timetable(&repo, tid).await.unwrap();
    assert_eq!(second.share_token.as_deref(), Some(token.as_str()));

    let shared = services::get_shared_timetable(&repo, &token).await.unwrap();
    assert_eq!(shared.timetable.id, tid);

    let err = services::get_shared_timetable(&repo, "missing").await.unwrap_err();
    assert!(err.is_not_found());
}

#[tokio::test]
async fn test_active_timetable_falls_back_to_first() {
    let (repo, tid) = repo_with_timetable("Winter").await;
    services::create_timetable(&repo, NewTimetable::named("Summer"))
        .await
        .unwrap();

    let active = services::get_active_timetable(&repo).await.unwrap();
    assert_eq!(active.timetable.id, tid);
    assert!(active.timetable.is_active);
}

#[tokio::test]
async fn test_last_timetable_cannot_be_deleted() {
    let (repo, tid) = repo_with_timetable("Winter").await;
    let err = services::delete_timetable(&repo, tid).await.unwrap_err();
    assert!(matches!(err, RepositoryError::ValidationError { .. }));

    let other = services::create_timetable(&repo, NewTimetable::named("Summer"))
        .await
        .unwrap();
    services::delete_timetable(&repo, tid).await.unwrap();
    assert!(services::get_timetable(&repo, tid).await.unwrap_err().is_not_found());
    assert!(services::get_timetable(&repo, other.id).await.is_ok());
}

#[tokio::test]
async fn test_week_view_and_statistics() {
    let (repo, tid) = repo_with_timetable("Winter").await;
    let mut courses = monday_courses();
    courses.push(course("Lab", DayOfWeek::FRIDAY, "14:00", "16:00"));
    services::add_courses(&repo, tid, courses).await.unwrap();

    let view = week_view(&repo, tid).await.unwrap();
    assert_eq!(view.days.len(), 7);
    assert_eq!(view.days[0].courses.len(), 3);
    assert_eq!(view.days[4].courses[0].name, "Lab");

    let stats = timetable_statistics(&repo, tid).await.unwrap();
    assert_eq!(stats.total_courses, 4);
    assert_eq!(stats.total_conflicts, 1);
    assert_eq!(stats.days_distribution["Monday"], 3);
    assert_eq!(stats.days_distribution["Friday"], 1);
    assert_eq!(stats.weekly_minutes, 90 + 90 + 90 + 120);
}
