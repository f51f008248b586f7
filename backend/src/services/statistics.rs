//! Week view and aggregate numbers for a timetable.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::api::TimetableId;
use crate::db::repository::{
    ConflictRepository, CourseRepository, FullRepository, RepositoryResult, TimetableRepository,
};
use crate::models::{Course, DayOfWeek};

/// One weekday column of the week view.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeekDay {
    pub day_of_week: DayOfWeek,
    pub day_name: String,
    pub courses: Vec<Course>,
}

/// Courses laid out Monday to Sunday.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeekView {
    pub timetable_id: TimetableId,
    pub days: Vec<WeekDay>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimetableStatistics {
    pub total_courses: usize,
    pub total_credits: u32,
    /// Unresolved conflicts only.
    pub total_conflicts: usize,
    pub course_types: BTreeMap<String, usize>,
    /// Keyed by English day name; days without courses are omitted.
    pub days_distribution: BTreeMap<String, usize>,
    pub mandatory_courses: usize,
    pub optional_courses: usize,
    /// Sum of course durations.
    pub weekly_minutes: u32,
}

/// Group courses into seven days, each sorted by start time.
pub fn build_week_view(timetable_id: TimetableId, courses: &[Course]) -> WeekView {
    let days = DayOfWeek::all()
        .map(|day| {
            let mut day_courses: Vec<Course> = courses
                .iter()
                .filter(|c| c.day_of_week == day)
                .cloned()
                .collect();
            day_courses.sort_by_key(|c| (c.start_time, c.end_time, c.id));
            WeekDay {
                day_of_week: day,
                day_name: day.name().to_string(),
                courses: day_courses,
            }
        })
        .collect();
    WeekView { timetable_id, days }
}

pub fn compute_statistics(courses: &[Course], unresolved_conflicts: usize) -> TimetableStatistics {
    let mut stats = TimetableStatistics {
        total_courses: courses.len(),
        total_conflicts: unresolved_conflicts,
        ..Default::default()
    };
    for course in courses {
        // Credits are user input; the totals clamp instead of wrapping.
        stats.total_credits = stats
            .total_credits
            .saturating_add(course.credits.unwrap_or(0));
        stats.weekly_minutes = stats
            .weekly_minutes
            .saturating_add(u32::from(course.duration_minutes()));
        *stats
            .course_types
            .entry(course.course_type.clone())
            .or_insert(0) += 1;
        *stats
            .days_distribution
            .entry(course.day_of_week.name().to_string())
            .or_insert(0) += 1;
        if course.is_mandatory {
            stats.mandatory_courses += 1;
        } else {
            stats.optional_courses += 1;
        }
    }
    stats
}

pub async fn week_view<R: FullRepository + ?Sized>(
    repo: &R,
    timetable_id: TimetableId,
) -> RepositoryResult<WeekView> {
    repo.get_timetable(timetable_id).await?;
    let courses = repo.list_courses(timetable_id).await?;
    Ok(build_week_view(timetable_id, &courses))
}

pub async fn timetable_statistics<R: FullRepository + ?Sized>(
    repo: &R,
    timetable_id: TimetableId,
) -> RepositoryResult<TimetableStatistics> {
    repo.get_timetable(timetable_id).await?;
    let courses = repo.list_courses(timetable_id).await?;
    let unresolved = repo.list_conflicts(timetable_id, false).await?.len();
    Ok(compute_statistics(&courses, unresolved))
}
