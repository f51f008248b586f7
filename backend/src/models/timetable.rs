//! Timetable, course, comment and notification entities.

use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};

use super::time::{ClockTime, DayOfWeek};
use crate::api::{CommentId, CourseId, NotificationId, TimetableId};

pub const DEFAULT_COLOR_THEME: &str = "blue";
pub const DEFAULT_COURSE_COLOR: &str = "#3498db";
pub const DEFAULT_COURSE_TYPE: &str = "Lecture";
pub const DEFAULT_REMINDER_MINUTES: u32 = 15;

fn default_color_theme() -> String {
    DEFAULT_COLOR_THEME.to_string()
}

fn default_course_color() -> String {
    DEFAULT_COURSE_COLOR.to_string()
}

/// Reads a present field into `Some`, so that an explicit `null` becomes
/// `Some(None)` while a missing field stays `None` through `#[serde(default)]`.
fn double_option<'de, D, T>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

fn default_course_type() -> String {
    DEFAULT_COURSE_TYPE.to_string()
}

fn default_reminder_minutes() -> u32 {
    DEFAULT_REMINDER_MINUTES
}

fn default_true() -> bool {
    true
}

// =============================================================================
// Timetable
// =============================================================================

/// A named collection of courses for one semester.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Timetable {
    pub id: TimetableId,
    pub name: String,
    pub description: Option<String>,
    pub semester: Option<String>,
    pub year: Option<i32>,
    pub color_theme: String,
    pub is_active: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub share_token: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Fields supplied when creating a timetable.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NewTimetable {
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub semester: Option<String>,
    #[serde(default)]
    pub year: Option<i32>,
    #[serde(default)]
    pub color_theme: Option<String>,
    #[serde(default)]
    pub is_active: bool,
}

impl NewTimetable {
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    /// Materialize into a stored timetable; the repository assigns the id.
    pub fn into_timetable(self, id: TimetableId, now: DateTime<Utc>) -> Timetable {
        Timetable {
            id,
            name: self.name.trim().to_string(),
            description: self.description,
            semester: self.semester,
            year: self.year,
            color_theme: self.color_theme.unwrap_or_else(default_color_theme),
            is_active: self.is_active,
            share_token: None,
            created_at: now,
            updated_at: now,
        }
    }
}

/// Partial update for a timetable. `None` leaves a field unchanged and
/// `Some(None)` clears an optional field.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TimetablePatch {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(
        default,
        deserialize_with = "double_option",
        skip_serializing_if = "Option::is_none"
    )]
    pub description: Option<Option<String>>,
    #[serde(
        default,
        deserialize_with = "double_option",
        skip_serializing_if = "Option::is_none"
    )]
    pub semester: Option<Option<String>>,
    #[serde(
        default,
        deserialize_with = "double_option",
        skip_serializing_if = "Option::is_none"
    )]
    pub year: Option<Option<i32>>,
    #[serde(default)]
    pub color_theme: Option<String>,
    #[serde(default)]
    pub is_active: Option<bool>,
}

impl TimetablePatch {
    pub fn apply(self, timetable: &mut Timetable) {
        if let Some(name) = self.name {
            timetable.name = name.trim().to_string();
        }
        if let Some(description) = self.description {
            timetable.description = description;
        }
        if let Some(semester) = self.semester {
            timetable.semester = semester;
        }
        if let Some(year) = self.year {
            timetable.year = year;
        }
        if let Some(color_theme) = self.color_theme {
            timetable.color_theme = color_theme;
        }
        if let Some(is_active) = self.is_active {
            timetable.is_active = is_active;
        }
    }
}

/// A timetable together with its courses.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimetableDetail {
    #[serde(flatten)]
    pub timetable: Timetable,
    pub courses: Vec<Course>,
}

// =============================================================================
// Course
// =============================================================================

/// One weekly course block inside a timetable.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Course {
    pub id: CourseId,
    pub timetable_id: TimetableId,
    pub name: String,
    pub code: Option<String>,
    pub instructor: Option<String>,
    pub room: Option<String>,
    pub building: Option<String>,
    pub description: Option<String>,
    pub color: String,
    pub day_of_week: DayOfWeek,
    pub start_time: ClockTime,
    pub end_time: ClockTime,
    pub course_type: String,
    pub credits: Option<u32>,
    pub is_mandatory: bool,
    pub horst_url: Option<String>,
    pub moodle_url: Option<String>,
    pub external_url: Option<String>,
    pub reminder_enabled: bool,
    pub reminder_minutes: u32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Course {
    /// Length of the block in minutes; zero when the times are inverted.
    pub fn duration_minutes(&self) -> u16 {
        self.end_time.minutes().saturating_sub(self.start_time.minutes())
    }
}

/// Fields supplied when creating a course.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewCourse {
    pub name: String,
    #[serde(default)]
    pub code: Option<String>,
    #[serde(default)]
    pub instructor: Option<String>,
    #[serde(default)]
    pub room: Option<String>,
    #[serde(default)]
    pub building: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default = "default_course_color")]
    pub color: String,
    pub day_of_week: DayOfWeek,
    pub start_time: ClockTime,
    pub end_time: ClockTime,
    #[serde(default = "default_course_type")]
    pub course_type: String,
    #[serde(default)]
    pub credits: Option<u32>,
    #[serde(default = "default_true")]
    pub is_mandatory: bool,
    #[serde(default)]
    pub horst_url: Option<String>,
    #[serde(default)]
    pub moodle_url: Option<String>,
    #[serde(default)]
    pub external_url: Option<String>,
    #[serde(default)]
    pub reminder_enabled: bool,
    #[serde(default = "default_reminder_minutes")]
    pub reminder_minutes: u32,
}

impl NewCourse {
    /// A course with only the required attributes set; everything else defaults.
    pub fn new(
        name: impl Into<String>,
        day_of_week: DayOfWeek,
        start_time: ClockTime,
        end_time: ClockTime,
    ) -> Self {
        Self {
            name: name.into(),
            code: None,
            instructor: None,
            room: None,
            building: None,
            description: None,
            color: default_course_color(),
            day_of_week,
            start_time,
            end_time,
            course_type: default_course_type(),
            credits: None,
            is_mandatory: true,
            horst_url: None,
            moodle_url: None,
            external_url: None,
            reminder_enabled: false,
            reminder_minutes: DEFAULT_REMINDER_MINUTES,
        }
    }

    pub fn with_room(mut self, room: impl Into<String>) -> Self {
        self.room = Some(room.into());
        self
    }

    pub fn into_course(
        self,
        id: CourseId,
        timetable_id: TimetableId,
        now: DateTime<Utc>,
    ) -> Course {
        Course {
            id,
            timetable_id,
            name: self.name.trim().to_string(),
            code: self.code,
            instructor: self.instructor,
            room: self.room,
            building: self.building,
            description: self.description,
            color: self.color,
            day_of_week: self.day_of_week,
            start_time: self.start_time,
            end_time: self.end_time,
            course_type: self.course_type,
            credits: self.credits,
            is_mandatory: self.is_mandatory,
            horst_url: self.horst_url,
            moodle_url: self.moodle_url,
            external_url: self.external_url,
            reminder_enabled: self.reminder_enabled,
            reminder_minutes: self.reminder_minutes,
            created_at: now,
            updated_at: now,
        }
    }
}

impl From<&Course> for NewCourse {
    fn from(course: &Course) -> Self {
        Self {
            name: course.name.clone(),
            code: course.code.clone(),
            instructor: course.instructor.clone(),
            room: course.room.clone(),
            building: course.building.clone(),
            description: course.description.clone(),
            color: course.color.clone(),
            day_of_week: course.day_of_week,
            start_time: course.start_time,
            end_time: course.end_time,
            course_type: course.course_type.clone(),
            credits: course.credits,
            is_mandatory: course.is_mandatory,
            horst_url: course.horst_url.clone(),
            moodle_url: course.moodle_url.clone(),
            external_url: course.external_url.clone(),
            reminder_enabled: course.reminder_enabled,
            reminder_minutes: course.reminder_minutes,
        }
    }
}

/// Partial update for a course. `None` leaves a field unchanged.
///
/// Optional course fields use a nested `Option`: a JSON `null` clears the
/// value, a missing key keeps it.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CoursePatch {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(
        default,
        deserialize_with = "double_option",
        skip_serializing_if = "Option::is_none"
    )]
    pub code: Option<Option<String>>,
    #[serde(
        default,
        deserialize_with = "double_option",
        skip_serializing_if = "Option::is_none"
    )]
    pub instructor: Option<Option<String>>,
    #[serde(
        default,
        deserialize_with = "double_option",
        skip_serializing_if = "Option::is_none"
    )]
    pub room: Option<Option<String>>,
    #[serde(
        default,
        deserialize_with = "double_option",
        skip_serializing_if = "Option::is_none"
    )]
    pub building: Option<Option<String>>,
    #[serde(
        default,
        deserialize_with = "double_option",
        skip_serializing_if = "Option::is_none"
    )]
    pub description: Option<Option<String>>,
    #[serde(default)]
    pub color: Option<String>,
    #[serde(default)]
    pub day_of_week: Option<DayOfWeek>,
    #[serde(default)]
    pub start_time: Option<ClockTime>,
    #[serde(default)]
    pub end_time: Option<ClockTime>,
    #[serde(default)]
    pub course_type: Option<String>,
    #[serde(
        default,
        deserialize_with = "double_option",
        skip_serializing_if = "Option::is_none"
    )]
    pub credits: Option<Option<u32>>,
    #[serde(default)]
    pub is_mandatory: Option<bool>,
    #[serde(
        default,
        deserialize_with = "double_option",
        skip_serializing_if = "Option::is_none"
    )]
    pub horst_url: Option<Option<String>>,
    #[serde(
        default,
        deserialize_with = "double_option",
        skip_serializing_if = "Option::is_none"
    )]
    pub moodle_url: Option<Option<String>>,
    #[serde(
        default,
        deserialize_with = "double_option",
        skip_serializing_if = "Option::is_none"
    )]
    pub external_url: Option<Option<String>>,
    #[serde(default)]
    pub reminder_enabled: Option<bool>,
    #[serde(default)]
    pub reminder_minutes: Option<u32>,
}

impl CoursePatch {
    pub fn apply(self, course: &mut Course) {
        if let Some(name) = self.name {
            course.name = name.trim().to_string();
        }
        if let Some(code) = self.code {
            course.code = code;
        }
        if let Some(instructor) = self.instructor {
            course.instructor = instructor;
        }
        if let Some(room) = self.room {
            course.room = room;
        }
        if let Some(building) = self.building {
            course.building = building;
        }
        if let Some(description) = self.description {
            course.description = description;
        }
        if let Some(color) = self.color {
            course.color = color;
        }
        if let Some(day) = self.day_of_week {
            course.day_of_week = day;
        }
        if let Some(start) = self.start_time {
            course.start_time = start;
        }
        if let Some(end) = self.end_time {
            course.end_time = end;
        }
        if let Some(course_type) = self.course_type {
            course.course_type = course_type;
        }
        if let Some(credits) = self.credits {
            course.credits = credits;
        }
        if let Some(is_mandatory) = self.is_mandatory {
            course.is_mandatory = is_mandatory;
        }
        if let Some(url) = self.horst_url {
            course.horst_url = url;
        }
        if let Some(url) = self.moodle_url {
            course.moodle_url = url;
        }
        if let Some(url) = self.external_url {
            course.external_url = url;
        }
        if let Some(enabled) = self.reminder_enabled {
            course.reminder_enabled = enabled;
        }
        if let Some(minutes) = self.reminder_minutes {
            course.reminder_minutes = minutes;
        }
    }
}

// =============================================================================
// Comments
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CommentKind {
    #[default]
    Note,
    Important,
    Reminder,
    Question,
}

/// A free-text note attached to a course.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CourseComment {
    pub id: CommentId,
    pub course_id: CourseId,
    pub comment: String,
    pub comment_type: CommentKind,
    pub is_private: bool,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewComment {
    pub comment: String,
    #[serde(default)]
    pub comment_type: CommentKind,
    #[serde(default = "default_true")]
    pub is_private: bool,
}

impl NewComment {
    pub fn new(comment: impl Into<String>) -> Self {
        Self {
            comment: comment.into(),
            comment_type: CommentKind::Note,
            is_private: true,
        }
    }
}

// =============================================================================
// Notifications
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NotificationKind {
    #[default]
    Reminder,
    CourseStart,
    Info,
}

/// A message scheduled for the student at a wall-clock instant.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Notification {
    pub id: NotificationId,
    pub course_id: Option<CourseId>,
    pub title: String,
    pub message: String,
    pub notification_type: NotificationKind,
    pub notify_time: NaiveDateTime,
    pub is_sent: bool,
    pub is_read: bool,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewNotification {
    #[serde(default)]
    pub course_id: Option<CourseId>,
    pub title: String,
    pub message: String,
    #[serde(default)]
    pub notification_type: NotificationKind,
    /// Defaults to "now" when omitted.
    #[serde(default)]
    pub notify_time: Option<NaiveDateTime>,
}
