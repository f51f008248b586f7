//! Public API surface for the timetable backend.
//!
//! This file consolidates the identifier types and re-exports the domain
//! models used by the HTTP API. All types derive Serialize/Deserialize.

pub use crate::algorithms::conflicts::{CourseBlock, DetectionReport};
pub use crate::models::conflict::{Conflict, ConflictKind, Severity, StoredConflict};
pub use crate::models::time::{ClockTime, DayOfWeek};
pub use crate::models::timetable::{
    CommentKind, Course, CourseComment, CoursePatch, NewComment, NewCourse, NewNotification,
    NewTimetable, Notification, NotificationKind, Timetable, TimetableDetail, TimetablePatch,
};
pub use crate::services::statistics::{TimetableStatistics, WeekDay, WeekView};

crate::define_id_type!(i64, TimetableId);
crate::define_id_type!(i64, CourseId);
crate::define_id_type!(i64, ConflictId);
crate::define_id_type!(i64, CommentId);
crate::define_id_type!(i64, NotificationId);

#[cfg(test)]
#[path = "api_tests.rs"]
mod api_tests;
