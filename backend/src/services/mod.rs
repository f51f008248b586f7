//! Service layer for features built on top of the core timetable operations.
//!
//! These services read through the repository traits and delegate every
//! course mutation to [`crate::db::services`], so conflict recomputation
//! happens in one place.

pub mod reminders;
pub mod statistics;
pub mod transfer;

pub use reminders::{generate_reminders, next_occurrence, plan_reminder, PlannedReminder};
pub use statistics::{
    build_week_view, compute_statistics, timetable_statistics, week_view, TimetableStatistics,
    WeekDay, WeekView,
};
pub use transfer::{
    export_formats, export_timetable, import_timetable, ExportFormat, ExportPayload,
    ImportOutcome, TransferError,
};
