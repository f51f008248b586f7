//! Conflict detection over the course blocks of one timetable.

use serde::{Deserialize, Serialize};
use std::collections::HashSet;

use crate::api::CourseId;
use crate::models::conflict::{Conflict, ConflictKind};
use crate::models::time::{ClockTime, DayOfWeek};
use crate::models::timetable::Course;

const DAYS_PER_WEEK: usize = 7;

/// The unit the detector operates on: one weekly occurrence of a course.
///
/// `day_of_week` is kept as a raw integer so that blocks from untrusted
/// sources can be handed over unchecked; out-of-range days are skipped.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CourseBlock {
    pub id: CourseId,
    pub name: String,
    pub day_of_week: u8,
    pub start: ClockTime,
    pub end: ClockTime,
    #[serde(default)]
    pub room: Option<String>,
}

impl CourseBlock {
    pub fn new(
        id: CourseId,
        name: impl Into<String>,
        day_of_week: u8,
        start: ClockTime,
        end: ClockTime,
    ) -> Self {
        Self {
            id,
            name: name.into(),
            day_of_week,
            start,
            end,
            room: None,
        }
    }

    pub fn with_room(mut self, room: impl Into<String>) -> Self {
        self.room = Some(room.into());
        self
    }

    /// A block can take part in detection only with `start < end` and a day in 0-6.
    pub fn is_well_formed(&self) -> bool {
        self.start < self.end && usize::from(self.day_of_week) < DAYS_PER_WEEK
    }

    /// Trimmed room name, `None` when absent or blank.
    pub fn normalized_room(&self) -> Option<&str> {
        self.room
            .as_deref()
            .map(str::trim)
            .filter(|room| !room.is_empty())
    }
}

impl From<&Course> for CourseBlock {
    fn from(course: &Course) -> Self {
        Self {
            id: course.id,
            name: course.name.clone(),
            day_of_week: course.day_of_week.index(),
            start: course.start_time,
            end: course.end_time,
            room: course.room.clone(),
        }
    }
}

/// Result of one detection run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DetectionReport {
    /// Conflicts sorted by `(course_a, course_b)`.
    pub conflicts: Vec<Conflict>,
    /// Number of malformed blocks left out of the analysis.
    pub skipped: usize,
}

impl DetectionReport {
    pub fn is_clean(&self) -> bool {
        self.conflicts.is_empty()
    }

    pub fn room_conflicts(&self) -> usize {
        self.conflicts.iter().filter(|c| c.is_room_conflict()).count()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DetectionError {
    #[error("course block {0} appears more than once in the batch")]
    DuplicateBlock(CourseId),
}

/// Half-open interval intersection: blocks that merely touch do not overlap.
pub fn overlaps(a: &CourseBlock, b: &CourseBlock) -> bool {
    a.day_of_week == b.day_of_week && a.start < b.end && b.start < a.end
}

/// Finds every pair of same-day course blocks whose time ranges overlap.
///
/// Blocks are partitioned by weekday, each day is sorted by start time and
/// swept: a block is compared only against the later-starting blocks that
/// begin before it ends. The observable result equals a full pairwise scan
/// with [`overlaps`].
///
/// # Classification
///
/// Every overlapping pair is reported once as [`ConflictKind::TimeOverlap`]
/// with HIGH severity. When both blocks name the same non-blank room the
/// conflict also carries `shared_room`, which adds
/// [`ConflictKind::RoomConflict`] to [`Conflict::kinds`]. A shared room without
/// a time overlap is not a conflict.
///
/// # Arguments
///
/// * `blocks` - All course blocks of one timetable, in any order
///
/// # Returns
///
/// * `Ok(DetectionReport)` - Conflicts in canonical order plus the number of
///   malformed blocks (`start >= end` or day outside 0-6) that were skipped
/// * `Err(DetectionError::DuplicateBlock)` - The same block id was passed twice
pub fn detect_conflicts(blocks: &[CourseBlock]) -> Result<DetectionReport, DetectionError> {
    let mut seen = HashSet::with_capacity(blocks.len());
    for block in blocks {
        if !seen.insert(block.id) {
            return Err(DetectionError::DuplicateBlock(block.id));
        }
    }

    let mut days: [Vec<&CourseBlock>; DAYS_PER_WEEK] = Default::default();
    let mut skipped = 0;
    for block in blocks {
        if block.is_well_formed() {
            days[usize::from(block.day_of_week)].push(block);
        } else {
            skipped += 1;
        }
    }

    let mut conflicts = Vec::new();
    for day in days.iter_mut() {
        day.sort_by_key(|block| (block.start, block.end, block.id));
        for (i, current) in day.iter().enumerate() {
            for later in &day[i + 1..] {
                if later.start >= current.end {
                    break;
                }
                conflicts.push(build_conflict(current, later));
            }
        }
    }

    conflicts.sort_by_key(|conflict| (conflict.course_a, conflict.course_b));
    Ok(DetectionReport { conflicts, skipped })
}

fn build_conflict(x: &CourseBlock, y: &CourseBlock) -> Conflict {
    let (a, b) = if x.id < y.id { (x, y) } else { (y, x) };

    let shared_room = match (a.normalized_room(), b.normalized_room()) {
        (Some(room_a), Some(room_b)) if room_a == room_b => Some(room_a.to_string()),
        _ => None,
    };

    let day = DayOfWeek::new(i64::from(a.day_of_week))
        .map(|day| day.name())
        .unwrap_or("?");
    let window_start = a.start.max(b.start);
    let window_end = a.end.min(b.end);
    let mut description = format!(
        "'{}' overlaps with '{}' on {} ({}-{})",
        a.name, b.name, day, window_start, window_end
    );
    if let Some(room) = &shared_room {
        description.push_str(&format!(", both in room {}", room));
    }

    let kind = ConflictKind::TimeOverlap;
    Conflict {
        course_a: a.id,
        course_b: b.id,
        kind,
        severity: kind.severity(),
        description,
        shared_room,
    }
}

#[cfg(test)]
#[path = "conflicts_tests.rs"]
mod conflicts_tests;
