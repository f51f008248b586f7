//! Conflict value types shared by the detector, the repository and the API.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::api::{ConflictId, CourseId, TimetableId};

/// Classification of a detected conflict.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ConflictKind {
    /// Two blocks overlap in time on the same day.
    TimeOverlap,
    /// The overlapping blocks are also booked into the same room.
    RoomConflict,
}

impl ConflictKind {
    pub fn severity(&self) -> Severity {
        match self {
            ConflictKind::TimeOverlap => Severity::High,
            ConflictKind::RoomConflict => Severity::Medium,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ConflictKind::TimeOverlap => "TIME_OVERLAP",
            ConflictKind::RoomConflict => "ROOM_CONFLICT",
        }
    }
}

impl fmt::Display for ConflictKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Severity {
    Medium,
    High,
}

/// A pair of overlapping course blocks.
///
/// `course_a < course_b` always holds. The primary `kind` of every conflict is
/// [`ConflictKind::TimeOverlap`]; a same-room booking is reported through
/// `shared_room` and shows up as a second entry in [`Conflict::kinds`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Conflict {
    pub course_a: CourseId,
    pub course_b: CourseId,
    pub kind: ConflictKind,
    pub severity: Severity,
    pub description: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub shared_room: Option<String>,
}

impl Conflict {
    /// Every classification that applies to this pair, primary first.
    pub fn kinds(&self) -> Vec<ConflictKind> {
        let mut kinds = vec![self.kind];
        if self.shared_room.is_some() {
            kinds.push(ConflictKind::RoomConflict);
        }
        kinds
    }

    pub fn is_room_conflict(&self) -> bool {
        self.shared_room.is_some()
    }

    pub fn involves(&self, course: CourseId) -> bool {
        self.course_a == course || self.course_b == course
    }
}

/// A detected conflict as persisted for one timetable.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoredConflict {
    pub id: ConflictId,
    pub timetable_id: TimetableId,
    #[serde(flatten)]
    pub conflict: Conflict,
    pub kinds: Vec<ConflictKind>,
    pub resolved: bool,
    pub detected_at: DateTime<Utc>,
}

impl StoredConflict {
    pub fn new(
        id: ConflictId,
        timetable_id: TimetableId,
        conflict: Conflict,
        detected_at: DateTime<Utc>,
    ) -> Self {
        let kinds = conflict.kinds();
        Self {
            id,
            timetable_id,
            conflict,
            kinds,
            resolved: false,
            detected_at,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample(shared_room: Option<&str>) -> Conflict {
        Conflict {
            course_a: CourseId::new(1),
            course_b: CourseId::new(2),
            kind: ConflictKind::TimeOverlap,
            severity: Severity::High,
            description: "overlap".to_string(),
            shared_room: shared_room.map(str::to_string),
        }
    }

    #[test]
    fn test_kind_severity_mapping() {
        assert_eq!(ConflictKind::TimeOverlap.severity(), Severity::High);
        assert_eq!(ConflictKind::RoomConflict.severity(), Severity::Medium);
    }

    #[test]
    fn test_kinds_include_room_annotation() {
        assert_eq!(sample(None).kinds(), vec![ConflictKind::TimeOverlap]);
        assert_eq!(
            sample(Some("A-101")).kinds(),
            vec![ConflictKind::TimeOverlap, ConflictKind::RoomConflict]
        );
    }

    #[test]
    fn test_serialized_names() {
        let json = serde_json::to_value(sample(Some("A-101"))).unwrap();
        assert_eq!(json["kind"], "TIME_OVERLAP");
        assert_eq!(json["severity"], "HIGH");
        assert_eq!(json["shared_room"], "A-101");

        let json = serde_json::to_value(sample(None)).unwrap();
        assert!(json.get("shared_room").is_none());
    }

    #[test]
    fn test_stored_conflict_starts_unresolved() {
        let stored = StoredConflict::new(
            ConflictId::new(1),
            TimetableId::new(3),
            sample(Some("A-101")),
            Utc::now(),
        );
        assert!(!stored.resolved);
        assert_eq!(stored.kinds.len(), 2);
        let json = serde_json::to_value(&stored).unwrap();
        assert_eq!(json["course_a"], 1);
        assert_eq!(json["kinds"][1], "ROOM_CONFLICT");
    }
}
