//! Timetable algorithms.
//!
//! # Components
//!
//! - [`conflicts`]: pairwise time-overlap and room double-booking detection
//!
//! # Example
//!
//! ```
//! use splan::algorithms::{detect_conflicts, CourseBlock};
//! use splan::api::CourseId;
//! use splan::models::ClockTime;
//!
//! let t = |s: &str| ClockTime::parse(s).unwrap();
//! let blocks = vec![
//!     CourseBlock::new(CourseId::new(1), "Analysis", 0, t("08:00"), t("09:30")),
//!     CourseBlock::new(CourseId::new(2), "Physics", 0, t("09:00"), t("10:00")),
//! ];
//! let report = detect_conflicts(&blocks).unwrap();
//! assert_eq!(report.conflicts.len(), 1);
//! ```

pub mod conflicts;

pub use conflicts::{detect_conflicts, overlaps, CourseBlock, DetectionError, DetectionReport};
