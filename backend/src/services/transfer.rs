//! Timetable import and export.
//!
//! Two formats are supported in both directions:
//!
//! - **JSON**: a document `{"timetable": {...}, "export_info": {...}}` whose
//!   `export_info.checksum` is the SHA-256 of the serialized courses array.
//! - **CSV**: one course per row, see [`CSV_HEADER`].
//!
//! Imports are parsed and validated completely before anything is stored,
//! then go through [`services::add_courses`] so conflicts are detected before
//! the caller sees the result.

use chrono::{DateTime, Utc};
use log::info;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

use crate::algorithms::conflicts::DetectionReport;
use crate::api::TimetableId;
use crate::db::checksum::json_checksum;
use crate::db::repository::{
    CourseRepository, FullRepository, RepositoryError, TimetableRepository,
};
use crate::db::services;
use crate::models::{
    ClockTime, DayOfWeek, NewCourse, NewTimetable, TimetableDetail, DEFAULT_COURSE_COLOR,
    DEFAULT_COURSE_TYPE,
};

pub const EXPORT_VERSION: &str = "1.0";
pub const DEFAULT_IMPORT_NAME: &str = "Imported Timetable";

pub const CSV_HEADER: [&str; 13] = [
    "name",
    "code",
    "instructor",
    "room",
    "building",
    "day",
    "start_time",
    "end_time",
    "color",
    "description",
    "course_type",
    "credits",
    "is_mandatory",
];

const CSV_REQUIRED: [&str; 4] = ["name", "day", "start_time", "end_time"];

#[derive(Debug, thiserror::Error)]
pub enum TransferError {
    #[error("Unsupported format '{0}'")]
    UnsupportedFormat(String),

    #[error("Invalid JSON document: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Invalid CSV document: {0}")]
    Csv(#[from] csv::Error),

    #[error("Missing required column '{0}'")]
    MissingColumn(String),

    #[error("Row {row}: {message}")]
    InvalidRow { row: usize, message: String },

    #[error("Checksum mismatch: document says {expected}, content hashes to {actual}")]
    ChecksumMismatch { expected: String, actual: String },

    #[error(transparent)]
    Repository(#[from] RepositoryError),
}

impl TransferError {
    fn row(row: usize, message: impl fmt::Display) -> Self {
        Self::InvalidRow {
            row,
            message: message.to_string(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExportFormat {
    Json,
    Csv,
}

impl ExportFormat {
    pub const ALL: [ExportFormat; 2] = [ExportFormat::Json, ExportFormat::Csv];

    pub fn extension(&self) -> &'static str {
        match self {
            ExportFormat::Json => "json",
            ExportFormat::Csv => "csv",
        }
    }

    pub fn content_type(&self) -> &'static str {
        match self {
            ExportFormat::Json => "application/json",
            ExportFormat::Csv => "text/csv; charset=utf-8",
        }
    }

    fn describe(&self) -> (&'static str, &'static str) {
        match self {
            ExportFormat::Json => ("JSON", "Complete timetable with all course attributes"),
            ExportFormat::Csv => ("CSV", "One course per row, for spreadsheets"),
        }
    }
}

impl FromStr for ExportFormat {
    type Err = TransferError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "json" => Ok(Self::Json),
            "csv" => Ok(Self::Csv),
            other => Err(TransferError::UnsupportedFormat(other.to_string())),
        }
    }
}

impl fmt::Display for ExportFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.extension())
    }
}

/// Catalogue entry for `GET /v1/export/formats`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FormatInfo {
    pub format: ExportFormat,
    pub name: String,
    pub description: String,
    pub extension: String,
    pub content_type: String,
    pub supports_import: bool,
}

pub fn export_formats() -> Vec<FormatInfo> {
    ExportFormat::ALL
        .iter()
        .map(|format| {
            let (name, description) = format.describe();
            FormatInfo {
                format: *format,
                name: name.to_string(),
                description: description.to_string(),
                extension: format.extension().to_string(),
                content_type: format.content_type().to_string(),
                supports_import: true,
            }
        })
        .collect()
}

// =============================================================================
// JSON document
// =============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExportedTimetable {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub semester: Option<String>,
    #[serde(default)]
    pub year: Option<i32>,
    #[serde(default)]
    pub color_theme: Option<String>,
    #[serde(default)]
    pub courses: Vec<NewCourse>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExportInfo {
    pub exported_at: DateTime<Utc>,
    pub format: ExportFormat,
    pub version: String,
    pub checksum: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExportDocument {
    pub timetable: ExportedTimetable,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub export_info: Option<ExportInfo>,
}

impl ExportDocument {
    pub fn from_detail(detail: &TimetableDetail) -> serde_json::Result<Self> {
        let courses: Vec<NewCourse> = detail.courses.iter().map(NewCourse::from).collect();
        let checksum = json_checksum(&courses)?;
        Ok(Self {
            timetable: ExportedTimetable {
                name: Some(detail.timetable.name.clone()),
                description: detail.timetable.description.clone(),
                semester: detail.timetable.semester.clone(),
                year: detail.timetable.year,
                color_theme: Some(detail.timetable.color_theme.clone()),
                courses,
            },
            export_info: Some(ExportInfo {
                exported_at: Utc::now(),
                format: ExportFormat::Json,
                version: EXPORT_VERSION.to_string(),
                checksum,
            }),
        })
    }
}

/// Parse a JSON export document, or a bare timetable object.
pub fn parse_json(content: &str) -> Result<ExportedTimetable, TransferError> {
    let value: serde_json::Value = serde_json::from_str(content)?;
    let document: ExportDocument = if value.get("timetable").is_some() {
        serde_json::from_value(value)?
    } else {
        ExportDocument {
            timetable: serde_json::from_value(value)?,
            export_info: None,
        }
    };

    if let Some(info) = &document.export_info {
        let actual = json_checksum(&document.timetable.courses)?;
        if !info.checksum.eq_ignore_ascii_case(&actual) {
            return Err(TransferError::ChecksumMismatch {
                expected: info.checksum.clone(),
                actual,
            });
        }
    }

    for (index, course) in document.timetable.courses.iter().enumerate() {
        check_course(index + 1, course)?;
    }
    Ok(document.timetable)
}

fn check_course(row: usize, course: &NewCourse) -> Result<(), TransferError> {
    if course.name.trim().is_empty() {
        return Err(TransferError::row(row, "name must not be blank"));
    }
    if course.start_time >= course.end_time {
        return Err(TransferError::row(
            row,
            format!(
                "start_time {} must be before end_time {}",
                course.start_time, course.end_time
            ),
        ));
    }
    Ok(())
}

// =============================================================================
// CSV
// =============================================================================

pub fn courses_to_csv(courses: &[NewCourse]) -> Result<String, TransferError> {
    let mut writer = csv::Writer::from_writer(Vec::new());
    writer.write_record(CSV_HEADER)?;
    for course in courses {
        let credits = course.credits.map(|c| c.to_string()).unwrap_or_default();
        let start = course.start_time.to_string();
        let end = course.end_time.to_string();
        writer.write_record([
            course.name.as_str(),
            course.code.as_deref().unwrap_or(""),
            course.instructor.as_deref().unwrap_or(""),
            course.room.as_deref().unwrap_or(""),
            course.building.as_deref().unwrap_or(""),
            course.day_of_week.name(),
            start.as_str(),
            end.as_str(),
            course.color.as_str(),
            course.description.as_deref().unwrap_or(""),
            course.course_type.as_str(),
            credits.as_str(),
            if course.is_mandatory { "true" } else { "false" },
        ])?;
    }
    let bytes = writer
        .into_inner()
        .map_err(|e| TransferError::Csv(e.into_error().into()))?;
    String::from_utf8(bytes).map_err(|e| TransferError::row(0, e))
}

fn parse_bool(raw: &str) -> Option<bool> {
    match raw.trim().to_lowercase().as_str() {
        "true" | "1" | "yes" | "y" | "ja" => Some(true),
        "false" | "0" | "no" | "n" | "nein" => Some(false),
        _ => None,
    }
}

fn optional(raw: Option<&str>) -> Option<String> {
    raw.map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

/// Parse CSV rows into courses. Row numbers in errors count the header as row 1.
pub fn parse_csv(content: &str) -> Result<Vec<NewCourse>, TransferError> {
    let mut reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .flexible(true)
        .from_reader(content.as_bytes());

    let columns: HashMap<String, usize> = reader
        .headers()?
        .iter()
        .enumerate()
        .map(|(index, name)| (name.trim().to_lowercase(), index))
        .collect();
    for required in CSV_REQUIRED {
        if !columns.contains_key(required) {
            return Err(TransferError::MissingColumn(required.to_string()));
        }
    }

    let mut courses = Vec::new();
    for (index, record) in reader.records().enumerate() {
        let record = record?;
        let row = index + 2;
        let field = |name: &str| columns.get(name).and_then(|&i| record.get(i));
        let required = |name: &str| {
            optional(field(name))
                .ok_or_else(|| TransferError::row(row, format!("missing value for '{}'", name)))
        };

        let name = required("name")?;
        let day = DayOfWeek::from_name(&required("day")?).map_err(|e| TransferError::row(row, e))?;
        let start = ClockTime::parse(&required("start_time")?).map_err(|e| TransferError::row(row, e))?;
        let end = ClockTime::parse(&required("end_time")?).map_err(|e| TransferError::row(row, e))?;

        let mut course = NewCourse::new(name, day, start, end);
        course.code = optional(field("code"));
        course.instructor = optional(field("instructor"));
        course.room = optional(field("room"));
        course.building = optional(field("building"));
        course.description = optional(field("description"));
        course.color = optional(field("color")).unwrap_or_else(|| DEFAULT_COURSE_COLOR.to_string());
        course.course_type =
            optional(field("course_type")).unwrap_or_else(|| DEFAULT_COURSE_TYPE.to_string());
        if let Some(credits) = optional(field("credits")) {
            course.credits = Some(credits.parse().map_err(|_| {
                TransferError::row(row, format!("credits '{}' is not a whole number", credits))
            })?);
        }
        if let Some(flag) = optional(field("is_mandatory")) {
            course.is_mandatory = parse_bool(&flag).ok_or_else(|| {
                TransferError::row(row, format!("is_mandatory '{}' is not a boolean", flag))
            })?;
        }

        check_course(row, &course)?;
        courses.push(course);
    }
    Ok(courses)
}

// =============================================================================
// Service entry points
// =============================================================================

/// A rendered export ready to be sent as a download.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportPayload {
    pub format: ExportFormat,
    pub filename: String,
    pub content_type: &'static str,
    pub body: String,
}

fn file_stem(name: &str) -> String {
    let stem: String = name
        .trim()
        .chars()
        .map(|c| if c.is_alphanumeric() || c == '-' { c } else { '_' })
        .collect();
    if stem.is_empty() {
        "timetable".to_string()
    } else {
        stem
    }
}

pub async fn export_timetable<R: FullRepository + ?Sized>(
    repo: &R,
    timetable_id: TimetableId,
    format: ExportFormat,
) -> Result<ExportPayload, TransferError> {
    let timetable = repo.get_timetable(timetable_id).await?;
    let courses = repo.list_courses(timetable_id).await?;
    let detail = TimetableDetail { timetable, courses };

    let body = match format {
        ExportFormat::Json => serde_json::to_string_pretty(&ExportDocument::from_detail(&detail)?)?,
        ExportFormat::Csv => {
            let courses: Vec<NewCourse> = detail.courses.iter().map(NewCourse::from).collect();
            courses_to_csv(&courses)?
        }
    };
    info!(
        "Exported timetable {} as {} ({} course(s))",
        timetable_id,
        format,
        detail.courses.len()
    );
    Ok(ExportPayload {
        format,
        filename: format!("{}.{}", file_stem(&detail.timetable.name), format.extension()),
        content_type: format.content_type(),
        body,
    })
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImportOutcome {
    pub timetable: TimetableDetail,
    pub imported: usize,
    pub detection: DetectionReport,
}

/// Import courses into a new timetable or append them to `target`.
///
/// The new timetable's name comes from `name`, then the document, then
/// [`DEFAULT_IMPORT_NAME`].
pub async fn import_timetable<R: FullRepository + ?Sized>(
    repo: &R,
    format: ExportFormat,
    content: &str,
    name: Option<String>,
    target: Option<TimetableId>,
) -> Result<ImportOutcome, TransferError> {
    let parsed = match format {
        ExportFormat::Json => parse_json(content)?,
        ExportFormat::Csv => ExportedTimetable {
            name: None,
            description: None,
            semester: None,
            year: None,
            color_theme: None,
            courses: parse_csv(content)?,
        },
    };

    let timetable_id = match target {
        Some(id) => repo.get_timetable(id).await?.id,
        None => {
            let name = optional(name.as_deref())
                .or_else(|| optional(parsed.name.as_deref()))
                .unwrap_or_else(|| DEFAULT_IMPORT_NAME.to_string());
            let created = services::create_timetable(
                repo,
                NewTimetable {
                    name,
                    description: parsed.description.clone(),
                    semester: parsed.semester.clone(),
                    year: parsed.year,
                    color_theme: parsed.color_theme.clone(),
                    is_active: false,
                },
            )
            .await?;
            created.id
        }
    };

    let (stored, detection) = services::add_courses(repo, timetable_id, parsed.courses).await?;
    info!(
        "Imported {} course(s) into timetable {} from {}",
        stored.len(),
        timetable_id,
        format
    );
    let timetable = services::get_timetable_detail(repo, timetable_id).await?;
    Ok(ImportOutcome {
        timetable,
        imported: stored.len(),
        detection,
    })
}
