//! Data Transfer Objects for the HTTP API.
//!
//! Domain models already derive Serialize/Deserialize and are returned
//! directly; this module holds the request and envelope types around them.

use serde::{Deserialize, Serialize};

use crate::api::{Notification, StoredConflict, Timetable, TimetableId};

/// Health check response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub repository: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MessageResponse {
    pub message: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TimetableListResponse {
    pub timetables: Vec<Timetable>,
    pub total: usize,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DuplicateRequest {
    #[serde(default)]
    pub name: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ShareResponse {
    pub share_token: String,
    pub share_url: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ConflictQuery {
    #[serde(default)]
    pub include_resolved: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConflictListResponse {
    pub conflicts: Vec<StoredConflict>,
    pub total: usize,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NotificationQuery {
    #[serde(default)]
    pub unread_only: bool,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ReminderRequest {
    /// Overrides the configured horizon.
    #[serde(default)]
    pub horizon_minutes: Option<u32>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReminderResponse {
    pub created: usize,
    pub notifications: Vec<Notification>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ExportQuery {
    #[serde(default)]
    pub format: Option<String>,
}

/// Request body for `POST /v1/timetables/import`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImportRequest {
    pub format: String,
    /// The raw document text (JSON or CSV).
    pub content: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub target_timetable_id: Option<TimetableId>,
}
