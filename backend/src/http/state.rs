//! Application state for the HTTP server.

use std::sync::Arc;

use crate::config::{AppConfig, ReminderSettings, ServerSettings};
use crate::db::repository::FullRepository;

/// Shared application state passed to all handlers.
#[derive(Clone)]
pub struct AppState {
    /// Repository instance for persistence
    pub repository: Arc<dyn FullRepository>,
    /// Default horizon for reminder generation
    pub reminder_horizon_minutes: u32,
    /// Maximum accepted request body
    pub body_limit_bytes: usize,
}

impl AppState {
    pub fn new(repository: Arc<dyn FullRepository>) -> Self {
        Self {
            repository,
            reminder_horizon_minutes: ReminderSettings::default().horizon_minutes,
            body_limit_bytes: ServerSettings::default().body_limit_bytes,
        }
    }

    pub fn with_config(mut self, config: &AppConfig) -> Self {
        self.reminder_horizon_minutes = config.reminders.horizon_minutes;
        self.body_limit_bytes = config.server.body_limit_bytes;
        self
    }
}
