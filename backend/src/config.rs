//! Application configuration.
//!
//! Settings come from an optional `splan.toml` file and are then overridden
//! by environment variables:
//!
//! | Variable | Setting |
//! |----------|---------|
//! | `HOST` | `server.host` |
//! | `PORT` | `server.port` |
//! | `REPOSITORY_TYPE` | `repository.type` |
//! | `SPLAN_REMINDER_HORIZON_MINUTES` | `reminders.horizon_minutes` |
//!
//! ```toml
//! [server]
//! host = "0.0.0.0"
//! port = 8080
//!
//! [repository]
//! type = "local"
//!
//! [reminders]
//! horizon_minutes = 1440
//! ```

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use crate::db::factory::RepositoryType;

pub const DEFAULT_CONFIG_FILE: &str = "splan.toml";

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse config file: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Invalid value for {key}: {message}")]
    InvalidValue { key: String, message: String },
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub server: ServerSettings,
    #[serde(default)]
    pub repository: RepositorySettings,
    #[serde(default)]
    pub reminders: ReminderSettings,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServerSettings {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
    /// Maximum accepted request body, mainly for imports.
    #[serde(default = "default_body_limit")]
    pub body_limit_bytes: usize,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            body_limit_bytes: default_body_limit(),
        }
    }
}

/// Repository type settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RepositorySettings {
    #[serde(rename = "type", default = "default_repo_type")]
    pub repo_type: String,
}

impl Default for RepositorySettings {
    fn default() -> Self {
        Self {
            repo_type: default_repo_type(),
        }
    }
}

impl RepositorySettings {
    pub fn repository_type(&self) -> Result<RepositoryType, String> {
        RepositoryType::from_str(&self.repo_type)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReminderSettings {
    /// How far ahead reminders are generated.
    #[serde(default = "default_horizon_minutes")]
    pub horizon_minutes: u32,
}

impl Default for ReminderSettings {
    fn default() -> Self {
        Self {
            horizon_minutes: default_horizon_minutes(),
        }
    }
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8080
}

fn default_body_limit() -> usize {
    // 10 MB
    10 * 1024 * 1024
}

fn default_repo_type() -> String {
    "local".to_string()
}

fn default_horizon_minutes() -> u32 {
    24 * 60
}

fn parse_var<T: FromStr>(key: &str, value: &str) -> Result<T, ConfigError>
where
    T::Err: std::fmt::Display,
{
    value
        .trim()
        .parse::<T>()
        .map_err(|e| ConfigError::InvalidValue {
            key: key.to_string(),
            message: e.to_string(),
        })
}

impl AppConfig {
    /// Parse configuration from TOML text.
    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(content)?)
    }

    /// Load configuration from a TOML file.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml(&content)
    }

    /// Locate `splan.toml` in the current directory, `backend/` or the parent.
    pub fn find_default_file() -> Option<PathBuf> {
        [
            PathBuf::from(DEFAULT_CONFIG_FILE),
            PathBuf::from("backend").join(DEFAULT_CONFIG_FILE),
            PathBuf::from("..").join(DEFAULT_CONFIG_FILE),
        ]
        .into_iter()
        .find(|path| path.exists())
    }

    /// Apply overrides from a variable lookup, e.g. `std::env::var`.
    pub fn apply_overrides<F>(&mut self, lookup: F) -> Result<(), ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(host) = lookup("HOST") {
            self.server.host = host;
        }
        if let Some(port) = lookup("PORT") {
            self.server.port = parse_var("PORT", &port)?;
        }
        if let Some(repo_type) = lookup("REPOSITORY_TYPE") {
            self.repository.repo_type = repo_type;
        }
        if let Some(horizon) = lookup("SPLAN_REMINDER_HORIZON_MINUTES") {
            self.reminders.horizon_minutes = parse_var("SPLAN_REMINDER_HORIZON_MINUTES", &horizon)?;
        }
        Ok(())
    }

    /// Reject settings that parse but cannot be used.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.repository
            .repository_type()
            .map_err(|message| ConfigError::InvalidValue {
                key: "repository.type".to_string(),
                message,
            })?;
        if self.server.body_limit_bytes == 0 {
            return Err(ConfigError::InvalidValue {
                key: "server.body_limit_bytes".to_string(),
                message: "must be greater than zero".to_string(),
            });
        }
        Ok(())
    }

    /// Load from `path` (or the default location when `None`), falling back to
    /// defaults when no file exists, then apply environment overrides.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let mut config = match path.map(Path::to_path_buf).or_else(Self::find_default_file) {
            Some(path) => Self::from_file(path)?,
            None => Self::default(),
        };
        config.apply_overrides(|key| std::env::var(key).ok())?;
        config.validate()?;
        Ok(config)
    }

    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }
}
