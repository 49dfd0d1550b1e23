//! Application configuration.
//!
//! # Responsibility
//! - Describe where the database, preferences and logs live.
//! - Load overrides from an optional JSON file with per-field defaults.
//!
//! # Invariants
//! - File names are plain names, never paths.

use crate::logging::default_log_level;
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::path::{Path, PathBuf};

pub const DEFAULT_DB_FILE_NAME: &str = "notekeep.sqlite3";
pub const DEFAULT_PREFS_FILE_NAME: &str = "prefs.json";
/// Notes generated when the database is created.
pub const DEFAULT_SEED_NOTE_COUNT: usize = 10;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub data_dir: PathBuf,
    pub db_file_name: String,
    pub prefs_file_name: String,
    pub log_level: String,
    pub seed_note_count: usize,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("notekeep-data"),
            db_file_name: DEFAULT_DB_FILE_NAME.to_string(),
            prefs_file_name: DEFAULT_PREFS_FILE_NAME.to_string(),
            log_level: default_log_level().to_string(),
            seed_note_count: DEFAULT_SEED_NOTE_COUNT,
        }
    }
}

#[derive(Debug)]
pub enum ConfigError {
    Io { path: PathBuf, source: std::io::Error },
    Json { path: PathBuf, source: serde_json::Error },
    Invalid(String),
}

impl Display for ConfigError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Io { path, source } => write!(f, "config `{}`: {source}", path.display()),
            Self::Json { path, source } => {
                write!(f, "config `{}` is not valid JSON: {source}", path.display())
            }
            Self::Invalid(message) => write!(f, "invalid config: {message}"),
        }
    }
}

impl Error for ConfigError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Io { source, .. } => Some(source),
            Self::Json { source, .. } => Some(source),
            Self::Invalid(_) => None,
        }
    }
}

impl AppConfig {
    pub fn for_data_dir(data_dir: impl Into<PathBuf>) -> Self {
        Self {
            data_dir: data_dir.into(),
            ..Self::default()
        }
    }

    /// Reads a JSON config file; missing fields take their defaults.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let bytes = std::fs::read(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let config: Self = serde_json::from_slice(&bytes).map_err(|source| ConfigError::Json {
            path: path.to_path_buf(),
            source,
        })?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        for (field, value) in [
            ("db_file_name", &self.db_file_name),
            ("prefs_file_name", &self.prefs_file_name),
        ] {
            if !is_plain_file_name(value) {
                return Err(ConfigError::Invalid(format!(
                    "`{field}` must be a plain file name, got `{value}`"
                )));
            }
        }
        if self.db_file_name == self.prefs_file_name {
            return Err(ConfigError::Invalid(
                "database and preference files must differ".to_string(),
            ));
        }
        Ok(())
    }

    pub fn db_path(&self) -> PathBuf {
        self.data_dir.join(&self.db_file_name)
    }

    pub fn prefs_path(&self) -> PathBuf {
        self.data_dir.join(&self.prefs_file_name)
    }

    pub fn log_dir(&self) -> PathBuf {
        self.data_dir.join("logs")
    }
}

fn is_plain_file_name(value: &str) -> bool {
    let trimmed = value.trim();
    !trimmed.is_empty()
        && trimmed == value
        && Path::new(value).file_name().and_then(|name| name.to_str()) == Some(value)
}
