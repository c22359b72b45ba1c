//! Store configuration resolved from the process environment.
//!
//! # Responsibility
//! - Resolve database location and logging settings in one place.
//! - Open the configured store with migrations applied.
//!
//! # Invariants
//! - Empty environment values are treated as unset.
//! - A configured log directory is always absolute.

use crate::db::{open_db, open_db_in_memory, DbResult};
use crate::logging::{default_log_level, normalize_level};
use rusqlite::Connection;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::path::{Path, PathBuf};

pub const ENV_DB_PATH: &str = "RECORD_STORE_DB";
pub const ENV_LOG_LEVEL: &str = "RECORD_STORE_LOG_LEVEL";
pub const ENV_LOG_DIR: &str = "RECORD_STORE_LOG_DIR";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    InvalidLogLevel(String),
    RelativeLogDir(PathBuf),
}

impl Display for ConfigError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidLogLevel(message) => write!(f, "{ENV_LOG_LEVEL}: {message}"),
            Self::RelativeLogDir(path) => write!(
                f,
                "{ENV_LOG_DIR} must be an absolute path, got `{}`",
                path.display()
            ),
        }
    }
}

impl Error for ConfigError {}

/// Resolved settings for one store process.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoreConfig {
    /// SQLite file; `None` selects an in-memory database.
    pub db_path: Option<PathBuf>,
    pub log_level: &'static str,
    /// Rolling log directory; `None` leaves file logging disabled.
    pub log_dir: Option<PathBuf>,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            db_path: None,
            log_level: default_log_level(),
            log_dir: None,
        }
    }
}

impl StoreConfig {
    /// Reads `RECORD_STORE_DB`, `RECORD_STORE_LOG_LEVEL` and
    /// `RECORD_STORE_LOG_DIR`.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Resolves settings through an arbitrary key lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let read = |key: &str| {
            lookup(key)
                .map(|value| value.trim().to_string())
                .filter(|value| !value.is_empty())
        };

        let log_level = match read(ENV_LOG_LEVEL) {
            Some(level) => normalize_level(&level).map_err(ConfigError::InvalidLogLevel)?,
            None => default_log_level(),
        };

        let log_dir = read(ENV_LOG_DIR).map(PathBuf::from);
        if let Some(dir) = log_dir.as_deref().filter(|dir| !dir.is_absolute()) {
            return Err(ConfigError::RelativeLogDir(dir.to_path_buf()));
        }

        Ok(Self {
            db_path: read(ENV_DB_PATH).map(PathBuf::from),
            log_level,
            log_dir,
        })
    }

    pub fn db_path(&self) -> Option<&Path> {
        self.db_path.as_deref()
    }
}

/// Opens the configured database, falling back to memory when no path is set.
pub fn open_store(config: &StoreConfig) -> DbResult<Connection> {
    match config.db_path() {
        Some(path) => open_db(path),
        None => open_db_in_memory(),
    }
}
