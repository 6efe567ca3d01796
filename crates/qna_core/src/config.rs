//! Runtime configuration for the Q&A core.
//!
//! # Responsibility
//! - Gather database location and logging settings in one value.
//! - Read overrides from `QNA_*` environment variables.
//!
//! # Invariants
//! - A parsed config always carries a supported log level.
//! - A configured log directory is always absolute.

use crate::db::{open_db, open_db_in_memory, DbResult};
use crate::logging::{init_logging, LoggingError};
use log::LevelFilter;
use rusqlite::Connection;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::path::{Path, PathBuf};

/// Database file path. Unset, blank or `:memory:` selects an in-memory DB.
pub const ENV_DB_PATH: &str = "QNA_DB_PATH";
/// One of `trace|debug|info|warn|error` (case-insensitive).
pub const ENV_LOG_LEVEL: &str = "QNA_LOG_LEVEL";
/// Absolute directory for rolling log files.
pub const ENV_LOG_DIR: &str = "QNA_LOG_DIR";

const IN_MEMORY_MARKER: &str = ":memory:";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    UnsupportedLogLevel(String),
    RelativeLogDir(String),
}

impl Display for ConfigError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::UnsupportedLogLevel(level) => write!(
                f,
                "unsupported log level `{level}`; expected trace|debug|info|warn|error"
            ),
            Self::RelativeLogDir(dir) => {
                write!(f, "log dir must be an absolute path, got `{dir}`")
            }
        }
    }
}

impl Error for ConfigError {}

/// Where the core keeps its SQLite data.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DatabaseLocation {
    InMemory,
    File(PathBuf),
}

/// File logging settings.
///
/// File logging stays disabled while `log_dir` is `None`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoggingConfig {
    pub level: LevelFilter,
    pub log_dir: Option<PathBuf>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            log_dir: None,
        }
    }
}

/// Complete runtime configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CoreConfig {
    pub database: DatabaseLocation,
    pub logging: LoggingConfig,
}

impl Default for CoreConfig {
    fn default() -> Self {
        Self {
            database: DatabaseLocation::InMemory,
            logging: LoggingConfig::default(),
        }
    }
}

impl CoreConfig {
    /// Builds a config from `QNA_*` environment variables over defaults.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds a config from an arbitrary key lookup over defaults.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let mut config = Self::default();

        if let Some(path) = lookup(ENV_DB_PATH) {
            config.database = parse_database_location(&path);
        }
        if let Some(level) = lookup(ENV_LOG_LEVEL) {
            config.logging.level = parse_log_level(&level)?;
        }
        if let Some(dir) = lookup(ENV_LOG_DIR) {
            config.logging.log_dir = parse_log_dir(&dir)?;
        }

        Ok(config)
    }

    /// Opens the configured database with migrations applied.
    pub fn open_db(&self) -> DbResult<Connection> {
        match &self.database {
            DatabaseLocation::InMemory => open_db_in_memory(),
            DatabaseLocation::File(path) => open_db(path),
        }
    }

    /// Starts file logging when a log directory is configured.
    ///
    /// Returns `Ok(false)` when file logging is disabled.
    pub fn init_logging(&self) -> Result<bool, LoggingError> {
        match self.logging.log_dir.as_deref() {
            Some(dir) => init_logging(self.logging.level, dir).map(|()| true),
            None => Ok(false),
        }
    }
}

/// Returns the default log level for current build mode.
///
/// - `debug` builds -> `debug`
/// - `release` builds -> `info`
pub fn default_log_level() -> LevelFilter {
    if cfg!(debug_assertions) {
        LevelFilter::Debug
    } else {
        LevelFilter::Info
    }
}

/// Parses a log level name, accepting `warning` as an alias of `warn`.
pub fn parse_log_level(level: &str) -> Result<LevelFilter, ConfigError> {
    match level.trim().to_ascii_lowercase().as_str() {
        "trace" => Ok(LevelFilter::Trace),
        "debug" => Ok(LevelFilter::Debug),
        "info" => Ok(LevelFilter::Info),
        "warn" | "warning" => Ok(LevelFilter::Warn),
        "error" => Ok(LevelFilter::Error),
        other => Err(ConfigError::UnsupportedLogLevel(other.to_string())),
    }
}

fn parse_database_location(value: &str) -> DatabaseLocation {
    let trimmed = value.trim();
    if trimmed.is_empty() || trimmed == IN_MEMORY_MARKER {
        DatabaseLocation::InMemory
    } else {
        DatabaseLocation::File(PathBuf::from(trimmed))
    }
}

fn parse_log_dir(value: &str) -> Result<Option<PathBuf>, ConfigError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Ok(None);
    }
    let path = Path::new(trimmed);
    if !path.is_absolute() {
        return Err(ConfigError::RelativeLogDir(trimmed.to_string()));
    }
    Ok(Some(path.to_path_buf()))
}

#[cfg(test)]
mod tests {
    use super::{
        parse_log_level, ConfigError, CoreConfig, DatabaseLocation, ENV_DB_PATH, ENV_LOG_DIR,
        ENV_LOG_LEVEL,
    };
    use log::LevelFilter;
    use std::collections::HashMap;
    use std::path::PathBuf;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let values: HashMap<String, String> = pairs
            .iter()
            .map(|(key, value)| (key.to_string(), value.to_string()))
            .collect();
        move |key| values.get(key).cloned()
    }

    #[test]
    fn defaults_use_in_memory_db_without_file_logging() {
        let config = CoreConfig::from_lookup(lookup_from(&[])).unwrap();
        assert_eq!(config, CoreConfig::default());
        assert_eq!(config.database, DatabaseLocation::InMemory);
        assert!(config.logging.log_dir.is_none());
    }

    #[test]
    fn parse_log_level_accepts_known_values() {
        assert_eq!(parse_log_level("INFO").unwrap(), LevelFilter::Info);
        assert_eq!(parse_log_level(" warning ").unwrap(), LevelFilter::Warn);
        assert_eq!(
            parse_log_level("verbose").unwrap_err(),
            ConfigError::UnsupportedLogLevel("verbose".to_string())
        );
    }

    #[test]
    fn env_overrides_are_applied() {
        let log_dir = std::env::temp_dir().join("qna-logs");
        let log_dir_str = log_dir.to_str().unwrap();
        let config = CoreConfig::from_lookup(lookup_from(&[
            (ENV_DB_PATH, "/var/lib/qna/qna.sqlite3"),
            (ENV_LOG_LEVEL, "error"),
            (ENV_LOG_DIR, log_dir_str),
        ]))
        .unwrap();

        assert_eq!(
            config.database,
            DatabaseLocation::File(PathBuf::from("/var/lib/qna/qna.sqlite3"))
        );
        assert_eq!(config.logging.level, LevelFilter::Error);
        assert_eq!(config.logging.log_dir, Some(log_dir));
    }

    #[test]
    fn memory_marker_and_blank_path_select_in_memory_db() {
        for value in [":memory:", "   "] {
            let config = CoreConfig::from_lookup(lookup_from(&[(ENV_DB_PATH, value)])).unwrap();
            assert_eq!(config.database, DatabaseLocation::InMemory);
        }
    }

    #[test]
    fn relative_log_dir_is_rejected() {
        let err = CoreConfig::from_lookup(lookup_from(&[(ENV_LOG_DIR, "logs/dev")])).unwrap_err();
        assert_eq!(err, ConfigError::RelativeLogDir("logs/dev".to_string()));
    }

    #[test]
    fn init_logging_is_skipped_without_log_dir() {
        assert!(!CoreConfig::default().init_logging().unwrap());
    }

    #[test]
    fn configured_file_database_is_opened_and_migrated() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("qna.sqlite3");
        let config = CoreConfig {
            database: DatabaseLocation::File(path.clone()),
            ..CoreConfig::default()
        };

        config.open_db().unwrap();
        assert!(path.exists());
    }
}
