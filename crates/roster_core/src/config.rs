//! Runtime configuration for roster hosts.
//!
//! All values are read from environment variables once and validated up
//! front, so a misconfigured host fails before touching the database.
//!
//! | Variable           | Default                          |
//! |--------------------|----------------------------------|
//! | `ROSTER_DB_PATH`   | `<temp_dir>/roster.sqlite3`      |
//! | `ROSTER_LOG_LEVEL` | `debug` (debug) / `info` (release) |
//! | `ROSTER_LOG_DIR`   | unset: logging stays disabled    |

use crate::logging::{default_log_level, normalize_log_dir, LogLevel};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::path::PathBuf;

pub const DB_PATH_VAR: &str = "ROSTER_DB_PATH";
pub const LOG_LEVEL_VAR: &str = "ROSTER_LOG_LEVEL";
pub const LOG_DIR_VAR: &str = "ROSTER_LOG_DIR";

const DEFAULT_DB_FILE_NAME: &str = "roster.sqlite3";

/// Configuration error naming the offending variable.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfigError {
    pub field: &'static str,
    pub message: String,
}

impl Display for ConfigError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "configuration error for {}: {}", self.field, self.message)
    }
}

impl Error for ConfigError {}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RosterConfig {
    pub db_path: PathBuf,
    pub log_level: LogLevel,
    /// Absolute directory for rolling log files; `None` disables file logging.
    pub log_dir: Option<PathBuf>,
}

impl RosterConfig {
    /// Loads configuration from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Loads configuration through `lookup`, which maps a variable name to
    /// its value. Blank values count as unset.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let read = |key: &str| {
            lookup(key)
                .map(|value| value.trim().to_string())
                .filter(|value| !value.is_empty())
        };

        let db_path = read(DB_PATH_VAR)
            .map(PathBuf::from)
            .unwrap_or_else(|| std::env::temp_dir().join(DEFAULT_DB_FILE_NAME));

        let log_level = match read(LOG_LEVEL_VAR) {
            Some(raw) => LogLevel::parse(&raw).map_err(|message| ConfigError {
                field: LOG_LEVEL_VAR,
                message,
            })?,
            None => default_log_level(),
        };

        let log_dir = read(LOG_DIR_VAR)
            .map(|raw| normalize_log_dir(&raw))
            .transpose()
            .map_err(|message| ConfigError {
                field: LOG_DIR_VAR,
                message,
            })?;

        Ok(Self {
            db_path,
            log_level,
            log_dir,
        })
    }
}
