//! Runtime configuration for hosts embedding the core.
//!
//! # Responsibility
//! - Provide defaults for storage location, reminder delay and logging.
//! - Overlay `TASKPAD_*` environment variables on top of defaults.
//!
//! # Invariants
//! - Invalid environment values are reported, never silently ignored.
//! - Empty environment values mean "use the default".

use crate::gateway::notification::{DEFAULT_REMINDER_DELAY, DEFAULT_REMINDER_TITLE};
use crate::gateway::persistence::DEFAULT_SNAPSHOT_KEY;
use crate::logging::default_log_level;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::path::PathBuf;
use std::time::Duration;

pub const ENV_DB_PATH: &str = "TASKPAD_DB_PATH";
pub const ENV_REMINDER_DELAY_SECS: &str = "TASKPAD_REMINDER_DELAY_SECS";
pub const ENV_LOG_LEVEL: &str = "TASKPAD_LOG_LEVEL";
pub const ENV_LOG_DIR: &str = "TASKPAD_LOG_DIR";
pub const ENV_NOTIFICATIONS: &str = "TASKPAD_NOTIFICATIONS";

const DEFAULT_DB_FILE_NAME: &str = "taskpad.sqlite3";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    InvalidValue {
        key: &'static str,
        value: String,
        expected: &'static str,
    },
}

impl Display for ConfigError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidValue {
                key,
                value,
                expected,
            } => write!(f, "invalid value `{value}` for {key}; expected {expected}"),
        }
    }
}

impl Error for ConfigError {}

/// Task store behavior knobs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoreConfig {
    pub reminder_delay: Duration,
    pub reminder_title: String,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            reminder_delay: DEFAULT_REMINDER_DELAY,
            reminder_title: DEFAULT_REMINDER_TITLE.to_string(),
        }
    }
}

/// Host-level configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppConfig {
    pub db_path: PathBuf,
    pub reminder_delay: Duration,
    pub log_level: String,
    /// Logging stays off when `None`.
    pub log_dir: Option<PathBuf>,
    pub notifications_enabled: bool,
    pub snapshot_key: String,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            db_path: std::env::temp_dir().join(DEFAULT_DB_FILE_NAME),
            reminder_delay: DEFAULT_REMINDER_DELAY,
            log_level: default_log_level().to_string(),
            log_dir: None,
            notifications_enabled: true,
            snapshot_key: DEFAULT_SNAPSHOT_KEY.to_string(),
        }
    }
}

impl AppConfig {
    /// Defaults overlaid with process environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Defaults overlaid with values from `lookup`.
    ///
    /// Split out from `from_env` so tests do not mutate process env.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let mut config = Self::default();
        let read = |key: &str| {
            lookup(key)
                .map(|raw| raw.trim().to_string())
                .filter(|value| !value.is_empty())
        };

        if let Some(path) = read(ENV_DB_PATH) {
            config.db_path = PathBuf::from(path);
        }
        if let Some(raw) = read(ENV_REMINDER_DELAY_SECS) {
            let secs = raw
                .parse::<u64>()
                .map_err(|_| ConfigError::InvalidValue {
                    key: ENV_REMINDER_DELAY_SECS,
                    value: raw.clone(),
                    expected: "a whole number of seconds",
                })?;
            config.reminder_delay = Duration::from_secs(secs);
        }
        if let Some(level) = read(ENV_LOG_LEVEL) {
            config.log_level = level;
        }
        if let Some(dir) = read(ENV_LOG_DIR) {
            config.log_dir = Some(PathBuf::from(dir));
        }
        if let Some(raw) = read(ENV_NOTIFICATIONS) {
            config.notifications_enabled =
                parse_switch(&raw).ok_or_else(|| ConfigError::InvalidValue {
                    key: ENV_NOTIFICATIONS,
                    value: raw.clone(),
                    expected: "on|off|true|false|1|0",
                })?;
        }

        Ok(config)
    }

    pub fn store_config(&self) -> StoreConfig {
        StoreConfig {
            reminder_delay: self.reminder_delay,
            ..StoreConfig::default()
        }
    }
}

fn parse_switch(value: &str) -> Option<bool> {
    match value.to_ascii_lowercase().as_str() {
        "on" | "true" | "1" | "yes" => Some(true),
        "off" | "false" | "0" | "no" => Some(false),
        _ => None,
    }
}
