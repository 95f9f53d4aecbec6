//! Process configuration (`~/.crewclock/crewclock.conf`, YAML).
//!
//! Business rules shared across processes live in the database `settings`
//! table instead; this file only describes how this process runs.

use crate::core::broadcaster::{DEFAULT_DEDUP_CAPACITY, DEFAULT_DEDUP_TTL};
use crate::core::reconcile::{DEFAULT_POLL_INTERVAL, DEFAULT_WINDOW};
use crate::db::pool::DEFAULT_BUSY_TIMEOUT;
use crate::errors::{AppError, AppResult};
use crate::utils::path::expand_tilde;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

const APP_DIR: &str = ".crewclock";
const CONFIG_FILE: &str = "crewclock.conf";
const DB_FILE: &str = "crewclock.sqlite";

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct Config {
    pub database: String,
    pub log_level: String,
    pub poll_interval_secs: u64,
    pub broadcast_window_secs: u64,
    pub dedup_ttl_secs: u64,
    pub dedup_capacity: usize,
    pub busy_timeout_ms: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            database: Self::database_file().to_string_lossy().to_string(),
            log_level: "warn".to_string(),
            poll_interval_secs: DEFAULT_POLL_INTERVAL.as_secs(),
            broadcast_window_secs: DEFAULT_WINDOW.as_secs(),
            dedup_ttl_secs: DEFAULT_DEDUP_TTL.as_secs(),
            dedup_capacity: DEFAULT_DEDUP_CAPACITY,
            busy_timeout_ms: DEFAULT_BUSY_TIMEOUT.as_millis() as u64,
        }
    }
}

impl Config {
    /// `~/.crewclock`, or `./.crewclock` when no home directory is known.
    pub fn config_dir() -> PathBuf {
        dirs::home_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(APP_DIR)
    }

    pub fn config_file() -> PathBuf {
        Self::config_dir().join(CONFIG_FILE)
    }

    pub fn database_file() -> PathBuf {
        Self::config_dir().join(DB_FILE)
    }

    /// Load the configuration file; a missing file yields the defaults.
    pub fn load() -> AppResult<Self> {
        Self::load_from(&Self::config_file())
    }

    pub fn load_from(path: &Path) -> AppResult<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let content = fs::read_to_string(path)?;
        Self::parse(&content).map_err(|e| AppError::Config(format!("{}: {e}", path.display())))
    }

    pub fn parse(content: &str) -> Result<Self, serde_yaml::Error> {
        if content.trim().is_empty() {
            return Ok(Self::default());
        }
        serde_yaml::from_str(content)
    }

    pub fn to_yaml(&self) -> AppResult<String> {
        serde_yaml::to_string(self).map_err(|e| AppError::Config(e.to_string()))
    }

    /// Write the file with `database` pointing at `db_name` (or the default
    /// database file) and return the database path.
    pub fn init_all(db_name: Option<&str>, write_config: bool) -> AppResult<PathBuf> {
        let dir = Self::config_dir();
        let db_path = match db_name {
            Some(name) => expand_tilde(name),
            None => Self::database_file(),
        };

        if write_config {
            fs::create_dir_all(&dir)?;
            let cfg = Config {
                database: db_path.to_string_lossy().to_string(),
                ..Config::default()
            };
            fs::write(Self::config_file(), cfg.to_yaml()?)?;
        }

        if let Some(parent) = db_path.parent()
            && !parent.as_os_str().is_empty()
        {
            fs::create_dir_all(parent)?;
        }

        Ok(db_path)
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.poll_interval_secs.max(1))
    }

    pub fn broadcast_window(&self) -> Duration {
        Duration::from_secs(self.broadcast_window_secs)
    }

    /// Never shorter than one scan window plus one poll, otherwise a change
    /// still inside the window would be forgotten and emitted again.
    pub fn dedup_ttl(&self) -> Duration {
        let floor = self.broadcast_window() + self.poll_interval();
        Duration::from_secs(self.dedup_ttl_secs).max(floor)
    }

    pub fn busy_timeout(&self) -> Duration {
        Duration::from_millis(self.busy_timeout_ms)
    }
}
