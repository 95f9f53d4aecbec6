//! Unified application error type.
//! Every layer (db, core, cli) returns AppError so the binary can render a
//! single short message per failure kind.

use std::io;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum AppError {
    // ---------------------------
    // Lifecycle (caller-facing)
    // ---------------------------
    #[error("User {0} already has an open time entry")]
    AlreadyClockedIn(i64),

    #[error("User {user_id} is not a current member of team {team_id}")]
    NotTeamMember { user_id: i64, team_id: i64 },

    #[error("Invalid reference: {0}")]
    InvalidReference(String),

    #[error("User {0} has no open time entry")]
    NoActiveEntry(i64),

    #[error("Job {0} has no open time entries")]
    JobNotActive(i64),

    #[error("Data integrity violation: {0}")]
    DataIntegrityViolation(String),

    #[error("Membership conflict: {0}")]
    MembershipConflict(String),

    #[error("This command needs the acting staff member (--user <id>)")]
    MissingPrincipal,

    // ---------------------------
    // IO / storage
    // ---------------------------
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("Database error: {0}")]
    Db(#[from] rusqlite::Error),

    #[error("Database migration error: {0}")]
    Migration(String),

    // ---------------------------
    // Parsing
    // ---------------------------
    #[error("Invalid date format: {0}")]
    InvalidDate(String),

    #[error("Invalid time format: {0}")]
    InvalidTime(String),

    #[error("Invalid timestamp stored: {0}")]
    InvalidTimestamp(String),

    #[error("Invalid setting {key}: {value}")]
    InvalidSetting { key: String, value: String },

    // ---------------------------
    // Config
    // ---------------------------
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Event serialization error: {0}")]
    Serialize(#[from] serde_json::Error),

    #[error("Internal error: {0}")]
    Other(String),
}

impl AppError {
    /// Short message shown to the person at the terminal.
    /// Storage failures never leak the underlying SQLite text.
    pub fn user_message(&self) -> String {
        match self {
            AppError::AlreadyClockedIn(_) => {
                "You already have an active time entry. Please clock out first.".into()
            }
            AppError::NotTeamMember { .. } => "You are not a member of this team.".into(),
            AppError::InvalidReference(what) => format!("Unknown or inactive {what}."),
            AppError::NoActiveEntry(_) => "No active time entry found.".into(),
            AppError::JobNotActive(job) => format!("Job {job} has no active time entries."),
            AppError::DataIntegrityViolation(_) => {
                "Stored data is inconsistent; an administrator has to fix it.".into()
            }
            AppError::Db(_) | AppError::Migration(_) | AppError::InvalidTimestamp(_) => {
                "Storage is temporarily unavailable. Please retry.".into()
            }
            other => other.to_string(),
        }
    }

    pub fn is_unique_violation(err: &rusqlite::Error) -> bool {
        matches!(
            err,
            rusqlite::Error::SqliteFailure(e, _)
                if e.extended_code == rusqlite::ffi::SQLITE_CONSTRAINT_UNIQUE
        )
    }
}

pub type AppResult<T> = Result<T, AppError>;
