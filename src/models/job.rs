use chrono::{DateTime, Local};
use serde::Serialize;

#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum JobStatus {
    InProgress,
    Completed,
}

impl JobStatus {
    /// Convert enum → DB string
    pub fn to_db_str(self) -> &'static str {
        match self {
            JobStatus::InProgress => "in_progress",
            JobStatus::Completed => "completed",
        }
    }

    /// Convert DB string → enum
    pub fn from_db_str(s: &str) -> Option<Self> {
        match s {
            "in_progress" => Some(JobStatus::InProgress),
            "completed" => Some(JobStatus::Completed),
            _ => None,
        }
    }

    pub fn is_completed(self) -> bool {
        matches!(self, JobStatus::Completed)
    }
}

/// One cleaning engagement at one customer by one team.
#[derive(Debug, Clone, Serialize)]
pub struct Job {
    pub id: i64,
    pub customer_id: i64,
    pub team_id: i64,
    pub status: JobStatus,
    pub created_at: DateTime<Local>,
    pub completed_at: Option<DateTime<Local>>,
}
