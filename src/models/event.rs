use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventKind {
    StaffClockedIn,
    StaffClockedOut,
    JobUpdated,
}

impl EventKind {
    pub fn as_str(self) -> &'static str {
        match self {
            EventKind::StaffClockedIn => "staff_clocked_in",
            EventKind::StaffClockedOut => "staff_clocked_out",
            EventKind::JobUpdated => "job_updated",
        }
    }
}

/// Dashboard notification. Best effort: consumers may see duplicates or gaps.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LifecycleEvent {
    #[serde(rename = "type")]
    pub kind: EventKind,
    pub job_id: i64,
    pub member_count: usize,
    pub job_completed: bool,
    pub timestamp: DateTime<Utc>,
}

impl LifecycleEvent {
    pub fn new(
        kind: EventKind,
        job_id: i64,
        member_count: usize,
        job_completed: bool,
        timestamp: DateTime<Utc>,
    ) -> Self {
        Self {
            kind,
            job_id,
            member_count,
            job_completed,
            timestamp,
        }
    }

    pub fn to_json_line(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }
}
