use chrono::{DateTime, Local, TimeDelta};
use serde::Serialize;

/// One staff member's presence on one job.
/// `clock_out_time == None` means the entry is still open.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TimeEntry {
    pub id: i64,
    pub user_id: i64,
    pub job_id: i64,
    pub clock_in_time: DateTime<Local>,
    pub clock_out_time: Option<DateTime<Local>>,
    pub lunch_break: bool,
    pub auto_lunch_deducted: bool,
}

impl TimeEntry {
    pub fn is_open(&self) -> bool {
        self.clock_out_time.is_none()
    }

    /// Raw presence, before any lunch deduction. Zero while open.
    pub fn worked(&self) -> TimeDelta {
        match self.clock_out_time {
            Some(out) => out - self.clock_in_time,
            None => TimeDelta::zero(),
        }
    }
}
