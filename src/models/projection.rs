//! Read-side shapes returned to display collaborators.

use chrono::{DateTime, Local, NaiveDate};
use serde::Serialize;

#[derive(Debug, Clone, Serialize)]
pub struct ActiveMember {
    pub entry_id: i64,
    pub user_id: i64,
    pub name: String,
    pub clock_in_time: DateTime<Local>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ActiveJob {
    pub job_id: i64,
    pub customer_id: i64,
    pub customer_name: String,
    pub customer_price: i64,
    pub team_name: Option<String>,
    pub team_color: Option<String>,
    pub started_at: DateTime<Local>,
    pub team_size: usize,
    pub allotted_minutes: i64,
    pub members: Vec<ActiveMember>,
}

#[derive(Debug, Clone, Serialize)]
pub struct CompletedEntry {
    pub entry_id: i64,
    pub job_id: i64,
    pub customer_name: String,
    pub clock_in_time: DateTime<Local>,
    pub clock_out_time: DateTime<Local>,
    pub lunch_break: bool,
    pub auto_lunch_deducted: bool,
}

/// One staff member's day as shown on the timesheet.
#[derive(Debug, Clone, Serialize)]
pub struct TimesheetDay {
    pub user_id: i64,
    pub staff_name: String,
    pub date: NaiveDate,
    pub first_clock_in: DateTime<Local>,
    pub last_clock_out: Option<DateTime<Local>>,
    pub jobs: usize,
    pub worked_minutes: i64,
    pub stored_lunch: bool,
    pub override_lunch: Option<bool>,
    pub displayed_lunch: bool,
    pub net_minutes: i64,
}
