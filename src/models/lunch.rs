use chrono::{NaiveDate, NaiveTime};
use serde::Serialize;

/// Global lunch-break rules, stored in the shared `settings` table.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LunchBreakSettings {
    pub min_hours: f64,
    pub duration_minutes: i64,
    pub start_time: NaiveTime,
    pub finish_time: NaiveTime,
    pub min_jobs: u32,
}

impl LunchBreakSettings {
    pub fn min_minutes(&self) -> i64 {
        (self.min_hours * 60.0).round() as i64
    }
}

impl Default for LunchBreakSettings {
    fn default() -> Self {
        Self {
            min_hours: 5.0,
            duration_minutes: 30,
            start_time: NaiveTime::from_hms_opt(9, 0, 0).unwrap_or(NaiveTime::MIN),
            finish_time: NaiveTime::from_hms_opt(17, 0, 0).unwrap_or(NaiveTime::MIN),
            min_jobs: 1,
        }
    }
}

/// Manual per-day decision that wins over the automatic rule for display.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct LunchBreakOverride {
    pub user_id: i64,
    pub date: NaiveDate,
    pub has_lunch_break: bool,
}
