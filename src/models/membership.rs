use chrono::NaiveDate;
use serde::Serialize;

/// Temporal team membership row. `end_date == None` means still active.
/// Rows are appended and closed, never rewritten.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TeamMembership {
    pub id: i64,
    pub user_id: i64,
    pub team_id: i64,
    pub start_date: NaiveDate,
    pub end_date: Option<NaiveDate>,
}

impl TeamMembership {
    /// `start_date <= day AND (end_date IS NULL OR end_date >= day)`
    pub fn covers(&self, day: NaiveDate) -> bool {
        self.start_date <= day && self.end_date.is_none_or(|end| end >= day)
    }
}
