//! Lunch-break policy.
//!
//! One rule is used everywhere (clock-out and timesheet): the shift must be
//! long enough, the staff member must have worked enough jobs that day, and
//! the shift must span the configured start and finish boundaries.

use crate::db::log::audit;
use crate::db::lunch::{delete_override, upsert_override};
use crate::db::reference::get_staff;
use crate::errors::{AppError, AppResult};
use crate::models::lunch::{LunchBreakOverride, LunchBreakSettings};
use crate::utils::date::format_date;
use chrono::{DateTime, Local, NaiveDate};
use rusqlite::Connection;

pub fn should_auto_deduct_lunch(
    clock_in: DateTime<Local>,
    clock_out: DateTime<Local>,
    jobs_today: u32,
    settings: &LunchBreakSettings,
) -> bool {
    let worked = (clock_out - clock_in).num_minutes();
    if worked < settings.min_minutes() {
        return false;
    }
    if jobs_today < settings.min_jobs {
        return false;
    }
    clock_in.time() <= settings.start_time && clock_out.time() >= settings.finish_time
}

/// Lunch flag shown for a day: the override wins when present.
pub fn displayed_lunch(stored: bool, ov: Option<&LunchBreakOverride>) -> bool {
    ov.map(|o| o.has_lunch_break).unwrap_or(stored)
}

/// Adjust a stored net total for display. The persisted entries are never
/// rewritten; only the shown figure moves by one lunch duration.
pub fn displayed_net_minutes(
    stored_net: i64,
    stored_lunch: bool,
    ov: Option<&LunchBreakOverride>,
    settings: &LunchBreakSettings,
) -> i64 {
    match (stored_lunch, displayed_lunch(stored_lunch, ov)) {
        (false, true) => stored_net - settings.duration_minutes,
        (true, false) => stored_net + settings.duration_minutes,
        _ => stored_net,
    }
}

/// Record a manual decision for one staff member and day.
pub fn set_override(conn: &Connection, ov: &LunchBreakOverride) -> AppResult<()> {
    if get_staff(conn, ov.user_id)?.is_none() {
        return Err(AppError::InvalidReference(format!("staff member {}", ov.user_id)));
    }
    upsert_override(conn, ov)?;
    audit(
        conn,
        "lunch_override",
        &format!("user {}", ov.user_id),
        &format!(
            "Lunch break {} on {}",
            if ov.has_lunch_break { "applied" } else { "removed" },
            format_date(ov.date)
        ),
    )?;
    tracing::info!(user_id = ov.user_id, date = %ov.date, has_lunch_break = ov.has_lunch_break, "lunch override set");
    Ok(())
}

/// Drop the manual decision; returns false when there was none.
pub fn clear_override(conn: &Connection, user_id: i64, date: NaiveDate) -> AppResult<bool> {
    let removed = delete_override(conn, user_id, date)?;
    if removed {
        audit(
            conn,
            "lunch_override_cleared",
            &format!("user {user_id}"),
            &format!("Lunch override cleared for {}", format_date(date)),
        )?;
    }
    Ok(removed)
}
