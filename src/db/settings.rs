//! Shared business settings (`settings` key/value table).
//!
//! Every process reads the same rows, so changing a rule from one terminal
//! applies to all of them on their next operation. Missing or unparseable
//! values fall back to the built-in defaults.

use crate::errors::{AppError, AppResult};
use crate::models::lunch::LunchBreakSettings;
use crate::utils::time::{format_time, parse_time};
use rusqlite::{Connection, OptionalExtension, params};

pub const LUNCH_MIN_HOURS: &str = "lunch_break_min_hours";
pub const LUNCH_DURATION_MINUTES: &str = "lunch_break_duration_minutes";
pub const LUNCH_START_TIME: &str = "lunch_break_start_time";
pub const LUNCH_FINISH_TIME: &str = "lunch_break_finish_time";
pub const LUNCH_MIN_JOBS: &str = "lunch_break_min_jobs";
pub const DEFAULT_ALLOTTED_MINUTES: &str = "default_allotted_minutes";
pub const STAFF_PAY_RATE: &str = "staff_pay_rate_per_hour";

pub const FALLBACK_ALLOTTED_MINUTES: i64 = 90;
pub const FALLBACK_PAY_RATE: f64 = 32.31;

/// Known keys with their default values, in display order.
pub fn known_settings() -> Vec<(&'static str, String)> {
    let lunch = LunchBreakSettings::default();
    vec![
        (LUNCH_MIN_HOURS, lunch.min_hours.to_string()),
        (LUNCH_DURATION_MINUTES, lunch.duration_minutes.to_string()),
        (LUNCH_START_TIME, format_time(lunch.start_time)),
        (LUNCH_FINISH_TIME, format_time(lunch.finish_time)),
        (LUNCH_MIN_JOBS, lunch.min_jobs.to_string()),
        (DEFAULT_ALLOTTED_MINUTES, FALLBACK_ALLOTTED_MINUTES.to_string()),
        (STAFF_PAY_RATE, FALLBACK_PAY_RATE.to_string()),
    ]
}

pub fn get_setting(conn: &Connection, key: &str) -> AppResult<Option<String>> {
    let mut stmt = conn.prepare_cached("SELECT value FROM settings WHERE key = ?1")?;
    Ok(stmt.query_row([key], |row| row.get(0)).optional()?)
}

/// Validate and store a setting. Unknown keys are rejected.
pub fn set_setting(conn: &Connection, key: &str, value: &str) -> AppResult<()> {
    validate(key, value)?;
    conn.execute(
        "INSERT INTO settings (key, value) VALUES (?1, ?2)
         ON CONFLICT(key) DO UPDATE SET value = excluded.value",
        params![key, value.trim()],
    )?;
    Ok(())
}

fn validate(key: &str, value: &str) -> AppResult<()> {
    let invalid = || AppError::InvalidSetting {
        key: key.to_string(),
        value: value.to_string(),
    };
    let v = value.trim();
    match key {
        LUNCH_MIN_HOURS | STAFF_PAY_RATE => {
            let n: f64 = v.parse().map_err(|_| invalid())?;
            if !n.is_finite() || n < 0.0 {
                return Err(invalid());
            }
        }
        LUNCH_DURATION_MINUTES | DEFAULT_ALLOTTED_MINUTES => {
            let n: i64 = v.parse().map_err(|_| invalid())?;
            if n <= 0 {
                return Err(invalid());
            }
        }
        LUNCH_MIN_JOBS => {
            v.parse::<u32>().map_err(|_| invalid())?;
        }
        LUNCH_START_TIME | LUNCH_FINISH_TIME => {
            parse_time(v).map_err(|_| invalid())?;
        }
        _ => return Err(invalid()),
    }
    Ok(())
}

fn parsed<T: std::str::FromStr>(conn: &Connection, key: &str) -> AppResult<Option<T>> {
    let value = get_setting(conn, key)?;
    let parsed = value.as_deref().and_then(|v| v.trim().parse::<T>().ok());
    if value.is_some() && parsed.is_none() {
        tracing::warn!(key, "unparseable setting, using default");
    }
    Ok(parsed)
}

pub fn load_lunch_settings(conn: &Connection) -> AppResult<LunchBreakSettings> {
    let d = LunchBreakSettings::default();
    let time_or = |key: &str, fallback| -> AppResult<_> {
        Ok(get_setting(conn, key)?
            .and_then(|v| parse_time(&v).ok())
            .unwrap_or(fallback))
    };

    Ok(LunchBreakSettings {
        min_hours: parsed(conn, LUNCH_MIN_HOURS)?.unwrap_or(d.min_hours),
        duration_minutes: parsed(conn, LUNCH_DURATION_MINUTES)?.unwrap_or(d.duration_minutes),
        start_time: time_or(LUNCH_START_TIME, d.start_time)?,
        finish_time: time_or(LUNCH_FINISH_TIME, d.finish_time)?,
        min_jobs: parsed(conn, LUNCH_MIN_JOBS)?.unwrap_or(d.min_jobs),
    })
}

pub fn default_allotted_minutes(conn: &Connection) -> AppResult<i64> {
    Ok(parsed::<i64>(conn, DEFAULT_ALLOTTED_MINUTES)?
        .filter(|m| *m > 0)
        .unwrap_or(FALLBACK_ALLOTTED_MINUTES))
}

pub fn pay_rate(conn: &Connection) -> AppResult<f64> {
    Ok(parsed(conn, STAFF_PAY_RATE)?.unwrap_or(FALLBACK_PAY_RATE))
}

/// Effective value of every known key (stored or default).
pub fn effective_settings(conn: &Connection) -> AppResult<Vec<(&'static str, String, bool)>> {
    let mut out = Vec::new();
    for (key, default) in known_settings() {
        match get_setting(conn, key)? {
            Some(v) => out.push((key, v, true)),
            None => out.push((key, default, false)),
        }
    }
    Ok(out)
}
