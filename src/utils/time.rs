//! Time utilities: HH:MM parsing, minute formatting and the storage
//! encoding of timestamps.

use crate::errors::{AppError, AppResult};
use chrono::{DateTime, Local, NaiveTime, SecondsFormat, Utc};

pub fn parse_time(t: &str) -> AppResult<NaiveTime> {
    NaiveTime::parse_from_str(t.trim(), "%H:%M").map_err(|_| AppError::InvalidTime(t.to_string()))
}

pub fn format_time(t: NaiveTime) -> String {
    t.format("%H:%M").to_string()
}

/// `135` -> `02h 15m`, negative values keep their sign.
pub fn mins2readable(mins: i64) -> String {
    let sign = if mins < 0 { "-" } else { "" };
    let m = mins.abs();
    format!("{}{:02}h {:02}m", sign, m / 60, m % 60)
}

/// Fixed-width UTC form with nanoseconds: lexical order is chronological
/// order and reloading yields the identical instant.
pub fn to_db_timestamp<Tz: chrono::TimeZone>(ts: &DateTime<Tz>) -> String {
    ts.with_timezone(&Utc)
        .to_rfc3339_opts(SecondsFormat::Nanos, true)
}

pub fn from_db_timestamp(raw: &str) -> AppResult<DateTime<Local>> {
    DateTime::parse_from_rfc3339(raw)
        .map(|dt| dt.with_timezone(&Local))
        .map_err(|_| AppError::InvalidTimestamp(raw.to_string()))
}

/// Local wall-clock rendering used by listings.
pub fn display_timestamp(ts: &DateTime<Local>) -> String {
    ts.format("%Y-%m-%d %H:%M").to_string()
}
