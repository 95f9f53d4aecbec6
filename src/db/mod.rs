pub mod initialize;
pub mod jobs;
pub mod log;
pub mod lunch;
pub mod memberships;
pub mod migrate;
pub mod pool;
pub mod reference;
pub mod settings;
pub mod stats;

use crate::errors::AppError;
use chrono::NaiveDate;

pub(crate) fn bool_to_db(v: bool) -> i64 {
    if v { 1 } else { 0 }
}

/// Convert a stored `YYYY-MM-DD` into a date, reporting the column on failure.
pub(crate) fn date_from_db(idx: usize, raw: &str) -> rusqlite::Result<NaiveDate> {
    NaiveDate::parse_from_str(raw, crate::utils::date::DATE_FMT).map_err(|_| {
        rusqlite::Error::FromSqlConversionFailure(
            idx,
            rusqlite::types::Type::Text,
            Box::new(AppError::InvalidDate(raw.to_string())),
        )
    })
}

/// Same as [`date_from_db`] for RFC 3339 timestamps.
pub(crate) fn ts_from_db(idx: usize, raw: &str) -> rusqlite::Result<chrono::DateTime<chrono::Local>> {
    crate::utils::time::from_db_timestamp(raw).map_err(|e| {
        rusqlite::Error::FromSqlConversionFailure(idx, rusqlite::types::Type::Text, Box::new(e))
    })
}

pub(crate) fn opt_ts_from_db(
    idx: usize,
    raw: Option<String>,
) -> rusqlite::Result<Option<chrono::DateTime<chrono::Local>>> {
    raw.map(|s| ts_from_db(idx, &s)).transpose()
}
