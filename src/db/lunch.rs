use crate::db::{bool_to_db, date_from_db};
use crate::errors::AppResult;
use crate::models::lunch::LunchBreakOverride;
use crate::utils::date::format_date;
use chrono::{NaiveDate, Utc};
use rusqlite::{Connection, OptionalExtension, params};

pub fn upsert_override(conn: &Connection, ov: &LunchBreakOverride) -> AppResult<()> {
    conn.execute(
        "INSERT INTO lunch_break_overrides (user_id, date, has_lunch_break, created_at)
         VALUES (?1, ?2, ?3, ?4)
         ON CONFLICT(user_id, date) DO UPDATE SET has_lunch_break = excluded.has_lunch_break",
        params![
            ov.user_id,
            format_date(ov.date),
            bool_to_db(ov.has_lunch_break),
            Utc::now().to_rfc3339()
        ],
    )?;
    Ok(())
}

/// Returns true when an override existed.
pub fn delete_override(conn: &Connection, user_id: i64, date: NaiveDate) -> AppResult<bool> {
    let n = conn.execute(
        "DELETE FROM lunch_break_overrides WHERE user_id = ?1 AND date = ?2",
        params![user_id, format_date(date)],
    )?;
    Ok(n > 0)
}

pub fn get_override(
    conn: &Connection,
    user_id: i64,
    date: NaiveDate,
) -> AppResult<Option<LunchBreakOverride>> {
    let mut stmt = conn.prepare_cached(
        "SELECT has_lunch_break FROM lunch_break_overrides WHERE user_id = ?1 AND date = ?2",
    )?;
    let flag: Option<i64> = stmt
        .query_row(params![user_id, format_date(date)], |row| row.get(0))
        .optional()?;
    Ok(flag.map(|f| LunchBreakOverride {
        user_id,
        date,
        has_lunch_break: f != 0,
    }))
}

/// Overrides with `from <= date <= to`, optionally for one user.
pub fn overrides_between(
    conn: &Connection,
    user_id: Option<i64>,
    from: NaiveDate,
    to: NaiveDate,
) -> AppResult<Vec<LunchBreakOverride>> {
    let mut stmt = conn.prepare_cached(
        "SELECT user_id, date, has_lunch_break FROM lunch_break_overrides
         WHERE date >= ?1 AND date <= ?2 AND (?3 IS NULL OR user_id = ?3)
         ORDER BY date ASC, user_id ASC",
    )?;
    let rows = stmt.query_map(params![format_date(from), format_date(to), user_id], |row| {
        let raw: String = row.get(1)?;
        Ok(LunchBreakOverride {
            user_id: row.get(0)?,
            date: date_from_db(1, &raw)?,
            has_lunch_break: row.get::<_, i64>(2)? != 0,
        })
    })?;
    Ok(rows.collect::<Result<Vec<_>, _>>()?)
}
