use crate::db::date_from_db;
use crate::errors::AppResult;
use crate::models::membership::TeamMembership;
use crate::utils::date::format_date;
use chrono::{NaiveDate, Utc};
use rusqlite::{Connection, Row, params};

fn map_membership(row: &Row) -> rusqlite::Result<TeamMembership> {
    let start: String = row.get(3)?;
    let end: Option<String> = row.get(4)?;
    Ok(TeamMembership {
        id: row.get(0)?,
        user_id: row.get(1)?,
        team_id: row.get(2)?,
        start_date: date_from_db(3, &start)?,
        end_date: end.map(|e| date_from_db(4, &e)).transpose()?,
    })
}

const COVERS_DAY: &str = "start_date <= ?2 AND (end_date IS NULL OR end_date >= ?2)";

/// Rows of `team_id` that cover `day`.
pub fn team_rows_on(conn: &Connection, team_id: i64, day: NaiveDate) -> AppResult<Vec<TeamMembership>> {
    let sql = format!(
        "SELECT id, user_id, team_id, start_date, end_date FROM team_memberships
         WHERE team_id = ?1 AND {COVERS_DAY}
         ORDER BY user_id ASC, id ASC"
    );
    let mut stmt = conn.prepare_cached(&sql)?;
    let rows = stmt.query_map(params![team_id, format_date(day)], map_membership)?;
    Ok(rows.collect::<Result<Vec<_>, _>>()?)
}

/// Rows of `user_id`, any team, that cover `day`.
pub fn user_rows_on(conn: &Connection, user_id: i64, day: NaiveDate) -> AppResult<Vec<TeamMembership>> {
    let sql = format!(
        "SELECT id, user_id, team_id, start_date, end_date FROM team_memberships
         WHERE user_id = ?1 AND {COVERS_DAY}
         ORDER BY id ASC"
    );
    let mut stmt = conn.prepare_cached(&sql)?;
    let rows = stmt.query_map(params![user_id, format_date(day)], map_membership)?;
    Ok(rows.collect::<Result<Vec<_>, _>>()?)
}

/// Full history of a user, oldest first.
pub fn user_history(conn: &Connection, user_id: i64) -> AppResult<Vec<TeamMembership>> {
    let mut stmt = conn.prepare_cached(
        "SELECT id, user_id, team_id, start_date, end_date FROM team_memberships
         WHERE user_id = ?1 ORDER BY start_date ASC, id ASC",
    )?;
    let rows = stmt.query_map([user_id], map_membership)?;
    Ok(rows.collect::<Result<Vec<_>, _>>()?)
}

pub fn insert_membership(
    conn: &Connection,
    user_id: i64,
    team_id: i64,
    start_date: NaiveDate,
) -> AppResult<i64> {
    conn.execute(
        "INSERT INTO team_memberships (user_id, team_id, start_date, end_date, created_at)
         VALUES (?1, ?2, ?3, NULL, ?4)",
        params![user_id, team_id, format_date(start_date), Utc::now().to_rfc3339()],
    )?;
    Ok(conn.last_insert_rowid())
}

/// Close open rows of `user_id` (optionally only on `team_id`) at `end_date`.
/// Rows starting after `end_date` are left untouched.
pub fn close_open(
    conn: &Connection,
    user_id: i64,
    team_id: Option<i64>,
    end_date: NaiveDate,
) -> AppResult<usize> {
    let n = conn.execute(
        "UPDATE team_memberships SET end_date = ?1
         WHERE user_id = ?2 AND end_date IS NULL AND start_date <= ?1
           AND (?3 IS NULL OR team_id = ?3)",
        params![format_date(end_date), user_id, team_id],
    )?;
    Ok(n)
}
