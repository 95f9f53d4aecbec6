//! Job and time-entry persistence.
//!
//! Only the lifecycle service writes these tables. Every function takes a
//! plain `&Connection` so it can run inside the caller's IMMEDIATE
//! transaction (a `Transaction` derefs to `Connection`).

use crate::db::{bool_to_db, opt_ts_from_db, ts_from_db};
use crate::errors::{AppError, AppResult};
use crate::models::job::{Job, JobStatus};
use crate::models::projection::{ActiveMember, CompletedEntry};
use crate::models::time_entry::TimeEntry;
use crate::utils::time::to_db_timestamp;
use chrono::{DateTime, TimeZone, Utc};
use rusqlite::{Connection, OptionalExtension, Row, params};

const ENTRY_COLUMNS: &str =
    "id, user_id, job_id, clock_in_time, clock_out_time, lunch_break, auto_lunch_deducted";

fn map_entry(row: &Row) -> rusqlite::Result<TimeEntry> {
    let clock_in: String = row.get(3)?;
    Ok(TimeEntry {
        id: row.get(0)?,
        user_id: row.get(1)?,
        job_id: row.get(2)?,
        clock_in_time: ts_from_db(3, &clock_in)?,
        clock_out_time: opt_ts_from_db(4, row.get(4)?)?,
        lunch_break: row.get::<_, i64>(5)? != 0,
        auto_lunch_deducted: row.get::<_, i64>(6)? != 0,
    })
}

fn map_job(row: &Row) -> rusqlite::Result<Job> {
    let status: String = row.get(3)?;
    let created: String = row.get(4)?;
    Ok(Job {
        id: row.get(0)?,
        customer_id: row.get(1)?,
        team_id: row.get(2)?,
        status: JobStatus::from_db_str(&status).ok_or_else(|| {
            rusqlite::Error::FromSqlConversionFailure(
                3,
                rusqlite::types::Type::Text,
                Box::new(AppError::Other(format!("unknown job status '{status}'"))),
            )
        })?,
        created_at: ts_from_db(4, &created)?,
        completed_at: opt_ts_from_db(5, row.get(5)?)?,
    })
}

// ---------------------------
// Jobs
// ---------------------------

pub fn insert_job<Tz: TimeZone>(
    conn: &Connection,
    customer_id: i64,
    team_id: i64,
    now: &DateTime<Tz>,
) -> AppResult<i64> {
    conn.execute(
        "INSERT INTO jobs (customer_id, team_id, status, created_at)
         VALUES (?1, ?2, 'in_progress', ?3)",
        params![customer_id, team_id, to_db_timestamp(now)],
    )?;
    Ok(conn.last_insert_rowid())
}

pub fn get_job(conn: &Connection, job_id: i64) -> AppResult<Option<Job>> {
    let mut stmt = conn.prepare_cached(
        "SELECT id, customer_id, team_id, status, created_at, completed_at
         FROM jobs WHERE id = ?1",
    )?;
    Ok(stmt.query_row([job_id], map_job).optional()?)
}

/// Flip the job to `completed`. Returns 1 only for the call that performed
/// the transition; later calls match no row.
pub fn complete_job<Tz: TimeZone>(conn: &Connection, job_id: i64, now: &DateTime<Tz>) -> AppResult<usize> {
    Ok(conn.execute(
        "UPDATE jobs SET status = 'completed', completed_at = ?1
         WHERE id = ?2 AND status = 'in_progress'",
        params![to_db_timestamp(now), job_id],
    )?)
}

// ---------------------------
// Time entries
// ---------------------------

/// Insert an open entry. `Ok(None)` when the user already holds an open
/// entry (the single-open-entry index rejected the row).
pub fn insert_open_entry<Tz: TimeZone>(
    conn: &Connection,
    user_id: i64,
    job_id: i64,
    now: &DateTime<Tz>,
) -> AppResult<Option<i64>> {
    let ts = to_db_timestamp(now);
    let res = conn.execute(
        "INSERT INTO time_entries
             (user_id, job_id, clock_in_time, clock_out_time, lunch_break, auto_lunch_deducted, updated_at)
         VALUES (?1, ?2, ?3, NULL, 0, 0, ?3)",
        params![user_id, job_id, ts],
    );
    match res {
        Ok(_) => Ok(Some(conn.last_insert_rowid())),
        Err(e) if AppError::is_unique_violation(&e) => Ok(None),
        Err(e) => Err(e.into()),
    }
}

pub fn get_entry(conn: &Connection, entry_id: i64) -> AppResult<Option<TimeEntry>> {
    let sql = format!("SELECT {ENTRY_COLUMNS} FROM time_entries WHERE id = ?1");
    let mut stmt = conn.prepare_cached(&sql)?;
    Ok(stmt.query_row([entry_id], map_entry).optional()?)
}

pub fn open_entry_for_user(conn: &Connection, user_id: i64) -> AppResult<Option<TimeEntry>> {
    let sql = format!(
        "SELECT {ENTRY_COLUMNS} FROM time_entries
         WHERE user_id = ?1 AND clock_out_time IS NULL"
    );
    let mut stmt = conn.prepare_cached(&sql)?;
    Ok(stmt.query_row([user_id], map_entry).optional()?)
}

pub fn open_entries_for_job(conn: &Connection, job_id: i64) -> AppResult<Vec<TimeEntry>> {
    let sql = format!(
        "SELECT {ENTRY_COLUMNS} FROM time_entries
         WHERE job_id = ?1 AND clock_out_time IS NULL
         ORDER BY clock_in_time ASC, id ASC"
    );
    let mut stmt = conn.prepare_cached(&sql)?;
    let rows = stmt.query_map([job_id], map_entry)?;
    Ok(rows.collect::<Result<Vec<_>, _>>()?)
}

pub fn entries_for_job(conn: &Connection, job_id: i64) -> AppResult<Vec<TimeEntry>> {
    let sql = format!(
        "SELECT {ENTRY_COLUMNS} FROM time_entries WHERE job_id = ?1 ORDER BY id ASC"
    );
    let mut stmt = conn.prepare_cached(&sql)?;
    let rows = stmt.query_map([job_id], map_entry)?;
    Ok(rows.collect::<Result<Vec<_>, _>>()?)
}

pub fn count_open_for_job(conn: &Connection, job_id: i64) -> AppResult<i64> {
    Ok(conn.query_row(
        "SELECT COUNT(*) FROM time_entries WHERE job_id = ?1 AND clock_out_time IS NULL",
        [job_id],
        |row| row.get(0),
    )?)
}

/// Close one entry. Returns 0 if it was already closed by someone else.
pub fn close_entry<Tz: TimeZone>(
    conn: &Connection,
    entry_id: i64,
    clock_out: &DateTime<Tz>,
    lunch_break: bool,
    auto_lunch_deducted: bool,
) -> AppResult<usize> {
    let ts = to_db_timestamp(clock_out);
    Ok(conn.execute(
        "UPDATE time_entries
         SET clock_out_time = ?1, lunch_break = ?2, auto_lunch_deducted = ?3, updated_at = ?1
         WHERE id = ?4 AND clock_out_time IS NULL",
        params![
            ts,
            bool_to_db(lunch_break),
            bool_to_db(auto_lunch_deducted),
            entry_id
        ],
    )?)
}

/// Entries of `user_id` clocked in within `[from, to)`.
pub fn count_user_entries_between(
    conn: &Connection,
    user_id: i64,
    from: DateTime<Utc>,
    to: DateTime<Utc>,
) -> AppResult<i64> {
    Ok(conn.query_row(
        "SELECT COUNT(*) FROM time_entries
         WHERE user_id = ?1 AND clock_in_time >= ?2 AND clock_in_time < ?3",
        params![user_id, to_db_timestamp(&from), to_db_timestamp(&to)],
        |row| row.get(0),
    )?)
}

/// Entries clocked in within `[from, to)`, optionally for one user,
/// paired with the staff name.
pub fn entries_between(
    conn: &Connection,
    user_id: Option<i64>,
    from: DateTime<Utc>,
    to: DateTime<Utc>,
) -> AppResult<Vec<(TimeEntry, String)>> {
    let mut stmt = conn.prepare_cached(
        "SELECT e.id, e.user_id, e.job_id, e.clock_in_time, e.clock_out_time,
                e.lunch_break, e.auto_lunch_deducted, s.name
         FROM time_entries e
         JOIN staff s ON s.id = e.user_id
         WHERE e.clock_in_time >= ?1 AND e.clock_in_time < ?2
           AND (?3 IS NULL OR e.user_id = ?3)
         ORDER BY e.user_id ASC, e.clock_in_time ASC",
    )?;
    let rows = stmt.query_map(
        params![to_db_timestamp(&from), to_db_timestamp(&to), user_id],
        |row| Ok((map_entry(row)?, row.get::<_, String>(7)?)),
    )?;
    Ok(rows.collect::<Result<Vec<_>, _>>()?)
}

// ---------------------------
// Read projections
// ---------------------------

pub fn open_members(conn: &Connection, job_id: i64) -> AppResult<Vec<ActiveMember>> {
    let mut stmt = conn.prepare_cached(
        "SELECT e.id, e.user_id, s.name, e.clock_in_time
         FROM time_entries e
         JOIN staff s ON s.id = e.user_id
         WHERE e.job_id = ?1 AND e.clock_out_time IS NULL
         ORDER BY e.clock_in_time ASC, e.id ASC",
    )?;
    let rows = stmt.query_map([job_id], |row| {
        let clock_in: String = row.get(3)?;
        Ok(ActiveMember {
            entry_id: row.get(0)?,
            user_id: row.get(1)?,
            name: row.get(2)?,
            clock_in_time: ts_from_db(3, &clock_in)?,
        })
    })?;
    Ok(rows.collect::<Result<Vec<_>, _>>()?)
}

/// Closed entries of `user_id` clocked in within `[from, to)`, newest first.
pub fn completed_between(
    conn: &Connection,
    user_id: i64,
    from: DateTime<Utc>,
    to: DateTime<Utc>,
) -> AppResult<Vec<CompletedEntry>> {
    let mut stmt = conn.prepare_cached(
        "SELECT e.id, e.job_id, c.name, e.clock_in_time, e.clock_out_time,
                e.lunch_break, e.auto_lunch_deducted
         FROM time_entries e
         JOIN jobs j ON j.id = e.job_id
         JOIN customers c ON c.id = j.customer_id
         WHERE e.user_id = ?1 AND e.clock_out_time IS NOT NULL
           AND e.clock_in_time >= ?2 AND e.clock_in_time < ?3
         ORDER BY e.clock_in_time DESC, e.id DESC",
    )?;
    let rows = stmt.query_map(
        params![user_id, to_db_timestamp(&from), to_db_timestamp(&to)],
        |row| {
            let clock_in: String = row.get(3)?;
            let clock_out: String = row.get(4)?;
            Ok(CompletedEntry {
                entry_id: row.get(0)?,
                job_id: row.get(1)?,
                customer_name: row.get(2)?,
                clock_in_time: ts_from_db(3, &clock_in)?,
                clock_out_time: ts_from_db(4, &clock_out)?,
                lunch_break: row.get::<_, i64>(5)? != 0,
                auto_lunch_deducted: row.get::<_, i64>(6)? != 0,
            })
        },
    )?;
    Ok(rows.collect::<Result<Vec<_>, _>>()?)
}

/// Per-job summary of entries touched since `since`, for the reconciler.
#[derive(Debug, Clone)]
pub struct RecentJobChange {
    pub job_id: i64,
    pub last_modified: DateTime<Utc>,
    pub open_members: usize,
    pub completed: bool,
}

pub fn jobs_modified_since(conn: &Connection, since: DateTime<Utc>) -> AppResult<Vec<RecentJobChange>> {
    let mut stmt = conn.prepare_cached(
        "SELECT e.job_id,
                MAX(e.updated_at),
                (SELECT COUNT(*) FROM time_entries o
                  WHERE o.job_id = e.job_id AND o.clock_out_time IS NULL),
                j.status
         FROM time_entries e
         JOIN jobs j ON j.id = e.job_id
         WHERE e.updated_at >= ?1
         GROUP BY e.job_id
         ORDER BY MAX(e.updated_at) ASC",
    )?;
    let rows = stmt.query_map([to_db_timestamp(&since)], |row| {
        let last: String = row.get(1)?;
        let status: String = row.get(3)?;
        Ok(RecentJobChange {
            job_id: row.get(0)?,
            last_modified: ts_from_db(1, &last)?.with_timezone(&Utc),
            open_members: row.get::<_, i64>(2)? as usize,
            completed: status == JobStatus::Completed.to_db_str(),
        })
    })?;
    Ok(rows.collect::<Result<Vec<_>, _>>()?)
}

/// Completed jobs of a customer with all their entries.
pub fn completed_jobs_for_customer(
    conn: &Connection,
    customer_id: i64,
) -> AppResult<Vec<(Job, Vec<TimeEntry>)>> {
    let mut stmt = conn.prepare_cached(
        "SELECT id, customer_id, team_id, status, created_at, completed_at
         FROM jobs WHERE customer_id = ?1 AND status = 'completed'
         ORDER BY id ASC",
    )?;
    let jobs = stmt
        .query_map([customer_id], map_job)?
        .collect::<Result<Vec<_>, _>>()?;

    let mut out = Vec::with_capacity(jobs.len());
    for job in jobs {
        let entries = entries_for_job(conn, job.id)?;
        out.push((job, entries));
    }
    Ok(out)
}
