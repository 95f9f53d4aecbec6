use crate::db::migrate::applied_versions;
use crate::db::pool::DbPool;
use crate::errors::AppResult;
use crate::ui::messages::{dash, field};
use rusqlite::OptionalExtension;
use std::fs;

fn count(pool: &DbPool, sql: &str) -> AppResult<i64> {
    Ok(pool.conn.query_row(sql, [], |row| row.get(0))?)
}

pub fn print_db_info(pool: &DbPool, db_path: &str) -> AppResult<()> {
    println!();

    let file_size = fs::metadata(db_path).map(|m| m.len()).unwrap_or(0);
    let file_mb = (file_size as f64) / (1024.0 * 1024.0);

    field("File", db_path);
    field("Size", format!("{file_mb:.2} MB"));

    let versions = applied_versions(&pool.conn)?;
    field(
        "Schema",
        versions.last().cloned().unwrap_or_else(dash),
    );

    field("Staff", count(pool, "SELECT COUNT(*) FROM staff")?);
    field("Teams", count(pool, "SELECT COUNT(*) FROM teams")?);
    field("Customers", count(pool, "SELECT COUNT(*) FROM customers")?);
    field(
        "Jobs in progress",
        count(pool, "SELECT COUNT(*) FROM jobs WHERE status = 'in_progress'")?,
    );
    field(
        "Jobs completed",
        count(pool, "SELECT COUNT(*) FROM jobs WHERE status = 'completed'")?,
    );
    field(
        "Open time entries",
        count(pool, "SELECT COUNT(*) FROM time_entries WHERE clock_out_time IS NULL")?,
    );

    let first: Option<String> = pool
        .conn
        .query_row(
            "SELECT clock_in_time FROM time_entries ORDER BY clock_in_time ASC LIMIT 1",
            [],
            |row| row.get(0),
        )
        .optional()?;
    let last: Option<String> = pool
        .conn
        .query_row(
            "SELECT clock_in_time FROM time_entries ORDER BY clock_in_time DESC LIMIT 1",
            [],
            |row| row.get(0),
        )
        .optional()?;

    field("First clock-in", first.unwrap_or_else(dash));
    field("Last clock-in", last.unwrap_or_else(dash));

    println!();
    Ok(())
}
