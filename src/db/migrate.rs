use crate::errors::{AppError, AppResult};
use crate::ui::messages::success;
use rusqlite::{Connection, OptionalExtension, Result, Transaction, TransactionBehavior};

/// A schema step, identified by a sortable version tag.
/// Applied steps are recorded in `log` with operation `migration_applied`.
struct Migration {
    version: &'static str,
    description: &'static str,
    sql: &'static str,
}

const MIGRATIONS: &[Migration] = &[
    Migration {
        version: "20260301_0001_reference_tables",
        description: "Created staff, teams, memberships, customers, tiers, settings, lunch overrides",
        sql: r#"
        CREATE TABLE IF NOT EXISTS staff (
            id      INTEGER PRIMARY KEY AUTOINCREMENT,
            name    TEXT NOT NULL,
            active  INTEGER NOT NULL DEFAULT 1
        );

        CREATE TABLE IF NOT EXISTS teams (
            id         INTEGER PRIMARY KEY AUTOINCREMENT,
            name       TEXT NOT NULL,
            color_hex  TEXT NOT NULL DEFAULT '#888888',
            active     INTEGER NOT NULL DEFAULT 1
        );

        CREATE TABLE IF NOT EXISTS team_memberships (
            id          INTEGER PRIMARY KEY AUTOINCREMENT,
            user_id     INTEGER NOT NULL REFERENCES staff(id),
            team_id     INTEGER NOT NULL REFERENCES teams(id),
            start_date  TEXT NOT NULL,
            end_date    TEXT,
            created_at  TEXT NOT NULL,
            CHECK (end_date IS NULL OR end_date >= start_date)
        );

        CREATE INDEX IF NOT EXISTS idx_memberships_team ON team_memberships(team_id, start_date);
        CREATE INDEX IF NOT EXISTS idx_memberships_user ON team_memberships(user_id, start_date);

        CREATE TABLE IF NOT EXISTS customers (
            id                      INTEGER PRIMARY KEY AUTOINCREMENT,
            name                    TEXT NOT NULL,
            price                   INTEGER NOT NULL,
            is_friends_family       INTEGER NOT NULL DEFAULT 0,
            friends_family_minutes  INTEGER,
            average_wage_ratio      INTEGER,
            active                  INTEGER NOT NULL DEFAULT 1
        );

        CREATE TABLE IF NOT EXISTS price_tiers (
            id                INTEGER PRIMARY KEY AUTOINCREMENT,
            price_min         INTEGER NOT NULL,
            price_max         INTEGER NOT NULL,
            allotted_minutes  INTEGER NOT NULL CHECK (allotted_minutes > 0),
            CHECK (price_max >= price_min)
        );

        CREATE TABLE IF NOT EXISTS settings (
            key    TEXT PRIMARY KEY,
            value  TEXT NOT NULL
        );

        CREATE TABLE IF NOT EXISTS lunch_break_overrides (
            id               INTEGER PRIMARY KEY AUTOINCREMENT,
            user_id          INTEGER NOT NULL REFERENCES staff(id),
            date             TEXT NOT NULL,
            has_lunch_break  INTEGER NOT NULL,
            created_at       TEXT NOT NULL,
            UNIQUE (user_id, date)
        );
        "#,
    },
    Migration {
        version: "20260301_0002_jobs_and_time_entries",
        description: "Created jobs and time_entries with the single-open-entry index",
        sql: r#"
        CREATE TABLE IF NOT EXISTS jobs (
            id            INTEGER PRIMARY KEY AUTOINCREMENT,
            customer_id   INTEGER NOT NULL REFERENCES customers(id),
            team_id       INTEGER NOT NULL REFERENCES teams(id),
            status        TEXT NOT NULL DEFAULT 'in_progress'
                          CHECK (status IN ('in_progress','completed')),
            created_at    TEXT NOT NULL,
            completed_at  TEXT
        );

        CREATE TABLE IF NOT EXISTS time_entries (
            id                   INTEGER PRIMARY KEY AUTOINCREMENT,
            user_id              INTEGER NOT NULL REFERENCES staff(id),
            job_id               INTEGER NOT NULL REFERENCES jobs(id),
            clock_in_time        TEXT NOT NULL,
            clock_out_time       TEXT,
            lunch_break          INTEGER NOT NULL DEFAULT 0,
            auto_lunch_deducted  INTEGER NOT NULL DEFAULT 0,
            updated_at           TEXT NOT NULL
        );

        CREATE UNIQUE INDEX IF NOT EXISTS idx_time_entries_single_open
            ON time_entries(user_id) WHERE clock_out_time IS NULL;
        CREATE INDEX IF NOT EXISTS idx_time_entries_job ON time_entries(job_id, clock_out_time);
        CREATE INDEX IF NOT EXISTS idx_time_entries_updated ON time_entries(updated_at);
        CREATE INDEX IF NOT EXISTS idx_time_entries_user_in ON time_entries(user_id, clock_in_time);
        "#,
    },
    Migration {
        version: "20260412_0003_customer_efficiency",
        description: "Added average_efficiency to customers",
        sql: "ALTER TABLE customers ADD COLUMN average_efficiency INTEGER;",
    },
];

/// Ensure that the `log` table exists; it also tracks applied migrations.
fn ensure_log_table(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        r#"
        CREATE TABLE IF NOT EXISTS log (
            id        INTEGER PRIMARY KEY AUTOINCREMENT,
            date      TEXT NOT NULL,
            operation TEXT NOT NULL,
            target    TEXT DEFAULT '',
            message   TEXT NOT NULL
        );
        "#,
    )?;
    Ok(())
}

fn is_applied(conn: &Connection, version: &str) -> Result<bool> {
    let mut chk = conn.prepare(
        "SELECT 1 FROM log
         WHERE operation = 'migration_applied' AND target = ?1
         LIMIT 1",
    )?;
    Ok(chk.query_row([version], |_| Ok(())).optional()?.is_some())
}

fn apply(conn: &Connection, m: &Migration) -> AppResult<()> {
    conn.execute_batch(m.sql)
        .map_err(|e| AppError::Migration(format!("{}: {}", m.version, e)))?;

    conn.execute(
        "INSERT INTO log (date, operation, target, message)
         VALUES (strftime('%Y-%m-%dT%H:%M:%SZ', 'now'), 'migration_applied', ?1, ?2)",
        [m.version, m.description],
    )?;
    Ok(())
}

/// Public entry point: run all pending migrations, returning how many ran.
///
/// The check and the steps share one IMMEDIATE transaction, so a process
/// starting at the same moment waits and then finds them applied.
/// Invoked by db::initialize::init_db().
pub fn run_pending_migrations(conn: &Connection) -> AppResult<usize> {
    let tx = Transaction::new_unchecked(conn, TransactionBehavior::Immediate)?;
    ensure_log_table(&tx)?;

    let mut applied = Vec::new();
    for m in MIGRATIONS {
        if is_applied(&tx, m.version)? {
            continue;
        }
        apply(&tx, m)?;
        applied.push(m.version);
    }
    tx.commit()?;

    for version in &applied {
        tracing::info!(version = *version, "migration applied");
    }
    if !applied.is_empty() {
        success(format!("Applied {} database migration(s).", applied.len()));
    }

    Ok(applied.len())
}

/// Versions recorded as applied, oldest first.
pub fn applied_versions(conn: &Connection) -> AppResult<Vec<String>> {
    ensure_log_table(conn)?;
    let mut stmt = conn.prepare(
        "SELECT target FROM log WHERE operation = 'migration_applied' ORDER BY id ASC",
    )?;
    let rows = stmt.query_map([], |row| row.get::<_, String>(0))?;
    let mut out = Vec::new();
    for r in rows {
        out.push(r?);
    }
    Ok(out)
}
