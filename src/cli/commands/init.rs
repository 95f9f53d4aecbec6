use crate::cli::parser::Cli;
use crate::config::Config;
use crate::db::initialize::init_db;
use crate::db::log;
use crate::db::pool::DbPool;
use crate::errors::AppResult;
use crate::ui::messages::{field, success, warning};

/// Handle the `init` command
///
/// Creates the config file (skipped in test mode), the database file and
/// applies all pending migrations.
pub fn handle(cli: &Cli) -> AppResult<()> {
    let db_path = Config::init_all(cli.db.as_deref(), !cli.test)?;
    let db_path = db_path.to_string_lossy().to_string();

    if !cli.test {
        field("Config file", Config::config_file().display());
    }
    field("Database", &db_path);

    let pool = DbPool::new(&db_path)?;
    init_db(&pool.conn)?;

    if let Err(e) = log::audit(
        &pool.conn,
        "init",
        "database",
        &format!("Database initialized at {db_path}"),
    ) {
        warning(format!("Failed to write internal log: {e}"));
    }

    success("crewclock initialization completed");
    Ok(())
}
