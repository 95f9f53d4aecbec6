pub mod allot;
pub mod clock;
pub mod config;
pub mod db;
pub mod init;
pub mod log;
pub mod lunch;
pub mod reference;
pub mod settings;
pub mod team;
pub mod timesheet;
pub mod view;
pub mod watch;

use crate::cli::parser::Cli;
use crate::config::Config;
use crate::core::broadcaster::EventBroadcaster;
use crate::core::lifecycle::JobService;
use crate::core::metrics::{CustomerMetricsRecalculator, MetricsTrigger};
use crate::db::initialize::init_db;
use crate::db::pool::DbPool;
use crate::errors::{AppError, AppResult};
use crate::utils::clock::system_clock;
use crate::utils::date::parse_date;
use chrono::{Local, NaiveDate};
use std::sync::Arc;

/// Open the configured database with the schema brought up to date.
pub(crate) fn open_db(cfg: &Config) -> AppResult<DbPool> {
    let pool = DbPool::with_busy_timeout(&cfg.database, cfg.busy_timeout())?;
    init_db(&pool.conn)?;
    Ok(pool)
}

pub(crate) fn acting_user(cli: &Cli) -> AppResult<i64> {
    cli.user.ok_or(AppError::MissingPrincipal)
}

pub(crate) fn build_service(cfg: &Config) -> JobService {
    let broadcaster = Arc::new(EventBroadcaster::new(cfg.dedup_ttl(), cfg.dedup_capacity));
    let metrics = MetricsTrigger::new(Arc::new(CustomerMetricsRecalculator::new(
        &cfg.database,
        cfg.busy_timeout(),
    )));
    JobService::new(&cfg.database, system_clock(), broadcaster, metrics)
        .with_busy_timeout(cfg.busy_timeout())
}

pub(crate) fn date_or_today(raw: Option<&String>) -> AppResult<NaiveDate> {
    match raw {
        Some(s) => parse_date(s),
        None => Ok(Local::now().date_naive()),
    }
}
