//! crewclock library root.
//! Exposes the CLI parser, the high-level run() function and the engine modules.

pub mod cli;
pub mod config;
pub mod core;
pub mod db;
pub mod errors;
pub mod models;
pub mod ui;
pub mod utils;

use clap::Parser;
use cli::parser::{Cli, Commands};
use config::Config;
use errors::AppResult;
use tracing_subscriber::EnvFilter;

/// Central command dispatcher
pub fn dispatch(cli: &Cli, cfg: &Config) -> AppResult<()> {
    match &cli.command {
        Commands::Init => cli::commands::init::handle(cli),
        Commands::Config { .. } => cli::commands::config::handle(&cli.command, cfg),
        Commands::Db { .. } => cli::commands::db::handle(&cli.command, cfg),
        Commands::Log { .. } => cli::commands::log::handle(&cli.command, cfg),
        Commands::Staff { .. } | Commands::Customer { .. } | Commands::Tier { .. } => {
            cli::commands::reference::handle(&cli.command, cfg)
        }
        Commands::Team { .. } => cli::commands::team::handle(&cli.command, cfg),
        Commands::Settings { .. } => cli::commands::settings::handle(&cli.command, cfg),
        Commands::ClockIn { .. } | Commands::ClockOut { .. } | Commands::EndActive { .. } => {
            cli::commands::clock::handle(cli, cfg)
        }
        Commands::Active { .. } | Commands::Today { .. } => cli::commands::view::handle(cli, cfg),
        Commands::Timesheet { .. } => cli::commands::timesheet::handle(cli, cfg),
        Commands::Lunch { .. } => cli::commands::lunch::handle(cli, cfg),
        Commands::Allot { .. } => cli::commands::allot::handle(&cli.command, cfg),
        Commands::Watch { .. } => cli::commands::watch::handle(cli, cfg),
    }
}

/// Diagnostics go to stderr; `RUST_LOG` wins over the configured level.
pub fn init_tracing(default_level: &str) {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(default_level))
        .unwrap_or_else(|_| EnvFilter::new("warn"));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_writer(std::io::stderr)
        .try_init();
}

/// Entry point used by main.rs
pub fn run() -> AppResult<()> {
    let cli = Cli::parse();

    let mut cfg = Config::load()?;
    if let Some(custom_db) = &cli.db {
        cfg.database = utils::path::expand_tilde(custom_db)
            .to_string_lossy()
            .to_string();
    }

    init_tracing(&cfg.log_level);
    dispatch(&cli, &cfg)
}
