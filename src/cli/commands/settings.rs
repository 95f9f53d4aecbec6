use crate::cli::commands::open_db;
use crate::cli::parser::Commands;
use crate::config::Config;
use crate::db::settings::{effective_settings, set_setting};
use crate::errors::{AppError, AppResult};
use crate::ui::messages::{header, success};
use crate::utils::table::Table;

pub fn handle(cmd: &Commands, cfg: &Config) -> AppResult<()> {
    let Commands::Settings { print, set } = cmd else {
        return Ok(());
    };
    let pool = open_db(cfg)?;

    if let Some(pair) = set {
        let (key, value) = pair.split_once('=').ok_or_else(|| AppError::InvalidSetting {
            key: pair.clone(),
            value: String::new(),
        })?;
        set_setting(&pool.conn, key.trim(), value)?;
        success(format!("{} = {}", key.trim(), value.trim()));
    }

    if *print {
        header("Settings");
        let mut table = Table::new(["KEY", "VALUE", "SOURCE"]);
        for (key, value, stored) in effective_settings(&pool.conn)? {
            let source = if stored { "stored" } else { "default" };
            table.add_row(vec![key.to_string(), value, source.to_string()]);
        }
        print!("{}", table.render());
    }
    Ok(())
}
