use crate::cli::commands::open_db;
use crate::cli::parser::Commands;
use crate::config::Config;
use crate::db::log::load_log;
use crate::errors::AppResult;
use crate::ui::messages::{header, operation_style};
use crate::utils::table::Table;
use chrono::{DateTime, Local};

pub fn handle(cmd: &Commands, cfg: &Config) -> AppResult<()> {
    if !matches!(cmd, Commands::Log { print: true }) {
        return Ok(());
    }

    let pool = open_db(cfg)?;
    let rows = load_log(&pool.conn)?;

    header("Internal log");
    let mut table = Table::new(["ID", "DATE", "OPERATION", "TARGET", "MESSAGE"]);
    for r in &rows {
        let date = DateTime::parse_from_rfc3339(&r.date)
            .map(|dt| dt.with_timezone(&Local).format("%Y-%m-%d %H:%M:%S").to_string())
            .unwrap_or_else(|_| r.date.clone());
        table.add_row(vec![
            r.id.to_string(),
            date,
            r.operation.clone(),
            r.target.clone(),
            r.message.clone(),
        ]);
    }

    // colour is applied after layout so ANSI codes do not skew column widths
    for (i, line) in table.render().lines().enumerate() {
        match i.checked_sub(2).and_then(|k| rows.get(k)) {
            Some(r) => {
                let painted = operation_style(&r.operation).paint(r.operation.as_str());
                println!("{}", line.replacen(&r.operation, &painted.to_string(), 1));
            }
            None => println!("{line}"),
        }
    }
    Ok(())
}
