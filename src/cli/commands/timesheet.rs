use crate::cli::commands::{acting_user, open_db};
use crate::cli::parser::{Cli, Commands};
use crate::config::Config;
use crate::core::timesheet::build_timesheet;
use crate::errors::AppResult;
use crate::ui::messages::{dash, header, info};
use crate::utils::date::{format_date, parse_date, week_start};
use crate::utils::table::Table;
use crate::utils::time::mins2readable;
use chrono::{Duration, Local};

pub fn handle(cli: &Cli, cfg: &Config) -> AppResult<()> {
    let Commands::Timesheet {
        from,
        to,
        all,
        json,
    } = &cli.command
    else {
        return Ok(());
    };

    let today = Local::now().date_naive();
    let from = match from {
        Some(s) => parse_date(s)?,
        None => week_start(today),
    };
    let to = match to {
        Some(s) => parse_date(s)?,
        None => from + Duration::days(6),
    };
    let user = if *all { None } else { Some(acting_user(cli)?) };

    let pool = open_db(cfg)?;
    let days = build_timesheet(&pool.conn, from, to, user)?;

    if *json {
        println!("{}", serde_json::to_string_pretty(&days)?);
        return Ok(());
    }

    header(format!("Timesheet {} .. {}", format_date(from), format_date(to)));
    if days.is_empty() {
        info("No entries in range.");
        return Ok(());
    }

    let mut table = Table::new(["DATE", "STAFF", "JOBS", "FIRST IN", "LAST OUT", "WORKED", "LUNCH", "NET"]);
    for d in days {
        let lunch = match d.override_lunch {
            Some(v) => format!("{} (manual)", if v { "yes" } else { "no" }),
            None => (if d.displayed_lunch { "yes" } else { "no" }).to_string(),
        };
        table.add_row(vec![
            format_date(d.date),
            d.staff_name,
            d.jobs.to_string(),
            d.first_clock_in.format("%H:%M").to_string(),
            d.last_clock_out
                .map(|t| t.format("%H:%M").to_string())
                .unwrap_or_else(dash),
            mins2readable(d.worked_minutes),
            lunch,
            mins2readable(d.net_minutes),
        ]);
    }
    print!("{}", table.render());
    Ok(())
}
