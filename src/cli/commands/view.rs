//! `active` and `today` read projections.

use crate::cli::commands::{acting_user, build_service, open_db};
use crate::cli::parser::{Cli, Commands};
use crate::config::Config;
use crate::errors::AppResult;
use crate::ui::messages::{field, header, info};
use crate::utils::table::Table;
use crate::utils::time::{display_timestamp, mins2readable};

pub fn handle(cli: &Cli, cfg: &Config) -> AppResult<()> {
    drop(open_db(cfg)?);
    let service = build_service(cfg);
    let user_id = acting_user(cli)?;

    match &cli.command {
        Commands::Active { json } => {
            let active = service.active_job(user_id)?;
            if *json {
                println!("{}", serde_json::to_string_pretty(&active)?);
                return Ok(());
            }
            let Some(job) = active else {
                info("No active job.");
                return Ok(());
            };

            header(format!("Job {} at {}", job.job_id, job.customer_name));
            if let Some(team) = &job.team_name {
                field("Team", team);
            }
            field("Started", display_timestamp(&job.started_at));
            field("Team size", job.team_size);
            field("Allotted", mins2readable(job.allotted_minutes));

            let mut table = Table::new(["ENTRY", "STAFF", "NAME", "CLOCK IN"]);
            for m in &job.members {
                table.add_row(vec![
                    m.entry_id.to_string(),
                    m.user_id.to_string(),
                    m.name.clone(),
                    display_timestamp(&m.clock_in_time),
                ]);
            }
            print!("{}", table.render());
        }
        Commands::Today { json } => {
            let entries = service.completed_today(user_id)?;
            if *json {
                println!("{}", serde_json::to_string_pretty(&entries)?);
                return Ok(());
            }
            if entries.is_empty() {
                info("Nothing completed today.");
                return Ok(());
            }
            let mut table = Table::new(["JOB", "CUSTOMER", "IN", "OUT", "WORKED", "LUNCH"]);
            for e in entries {
                let lunch = match (e.lunch_break, e.auto_lunch_deducted) {
                    (true, true) => "auto",
                    (true, false) => "yes",
                    _ => "no",
                };
                table.add_row(vec![
                    e.job_id.to_string(),
                    e.customer_name,
                    display_timestamp(&e.clock_in_time),
                    display_timestamp(&e.clock_out_time),
                    mins2readable((e.clock_out_time - e.clock_in_time).num_minutes()),
                    lunch.to_string(),
                ]);
            }
            print!("{}", table.render());
        }
        _ => {}
    }
    Ok(())
}
