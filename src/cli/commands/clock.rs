//! `clock-in`, `clock-out` and `end-active`.

use crate::cli::commands::{acting_user, build_service, open_db};
use crate::cli::parser::{Cli, Commands};
use crate::config::Config;
use crate::core::lifecycle::{ClockInRequest, ClockOutOutcome, ClockOutRequest};
use crate::errors::AppResult;
use crate::ui::messages::{field, info, success};
use crate::utils::time::mins2readable;

pub fn handle(cli: &Cli, cfg: &Config) -> AppResult<()> {
    // schema first: the service assumes the tables exist
    drop(open_db(cfg)?);
    let service = build_service(cfg);

    match &cli.command {
        Commands::ClockIn {
            customer,
            team,
            with,
        } => {
            let outcome = service.clock_in(&ClockInRequest {
                user_id: acting_user(cli)?,
                customer_id: *customer,
                team_id: *team,
                member_ids: with.clone(),
            })?;

            success(format!(
                "Clocked in {} member(s) on job {}",
                outcome.members_clocked_in, outcome.job_id
            ));
            field("Allotted", mins2readable(outcome.allotted_minutes));
            if !outcome.skipped_members.is_empty() {
                info(format!(
                    "Already clocked in elsewhere, skipped: {:?}",
                    outcome.skipped_members
                ));
            }
        }
        Commands::ClockOut { lunch, all, select } => {
            let outcome = service.clock_out(&ClockOutRequest {
                user_id: acting_user(cli)?,
                lunch_break: *lunch,
                clock_out_all_members: *all,
                selected_member_ids: select.clone(),
            })?;
            report(&outcome);
        }
        Commands::EndActive { job } => {
            let outcome = service.end_active(*job)?;
            report(&outcome);
        }
        _ => {}
    }

    service.metrics().wait_idle();
    Ok(())
}

fn report(outcome: &ClockOutOutcome) {
    success(format!(
        "Clocked out {} member(s) from job {}",
        outcome.members_clocked_out(),
        outcome.job_id
    ));
    for c in &outcome.closed {
        let lunch = match (c.lunch_break, c.auto_lunch_deducted) {
            (true, true) => "lunch (auto)",
            (true, false) => "lunch",
            _ => "no lunch",
        };
        info(format!("entry {} (staff {}): {lunch}", c.entry_id, c.user_id));
    }
    if outcome.job_completed {
        success(format!("Job {} completed", outcome.job_id));
    } else {
        info(format!("{} member(s) still on the job", outcome.remaining_open));
    }
}
