use crate::cli::commands::{acting_user, open_db};
use crate::cli::parser::{Cli, Commands, LunchAction};
use crate::config::Config;
use crate::core::lunch::{clear_override, set_override};
use crate::errors::AppResult;
use crate::models::lunch::LunchBreakOverride;
use crate::ui::messages::{info, success};
use crate::utils::date::{format_date, parse_date};

pub fn handle(cli: &Cli, cfg: &Config) -> AppResult<()> {
    let Commands::Lunch { action } = &cli.command else {
        return Ok(());
    };
    let pool = open_db(cfg)?;

    match action {
        LunchAction::Set {
            date,
            staff,
            applied,
        } => {
            let user_id = match staff {
                Some(id) => *id,
                None => acting_user(cli)?,
            };
            let date = parse_date(date)?;
            set_override(
                &pool.conn,
                &LunchBreakOverride {
                    user_id,
                    date,
                    has_lunch_break: *applied,
                },
            )?;
            success(format!(
                "Lunch break {} for staff {user_id} on {}",
                if *applied { "applied" } else { "removed" },
                format_date(date)
            ));
        }
        LunchAction::Clear { date, staff } => {
            let user_id = match staff {
                Some(id) => *id,
                None => acting_user(cli)?,
            };
            let date = parse_date(date)?;
            if clear_override(&pool.conn, user_id, date)? {
                success(format!(
                    "Lunch override cleared for staff {user_id} on {}",
                    format_date(date)
                ));
            } else {
                info("No override to clear.");
            }
        }
    }
    Ok(())
}
