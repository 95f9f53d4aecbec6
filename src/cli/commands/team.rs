use crate::cli::commands::{date_or_today, open_db};
use crate::cli::parser::{Commands, TeamAction};
use crate::config::Config;
use crate::core::membership::MembershipLedger;
use crate::db::reference::{get_staff, get_team, insert_team, list_teams};
use crate::errors::{AppError, AppResult};
use crate::ui::messages::{header, info, success};
use crate::utils::date::format_date;
use crate::utils::table::Table;

pub fn handle(cmd: &Commands, cfg: &Config) -> AppResult<()> {
    let Commands::Team { action } = cmd else {
        return Ok(());
    };
    let pool = open_db(cfg)?;
    let ledger = MembershipLedger::new(&pool.conn);

    match action {
        TeamAction::Add { name, color } => {
            let id = insert_team(&pool.conn, name.trim(), color.trim())?;
            success(format!("Added team #{id}: {}", name.trim()));
        }
        TeamAction::List => {
            let mut table = Table::new(["ID", "NAME", "COLOR", "ACTIVE"]);
            for t in list_teams(&pool.conn)? {
                let active = if t.active { "yes" } else { "no" };
                table.add_row(vec![t.id.to_string(), t.name, t.color_hex, active.into()]);
            }
            print!("{}", table.render());
        }
        TeamAction::Join { staff, team, from } => {
            let start = date_or_today(from.as_ref())?;
            ledger.join(*staff, *team, start)?;
            success(format!(
                "Staff member {staff} joined team {team} from {}",
                format_date(start)
            ));
        }
        TeamAction::Leave { staff, team, on } => {
            let end = date_or_today(on.as_ref())?;
            ledger.leave(*staff, *team, end)?;
            success(format!(
                "Staff member {staff} left team {team} on {}",
                format_date(end)
            ));
        }
        TeamAction::Members { team, date } => {
            let day = date_or_today(date.as_ref())?;
            let team_row = get_team(&pool.conn, *team)?
                .ok_or_else(|| AppError::InvalidReference(format!("team {team}")))?;

            header(format!("{} on {}", team_row.name, format_date(day)));
            let members = ledger.members_at(*team, day)?;
            if members.is_empty() {
                info("No members.");
                return Ok(());
            }
            let mut table = Table::new(["ID", "NAME"]);
            for user_id in members {
                let name = get_staff(&pool.conn, user_id)?
                    .map(|s| s.name)
                    .unwrap_or_default();
                table.add_row(vec![user_id.to_string(), name]);
            }
            print!("{}", table.render());
        }
    }
    Ok(())
}
