//! `staff`, `customer` and `tier` maintenance commands.

use crate::cli::commands::open_db;
use crate::cli::parser::{Commands, CustomerAction, StaffAction, TierAction};
use crate::config::Config;
use crate::db::reference::{
    NewCustomer, insert_customer, insert_staff, insert_tier, list_customers, list_staff, load_tiers,
    set_customer_active,
};
use crate::errors::{AppError, AppResult};
use crate::models::reference::PriceTier;
use crate::ui::messages::{dash, info, success};
use crate::utils::table::Table;

fn yes_no(v: bool) -> String {
    if v { "yes".into() } else { "no".into() }
}

fn opt_or_dash(v: Option<i64>) -> String {
    v.map(|n| n.to_string()).unwrap_or_else(dash)
}

pub fn handle(cmd: &Commands, cfg: &Config) -> AppResult<()> {
    match cmd {
        Commands::Staff { action } => staff(action, cfg),
        Commands::Customer { action } => customer(action, cfg),
        Commands::Tier { action } => tier(action, cfg),
        _ => Ok(()),
    }
}

fn staff(action: &StaffAction, cfg: &Config) -> AppResult<()> {
    let pool = open_db(cfg)?;
    match action {
        StaffAction::Add { name } => {
            let id = insert_staff(&pool.conn, name.trim())?;
            success(format!("Added staff member #{id}: {}", name.trim()));
        }
        StaffAction::List => {
            let mut table = Table::new(["ID", "NAME", "ACTIVE"]);
            for s in list_staff(&pool.conn)? {
                table.add_row(vec![s.id.to_string(), s.name, yes_no(s.active)]);
            }
            print!("{}", table.render());
        }
    }
    Ok(())
}

fn customer(action: &CustomerAction, cfg: &Config) -> AppResult<()> {
    let pool = open_db(cfg)?;
    match action {
        CustomerAction::Add {
            name,
            price,
            ff_minutes,
        } => {
            if let Some(m) = ff_minutes
                && *m <= 0
            {
                return Err(AppError::Other(format!(
                    "Friends & Family minutes must be positive, got {m}"
                )));
            }
            let id = insert_customer(
                &pool.conn,
                &NewCustomer {
                    name: name.trim(),
                    price: *price,
                    is_friends_family: ff_minutes.is_some(),
                    friends_family_minutes: *ff_minutes,
                },
            )?;
            success(format!("Added customer #{id}: {} (price {price})", name.trim()));
        }
        CustomerAction::List => {
            let mut table = Table::new([
                "ID", "NAME", "PRICE", "F&F", "F&F MIN", "EFFICIENCY %", "WAGE RATIO %",
            ]);
            for c in list_customers(&pool.conn)? {
                table.add_row(vec![
                    c.id.to_string(),
                    c.name,
                    c.price.to_string(),
                    yes_no(c.is_friends_family),
                    opt_or_dash(c.friends_family_minutes),
                    opt_or_dash(c.average_efficiency),
                    opt_or_dash(c.average_wage_ratio),
                ]);
            }
            print!("{}", table.render());
        }
        CustomerAction::Deactivate { id } => {
            if set_customer_active(&pool.conn, *id, false)? == 0 {
                return Err(AppError::InvalidReference(format!("customer {id}")));
            }
            success(format!("Customer #{id} deactivated"));
        }
    }
    Ok(())
}

fn tier(action: &TierAction, cfg: &Config) -> AppResult<()> {
    let pool = open_db(cfg)?;
    match action {
        TierAction::Add { min, max, minutes } => {
            if max < min || *minutes <= 0 {
                return Err(AppError::Other(format!(
                    "Invalid tier {min}-{max} -> {minutes} min"
                )));
            }
            let tier = PriceTier {
                price_min: *min,
                price_max: *max,
                allotted_minutes: *minutes,
            };
            let existing = load_tiers(&pool.conn)?;
            if existing
                .iter()
                .any(|t| t.price_min <= tier.price_max && tier.price_min <= t.price_max)
            {
                return Err(AppError::Other(format!(
                    "Tier {min}-{max} overlaps an existing tier"
                )));
            }
            insert_tier(&pool.conn, &tier)?;
            success(format!("Added tier {min}-{max} -> {minutes} min"));
        }
        TierAction::List => {
            let tiers = load_tiers(&pool.conn)?;
            if tiers.is_empty() {
                info("No price tiers configured; the default allotment applies.");
                return Ok(());
            }
            let mut table = Table::new(["PRICE MIN", "PRICE MAX", "MINUTES"]);
            for t in tiers {
                table.add_row(vec![
                    t.price_min.to_string(),
                    t.price_max.to_string(),
                    t.allotted_minutes.to_string(),
                ]);
            }
            print!("{}", table.render());
        }
    }
    Ok(())
}
