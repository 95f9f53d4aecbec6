use crate::cli::commands::open_db;
use crate::cli::parser::Commands;
use crate::config::Config;
use crate::core::allotment::AllotmentCalculator;
use crate::errors::AppResult;
use crate::utils::time::mins2readable;

pub fn handle(cmd: &Commands, cfg: &Config) -> AppResult<()> {
    if let Commands::Allot {
        price,
        team_size,
        ff_minutes,
    } = cmd
    {
        let pool = open_db(cfg)?;
        let calc = AllotmentCalculator::load(&pool.conn)?;
        let minutes = calc.compute(*price, ff_minutes.is_some(), *ff_minutes, *team_size);
        println!("{minutes} ({})", mins2readable(minutes));
    }
    Ok(())
}
