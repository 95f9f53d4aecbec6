//! crewclock main entrypoint.

use crewclock::errors::AppError;
use crewclock::run;
use crewclock::ui::messages::error;

fn main() {
    if let Err(e) = run() {
        tracing::debug!(error = %e, "command failed");
        error(e.user_message());
        let code = match e {
            AppError::Db(_) | AppError::Migration(_) => 2,
            _ => 1,
        };
        std::process::exit(code);
    }
}
