use clap::{ArgAction, Parser, Subcommand};

/// Command-line interface definition for crewclock
/// Job clock-in/out, allotted time and lunch rules for cleaning crews, on SQLite
#[derive(Parser)]
#[command(
    name = "crewclock",
    version = env!("CARGO_PKG_VERSION"),
    about = "Track cleaning jobs: clock crews in and out, compute allotted time and lunch deductions",
    long_about = None
)]
pub struct Cli {
    /// Override database path (useful for tests or custom DB)
    #[arg(global = true, long = "db")]
    pub db: Option<String>,

    /// Acting staff member id (trusted, supplied by the caller)
    #[arg(global = true, long = "user")]
    pub user: Option<i64>,

    /// Run in test mode (no config file update)
    #[arg(global = true, long = "test", hide = true)]
    pub test: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Initialize the database and configuration
    Init,

    /// Show the configuration file
    Config {
        #[arg(long = "print", help = "Print the current configuration")]
        print_config: bool,
    },

    /// Manage the database (migrations, integrity checks, info)
    Db {
        #[arg(long = "migrate", help = "Run pending database migrations")]
        migrate: bool,

        #[arg(long = "check", help = "Check database integrity")]
        check: bool,

        #[arg(long = "info", help = "Show database information")]
        info: bool,
    },

    /// Print the internal log table
    Log {
        #[arg(long = "print", help = "Print rows from the internal log table")]
        print: bool,
    },

    /// Staff members
    Staff {
        #[command(subcommand)]
        action: StaffAction,
    },

    /// Teams and their membership history
    Team {
        #[command(subcommand)]
        action: TeamAction,
    },

    /// Customers
    Customer {
        #[command(subcommand)]
        action: CustomerAction,
    },

    /// Price tiers (price band -> allotted minutes for two people)
    Tier {
        #[command(subcommand)]
        action: TierAction,
    },

    /// Shared business settings stored in the database
    Settings {
        #[arg(long = "print", help = "Print effective settings")]
        print: bool,

        #[arg(long = "set", value_name = "KEY=VALUE", help = "Update one setting")]
        set: Option<String>,
    },

    /// Start a job and clock in (the acting user plus optional members)
    ClockIn {
        #[arg(long = "customer")]
        customer: i64,

        #[arg(long = "team")]
        team: i64,

        /// Staff ids clocking in together with you
        #[arg(long = "with", value_delimiter = ',')]
        with: Vec<i64>,
    },

    /// Clock out of the active job
    ClockOut {
        /// Record a lunch break
        #[arg(long = "lunch")]
        lunch: bool,

        /// Clock out every member still on the job
        #[arg(long = "all", conflicts_with = "select")]
        all: bool,

        /// Time-entry ids of other members to clock out with you
        #[arg(long = "select", value_delimiter = ',')]
        select: Vec<i64>,
    },

    /// Admin: close every open entry of a job
    EndActive {
        job: i64,
    },

    /// Show your active job
    Active {
        #[arg(long = "json")]
        json: bool,
    },

    /// Show entries you completed today
    Today {
        #[arg(long = "json")]
        json: bool,
    },

    /// Daily hours with lunch deductions (defaults to the current week)
    Timesheet {
        #[arg(long = "from", help = "First day (YYYY-MM-DD)")]
        from: Option<String>,

        #[arg(long = "to", help = "Last day (YYYY-MM-DD)")]
        to: Option<String>,

        /// Every staff member instead of the acting user
        #[arg(long = "all")]
        all: bool,

        #[arg(long = "json")]
        json: bool,
    },

    /// Manual lunch-break decisions per staff member and day
    Lunch {
        #[command(subcommand)]
        action: LunchAction,
    },

    /// Compute allotted minutes for a price and team size
    Allot {
        #[arg(long = "price")]
        price: i64,

        #[arg(long = "team-size", default_value_t = 2)]
        team_size: usize,

        /// Friends & Family fixed duration (bypasses tiers)
        #[arg(long = "ff-minutes")]
        ff_minutes: Option<i64>,
    },

    /// Stream lifecycle events as JSON lines
    Watch {
        #[arg(long = "session", default_value = "cli")]
        session: String,

        /// Stop after this many seconds (runs until interrupted otherwise)
        #[arg(long = "for-secs")]
        for_secs: Option<u64>,
    },
}

#[derive(Subcommand)]
pub enum StaffAction {
    Add { name: String },
    List,
}

#[derive(Subcommand)]
pub enum TeamAction {
    Add {
        name: String,

        #[arg(long = "color", default_value = "#888888")]
        color: String,
    },
    List,
    /// Move a staff member into a team from a date (default today)
    Join {
        #[arg(long = "staff")]
        staff: i64,

        #[arg(long = "team")]
        team: i64,

        #[arg(long = "from")]
        from: Option<String>,
    },
    /// Close a staff member's membership at a date (default today)
    Leave {
        #[arg(long = "staff")]
        staff: i64,

        #[arg(long = "team")]
        team: i64,

        #[arg(long = "on")]
        on: Option<String>,
    },
    /// Members of a team on a date (default today)
    Members {
        team: i64,

        #[arg(long = "date")]
        date: Option<String>,
    },
}

#[derive(Subcommand)]
pub enum CustomerAction {
    Add {
        name: String,

        #[arg(long = "price")]
        price: i64,

        /// Friends & Family fixed duration in minutes
        #[arg(long = "ff-minutes")]
        ff_minutes: Option<i64>,
    },
    List,
    /// Stop accepting new jobs for a customer
    Deactivate { id: i64 },
}

#[derive(Subcommand)]
pub enum TierAction {
    Add {
        #[arg(long = "min")]
        min: i64,

        #[arg(long = "max")]
        max: i64,

        #[arg(long = "minutes")]
        minutes: i64,
    },
    List,
}

#[derive(Subcommand)]
pub enum LunchAction {
    Set {
        date: String,

        /// Staff member (defaults to the acting user)
        #[arg(long = "staff")]
        staff: Option<i64>,

        #[arg(long = "applied", action = ArgAction::Set)]
        applied: bool,
    },
    Clear {
        date: String,

        #[arg(long = "staff")]
        staff: Option<i64>,
    },
}
