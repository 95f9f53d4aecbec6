#![allow(dead_code)]
use assert_cmd::{Command, cargo_bin_cmd};
use chrono::{DateTime, Local, NaiveDate, TimeZone};
use crewclock::core::broadcaster::EventBroadcaster;
use crewclock::core::lifecycle::JobService;
use crewclock::core::metrics::{MetricsRecalculator, MetricsTrigger};
use crewclock::db::initialize::init_db;
use crewclock::db::memberships::insert_membership;
use crewclock::db::pool::DbPool;
use crewclock::db::reference::{NewCustomer, insert_customer, insert_staff, insert_team, insert_tier};
use crewclock::errors::AppResult;
use crewclock::models::reference::PriceTier;
use crewclock::utils::clock::FixedClock;
use std::sync::{Arc, Mutex};
use tempfile::TempDir;

pub fn cc() -> Command {
    cargo_bin_cmd!("crewclock")
}

/// Fresh database path inside its own temp dir (kept alive by the TempDir).
pub fn setup_test_db(name: &str) -> (TempDir, String) {
    let dir = tempfile::Builder::new()
        .prefix(&format!("crewclock_{name}_"))
        .tempdir()
        .expect("temp dir");
    let db_path = dir.path().join("crewclock.sqlite");
    (dir, db_path.to_string_lossy().to_string())
}

/// Initialise a test database through the CLI.
pub fn cli_init(db_path: &str) {
    cc().args(["--db", db_path, "--test", "init"])
        .assert()
        .success();
}

pub fn local(y: i32, m: u32, d: u32, hh: u32, mm: u32) -> DateTime<Local> {
    Local
        .with_ymd_and_hms(y, m, d, hh, mm, 0)
        .earliest()
        .expect("valid local time")
}

pub fn day(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).expect("valid date")
}

/// Records every customer id it is asked to recalculate.
#[derive(Default)]
pub struct RecordingRecalculator {
    pub calls: Mutex<Vec<i64>>,
}

impl RecordingRecalculator {
    pub fn calls(&self) -> Vec<i64> {
        self.calls.lock().expect("calls lock").clone()
    }
}

impl MetricsRecalculator for RecordingRecalculator {
    fn recalculate(&self, customer_id: i64) -> AppResult<()> {
        self.calls.lock().expect("calls lock").push(customer_id);
        Ok(())
    }
}

/// Ids created by [`Fixture::new`].
pub const ALICE: i64 = 1;
pub const BOB: i64 = 2;
pub const CARA: i64 = 3;
pub const DAN: i64 = 4;

pub const TEAM_BLUE: i64 = 1;
pub const TEAM_RED: i64 = 2;

/// price 150, tier 100-150 -> 90
pub const CUSTOMER_STANDARD: i64 = 1;
/// price 220, tier 201-250 -> 150
pub const CUSTOMER_LARGE: i64 = 2;
/// Friends & Family, fixed 45 minutes
pub const CUSTOMER_FRIENDS: i64 = 3;
/// price 999, no tier
pub const CUSTOMER_UNTIERED: i64 = 4;

/// Seeded database plus a service wired to a fixed clock.
///
/// Alice, Bob and Cara are on the blue team since 2026-01-01; Dan is on
/// the red team.
pub struct Fixture {
    pub _dir: TempDir,
    pub db_path: String,
    pub clock: Arc<FixedClock>,
    pub broadcaster: Arc<EventBroadcaster>,
    pub recorder: Arc<RecordingRecalculator>,
    pub service: JobService,
}

impl Fixture {
    pub fn new(name: &str) -> Self {
        let (dir, db_path) = setup_test_db(name);
        seed(&db_path);

        let clock = Arc::new(FixedClock::new(local(2026, 3, 10, 8, 0)));
        let broadcaster = Arc::new(EventBroadcaster::default());
        let recorder = Arc::new(RecordingRecalculator::default());
        let service = JobService::new(
            db_path.clone(),
            clock.clone(),
            Arc::clone(&broadcaster),
            MetricsTrigger::new(recorder.clone()),
        );

        Self {
            _dir: dir,
            db_path,
            clock,
            broadcaster,
            recorder,
            service,
        }
    }

    pub fn pool(&self) -> DbPool {
        DbPool::new(&self.db_path).expect("open db")
    }

    /// Another "process" on the same database with its own broadcaster.
    pub fn second_service(&self, broadcaster: Arc<EventBroadcaster>) -> JobService {
        JobService::new(
            self.db_path.clone(),
            self.clock.clone(),
            broadcaster,
            MetricsTrigger::disabled(),
        )
    }

    pub fn open_count_for_user(&self, user_id: i64) -> i64 {
        self.pool()
            .conn
            .query_row(
                "SELECT COUNT(*) FROM time_entries WHERE user_id = ?1 AND clock_out_time IS NULL",
                [user_id],
                |r| r.get(0),
            )
            .expect("count")
    }

    pub fn job_status(&self, job_id: i64) -> String {
        self.pool()
            .conn
            .query_row("SELECT status FROM jobs WHERE id = ?1", [job_id], |r| r.get(0))
            .expect("status")
    }

    /// Both storage invariants, checked over the whole database.
    pub fn assert_invariants(&self) {
        let pool = self.pool();
        let max_open: i64 = pool
            .conn
            .query_row(
                "SELECT COALESCE(MAX(n), 0) FROM (
                     SELECT COUNT(*) AS n FROM time_entries
                     WHERE clock_out_time IS NULL GROUP BY user_id)",
                [],
                |r| r.get(0),
            )
            .expect("max open");
        assert!(max_open <= 1, "a user holds {max_open} open entries");

        let mismatched: i64 = pool
            .conn
            .query_row(
                "SELECT COUNT(*) FROM jobs j
                 WHERE (j.status = 'completed') <>
                       (NOT EXISTS (SELECT 1 FROM time_entries e
                                    WHERE e.job_id = j.id AND e.clock_out_time IS NULL))",
                [],
                |r| r.get(0),
            )
            .expect("mismatch");
        assert_eq!(mismatched, 0, "job status disagrees with its open entries");
    }
}

/// Reference data shared by the library-level tests.
pub fn seed(db_path: &str) {
    let pool = DbPool::new(db_path).expect("open db");
    let conn = &pool.conn;
    init_db(conn).expect("migrate");

    for name in ["Alice", "Bob", "Cara", "Dan"] {
        insert_staff(conn, name).expect("staff");
    }
    insert_team(conn, "Blue", "#3366ff").expect("team");
    insert_team(conn, "Red", "#ff3333").expect("team");

    for user in [ALICE, BOB, CARA] {
        insert_membership(conn, user, TEAM_BLUE, day(2026, 1, 1)).expect("membership");
    }
    insert_membership(conn, DAN, TEAM_RED, day(2026, 1, 1)).expect("membership");

    let customers = [
        ("Standard Home", 150, false, None),
        ("Large Home", 220, false, None),
        ("Grandma", 80, true, Some(45)),
        ("Mansion", 999, false, None),
    ];
    for (name, price, ff, ff_minutes) in customers {
        insert_customer(
            conn,
            &NewCustomer {
                name,
                price,
                is_friends_family: ff,
                friends_family_minutes: ff_minutes,
            },
        )
        .expect("customer");
    }

    for (min, max, minutes) in [(100, 150, 90), (151, 200, 120), (201, 250, 150)] {
        insert_tier(
            conn,
            &PriceTier {
                price_min: min,
                price_max: max,
                allotted_minutes: minutes,
            },
        )
        .expect("tier");
    }
}
