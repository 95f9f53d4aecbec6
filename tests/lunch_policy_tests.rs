mod common;
use chrono::NaiveTime;
use common::{ALICE, BOB, CUSTOMER_STANDARD, Fixture, TEAM_BLUE, day, local};
use crewclock::core::lifecycle::{ClockInRequest, ClockOutRequest};
use crewclock::core::lunch::{
    clear_override, displayed_lunch, displayed_net_minutes, set_override, should_auto_deduct_lunch,
};
use crewclock::core::timesheet::build_timesheet;
use crewclock::db::lunch::get_override;
use crewclock::db::settings::{LUNCH_MIN_JOBS, LUNCH_START_TIME, load_lunch_settings, set_setting};
use crewclock::errors::AppError;
use crewclock::models::lunch::{LunchBreakOverride, LunchBreakSettings};

fn settings() -> LunchBreakSettings {
    LunchBreakSettings::default()
}

#[test]
fn test_long_shift_spanning_window_deducts() {
    let s = settings();
    assert!(should_auto_deduct_lunch(
        local(2026, 3, 10, 8, 0),
        local(2026, 3, 10, 17, 30),
        1,
        &s
    ));
}

#[test]
fn test_boundaries_are_inclusive() {
    let s = settings();
    // 09:00 -> 17:00 is exactly eight hours and touches both boundaries
    assert!(should_auto_deduct_lunch(
        local(2026, 3, 10, 9, 0),
        local(2026, 3, 10, 17, 0),
        1,
        &s
    ));
    assert!(!should_auto_deduct_lunch(
        local(2026, 3, 10, 9, 1),
        local(2026, 3, 10, 17, 30),
        1,
        &s
    ));
    assert!(!should_auto_deduct_lunch(
        local(2026, 3, 10, 8, 0),
        local(2026, 3, 10, 16, 59),
        1,
        &s
    ));
}

#[test]
fn test_minimum_hours_boundary() {
    let s = LunchBreakSettings {
        start_time: NaiveTime::from_hms_opt(12, 0, 0).expect("time"),
        finish_time: NaiveTime::from_hms_opt(13, 0, 0).expect("time"),
        ..settings()
    };
    // exactly five hours
    assert!(should_auto_deduct_lunch(
        local(2026, 3, 10, 9, 0),
        local(2026, 3, 10, 14, 0),
        1,
        &s
    ));
    assert!(!should_auto_deduct_lunch(
        local(2026, 3, 10, 9, 0),
        local(2026, 3, 10, 13, 59),
        1,
        &s
    ));
}

#[test]
fn test_minimum_jobs() {
    let s = LunchBreakSettings {
        min_jobs: 2,
        ..settings()
    };
    let (cin, cout) = (local(2026, 3, 10, 8, 0), local(2026, 3, 10, 17, 30));
    assert!(!should_auto_deduct_lunch(cin, cout, 1, &s));
    assert!(should_auto_deduct_lunch(cin, cout, 2, &s));
}

#[test]
fn test_short_shift_never_deducts() {
    let s = settings();
    assert!(!should_auto_deduct_lunch(
        local(2026, 3, 10, 8, 0),
        local(2026, 3, 10, 10, 0),
        3,
        &s
    ));
}

#[test]
fn test_override_moves_only_displayed_net() {
    let s = settings();
    let on = LunchBreakOverride {
        user_id: ALICE,
        date: day(2026, 3, 10),
        has_lunch_break: true,
    };
    let off = LunchBreakOverride {
        has_lunch_break: false,
        ..on
    };

    assert!(displayed_lunch(false, Some(&on)));
    assert!(!displayed_lunch(true, Some(&off)));
    assert!(displayed_lunch(true, None));

    assert_eq!(displayed_net_minutes(480, false, Some(&on), &s), 450);
    assert_eq!(displayed_net_minutes(450, true, Some(&off), &s), 480);
    assert_eq!(displayed_net_minutes(450, true, Some(&on), &s), 450);
    assert_eq!(displayed_net_minutes(480, false, None, &s), 480);
}

#[test]
fn test_settings_are_read_from_database() {
    let fx = Fixture::new("lunch_settings");
    let pool = fx.pool();

    set_setting(&pool.conn, LUNCH_MIN_JOBS, "3").expect("set");
    set_setting(&pool.conn, LUNCH_START_TIME, "11:30").expect("set");

    let s = load_lunch_settings(&pool.conn).expect("load");
    assert_eq!(s.min_jobs, 3);
    assert_eq!(s.start_time, NaiveTime::from_hms_opt(11, 30, 0).expect("time"));
    assert_eq!(s.duration_minutes, 30);

    let err = set_setting(&pool.conn, LUNCH_START_TIME, "noon").unwrap_err();
    assert!(matches!(err, AppError::InvalidSetting { .. }));
    let err = set_setting(&pool.conn, "lunch_colour", "red").unwrap_err();
    assert!(matches!(err, AppError::InvalidSetting { .. }));
}

#[test]
fn test_clock_out_applies_rule_and_timesheet_honours_override() {
    let fx = Fixture::new("lunch_timesheet");

    fx.service
        .clock_in(&ClockInRequest {
            user_id: ALICE,
            customer_id: CUSTOMER_STANDARD,
            team_id: TEAM_BLUE,
            member_ids: vec![BOB],
        })
        .expect("clock in");

    fx.clock.set(local(2026, 3, 10, 17, 0));
    let out = fx
        .service
        .clock_out(&ClockOutRequest {
            user_id: ALICE,
            lunch_break: false,
            clock_out_all_members: true,
            selected_member_ids: vec![],
        })
        .expect("clock out");
    assert!(out.closed.iter().all(|c| c.auto_lunch_deducted && c.lunch_break));

    let pool = fx.pool();
    let date = day(2026, 3, 10);
    let sheet = build_timesheet(&pool.conn, date, date, Some(ALICE)).expect("timesheet");
    assert_eq!(sheet.len(), 1);
    assert_eq!(sheet[0].worked_minutes, 540);
    assert!(sheet[0].displayed_lunch);
    assert_eq!(sheet[0].net_minutes, 510);

    set_override(
        &pool.conn,
        &LunchBreakOverride {
            user_id: ALICE,
            date,
            has_lunch_break: false,
        },
    )
    .expect("override");

    let sheet = build_timesheet(&pool.conn, date, date, None).expect("timesheet");
    let alice = sheet.iter().find(|d| d.user_id == ALICE).expect("alice row");
    let bob = sheet.iter().find(|d| d.user_id == BOB).expect("bob row");
    assert!(alice.stored_lunch);
    assert_eq!(alice.override_lunch, Some(false));
    assert!(!alice.displayed_lunch);
    assert_eq!(alice.net_minutes, 540);
    assert_eq!(bob.net_minutes, 510);

    // stored entries are untouched
    let stored: i64 = pool
        .conn
        .query_row(
            "SELECT COUNT(*) FROM time_entries WHERE user_id = ?1 AND lunch_break = 1",
            [ALICE],
            |r| r.get(0),
        )
        .expect("count");
    assert_eq!(stored, 1);

    assert!(clear_override(&pool.conn, ALICE, date).expect("clear"));
    assert!(!clear_override(&pool.conn, ALICE, date).expect("clear again"));
    assert!(get_override(&pool.conn, ALICE, date).expect("get").is_none());
}

#[test]
fn test_override_for_unknown_staff_is_rejected() {
    let fx = Fixture::new("lunch_unknown_staff");
    let pool = fx.pool();

    let err = set_override(
        &pool.conn,
        &LunchBreakOverride {
            user_id: 99,
            date: day(2026, 3, 10),
            has_lunch_break: true,
        },
    )
    .unwrap_err();
    assert!(matches!(err, AppError::InvalidReference(_)));
}
