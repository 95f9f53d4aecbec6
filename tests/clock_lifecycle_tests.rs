mod common;
use chrono::{Local, TimeZone, Timelike};
use common::{
    ALICE, BOB, CARA, CUSTOMER_FRIENDS, CUSTOMER_LARGE, CUSTOMER_STANDARD, DAN, Fixture, TEAM_BLUE, local,
};
use crewclock::core::lifecycle::{ClockInRequest, ClockOutRequest};
use crewclock::db::jobs::{get_entry, get_job, insert_open_entry};
use crewclock::db::reference::set_customer_active;
use crewclock::errors::AppError;
use crewclock::models::job::JobStatus;
use crewclock::utils::time::to_db_timestamp;
use mockable::Clock;
use rusqlite::params;
use std::sync::Barrier;
use std::thread;

fn clock_in(user_id: i64, customer_id: i64, member_ids: Vec<i64>) -> ClockInRequest {
    ClockInRequest {
        user_id,
        customer_id,
        team_id: TEAM_BLUE,
        member_ids,
    }
}

fn clock_out(user_id: i64) -> ClockOutRequest {
    ClockOutRequest {
        user_id,
        lunch_break: false,
        clock_out_all_members: false,
        selected_member_ids: vec![],
    }
}

#[test]
fn test_solo_job_start_to_finish() {
    let fx = Fixture::new("solo_job");

    let started = fx
        .service
        .clock_in(&clock_in(ALICE, CUSTOMER_STANDARD, vec![]))
        .expect("clock in");
    assert_eq!(started.members_clocked_in, 1);
    assert_eq!(started.allotted_minutes, 180);
    assert_eq!(fx.job_status(started.job_id), "in_progress");

    let active = fx.service.active_job(ALICE).expect("active").expect("has job");
    assert_eq!(active.job_id, started.job_id);
    assert_eq!(active.team_size, 1);
    assert_eq!(active.allotted_minutes, 180);
    assert_eq!(active.team_name.as_deref(), Some("Blue"));

    fx.clock.advance_minutes(120);
    let done = fx.service.clock_out(&clock_out(ALICE)).expect("clock out");
    assert_eq!(done.members_clocked_out(), 1);
    assert_eq!(done.remaining_open, 0);
    assert!(done.job_completed);
    assert!(!done.closed[0].lunch_break);
    assert!(!done.closed[0].auto_lunch_deducted);

    assert_eq!(fx.job_status(started.job_id), "completed");
    assert!(fx.service.active_job(ALICE).expect("active").is_none());

    let today = fx.service.completed_today(ALICE).expect("today");
    assert_eq!(today.len(), 1);
    assert_eq!(today[0].customer_name, "Standard Home");
    fx.assert_invariants();
}

#[test]
fn test_second_clock_in_is_rejected() {
    let fx = Fixture::new("double_clock_in");

    fx.service
        .clock_in(&clock_in(ALICE, CUSTOMER_STANDARD, vec![]))
        .expect("first");
    let err = fx
        .service
        .clock_in(&clock_in(ALICE, CUSTOMER_LARGE, vec![]))
        .unwrap_err();

    assert!(matches!(err, AppError::AlreadyClockedIn(ALICE)));
    assert_eq!(fx.open_count_for_user(ALICE), 1);
    let jobs: i64 = fx
        .pool()
        .conn
        .query_row("SELECT COUNT(*) FROM jobs", [], |r| r.get(0))
        .expect("count");
    assert_eq!(jobs, 1);
    fx.assert_invariants();
}

#[test]
fn test_partial_clock_out_keeps_job_running() {
    let fx = Fixture::new("partial_clock_out");

    let started = fx
        .service
        .clock_in(&clock_in(ALICE, CUSTOMER_STANDARD, vec![BOB]))
        .expect("clock in");
    assert_eq!(started.members_clocked_in, 2);
    assert_eq!(started.allotted_minutes, 90);

    fx.clock.advance_minutes(60);
    let first = fx.service.clock_out(&clock_out(ALICE)).expect("alice out");
    assert_eq!(first.members_clocked_out(), 1);
    assert_eq!(first.remaining_open, 1);
    assert!(!first.job_completed);
    assert_eq!(fx.job_status(started.job_id), "in_progress");
    assert!(fx.recorder.calls().is_empty());
    fx.assert_invariants();

    fx.clock.advance_minutes(30);
    let last = fx.service.clock_out(&clock_out(BOB)).expect("bob out");
    assert_eq!(last.remaining_open, 0);
    assert!(last.job_completed);
    assert_eq!(fx.job_status(started.job_id), "completed");

    fx.service.metrics().wait_idle();
    assert_eq!(fx.recorder.calls(), vec![CUSTOMER_STANDARD]);
    fx.assert_invariants();
}

#[test]
fn test_clock_out_all_members_completes_job_once() {
    let fx = Fixture::new("clock_out_all");

    let started = fx
        .service
        .clock_in(&clock_in(ALICE, CUSTOMER_LARGE, vec![BOB, CARA]))
        .expect("clock in");
    assert_eq!(started.allotted_minutes, 100);

    fx.clock.advance_minutes(100);
    let done = fx
        .service
        .clock_out(&ClockOutRequest {
            clock_out_all_members: true,
            ..clock_out(ALICE)
        })
        .expect("clock out all");
    assert_eq!(done.members_clocked_out(), 3);
    assert!(done.job_completed);

    let job = {
        let pool = fx.pool();
        get_job(&pool.conn, started.job_id).expect("query").expect("job")
    };
    assert_eq!(job.status, JobStatus::Completed);
    assert_eq!(job.completed_at, Some(fx.clock.local()));

    let err = fx.service.end_active(started.job_id).unwrap_err();
    assert!(matches!(err, AppError::JobNotActive(_)));

    fx.service.metrics().wait_idle();
    assert_eq!(fx.recorder.calls(), vec![CUSTOMER_LARGE]);
    fx.assert_invariants();
}

#[test]
fn test_selected_members_by_entry_id() {
    let fx = Fixture::new("selected_members");

    let started = fx
        .service
        .clock_in(&clock_in(ALICE, CUSTOMER_STANDARD, vec![BOB, CARA]))
        .expect("clock in");
    let bob_entry = started.entry_ids[1];

    fx.clock.advance_minutes(45);
    let out = fx
        .service
        .clock_out(&ClockOutRequest {
            selected_member_ids: vec![bob_entry, 9999],
            ..clock_out(ALICE)
        })
        .expect("clock out");

    let mut users: Vec<i64> = out.closed.iter().map(|c| c.user_id).collect();
    users.sort();
    assert_eq!(users, vec![ALICE, BOB]);
    assert_eq!(out.remaining_open, 1);
    assert!(!out.job_completed);
    assert_eq!(fx.open_count_for_user(CARA), 1);
    fx.assert_invariants();
}

#[test]
fn test_member_already_on_another_job_is_skipped() {
    let fx = Fixture::new("skip_busy_member");

    fx.service
        .clock_in(&clock_in(BOB, CUSTOMER_STANDARD, vec![]))
        .expect("bob");
    let started = fx
        .service
        .clock_in(&clock_in(ALICE, CUSTOMER_LARGE, vec![BOB, CARA]))
        .expect("alice");

    assert_eq!(started.members_clocked_in, 2);
    assert_eq!(started.skipped_members, vec![BOB]);
    assert_eq!(fx.open_count_for_user(BOB), 1);
    fx.assert_invariants();
}

#[test]
fn test_long_shift_gets_automatic_lunch() {
    let fx = Fixture::new("auto_lunch");

    let started = fx
        .service
        .clock_in(&clock_in(ALICE, CUSTOMER_STANDARD, vec![]))
        .expect("clock in");
    fx.clock.set(local(2026, 3, 10, 17, 0));

    let out = fx.service.clock_out(&clock_out(ALICE)).expect("clock out");
    assert!(out.closed[0].auto_lunch_deducted);
    assert!(out.closed[0].lunch_break);

    let pool = fx.pool();
    let entry = get_entry(&pool.conn, started.entry_ids[0]).expect("query").expect("entry");
    assert!(entry.lunch_break);
    assert!(entry.auto_lunch_deducted);
}

#[test]
fn test_requested_lunch_is_kept_without_auto_flag() {
    let fx = Fixture::new("requested_lunch");

    fx.service
        .clock_in(&clock_in(ALICE, CUSTOMER_STANDARD, vec![]))
        .expect("clock in");
    fx.clock.advance_minutes(90);

    let out = fx
        .service
        .clock_out(&ClockOutRequest {
            lunch_break: true,
            ..clock_out(ALICE)
        })
        .expect("clock out");
    assert!(out.closed[0].lunch_break);
    assert!(!out.closed[0].auto_lunch_deducted);
}

#[test]
fn test_clock_out_without_open_entry() {
    let fx = Fixture::new("clock_out_idle");
    let err = fx.service.clock_out(&clock_out(ALICE)).unwrap_err();
    assert!(matches!(err, AppError::NoActiveEntry(ALICE)));
}

#[test]
fn test_invalid_references_are_rejected() {
    let fx = Fixture::new("invalid_refs");

    let err = fx.service.clock_in(&clock_in(ALICE, 42, vec![])).unwrap_err();
    assert!(matches!(err, AppError::InvalidReference(_)));

    let err = fx
        .service
        .clock_in(&ClockInRequest {
            team_id: 42,
            ..clock_in(ALICE, CUSTOMER_STANDARD, vec![])
        })
        .unwrap_err();
    assert!(matches!(err, AppError::InvalidReference(_)));

    let err = fx
        .service
        .clock_in(&clock_in(ALICE, CUSTOMER_STANDARD, vec![77]))
        .unwrap_err();
    assert!(matches!(err, AppError::InvalidReference(_)));

    {
        let pool = fx.pool();
        set_customer_active(&pool.conn, CUSTOMER_LARGE, false).expect("deactivate");
    }
    let err = fx.service.clock_in(&clock_in(ALICE, CUSTOMER_LARGE, vec![])).unwrap_err();
    assert!(matches!(err, AppError::InvalidReference(_)));

    // Dan belongs to the red team
    let err = fx.service.clock_in(&clock_in(DAN, CUSTOMER_STANDARD, vec![])).unwrap_err();
    assert!(matches!(err, AppError::NotTeamMember { user_id: DAN, .. }));

    assert_eq!(fx.open_count_for_user(ALICE), 0);
    fx.assert_invariants();
}

#[test]
fn test_friends_and_family_allotment_ignores_team_size() {
    let fx = Fixture::new("friends_family");
    let started = fx
        .service
        .clock_in(&clock_in(ALICE, CUSTOMER_FRIENDS, vec![BOB, CARA]))
        .expect("clock in");
    assert_eq!(started.allotted_minutes, 45);
}

#[test]
fn test_end_active_closes_every_member() {
    let fx = Fixture::new("end_active");

    let started = fx
        .service
        .clock_in(&clock_in(ALICE, CUSTOMER_STANDARD, vec![BOB]))
        .expect("clock in");
    fx.clock.advance_minutes(30);

    let out = fx.service.end_active(started.job_id).expect("end active");
    assert_eq!(out.members_clocked_out(), 2);
    assert!(out.job_completed);
    assert_eq!(fx.job_status(started.job_id), "completed");

    let err = fx.service.end_active(4242).unwrap_err();
    assert!(matches!(err, AppError::InvalidReference(_)));

    fx.service.metrics().wait_idle();
    assert_eq!(fx.recorder.calls(), vec![CUSTOMER_STANDARD]);
    fx.assert_invariants();
}

#[test]
fn test_timestamps_survive_storage_exactly() {
    let fx = Fixture::new("timestamp_roundtrip");
    let precise = local(2026, 3, 10, 8, 0)
        .with_nanosecond(123_456_789)
        .expect("nanos");
    fx.clock.set(precise);

    let started = fx
        .service
        .clock_in(&clock_in(ALICE, CUSTOMER_STANDARD, vec![]))
        .expect("clock in");

    let out_at = Local
        .timestamp_opt(precise.timestamp() + 3_723, 987_654_321)
        .single()
        .expect("out instant");
    fx.clock.set(out_at);
    fx.service.clock_out(&clock_out(ALICE)).expect("clock out");

    let pool = fx.pool();
    let entry = get_entry(&pool.conn, started.entry_ids[0]).expect("query").expect("entry");
    assert_eq!(entry.clock_in_time, precise);
    assert_eq!(entry.clock_out_time, Some(out_at));
}

#[test]
fn test_concurrent_clock_in_admits_exactly_one() {
    let fx = Fixture::new("concurrent_clock_in");
    let barrier = Barrier::new(2);

    let results: Vec<_> = thread::scope(|s| {
        let handles: Vec<_> = [CUSTOMER_STANDARD, CUSTOMER_LARGE]
            .into_iter()
            .map(|customer| {
                let (service, barrier) = (&fx.service, &barrier);
                s.spawn(move || {
                    barrier.wait();
                    service.clock_in(&clock_in(ALICE, customer, vec![]))
                })
            })
            .collect();
        handles
            .into_iter()
            .map(|h| h.join().expect("thread"))
            .collect()
    });

    let ok = results.iter().filter(|r| r.is_ok()).count();
    let rejected = results
        .iter()
        .filter(|r| matches!(r, Err(AppError::AlreadyClockedIn(ALICE))))
        .count();
    assert_eq!((ok, rejected), (1, 1));
    assert_eq!(fx.open_count_for_user(ALICE), 1);
    fx.assert_invariants();
}

#[test]
fn test_concurrent_clock_outs_complete_job_once() {
    let fx = Fixture::new("concurrent_clock_out");
    fx.service
        .clock_in(&clock_in(ALICE, CUSTOMER_STANDARD, vec![BOB]))
        .expect("clock in");
    fx.clock.advance_minutes(60);

    let barrier = Barrier::new(2);
    let results: Vec<_> = thread::scope(|s| {
        let handles: Vec<_> = [ALICE, BOB]
            .into_iter()
            .map(|user| {
                let (service, barrier) = (&fx.service, &barrier);
                s.spawn(move || {
                    barrier.wait();
                    service.clock_out(&clock_out(user))
                })
            })
            .collect();
        handles
            .into_iter()
            .map(|h| h.join().expect("thread"))
            .collect()
    });

    let outcomes: Vec<_> = results.into_iter().map(|r| r.expect("clock out")).collect();
    assert_eq!(outcomes.iter().filter(|o| o.job_completed).count(), 1);

    fx.service.metrics().wait_idle();
    assert_eq!(fx.recorder.calls(), vec![CUSTOMER_STANDARD]);
    fx.assert_invariants();
}

#[test]
fn test_storage_refuses_a_second_open_entry() {
    let fx = Fixture::new("single_open_index");
    let started = fx
        .service
        .clock_in(&clock_in(ALICE, CUSTOMER_STANDARD, vec![]))
        .expect("clock in");

    // a writer that skipped the lifecycle checks, on its own connection
    let pool = fx.pool();
    let now = fx.clock.local();
    let again = insert_open_entry(&pool.conn, ALICE, started.job_id, &now).expect("insert");
    assert_eq!(again, None);

    let err = pool
        .conn
        .execute(
            "INSERT INTO time_entries (user_id, job_id, clock_in_time, updated_at)
             VALUES (?1, ?2, ?3, ?3)",
            params![ALICE, started.job_id, to_db_timestamp(&now)],
        )
        .unwrap_err();
    assert!(AppError::is_unique_violation(&err), "unexpected error: {err}");

    // closed entries do not count against the index
    let bob = insert_open_entry(&pool.conn, BOB, started.job_id, &now).expect("insert");
    assert!(bob.is_some());
    assert_eq!(fx.open_count_for_user(ALICE), 1);
    fx.assert_invariants();
}

#[test]
fn test_orphaned_rows_surface_as_integrity_violations() {
    let fx = Fixture::new("orphaned_rows");
    let started = fx
        .service
        .clock_in(&clock_in(ALICE, CUSTOMER_STANDARD, vec![]))
        .expect("clock in");

    let pool = fx.pool();
    pool.conn
        .execute_batch("PRAGMA foreign_keys = OFF;")
        .expect("disable foreign keys");

    pool.conn
        .execute("DELETE FROM customers WHERE id = ?1", [CUSTOMER_STANDARD])
        .expect("delete customer");
    let err = fx.service.active_job(ALICE).unwrap_err();
    assert!(matches!(err, AppError::DataIntegrityViolation(_)), "got {err:?}");

    pool.conn
        .execute("DELETE FROM jobs WHERE id = ?1", [started.job_id])
        .expect("delete job");
    let err = fx.service.active_job(ALICE).unwrap_err();
    assert!(matches!(err, AppError::DataIntegrityViolation(_)), "got {err:?}");
}
