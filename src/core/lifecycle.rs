//! Job and time-entry state machine.
//!
//! Per user: IDLE (no open entry) <-> CLOCKED_IN (exactly one open entry).
//! Per job: IN_PROGRESS (at least one open entry) -> COMPLETED (none left).
//!
//! Each operation opens its own connection and runs in one IMMEDIATE
//! transaction. The single-open-entry rule is enforced by a partial unique
//! index, so a concurrent clock-in that slips past the read check still fails
//! with `AlreadyClockedIn`. Events and the metrics trigger fire only after
//! commit.

use crate::core::allotment::AllotmentCalculator;
use crate::core::broadcaster::EventBroadcaster;
use crate::core::lunch::should_auto_deduct_lunch;
use crate::core::membership::MembershipLedger;
use crate::core::metrics::MetricsTrigger;
use crate::db::jobs::{
    close_entry, complete_job, completed_between, count_open_for_job, count_user_entries_between,
    get_job, insert_job, insert_open_entry, open_entries_for_job, open_entry_for_user, open_members,
};
use crate::db::log::audit;
use crate::db::pool::{DEFAULT_BUSY_TIMEOUT, DbPool};
use crate::db::reference::{get_customer, get_staff, get_team};
use crate::db::settings::load_lunch_settings;
use crate::errors::{AppError, AppResult};
use crate::models::event::{EventKind, LifecycleEvent};
use crate::models::job::Job;
use crate::models::projection::{ActiveJob, CompletedEntry};
use crate::models::reference::Customer;
use crate::models::time_entry::TimeEntry;
use crate::utils::clock::SharedClock;
use crate::utils::date::local_days_bounds;
use chrono::{DateTime, Local, Utc};
use rusqlite::Connection;
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;

#[derive(Debug, Clone)]
pub struct ClockInRequest {
    pub user_id: i64,
    pub customer_id: i64,
    pub team_id: i64,
    /// Staff ids to clock in alongside the requester.
    pub member_ids: Vec<i64>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ClockInOutcome {
    pub job_id: i64,
    pub entry_ids: Vec<i64>,
    pub members_clocked_in: usize,
    /// Members that already held an open entry and were left alone.
    pub skipped_members: Vec<i64>,
    pub allotted_minutes: i64,
}

#[derive(Debug, Clone)]
pub struct ClockOutRequest {
    pub user_id: i64,
    pub lunch_break: bool,
    pub clock_out_all_members: bool,
    /// Time-entry ids of the job's open entries to close. The requester's
    /// own entry is always included.
    pub selected_member_ids: Vec<i64>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ClosedEntry {
    pub entry_id: i64,
    pub user_id: i64,
    pub lunch_break: bool,
    pub auto_lunch_deducted: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct ClockOutOutcome {
    pub job_id: i64,
    pub closed: Vec<ClosedEntry>,
    pub remaining_open: i64,
    pub job_completed: bool,
}

impl ClockOutOutcome {
    pub fn members_clocked_out(&self) -> usize {
        self.closed.len()
    }
}

struct CloseResult {
    outcome: ClockOutOutcome,
    customer_id: i64,
    completed_now: bool,
}

pub struct JobService {
    db_path: String,
    busy_timeout: Duration,
    clock: SharedClock,
    broadcaster: Arc<EventBroadcaster>,
    metrics: MetricsTrigger,
}

impl JobService {
    pub fn new(
        db_path: impl Into<String>,
        clock: SharedClock,
        broadcaster: Arc<EventBroadcaster>,
        metrics: MetricsTrigger,
    ) -> Self {
        Self {
            db_path: db_path.into(),
            busy_timeout: DEFAULT_BUSY_TIMEOUT,
            clock,
            broadcaster,
            metrics,
        }
    }

    pub fn with_busy_timeout(mut self, timeout: Duration) -> Self {
        self.busy_timeout = timeout;
        self
    }

    pub fn broadcaster(&self) -> &Arc<EventBroadcaster> {
        &self.broadcaster
    }

    pub fn metrics(&self) -> &MetricsTrigger {
        &self.metrics
    }

    fn open(&self) -> AppResult<DbPool> {
        DbPool::with_busy_timeout(&self.db_path, self.busy_timeout)
    }

    pub fn clock_in(&self, req: &ClockInRequest) -> AppResult<ClockInOutcome> {
        let mut pool = self.open()?;
        let now = self.clock.local();
        let tx = pool.immediate()?;

        if open_entry_for_user(&tx, req.user_id)?.is_some() {
            return Err(AppError::AlreadyClockedIn(req.user_id));
        }

        let customer = get_customer(&tx, req.customer_id)?
            .filter(|c| c.active)
            .ok_or_else(|| AppError::InvalidReference(format!("customer {}", req.customer_id)))?;
        if !get_team(&tx, req.team_id)?.is_some_and(|t| t.active) {
            return Err(AppError::InvalidReference(format!("team {}", req.team_id)));
        }

        let members = member_set(req.user_id, &req.member_ids);
        for &member in &members {
            if !get_staff(&tx, member)?.is_some_and(|s| s.active) {
                return Err(AppError::InvalidReference(format!("staff member {member}")));
            }
        }

        if !MembershipLedger::new(&tx).is_current_member(req.user_id, req.team_id, now.date_naive())? {
            return Err(AppError::NotTeamMember {
                user_id: req.user_id,
                team_id: req.team_id,
            });
        }

        let job_id = insert_job(&tx, customer.id, req.team_id, &now)?;

        let mut entry_ids = Vec::with_capacity(members.len());
        let mut skipped = Vec::new();
        for &member in &members {
            match insert_open_entry(&tx, member, job_id, &now)? {
                Some(id) => entry_ids.push(id),
                None if member == req.user_id => {
                    return Err(AppError::AlreadyClockedIn(req.user_id));
                }
                None => {
                    tracing::info!(job_id, member, "member already clocked in elsewhere, skipped");
                    skipped.push(member);
                }
            }
        }

        let allotted = AllotmentCalculator::load(&tx)?.for_customer(&customer, entry_ids.len());

        audit(
            &tx,
            "clock_in",
            &format!("job {job_id}"),
            &format!(
                "User {} clocked in {} member(s) at customer {}",
                req.user_id,
                entry_ids.len(),
                customer.id
            ),
        )?;
        tx.commit()?;

        tracing::info!(
            user_id = req.user_id,
            job_id,
            members = entry_ids.len(),
            allotted,
            "job started"
        );

        self.broadcaster.publish(&LifecycleEvent::new(
            EventKind::StaffClockedIn,
            job_id,
            entry_ids.len(),
            false,
            now.with_timezone(&Utc),
        ));

        Ok(ClockInOutcome {
            job_id,
            members_clocked_in: entry_ids.len(),
            entry_ids,
            skipped_members: skipped,
            allotted_minutes: allotted,
        })
    }

    pub fn clock_out(&self, req: &ClockOutRequest) -> AppResult<ClockOutOutcome> {
        let mut pool = self.open()?;
        let now = self.clock.local();
        let tx = pool.immediate()?;

        let own = open_entry_for_user(&tx, req.user_id)?
            .ok_or(AppError::NoActiveEntry(req.user_id))?;

        let open = open_entries_for_job(&tx, own.job_id)?;
        let targets: Vec<TimeEntry> = if req.clock_out_all_members {
            open
        } else {
            open.into_iter()
                .filter(|e| e.id == own.id || req.selected_member_ids.contains(&e.id))
                .collect()
        };

        let result = close_entries(&tx, own.job_id, &targets, req.lunch_break, &now)?;
        audit(
            &tx,
            "clock_out",
            &format!("job {}", own.job_id),
            &format!(
                "User {} clocked out {} member(s), {} still open",
                req.user_id,
                result.outcome.closed.len(),
                result.outcome.remaining_open
            ),
        )?;
        tx.commit()?;

        Ok(self.after_close(result, now))
    }

    /// Admin action: close every open entry of a job and complete it.
    pub fn end_active(&self, job_id: i64) -> AppResult<ClockOutOutcome> {
        let mut pool = self.open()?;
        let now = self.clock.local();
        let tx = pool.immediate()?;

        if get_job(&tx, job_id)?.is_none() {
            return Err(AppError::InvalidReference(format!("job {job_id}")));
        }
        let open = open_entries_for_job(&tx, job_id)?;
        if open.is_empty() {
            return Err(AppError::JobNotActive(job_id));
        }

        let result = close_entries(&tx, job_id, &open, false, &now)?;
        audit(
            &tx,
            "end_active",
            &format!("job {job_id}"),
            &format!("Ended job with {} open member(s)", result.outcome.closed.len()),
        )?;
        tx.commit()?;

        Ok(self.after_close(result, now))
    }

    fn after_close(&self, result: CloseResult, now: DateTime<Local>) -> ClockOutOutcome {
        let CloseResult {
            outcome,
            customer_id,
            completed_now,
        } = result;

        tracing::info!(
            job_id = outcome.job_id,
            closed = outcome.closed.len(),
            remaining = outcome.remaining_open,
            completed = outcome.job_completed,
            "members clocked out"
        );

        if completed_now {
            self.metrics.fire(customer_id);
        }

        self.broadcaster.publish(&LifecycleEvent::new(
            EventKind::StaffClockedOut,
            outcome.job_id,
            outcome.closed.len(),
            outcome.job_completed,
            now.with_timezone(&Utc),
        ));

        outcome
    }

    /// The requester's in-progress job, or `None` when idle.
    pub fn active_job(&self, user_id: i64) -> AppResult<Option<ActiveJob>> {
        let pool = self.open()?;
        let conn = &pool.conn;

        let Some(own) = open_entry_for_user(conn, user_id)? else {
            return Ok(None);
        };
        let job = existing_job(conn, own.job_id)?;
        let customer = job_customer(conn, &job)?;
        let team = get_team(conn, job.team_id)?;
        let members = open_members(conn, job.id)?;

        let allotted = AllotmentCalculator::load(conn)?.for_customer(&customer, members.len());
        let started_at = members
            .iter()
            .map(|m| m.clock_in_time)
            .min()
            .unwrap_or(job.created_at);

        Ok(Some(ActiveJob {
            job_id: job.id,
            customer_id: customer.id,
            customer_name: customer.name,
            customer_price: customer.price,
            team_name: team.as_ref().map(|t| t.name.clone()),
            team_color: team.map(|t| t.color_hex),
            started_at,
            team_size: members.len(),
            allotted_minutes: allotted,
            members,
        }))
    }

    /// The requester's closed entries that started today, newest first.
    pub fn completed_today(&self, user_id: i64) -> AppResult<Vec<CompletedEntry>> {
        let pool = self.open()?;
        let today = self.clock.local().date_naive();
        let (from, to) = local_days_bounds(today, today);
        completed_between(&pool.conn, user_id, from, to)
    }
}

/// Requester first, then the other members in request order, without repeats.
fn member_set(user_id: i64, member_ids: &[i64]) -> Vec<i64> {
    let mut out = vec![user_id];
    for &id in member_ids {
        if !out.contains(&id) {
            out.push(id);
        }
    }
    out
}

fn close_entries(
    conn: &Connection,
    job_id: i64,
    targets: &[TimeEntry],
    requested_lunch: bool,
    now: &DateTime<Local>,
) -> AppResult<CloseResult> {
    let settings = load_lunch_settings(conn)?;

    let mut closed = Vec::with_capacity(targets.len());
    for entry in targets {
        let day = entry.clock_in_time.date_naive();
        let (from, to) = local_days_bounds(day, day);
        let jobs_today = count_user_entries_between(conn, entry.user_id, from, to)?;
        let jobs_today = u32::try_from(jobs_today).unwrap_or(u32::MAX);

        let auto = should_auto_deduct_lunch(entry.clock_in_time, *now, jobs_today, &settings);
        let lunch_break = requested_lunch || auto;

        if close_entry(conn, entry.id, now, lunch_break, auto)? == 1 {
            closed.push(ClosedEntry {
                entry_id: entry.id,
                user_id: entry.user_id,
                lunch_break,
                auto_lunch_deducted: auto,
            });
        }
    }

    // Re-read inside the transaction: another request may have closed
    // entries of this job since `targets` was loaded.
    let remaining_open = count_open_for_job(conn, job_id)?;
    let completed_now = remaining_open == 0 && complete_job(conn, job_id, now)? == 1;

    let job = existing_job(conn, job_id)?;
    if completed_now {
        audit(
            conn,
            "job_completed",
            &format!("job {job_id}"),
            &format!("Job for customer {} completed", job.customer_id),
        )?;
    }

    Ok(CloseResult {
        outcome: ClockOutOutcome {
            job_id,
            closed,
            remaining_open,
            job_completed: remaining_open == 0,
        },
        customer_id: job.customer_id,
        completed_now,
    })
}

fn existing_job(conn: &Connection, job_id: i64) -> AppResult<Job> {
    get_job(conn, job_id)?.ok_or_else(|| {
        tracing::error!(job_id, "time entry references a missing job");
        AppError::DataIntegrityViolation(format!("time entry references missing job {job_id}"))
    })
}

fn job_customer(conn: &Connection, job: &Job) -> AppResult<Customer> {
    get_customer(conn, job.customer_id)?.ok_or_else(|| {
        tracing::error!(job_id = job.id, customer_id = job.customer_id, "job references a missing customer");
        AppError::DataIntegrityViolation(format!(
            "job {} references missing customer {}",
            job.id, job.customer_id
        ))
    })
}
