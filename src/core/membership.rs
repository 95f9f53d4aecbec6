//! Temporal team membership ledger.
//!
//! A row covers day `D` when `start_date <= D AND (end_date IS NULL OR
//! end_date >= D)`. A user covered by rows of two different teams on the same
//! day is an integrity violation: queries that observe it fail instead of
//! choosing a team.

use crate::db::log::audit;
use crate::db::memberships::{close_open, insert_membership, team_rows_on, user_history, user_rows_on};
use crate::db::reference::{get_staff, get_team};
use crate::errors::{AppError, AppResult};
use crate::models::membership::TeamMembership;
use crate::utils::date::format_date;
use chrono::{Days, NaiveDate};
use rusqlite::Connection;
use std::collections::BTreeSet;

pub struct MembershipLedger<'c> {
    conn: &'c Connection,
}

impl<'c> MembershipLedger<'c> {
    pub fn new(conn: &'c Connection) -> Self {
        Self { conn }
    }

    /// Members of `team_id` on `today`.
    pub fn current_members(&self, team_id: i64, today: NaiveDate) -> AppResult<Vec<i64>> {
        self.members_at(team_id, today)
    }

    pub fn members_at(&self, team_id: i64, date: NaiveDate) -> AppResult<Vec<i64>> {
        let users: BTreeSet<i64> = team_rows_on(self.conn, team_id, date)?
            .into_iter()
            .map(|m| m.user_id)
            .collect();

        for user_id in &users {
            self.team_of(*user_id, date)?;
        }
        Ok(users.into_iter().collect())
    }

    pub fn is_current_member(&self, user_id: i64, team_id: i64, today: NaiveDate) -> AppResult<bool> {
        Ok(self.team_of(user_id, today)? == Some(team_id))
    }

    /// The single team covering `user_id` on `date`.
    pub fn team_of(&self, user_id: i64, date: NaiveDate) -> AppResult<Option<i64>> {
        let teams: BTreeSet<i64> = user_rows_on(self.conn, user_id, date)?
            .into_iter()
            .map(|m| m.team_id)
            .collect();

        if teams.len() > 1 {
            let detail = format!(
                "user {user_id} is a member of teams {:?} on {}",
                teams,
                format_date(date)
            );
            tracing::error!(user_id, date = %date, teams = ?teams, "overlapping team memberships");
            return Err(AppError::DataIntegrityViolation(detail));
        }
        Ok(teams.into_iter().next())
    }

    pub fn history(&self, user_id: i64) -> AppResult<Vec<TeamMembership>> {
        user_history(self.conn, user_id)
    }

    /// Move `user_id` into `team_id` from `start_date`. Any open membership
    /// is closed the day before, so the two rows never overlap.
    pub fn join(&self, user_id: i64, team_id: i64, start_date: NaiveDate) -> AppResult<i64> {
        if !get_staff(self.conn, user_id)?.is_some_and(|s| s.active) {
            return Err(AppError::InvalidReference(format!("staff member {user_id}")));
        }
        if !get_team(self.conn, team_id)?.is_some_and(|t| t.active) {
            return Err(AppError::InvalidReference(format!("team {team_id}")));
        }

        let history = user_history(self.conn, user_id)?;
        if history.iter().any(|m| m.start_date >= start_date) {
            return Err(AppError::MembershipConflict(format!(
                "user {user_id} already has a membership starting on or after {}",
                format_date(start_date)
            )));
        }
        if history
            .iter()
            .any(|m| m.team_id == team_id && m.end_date.is_none())
        {
            return Err(AppError::MembershipConflict(format!(
                "user {user_id} is already an active member of team {team_id}"
            )));
        }

        let tx = self.conn.unchecked_transaction()?;
        if let Some(day_before) = start_date.checked_sub_days(Days::new(1)) {
            close_open(&tx, user_id, None, day_before)?;
        }
        let id = insert_membership(&tx, user_id, team_id, start_date)?;
        audit(
            &tx,
            "team_join",
            &format!("user {user_id}"),
            &format!("Joined team {team_id} from {}", format_date(start_date)),
        )?;
        tx.commit()?;

        tracing::info!(user_id, team_id, start = %start_date, "team membership opened");
        Ok(id)
    }

    /// Close the open membership of `user_id` in `team_id` at `end_date`.
    pub fn leave(&self, user_id: i64, team_id: i64, end_date: NaiveDate) -> AppResult<()> {
        let tx = self.conn.unchecked_transaction()?;
        let closed = close_open(&tx, user_id, Some(team_id), end_date)?;
        if closed == 0 {
            return Err(AppError::NotTeamMember { user_id, team_id });
        }
        audit(
            &tx,
            "team_leave",
            &format!("user {user_id}"),
            &format!("Left team {team_id} on {}", format_date(end_date)),
        )?;
        tx.commit()?;

        tracing::info!(user_id, team_id, end = %end_date, "team membership closed");
        Ok(())
    }
}
