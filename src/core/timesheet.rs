//! Timesheet projection: one row per staff member and local day.
//!
//! Stored lunch flags are shown as persisted; a manual override only moves
//! the displayed net figure.

use crate::core::lunch::{displayed_lunch, displayed_net_minutes};
use crate::db::jobs::entries_between;
use crate::db::lunch::overrides_between;
use crate::db::settings::load_lunch_settings;
use crate::errors::AppResult;
use crate::models::lunch::LunchBreakOverride;
use crate::models::projection::TimesheetDay;
use crate::utils::date::local_days_bounds;
use chrono::NaiveDate;
use rusqlite::Connection;
use std::collections::{BTreeMap, HashMap};

pub fn build_timesheet(
    conn: &Connection,
    from: NaiveDate,
    to: NaiveDate,
    user_id: Option<i64>,
) -> AppResult<Vec<TimesheetDay>> {
    let settings = load_lunch_settings(conn)?;
    let (start, end) = local_days_bounds(from, to);

    let overrides: HashMap<(i64, NaiveDate), LunchBreakOverride> =
        overrides_between(conn, user_id, from, to)?
            .into_iter()
            .map(|o| ((o.user_id, o.date), o))
            .collect();

    let mut days: BTreeMap<(i64, NaiveDate), TimesheetDay> = BTreeMap::new();

    for (entry, staff_name) in entries_between(conn, user_id, start, end)? {
        let date = entry.clock_in_time.date_naive();
        let day = days
            .entry((entry.user_id, date))
            .or_insert_with(|| TimesheetDay {
                user_id: entry.user_id,
                staff_name,
                date,
                first_clock_in: entry.clock_in_time,
                last_clock_out: None,
                jobs: 0,
                worked_minutes: 0,
                stored_lunch: false,
                override_lunch: None,
                displayed_lunch: false,
                net_minutes: 0,
            });

        day.jobs += 1;
        day.first_clock_in = day.first_clock_in.min(entry.clock_in_time);
        if let Some(out) = entry.clock_out_time {
            day.last_clock_out = Some(day.last_clock_out.map_or(out, |prev| prev.max(out)));
        }
        day.worked_minutes += entry.worked().num_minutes();
        day.stored_lunch |= entry.lunch_break;
    }

    let mut out = Vec::with_capacity(days.len());
    for ((user, date), mut day) in days {
        let ov = overrides.get(&(user, date));
        let stored_net = if day.stored_lunch {
            day.worked_minutes - settings.duration_minutes
        } else {
            day.worked_minutes
        };

        day.override_lunch = ov.map(|o| o.has_lunch_break);
        day.displayed_lunch = displayed_lunch(day.stored_lunch, ov);
        day.net_minutes = displayed_net_minutes(stored_net, day.stored_lunch, ov, &settings);
        out.push(day);
    }
    Ok(out)
}
