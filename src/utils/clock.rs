//! Injectable wall clock.
//!
//! Business logic never calls `Local::now()` directly; it asks a
//! [`mockable::Clock`] so tests can pin "now" to a known instant.

use chrono::{DateTime, Local, TimeDelta, Utc};
use mockable::{Clock, DefaultClock};
use std::sync::{Arc, Mutex, MutexGuard};

pub type SharedClock = Arc<dyn Clock + Send + Sync>;

pub fn system_clock() -> SharedClock {
    Arc::new(DefaultClock)
}

/// A clock that only moves when told to.
#[derive(Debug)]
pub struct FixedClock(Mutex<DateTime<Utc>>);

impl FixedClock {
    pub fn new(now: DateTime<Local>) -> Self {
        Self(Mutex::new(now.with_timezone(&Utc)))
    }

    pub fn set(&self, now: DateTime<Local>) {
        *self.guard() = now.with_timezone(&Utc);
    }

    pub fn advance_minutes(&self, minutes: i64) {
        *self.guard() += TimeDelta::minutes(minutes);
    }

    fn guard(&self) -> MutexGuard<'_, DateTime<Utc>> {
        // a poisoned clock still holds a valid instant
        self.0.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl Clock for FixedClock {
    fn local(&self) -> DateTime<Local> {
        self.utc().with_timezone(&Local)
    }

    fn utc(&self) -> DateTime<Utc> {
        *self.guard()
    }
}
