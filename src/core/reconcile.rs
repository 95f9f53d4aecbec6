//! Cross-process event reconciliation.
//!
//! Other processes write to the same database but publish only to their own
//! subscribers. This loop scans for time entries touched within a trailing
//! window and publishes `job_updated` for every job whose latest change is
//! newer than what this process already broadcast.

use crate::core::broadcaster::EventBroadcaster;
use crate::db::jobs::jobs_modified_since;
use crate::db::pool::{DEFAULT_BUSY_TIMEOUT, DbPool};
use crate::errors::AppResult;
use crate::models::event::{EventKind, LifecycleEvent};
use crate::utils::clock::SharedClock;
use chrono::TimeDelta;
use std::sync::Arc;
use std::sync::mpsc::{self, RecvTimeoutError, Sender};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(5);
pub const DEFAULT_WINDOW: Duration = Duration::from_secs(10);

pub struct Reconciler {
    db_path: String,
    busy_timeout: Duration,
    clock: SharedClock,
    broadcaster: Arc<EventBroadcaster>,
    window: Duration,
}

impl Reconciler {
    pub fn new(db_path: impl Into<String>, clock: SharedClock, broadcaster: Arc<EventBroadcaster>) -> Self {
        Self {
            db_path: db_path.into(),
            busy_timeout: DEFAULT_BUSY_TIMEOUT,
            clock,
            broadcaster,
            window: DEFAULT_WINDOW,
        }
    }

    pub fn with_window(mut self, window: Duration) -> Self {
        self.window = window;
        self
    }

    pub fn with_busy_timeout(mut self, timeout: Duration) -> Self {
        self.busy_timeout = timeout;
        self
    }

    /// One scan. Returns how many events were published.
    pub fn poll_once(&self) -> AppResult<usize> {
        self.poll_at(Instant::now())
    }

    /// Same as [`Reconciler::poll_once`] with an explicit monotonic instant
    /// for the dedup cache.
    pub fn poll_at(&self, now: Instant) -> AppResult<usize> {
        if self.broadcaster.subscriber_count() == 0 {
            return Ok(0);
        }

        let window = TimeDelta::from_std(self.window).unwrap_or(TimeDelta::seconds(10));
        let since = self.clock.utc() - window;

        let pool = DbPool::with_busy_timeout(&self.db_path, self.busy_timeout)?;
        let changes = jobs_modified_since(&pool.conn, since)?;

        let mut published = 0;
        for change in changes {
            let event = LifecycleEvent::new(
                EventKind::JobUpdated,
                change.job_id,
                change.open_members,
                change.completed,
                change.last_modified,
            );
            if self.broadcaster.publish_if_newer(&event, now).is_some() {
                published += 1;
            }
        }

        if published > 0 {
            tracing::debug!(published, "reconciled remote job changes");
        }
        Ok(published)
    }

    /// Run [`Reconciler::poll_once`] every `interval` on a dedicated thread
    /// until the handle is stopped or dropped.
    pub fn spawn(self, interval: Duration) -> std::io::Result<ReconcilerHandle> {
        let (stop_tx, stop_rx) = mpsc::channel::<()>();

        let join = thread::Builder::new()
            .name("reconciler".into())
            .spawn(move || {
                loop {
                    match stop_rx.recv_timeout(interval) {
                        Err(RecvTimeoutError::Timeout) => {
                            if let Err(e) = self.poll_once() {
                                tracing::warn!(error = %e, "reconciliation pass failed");
                            }
                        }
                        Ok(()) | Err(RecvTimeoutError::Disconnected) => break,
                    }
                }
                tracing::debug!("reconciler stopped");
            })?;

        Ok(ReconcilerHandle {
            stop: Some(stop_tx),
            join: Some(join),
        })
    }
}

pub struct ReconcilerHandle {
    stop: Option<Sender<()>>,
    join: Option<JoinHandle<()>>,
}

impl ReconcilerHandle {
    /// Stop the loop and wait for the thread to exit.
    pub fn stop(mut self) {
        self.shutdown();
    }

    fn shutdown(&mut self) {
        if let Some(stop) = self.stop.take() {
            let _ = stop.send(());
        }
        if let Some(join) = self.join.take()
            && join.join().is_err()
        {
            tracing::error!("reconciler thread panicked");
        }
    }
}

impl Drop for ReconcilerHandle {
    fn drop(&mut self) {
        self.shutdown();
    }
}
