//! `watch`: subscribe stdout to lifecycle events.
//!
//! Transitions made by other processes reach this one through the
//! reconciler, so the stream shows every job change in the shared database.

use crate::cli::commands::open_db;
use crate::cli::parser::{Cli, Commands};
use crate::config::Config;
use crate::core::broadcaster::{EventBroadcaster, SubscriberKey, WriterSink};
use crate::core::reconcile::Reconciler;
use crate::errors::AppResult;
use crate::utils::clock::system_clock;
use std::io;
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

const WATCH_TICK: Duration = Duration::from_millis(200);

/// Why a watch session ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WatchEnd {
    TimeUp,
    SubscribersGone,
}

/// Block until `limit` elapses or the broadcaster has no subscriber left.
pub fn wait_for_end(broadcaster: &EventBroadcaster, limit: Option<Duration>, tick: Duration) -> WatchEnd {
    let deadline = limit.map(|l| Instant::now() + l);
    loop {
        if broadcaster.subscriber_count() == 0 {
            return WatchEnd::SubscribersGone;
        }
        let nap = match deadline {
            Some(d) => {
                let left = d.saturating_duration_since(Instant::now());
                if left.is_zero() {
                    return WatchEnd::TimeUp;
                }
                left.min(tick)
            }
            None => tick,
        };
        thread::sleep(nap);
    }
}

pub fn handle(cli: &Cli, cfg: &Config) -> AppResult<()> {
    let Commands::Watch { session, for_secs } = &cli.command else {
        return Ok(());
    };
    drop(open_db(cfg)?);

    let broadcaster = Arc::new(EventBroadcaster::new(cfg.dedup_ttl(), cfg.dedup_capacity));
    broadcaster.subscribe(
        SubscriberKey::new(cli.user.unwrap_or(0), session.clone()),
        Box::new(WriterSink::new(io::stdout())),
    );

    let reconciler = Reconciler::new(&cfg.database, system_clock(), Arc::clone(&broadcaster))
        .with_window(cfg.broadcast_window())
        .with_busy_timeout(cfg.busy_timeout());

    // first pass right away so a late subscriber sees recent changes
    if let Err(e) = reconciler.poll_once() {
        tracing::warn!(error = %e, "initial reconciliation failed");
    }

    let handle = reconciler.spawn(cfg.poll_interval())?;
    tracing::info!(interval = ?cfg.poll_interval(), "watching for job changes");

    let end = wait_for_end(&broadcaster, for_secs.map(Duration::from_secs), WATCH_TICK);
    if end == WatchEnd::SubscribersGone {
        tracing::info!("output closed, stopping watch");
    }

    handle.stop();
    Ok(())
}
