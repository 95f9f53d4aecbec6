//! Process-local fan-out of lifecycle events to dashboard subscribers.
//!
//! Delivery is best effort. A sink that fails is dropped from the registry;
//! the failure is logged and never reaches the operation that published.

use crate::core::dedup::DedupCache;
use crate::errors::{AppError, AppResult};
use crate::models::event::LifecycleEvent;
use dashmap::DashMap;
use std::io::Write;
use std::sync::mpsc::Sender;
use std::sync::{Mutex, MutexGuard};
use std::time::{Duration, Instant};

pub const DEFAULT_DEDUP_TTL: Duration = Duration::from_secs(30);
pub const DEFAULT_DEDUP_CAPACITY: usize = 1024;

pub trait EventSink: Send + Sync {
    fn deliver(&self, event: &LifecycleEvent) -> AppResult<()>;
}

/// In-memory subscriber; fails once the receiving side is gone.
pub struct ChannelSink(pub Sender<LifecycleEvent>);

impl EventSink for ChannelSink {
    fn deliver(&self, event: &LifecycleEvent) -> AppResult<()> {
        self.0
            .send(event.clone())
            .map_err(|_| AppError::Other("subscriber channel closed".into()))
    }
}

/// Writes one JSON object per line and flushes after each event.
pub struct WriterSink<W: Write + Send>(Mutex<W>);

impl<W: Write + Send> WriterSink<W> {
    pub fn new(writer: W) -> Self {
        Self(Mutex::new(writer))
    }
}

impl<W: Write + Send> EventSink for WriterSink<W> {
    fn deliver(&self, event: &LifecycleEvent) -> AppResult<()> {
        let line = event.to_json_line()?;
        let mut w = self.0.lock().unwrap_or_else(|p| p.into_inner());
        writeln!(w, "{line}")?;
        w.flush()?;
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SubscriberKey {
    pub user_id: i64,
    pub session: String,
}

impl SubscriberKey {
    pub fn new(user_id: i64, session: impl Into<String>) -> Self {
        Self {
            user_id,
            session: session.into(),
        }
    }
}

pub struct EventBroadcaster {
    subscribers: DashMap<SubscriberKey, Box<dyn EventSink>>,
    dedup: Mutex<DedupCache>,
}

impl Default for EventBroadcaster {
    fn default() -> Self {
        Self::new(DEFAULT_DEDUP_TTL, DEFAULT_DEDUP_CAPACITY)
    }
}

impl EventBroadcaster {
    pub fn new(dedup_ttl: Duration, dedup_capacity: usize) -> Self {
        Self {
            subscribers: DashMap::new(),
            dedup: Mutex::new(DedupCache::new(dedup_ttl, dedup_capacity)),
        }
    }

    /// Register a sink. A previous sink under the same key is replaced.
    pub fn subscribe(&self, key: SubscriberKey, sink: Box<dyn EventSink>) {
        tracing::debug!(user_id = key.user_id, session = %key.session, "subscriber registered");
        self.subscribers.insert(key, sink);
    }

    pub fn unsubscribe(&self, key: &SubscriberKey) -> bool {
        self.subscribers.remove(key).is_some()
    }

    pub fn subscriber_count(&self) -> usize {
        self.subscribers.len()
    }

    pub fn is_subscribed(&self, key: &SubscriberKey) -> bool {
        self.subscribers.contains_key(key)
    }

    /// Deliver to every local subscriber and remember the transition so the
    /// reconciler does not re-emit it. Returns the number of deliveries.
    pub fn publish(&self, event: &LifecycleEvent) -> usize {
        self.dedup_guard()
            .record(event.job_id, event.timestamp, Instant::now());
        self.deliver_all(event)
    }

    /// Publish only when `event.timestamp` is newer than the last transition
    /// published for the job. `None` when suppressed.
    pub fn publish_if_newer(&self, event: &LifecycleEvent, now: Instant) -> Option<usize> {
        if !self.dedup_guard().observe(event.job_id, event.timestamp, now) {
            return None;
        }
        Some(self.deliver_all(event))
    }

    fn deliver_all(&self, event: &LifecycleEvent) -> usize {
        let mut delivered = 0;
        self.subscribers.retain(|key, sink| match sink.deliver(event) {
            Ok(()) => {
                delivered += 1;
                true
            }
            Err(e) => {
                tracing::warn!(
                    user_id = key.user_id,
                    session = %key.session,
                    error = %e,
                    "dropping subscriber after failed delivery"
                );
                false
            }
        });
        tracing::debug!(
            kind = event.kind.as_str(),
            job_id = event.job_id,
            delivered,
            "event published"
        );
        delivered
    }

    fn dedup_guard(&self) -> MutexGuard<'_, DedupCache> {
        self.dedup.lock().unwrap_or_else(|p| p.into_inner())
    }
}
