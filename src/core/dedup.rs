//! Bounded "already broadcast" cache.
//!
//! Remembers, per job, the newest modification instant that was published.
//! Entries expire after a TTL and the map never grows past its capacity:
//! inserting into a full cache evicts the entry recorded longest ago.

use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::time::{Duration, Instant};

#[derive(Debug, Clone, Copy)]
struct Seen {
    modified: DateTime<Utc>,
    recorded_at: Instant,
}

#[derive(Debug)]
pub struct DedupCache {
    ttl: Duration,
    capacity: usize,
    seen: HashMap<i64, Seen>,
}

impl DedupCache {
    pub fn new(ttl: Duration, capacity: usize) -> Self {
        Self {
            ttl,
            capacity: capacity.max(1),
            seen: HashMap::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.seen.len()
    }

    pub fn is_empty(&self) -> bool {
        self.seen.is_empty()
    }

    /// Returns true and records `modified` when it is newer than what was
    /// already published for `job_id` (or nothing live is recorded).
    pub fn observe(&mut self, job_id: i64, modified: DateTime<Utc>, now: Instant) -> bool {
        self.purge_expired(now);

        if let Some(prev) = self.seen.get(&job_id)
            && prev.modified >= modified
        {
            return false;
        }

        self.record(job_id, modified, now);
        true
    }

    /// Record unconditionally, keeping the newer of the stored and given instants.
    pub fn record(&mut self, job_id: i64, modified: DateTime<Utc>, now: Instant) {
        if !self.seen.contains_key(&job_id) && self.seen.len() >= self.capacity {
            self.evict_oldest();
        }
        let entry = self.seen.entry(job_id).or_insert(Seen {
            modified,
            recorded_at: now,
        });
        if modified >= entry.modified {
            entry.modified = modified;
            entry.recorded_at = now;
        }
    }

    pub fn purge_expired(&mut self, now: Instant) {
        let ttl = self.ttl;
        self.seen
            .retain(|_, s| now.saturating_duration_since(s.recorded_at) < ttl);
    }

    fn evict_oldest(&mut self) {
        let oldest = self
            .seen
            .iter()
            .min_by_key(|(_, s)| s.recorded_at)
            .map(|(job, _)| *job);
        if let Some(job) = oldest {
            self.seen.remove(&job);
        }
    }
}
