/// Bounded, newest-first alert buffer.
///
/// Two producers feed it: classification transitions from registry updates
/// (deterministic, synchronous) and whatever `AlertSource` the engine polls
/// on its periodic task. The feed itself does not distinguish producers.
///
/// Alerts are immutable once stamped. They leave the feed in exactly two
/// ways: FIFO eviction when a push exceeds capacity, or explicit dismissal.
/// Eviction is normal operation and is never surfaced as an error.

use std::collections::VecDeque;

use chrono::{DateTime, Utc};
use tracing::debug;

use crate::model::{Alert, AlertDraft};

pub struct AlertFeed {
    entries: VecDeque<Alert>,
    capacity: usize,
    next_id: u64,
}

impl AlertFeed {
    /// A feed with zero capacity would silently drop every alert.
    pub fn new(capacity: usize) -> Self {
        assert!(capacity > 0, "alert feed capacity must be at least 1");
        Self {
            entries: VecDeque::with_capacity(capacity + 1),
            capacity,
            next_id: 1,
        }
    }

    /// Stamp a draft with a unique id and creation time, insert it at the
    /// head, and evict from the tail if the feed is over capacity.
    /// Returns the id of the stamped alert.
    pub fn push(&mut self, draft: AlertDraft, now: DateTime<Utc>) -> u64 {
        let id = self.next_id;
        self.next_id += 1;

        self.entries.push_front(Alert {
            id,
            kind: draft.kind,
            message: draft.message,
            station_id: draft.station_id,
            created_at: now,
        });

        while self.entries.len() > self.capacity {
            if let Some(evicted) = self.entries.pop_back() {
                debug!(alert_id = evicted.id, "evicted oldest alert at capacity");
            }
        }

        id
    }

    /// Alerts newest first.
    pub fn list(&self) -> impl Iterator<Item = &Alert> {
        self.entries.iter()
    }

    /// Remove an alert by id. Dismissal is removal, not mutation — the
    /// remaining entries are untouched. Returns false for unknown ids
    /// (the alert may already have been evicted).
    pub fn dismiss(&mut self, id: u64) -> bool {
        match self.entries.iter().position(|a| a.id == id) {
            Some(pos) => {
                self.entries.remove(pos);
                true
            }
            None => false,
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
