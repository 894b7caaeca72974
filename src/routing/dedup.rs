//! Best-effort duplicate delivery suppression.
//!
//! Remembers recently dispatched idempotency keys for a bounded window.
//! When the cache exceeds its capacity the oldest half is dropped; this is a
//! heuristic, not an LRU and not an exactly-once guarantee.

use std::collections::{HashMap, VecDeque};
use std::sync::Mutex;
use std::time::Duration;

use tokio::time::Instant;

use crate::config::DedupConfig;

#[derive(Debug, Default)]
struct Entries {
    seen: HashMap<String, Instant>,
    order: VecDeque<String>,
}

#[derive(Debug)]
pub struct DedupCache {
    entries: Mutex<Entries>,
    capacity: usize,
    window: Duration,
}

impl DedupCache {
    pub fn new(capacity: usize, window: Duration) -> Self {
        Self {
            entries: Mutex::new(Entries::default()),
            capacity: capacity.max(2),
            window,
        }
    }

    pub fn from_config(config: &DedupConfig) -> Self {
        Self::new(config.capacity, Duration::from_secs(config.window_secs))
    }

    /// Record `key`. Returns true if it was already seen inside the window.
    ///
    /// Check and insert happen under one lock, so two concurrent deliveries of
    /// the same key cannot both pass.
    pub fn check_and_insert(&self, key: &str) -> bool {
        let now = Instant::now();
        let mut entries = self.entries.lock().unwrap_or_else(|p| p.into_inner());

        if let Some(seen_at) = entries.seen.get(key) {
            if now.duration_since(*seen_at) < self.window {
                return true;
            }
        }

        if entries.seen.insert(key.to_string(), now).is_none() {
            entries.order.push_back(key.to_string());
        } else {
            // Expired key re-seen: move it to the back.
            entries.order.retain(|k| k != key);
            entries.order.push_back(key.to_string());
        }

        if entries.order.len() > self.capacity {
            let drop_count = entries.order.len() - self.capacity / 2;
            for _ in 0..drop_count {
                if let Some(old) = entries.order.pop_front() {
                    entries.seen.remove(&old);
                }
            }
            tracing::debug!(dropped = drop_count, kept = entries.order.len(), "Dedup cache trimmed");
        }
        false
    }

    /// Forget `key`, e.g. when its dispatch could not be attempted.
    pub fn remove(&self, key: &str) {
        let mut entries = self.entries.lock().unwrap_or_else(|p| p.into_inner());
        if entries.seen.remove(key).is_some() {
            entries.order.retain(|k| k != key);
        }
    }

    pub fn len(&self) -> usize {
        self.entries.lock().unwrap_or_else(|p| p.into_inner()).order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
