//! Sticky (affinity hash) load balancing strategy.

use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};

use crate::load_balancer::round_robin::RoundRobin;
use crate::load_balancer::{Candidate, LoadBalancer};

/// Routes equal affinity keys to the same index of an unchanged eligible set.
/// Requests without a key rotate like round robin.
#[derive(Debug, Default)]
pub struct Sticky {
    fallback: RoundRobin,
}

impl Sticky {
    pub fn new() -> Self {
        Self::default()
    }
}

/// Stable non-negative hash of an affinity key for the process lifetime.
pub fn affinity_hash(key: &str) -> u64 {
    let mut hasher = DefaultHasher::new();
    key.hash(&mut hasher);
    hasher.finish()
}

impl LoadBalancer for Sticky {
    fn next_server(&self, candidates: &[Candidate<'_>], affinity: Option<&str>) -> Option<usize> {
        if candidates.is_empty() {
            return None;
        }
        match affinity {
            Some(key) => Some((affinity_hash(key) % candidates.len() as u64) as usize),
            None => self.fallback.advance(candidates.len()),
        }
    }
}
