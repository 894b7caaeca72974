//! Round-robin load balancing strategy.

use std::sync::atomic::{AtomicUsize, Ordering};

use crate::load_balancer::{Candidate, LoadBalancer};

/// Round-robin selector.
///
/// Stores a single rotation cursor shared by every service. The cursor is
/// always reduced modulo the current eligible-set size, so it self-corrects
/// when backends join or leave the set between calls.
#[derive(Debug, Default)]
pub struct RoundRobin {
    cursor: AtomicUsize,
}

impl RoundRobin {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start the rotation at a given cursor value.
    pub fn starting_at(cursor: usize) -> Self {
        Self {
            cursor: AtomicUsize::new(cursor),
        }
    }

    /// Current cursor value.
    pub fn cursor(&self) -> usize {
        self.cursor.load(Ordering::Relaxed)
    }

    /// Take the slot for a set of `len` candidates and advance the cursor.
    pub(crate) fn advance(&self, len: usize) -> Option<usize> {
        if len == 0 {
            return None;
        }
        // fetch_update makes the read-modify-write atomic under contention.
        let previous = self
            .cursor
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |c| Some((c % len + 1) % len))
            .unwrap_or_else(|c| c);
        Some(previous % len)
    }
}

impl LoadBalancer for RoundRobin {
    fn next_server(&self, candidates: &[Candidate<'_>], _affinity: Option<&str>) -> Option<usize> {
        self.advance(candidates.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn candidates<'a>(ids: &[&'a str]) -> Vec<Candidate<'a>> {
        ids.iter()
            .copied()
            .map(|id| Candidate {
                id,
                request_count: 0,
                weight: 1,
            })
            .collect()
    }

    #[test]
    fn test_round_robin() {
        let lb = RoundRobin::new();
        let backends = candidates(&["a", "b", "c"]);

        let picks: Vec<_> = (0..4)
            .map(|_| backends[lb.next_server(&backends, None).unwrap()].id)
            .collect();
        assert_eq!(picks, ["a", "b", "c", "a"]);
    }

    #[test]
    fn visits_each_member_once_per_cycle() {
        let lb = RoundRobin::starting_at(7);
        let backends = candidates(&["a", "b", "c", "d"]);

        let mut seen: Vec<_> = (0..4)
            .map(|_| lb.next_server(&backends, None).unwrap())
            .collect();
        seen.sort_unstable();
        assert_eq!(seen, [0, 1, 2, 3]);
    }

    #[test]
    fn cursor_wraps_when_set_shrinks() {
        let lb = RoundRobin::starting_at(2);
        let backends = candidates(&["a", "b"]);

        // 2 % 2 == 0
        assert_eq!(lb.next_server(&backends, None), Some(0));
        assert_eq!(lb.cursor(), 1);
    }

    #[test]
    fn empty_set_returns_none() {
        let lb = RoundRobin::new();
        assert_eq!(lb.next_server(&[], None), None);
        assert_eq!(lb.cursor(), 0);
    }
}
