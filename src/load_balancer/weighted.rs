//! Weighted random load balancing strategy.
//!
//! Each candidate owns a slice of `[0, total_weight)` proportional to its
//! static weight; a uniform draw over that range picks the slice.

use rand::Rng;

use crate::load_balancer::{Candidate, LoadBalancer};

#[derive(Debug, Default)]
pub struct Weighted;

impl Weighted {
    pub fn new() -> Self {
        Self
    }
}

/// Map a draw in `[0, total_weight)` to a candidate index by cumulative sum.
pub fn pick_by_draw(candidates: &[Candidate<'_>], draw: u64) -> Option<usize> {
    let mut cumulative = 0u64;
    for (index, candidate) in candidates.iter().enumerate() {
        cumulative += u64::from(candidate.weight);
        if draw < cumulative {
            return Some(index);
        }
    }
    None
}

impl LoadBalancer for Weighted {
    fn next_server(&self, candidates: &[Candidate<'_>], _affinity: Option<&str>) -> Option<usize> {
        let total: u64 = candidates.iter().map(|c| u64::from(c.weight)).sum();
        if total == 0 {
            return None;
        }
        let draw = rand::thread_rng().gen_range(0..total);
        pick_by_draw(candidates, draw)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn weighted<'a>(entries: &[(&'a str, u32)]) -> Vec<Candidate<'a>> {
        entries.iter()
            .map(|&(id, weight)| Candidate {
                id,
                request_count: 0,
                weight,
            })
            .collect()
    }

    #[test]
    fn draw_maps_to_cumulative_slices() {
        let backends = weighted(&[("a", 1), ("b", 3), ("c", 1)]);
        assert_eq!(pick_by_draw(&backends, 0), Some(0));
        assert_eq!(pick_by_draw(&backends, 1), Some(1));
        assert_eq!(pick_by_draw(&backends, 3), Some(1));
        assert_eq!(pick_by_draw(&backends, 4), Some(2));
        assert_eq!(pick_by_draw(&backends, 5), None);
    }

    #[test]
    fn unweighted_backends_still_receive_traffic() {
        let lb = Weighted::new();
        let backends = weighted(&[("heavy", 8), ("default", 1)]);

        let mut hits = [0usize; 2];
        for _ in 0..2_000 {
            hits[lb.next_server(&backends, None).unwrap()] += 1;
        }
        assert!(hits[1] > 0);
        assert!(hits[0] > hits[1] * 3, "{hits:?}");
    }

    #[test]
    fn empty_or_weightless_set_returns_none() {
        let lb = Weighted::new();
        assert_eq!(lb.next_server(&[], None), None);
        assert_eq!(lb.next_server(&weighted(&[("a", 0)]), None), None);
    }
}
