//! Least Connections load balancing strategy.

use crate::load_balancer::{Candidate, LoadBalancer};

/// Least connections selector.
/// Selects the backend with the fewest successfully forwarded requests.
#[derive(Debug, Default)]
pub struct LeastConnections;

impl LeastConnections {
    pub fn new() -> Self {
        Self
    }
}

impl LoadBalancer for LeastConnections {
    fn next_server(&self, candidates: &[Candidate<'_>], _affinity: Option<&str>) -> Option<usize> {
        // min_by_key keeps the first minimum, so ties go to registry order
        candidates
            .iter()
            .enumerate()
            .min_by_key(|(_, c)| c.request_count)
            .map(|(index, _)| index)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn candidate(id: &str, request_count: u64) -> Candidate<'_> {
        Candidate {
            id,
            request_count,
            weight: 1,
        }
    }

    #[test]
    fn test_least_conn() {
        let lb = LeastConnections::new();
        let backends = vec![candidate("a", 1), candidate("b", 0)];
        assert_eq!(lb.next_server(&backends, None), Some(1));

        let backends = vec![candidate("a", 1), candidate("b", 2)];
        assert_eq!(lb.next_server(&backends, None), Some(0));
    }

    #[test]
    fn ties_go_to_first_in_order() {
        let lb = LeastConnections::new();
        let backends = vec![candidate("a", 5), candidate("b", 2), candidate("c", 2)];
        assert_eq!(backends[lb.next_server(&backends, None).unwrap()].id, "b");
    }

    #[test]
    fn never_picks_above_minimum() {
        let lb = LeastConnections::new();
        let backends = vec![candidate("a", 9), candidate("b", 3), candidate("c", 7), candidate("d", 4)];
        let pick = backends[lb.next_server(&backends, None).unwrap()];
        assert!(backends.iter().all(|c| pick.request_count <= c.request_count));
        assert_eq!(lb.next_server(&[], None), None);
    }
}
