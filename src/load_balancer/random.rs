//! Uniform random load balancing strategy.

use rand::Rng;

use crate::load_balancer::{Candidate, LoadBalancer};

#[derive(Debug, Default)]
pub struct RandomPick;

impl RandomPick {
    pub fn new() -> Self {
        Self
    }
}

impl LoadBalancer for RandomPick {
    fn next_server(&self, candidates: &[Candidate<'_>], _affinity: Option<&str>) -> Option<usize> {
        if candidates.is_empty() {
            return None;
        }
        Some(rand::thread_rng().gen_range(0..candidates.len()))
    }
}
