//! Backend selection.
//!
//! # Responsibilities
//! - Build the eligible set for a service (configured + healthy)
//! - Apply the configured strategy to the eligible set
//!
//! The health snapshot is taken under one lock and released before the
//! strategy runs, so selection never blocks on forwarding.

use std::sync::Arc;

use crate::health::HealthTracker;
use crate::load_balancer::{Candidate, LoadBalancer, Registry, Strategy};

/// Picks one healthy backend for a service.
#[derive(Debug)]
pub struct Selector {
    registry: Arc<Registry>,
    health: Arc<HealthTracker>,
    strategy: Strategy,
    balancer: Box<dyn LoadBalancer>,
}

impl Selector {
    pub fn new(registry: Arc<Registry>, health: Arc<HealthTracker>, strategy: Strategy) -> Self {
        Self {
            registry,
            health,
            strategy,
            balancer: strategy.build(),
        }
    }

    pub fn strategy(&self) -> Strategy {
        self.strategy
    }

    /// Identifiers of the eligible set for `service`, in registry order.
    pub fn eligible(&self, service: &str) -> Vec<String> {
        let snapshot = self.health.snapshot();
        self.registry
            .backends_for(service)
            .filter(|b| snapshot.get(b.id()).map_or(true, |h| h.is_healthy()))
            .map(|b| b.id().to_string())
            .collect()
    }

    /// Choose a backend for `service`, or `None` when the eligible set is empty.
    pub fn select(&self, service: &str, affinity: Option<&str>) -> Option<String> {
        let snapshot = self.health.snapshot();
        let candidates: Vec<Candidate<'_>> = self
            .registry
            .backends_for(service)
            .filter_map(|b| {
                let health = snapshot.get(b.id());
                if health.is_some_and(|h| !h.is_healthy()) {
                    return None;
                }
                Some(Candidate {
                    id: b.id(),
                    request_count: health.map_or(0, |h| h.request_count),
                    weight: b.weight(),
                })
            })
            .collect();

        let chosen = self
            .balancer
            .next_server(&candidates, affinity)
            .and_then(|index| candidates.get(index))
            .map(|c| c.id.to_string());

        match &chosen {
            Some(id) => tracing::debug!(
                service = %service,
                backend = %id,
                strategy = %self.strategy,
                eligible = candidates.len(),
                "Backend selected"
            ),
            None => tracing::debug!(service = %service, strategy = %self.strategy, "No eligible backend"),
        }
        chosen
    }
}
