//! Load balancing subsystem.
//!
//! # Data Flow
//! ```text
//! Route matched → service identified
//!     → registry.rs (backends configured for the service, insertion order)
//!     → health tracker (drop unhealthy backends) = eligible set
//!     → Apply load balancing algorithm:
//!         - round_robin.rs (rotate through backends, shared cursor)
//!         - least_conn.rs (pick backend with fewest forwarded requests)
//!         - random.rs (uniform pick)
//!         - weighted.rs (static weights, cumulative draw)
//!         - sticky.rs (hash affinity key, round robin fallback)
//!     → Return backend id or none
//! ```
//!
//! # Design Decisions
//! - Strategies only see a snapshot of the eligible set; they never lock
//! - One strategy per process, chosen from configuration
//! - Empty eligible set is a normal outcome, not an error

pub mod backend;
pub mod least_conn;
pub mod random;
pub mod registry;
pub mod round_robin;
pub mod selector;
pub mod sticky;
pub mod weighted;

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

pub use backend::Backend;
pub use registry::Registry;
pub use selector::Selector;

/// A member of the eligible set, as seen by a strategy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Candidate<'a> {
    pub id: &'a str,
    pub request_count: u64,
    pub weight: u32,
}

/// A selection algorithm over the eligible set.
pub trait LoadBalancer: Send + Sync + fmt::Debug {
    /// Return the index of the chosen candidate, or `None` when there are none.
    fn next_server(&self, candidates: &[Candidate<'_>], affinity: Option<&str>) -> Option<usize>;
}

/// Configured selection strategy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Strategy {
    #[default]
    RoundRobin,
    LeastConnections,
    Random,
    Weighted,
    Sticky,
}

impl Strategy {
    pub const ALL: [Strategy; 5] = [
        Strategy::RoundRobin,
        Strategy::LeastConnections,
        Strategy::Random,
        Strategy::Weighted,
        Strategy::Sticky,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Strategy::RoundRobin => "round_robin",
            Strategy::LeastConnections => "least_connections",
            Strategy::Random => "random",
            Strategy::Weighted => "weighted",
            Strategy::Sticky => "sticky",
        }
    }

    /// Build the algorithm implementing this strategy.
    pub fn build(&self) -> Box<dyn LoadBalancer> {
        match self {
            Strategy::RoundRobin => Box::new(round_robin::RoundRobin::new()),
            Strategy::LeastConnections => Box::new(least_conn::LeastConnections::new()),
            Strategy::Random => Box::new(random::RandomPick::new()),
            Strategy::Weighted => Box::new(weighted::Weighted::new()),
            Strategy::Sticky => Box::new(sticky::Sticky::new()),
        }
    }
}

impl fmt::Display for Strategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Strategy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_lowercase();
        Strategy::ALL
            .into_iter()
            .find(|strategy| strategy.as_str() == wanted)
            .ok_or_else(|| {
                format!(
                    "unknown strategy {s:?}, expected one of {}",
                    Strategy::ALL.map(|s| s.as_str()).join(", ")
                )
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strategy_names_round_trip() {
        for strategy in Strategy::ALL {
            assert_eq!(strategy.as_str().parse::<Strategy>().unwrap(), strategy);
        }
        assert_eq!(" Least_Connections ".parse::<Strategy>().unwrap(), Strategy::LeastConnections);
        assert!("fastest".parse::<Strategy>().is_err());
    }
}
