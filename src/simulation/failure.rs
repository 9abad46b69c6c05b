// SPDX-License-Identifier: AGPL-3.0-or-later
// SPDX-FileCopyrightText: 2025 Jonathan D.A. Jewell
//! Injectable failure patterns and upstream cascade

use super::metrics::Pressure;
use super::HealthState;
use crate::graph::ArchitectureGraph;
use crate::types::ServiceCategory;
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::collections::{HashSet, VecDeque};
use std::fmt;
use std::str::FromStr;
use std::time::Duration;

/// Pressure put on nodes degraded by a cascade
pub const CASCADE_PRESSURE: Pressure = Pressure {
    latency_factor: 2.0,
    cpu: 0.1,
    memory: 0.0,
};

/// The fixed set of failures that can be injected
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum FailurePattern {
    /// Process dies and stops serving
    ServiceCrash,
    /// Responses slow down sharply
    LatencySpike,
    /// Memory climbs until the node thrashes
    MemoryLeak,
    /// CPU saturates
    CpuExhaustion,
    /// Node is unreachable from the rest of the system
    NetworkPartition,
    /// Data store goes down
    DatabaseOutage,
}

/// Parameters of a failure pattern
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct FailureSpec {
    /// Health of the target while the failure lasts
    pub health: HealthState,
    /// How long the failure lasts
    pub duration: Duration,
    /// Chance that a synchronous dependent degrades
    pub cascade_probability: f64,
    /// Stress on the target while the failure lasts
    pub pressure: Pressure,
}

impl FailureSpec {
    /// Combined latency multiplier on the target while the failure lasts
    #[must_use]
    pub fn latency_multiplier(&self) -> f64 {
        self.pressure.latency_factor * self.health.latency_multiplier()
    }
}

impl FailurePattern {
    /// Every pattern
    pub const ALL: [Self; 6] = [
        Self::ServiceCrash,
        Self::LatencySpike,
        Self::MemoryLeak,
        Self::CpuExhaustion,
        Self::NetworkPartition,
        Self::DatabaseOutage,
    ];

    /// Get the wire tag for this pattern
    #[must_use]
    pub fn code(&self) -> &'static str {
        match self {
            Self::ServiceCrash => "service-crash",
            Self::LatencySpike => "latency-spike",
            Self::MemoryLeak => "memory-leak",
            Self::CpuExhaustion => "cpu-exhaustion",
            Self::NetworkPartition => "network-partition",
            Self::DatabaseOutage => "database-outage",
        }
    }

    /// One-line description
    #[must_use]
    pub fn description(&self) -> &'static str {
        match self {
            Self::ServiceCrash => "Service process crashes and stops serving",
            Self::LatencySpike => "Response times jump fivefold",
            Self::MemoryLeak => "Memory usage climbs until the service thrashes",
            Self::CpuExhaustion => "CPU saturates and requests queue up",
            Self::NetworkPartition => "Service becomes unreachable",
            Self::DatabaseOutage => "Data store goes offline",
        }
    }

    /// The fixed parameter table
    #[must_use]
    pub fn spec(&self) -> FailureSpec {
        let (health, secs, cascade_probability, pressure) = match self {
            Self::ServiceCrash => (HealthState::Failed, 30, 0.6, Pressure::NONE),
            Self::LatencySpike => (
                HealthState::Degraded,
                20,
                0.3,
                // x5 overall once the degraded x3 applies
                Pressure { latency_factor: 5.0 / 3.0, ..Pressure::NONE },
            ),
            Self::MemoryLeak => (
                HealthState::Degraded,
                60,
                0.2,
                Pressure { latency_factor: 1.5, memory: 0.5, ..Pressure::NONE },
            ),
            Self::CpuExhaustion => (
                HealthState::Degraded,
                45,
                0.4,
                Pressure { latency_factor: 2.5, cpu: 0.8, ..Pressure::NONE },
            ),
            Self::NetworkPartition => (HealthState::Failed, 40, 0.5, Pressure::NONE),
            Self::DatabaseOutage => (HealthState::Failed, 90, 0.8, Pressure::NONE),
        };
        FailureSpec {
            health,
            duration: Duration::from_secs(secs),
            cascade_probability,
            pressure,
        }
    }

    /// Whether the pattern makes sense for a node category
    #[must_use]
    pub fn applies_to(&self, category: ServiceCategory) -> bool {
        match self {
            Self::DatabaseOutage => category.is_data_store(),
            _ => true,
        }
    }
}

impl fmt::Display for FailurePattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

impl FromStr for FailurePattern {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let lower = s.to_lowercase().replace('_', "-");
        Self::ALL.into_iter().find(|p| p.code() == lower).ok_or_else(|| {
            let valid: Vec<_> = Self::ALL.iter().map(Self::code).collect();
            format!("Unknown failure pattern: {s}. Valid: {}", valid.join(", "))
        })
    }
}

/// A dependent degraded by a cascade
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CascadeHit {
    /// Degraded node
    pub node_id: String,
    /// Node whose failure reached it
    pub from: String,
    /// Hops from the injected node
    pub depth: usize,
}

/// Spread a failure to upstream dependents
///
/// Dependents are the sources of edges into an affected node. Each is hit
/// with probability `p` over a synchronous edge and `p / 2` over an
/// asynchronous one; `p` halves with every hop and the walk stops at
/// `max_depth`. A node is hit at most once and the origin never.
pub fn cascade<R: Rng + ?Sized>(
    rng: &mut R,
    graph: &ArchitectureGraph,
    origin: &str,
    probability: f64,
    max_depth: usize,
) -> Vec<CascadeHit> {
    let mut affected: HashSet<String> = HashSet::from([origin.to_string()]);
    let mut queue = VecDeque::from([(origin.to_string(), 0usize, probability)]);
    let mut hits = Vec::new();

    while let Some((node, depth, p)) = queue.pop_front() {
        if depth >= max_depth {
            continue;
        }
        for edge in graph.edges_to(&node) {
            if affected.contains(&edge.source) {
                continue;
            }
            let chance = if edge.kind.is_synchronous() { p } else { p / 2.0 };
            if rng.gen_bool(chance.clamp(0.0, 1.0)) {
                affected.insert(edge.source.clone());
                hits.push(CascadeHit {
                    node_id: edge.source.clone(),
                    from: node.clone(),
                    depth: depth + 1,
                });
                queue.push_back((edge.source.clone(), depth + 1, p / 2.0));
            }
        }
    }

    hits
}
