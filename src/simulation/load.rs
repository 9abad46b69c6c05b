// SPDX-License-Identifier: AGPL-3.0-or-later
// SPDX-FileCopyrightText: 2025 Jonathan D.A. Jewell
//! Load-test shaping and traffic propagation

use crate::graph::ArchitectureGraph;
use petgraph::graph::NodeIndex;
use petgraph::Direction;
use serde::{Deserialize, Serialize};
use std::f64::consts::PI;
use std::fmt;
use std::str::FromStr;
use std::time::Duration;
use tracing::{debug, info};

/// Utilisation above which a node counts as saturated
pub const SATURATION_THRESHOLD: f64 = 0.8;

/// Number of plateaus in the `step` pattern
const STEPS: f64 = 4.0;

/// Shape of offered load over a test
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum LoadPattern {
    /// Peak load for the whole test
    Constant,
    /// Linear climb from base to peak
    RampUp,
    /// Base load with a burst at peak through the middle fifth
    Spike,
    /// Four equal plateaus from base to peak
    Step,
    /// One smooth cosine swell from base to peak and back
    Wave,
}

impl LoadPattern {
    /// Every pattern
    pub const ALL: [Self; 5] = [Self::Constant, Self::RampUp, Self::Spike, Self::Step, Self::Wave];

    /// Get the wire tag for this pattern
    #[must_use]
    pub fn code(&self) -> &'static str {
        match self {
            Self::Constant => "constant",
            Self::RampUp => "ramp-up",
            Self::Spike => "spike",
            Self::Step => "step",
            Self::Wave => "wave",
        }
    }

    /// Offered load at `fraction` of the way through a test
    #[must_use]
    pub fn shape(&self, fraction: f64, base: f64, peak: f64) -> f64 {
        let f = fraction.clamp(0.0, 1.0);
        let span = peak - base;
        match self {
            Self::Constant => peak,
            Self::RampUp => base + span * f,
            Self::Spike => {
                if (0.4..0.6).contains(&f) {
                    peak
                } else {
                    base
                }
            }
            Self::Step => {
                let step = (f * STEPS).floor().min(STEPS - 1.0);
                base + span * step / (STEPS - 1.0)
            }
            Self::Wave => base + span * (1.0 - (2.0 * PI * f).cos()) / 2.0,
        }
    }
}

impl fmt::Display for LoadPattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

impl FromStr for LoadPattern {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let lower = s.to_lowercase().replace('_', "-");
        Self::ALL.into_iter().find(|p| p.code() == lower).ok_or_else(|| {
            let valid: Vec<_> = Self::ALL.iter().map(Self::code).collect();
            format!("Unknown load pattern: {s}. Valid: {}", valid.join(", "))
        })
    }
}

/// A load test's traffic curve
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct LoadProfile {
    /// Curve shape
    pub pattern: LoadPattern,
    /// Quiet-period requests per second
    pub base_rps: f64,
    /// Highest requests per second
    pub peak_rps: f64,
    /// Test length
    pub duration: Duration,
}

impl LoadProfile {
    /// Offered load at elapsed time `t`
    #[must_use]
    pub fn rps_at(&self, t: Duration) -> f64 {
        let total = self.duration.as_secs_f64();
        let fraction = if total > 0.0 { t.as_secs_f64() / total } else { 1.0 };
        self.pattern.shape(fraction, self.base_rps, self.peak_rps)
    }

    /// Sample times from zero up to the duration (inclusive) every `step`
    ///
    /// At most [`MAX_SAMPLES`] times are returned.
    #[must_use]
    pub fn samples(&self, step: Duration) -> Vec<Duration> {
        if step.is_zero() {
            return vec![Duration::ZERO];
        }
        let mut times = Vec::new();
        let mut t = Some(Duration::ZERO);
        while let Some(now) = t.filter(|now| *now <= self.duration) {
            if times.len() == MAX_SAMPLES {
                break;
            }
            times.push(now);
            t = now.checked_add(step);
        }
        times
    }
}

/// Upper bound on the points of one load-test timeline
pub const MAX_SAMPLES: usize = 10_000;

/// Capacity of a node in requests per second
#[must_use]
pub fn node_capacity(graph: &ArchitectureGraph, index: usize) -> f64 {
    graph.nodes().get(index).map_or(0.0, |n| {
        n.category().capacity_per_replica() * f64::from(n.config.replicas)
    })
}

/// Nodes with no inbound edges; every node when the diagram has none
#[must_use]
pub fn entry_nodes(graph: &ArchitectureGraph) -> Vec<usize> {
    let pg = graph.petgraph();
    let entries: Vec<usize> = pg
        .node_indices()
        .filter(|&idx| pg.neighbors_directed(idx, Direction::Incoming).next().is_none())
        .map(|idx| idx.index())
        .collect();
    if entries.is_empty() {
        (0..graph.node_count()).collect()
    } else {
        entries
    }
}

/// Requests per second arriving at each node
///
/// `entry_rps` is split evenly over the entry nodes. Each node forwards its
/// full inflow to every downstream node, in topological order over the
/// diagram with cycle-closing edges dropped. Nodes marked in `blocked`
/// receive traffic but forward none.
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn propagate(graph: &ArchitectureGraph, entry_rps: f64, blocked: &[bool]) -> Vec<f64> {
    let mut load = vec![0.0; graph.node_count()];
    let entries = entry_nodes(graph);
    if entries.is_empty() {
        return load;
    }

    let share = entry_rps / entries.len() as f64;
    for &i in &entries {
        load[i] += share;
    }

    let dag = graph.acyclic_where(|_| true);
    for u in ArchitectureGraph::topological_positions(&dag) {
        if blocked.get(u).copied().unwrap_or(false) {
            continue;
        }
        let inflow = load[u];
        for v in dag.neighbors(NodeIndex::new(u)) {
            load[dag[v]] += inflow;
        }
    }
    load
}

/// One point on a load-test timeline
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LoadSample {
    /// Elapsed time in milliseconds
    pub t_ms: u64,
    /// Offered requests per second at the entry points
    pub offered_rps: f64,
    /// Highest load over capacity of any node
    pub max_utilization: f64,
    /// Node with the highest utilisation
    pub hottest_node: Option<String>,
    /// Nodes above the saturation threshold
    pub saturated: Vec<String>,
    /// Share of requests dropped by the most overloaded node
    pub estimated_error_rate: f64,
}

/// Result of [`run_load_test`]
#[derive(Debug, Clone, Serialize)]
pub struct LoadTestReport {
    /// The profile that was run
    pub profile: LoadProfile,
    /// One sample per step
    pub timeline: Vec<LoadSample>,
    /// When the first node saturated, if any did
    pub first_saturation_ms: Option<u64>,
    /// Highest utilisation seen
    pub peak_utilization: f64,
    /// Entry load at which the weakest node reaches full capacity
    pub breaking_point_rps: Option<f64>,
    /// Node that breaks first
    pub weakest_node: Option<String>,
}

/// Drive a load profile through the diagram
#[must_use]
#[allow(clippy::cast_possible_truncation)]
pub fn run_load_test(graph: &ArchitectureGraph, profile: &LoadProfile, step: Duration) -> LoadTestReport {
    let nodes = graph.nodes();
    let capacity: Vec<f64> = (0..nodes.len()).map(|i| node_capacity(graph, i)).collect();

    // load is linear in entry rps, so one unit run gives every node's multiplier
    let factor = propagate(graph, 1.0, &[]);
    let weakest = (0..nodes.len())
        .filter(|&i| factor[i] > 0.0 && capacity[i] > 0.0)
        .map(|i| (i, capacity[i] / factor[i]))
        .min_by(|a, b| a.1.total_cmp(&b.1));

    let mut timeline = Vec::new();
    let mut first_saturation_ms = None;
    let mut peak_utilization: f64 = 0.0;

    for t in profile.samples(step) {
        let offered = profile.rps_at(t);
        let utilization: Vec<f64> = (0..nodes.len())
            .map(|i| if capacity[i] > 0.0 { offered * factor[i] / capacity[i] } else { 0.0 })
            .collect();

        let hottest = (0..nodes.len()).max_by(|&a, &b| utilization[a].total_cmp(&utilization[b]));
        let max_utilization = hottest.map_or(0.0, |i| utilization[i]);
        let saturated: Vec<String> = (0..nodes.len())
            .filter(|&i| utilization[i] > SATURATION_THRESHOLD)
            .map(|i| nodes[i].id.clone())
            .collect();
        let estimated_error_rate = if max_utilization > 1.0 {
            (max_utilization - 1.0) / max_utilization
        } else {
            0.0
        };

        let t_ms = t.as_millis() as u64;
        if first_saturation_ms.is_none() && !saturated.is_empty() {
            debug!("Saturation at {} ms: {:?}", t_ms, saturated);
            first_saturation_ms = Some(t_ms);
        }
        peak_utilization = peak_utilization.max(max_utilization);

        timeline.push(LoadSample {
            t_ms,
            offered_rps: offered,
            max_utilization,
            hottest_node: hottest.map(|i| nodes[i].id.clone()),
            saturated,
            estimated_error_rate,
        });
    }

    info!(
        "Load test {}: {} samples, peak utilisation {:.2}",
        profile.pattern,
        timeline.len(),
        peak_utilization
    );

    LoadTestReport {
        profile: *profile,
        timeline,
        first_saturation_ms,
        peak_utilization,
        breaking_point_rps: weakest.map(|(_, rps)| rps),
        weakest_node: weakest.map(|(i, _)| nodes[i].id.clone()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{CommunicationType, Position, ServiceCategory, ServiceConfig, ServiceNode};

    fn add(graph: &mut ArchitectureGraph, name: &str, category: ServiceCategory) -> String {
        let node = ServiceNode::new(ServiceConfig::new(name, category), Position::default());
        let id = node.id.clone();
        graph.add_node(node).unwrap();
        id
    }

    fn profile(pattern: LoadPattern) -> LoadProfile {
        LoadProfile {
            pattern,
            base_rps: 100.0,
            peak_rps: 500.0,
            duration: Duration::from_secs(100),
        }
    }

    #[test]
    fn test_pattern_shapes() {
        let secs = Duration::from_secs;
        let close = |a: f64, b: f64| (a - b).abs() < 1e-9;

        assert!(close(profile(LoadPattern::Constant).rps_at(secs(0)), 500.0));
        assert!(close(profile(LoadPattern::RampUp).rps_at(secs(50)), 300.0));
        assert!(close(profile(LoadPattern::Spike).rps_at(secs(39)), 100.0));
        assert!(close(profile(LoadPattern::Spike).rps_at(secs(40)), 500.0));
        assert!(close(profile(LoadPattern::Spike).rps_at(secs(60)), 100.0));
        assert!(close(profile(LoadPattern::Step).rps_at(secs(0)), 100.0));
        assert!(close(profile(LoadPattern::Step).rps_at(secs(30)), 100.0 + 400.0 / 3.0));
        assert!(close(profile(LoadPattern::Step).rps_at(secs(100)), 500.0));
        assert!(close(profile(LoadPattern::Wave).rps_at(secs(0)), 100.0));
        assert!(close(profile(LoadPattern::Wave).rps_at(secs(50)), 500.0));
    }

    #[test]
    fn test_samples_include_both_ends() {
        let samples = profile(LoadPattern::Constant).samples(Duration::from_secs(25));
        assert_eq!(samples.len(), 5);
        assert_eq!(samples.last(), Some(&Duration::from_secs(100)));
        assert_eq!(profile(LoadPattern::Constant).samples(Duration::ZERO).len(), 1);
    }

    #[test]
    fn test_samples_survive_huge_durations() {
        let mut endless = profile(LoadPattern::Constant);
        endless.duration = Duration::MAX;

        let coarse = endless.samples(Duration::MAX);
        assert_eq!(coarse, vec![Duration::ZERO, Duration::MAX]);

        let fine = endless.samples(Duration::from_secs(1));
        assert_eq!(fine.len(), MAX_SAMPLES);
        assert_eq!(fine.last(), Some(&Duration::from_secs(MAX_SAMPLES as u64 - 1)));
    }

    #[test]
    fn test_propagate_accumulates_over_paths() {
        // gw -> a -> db, gw -> b -> db
        let mut graph = ArchitectureGraph::default();
        let gw = add(&mut graph, "gw", ServiceCategory::Gateway);
        let a = add(&mut graph, "a", ServiceCategory::Service);
        let b = add(&mut graph, "b", ServiceCategory::Service);
        let db = add(&mut graph, "db", ServiceCategory::Database);
        for (s, t) in [(&gw, &a), (&gw, &b), (&a, &db), (&b, &db)] {
            graph.connect(s, t, CommunicationType::Sync, None).unwrap();
        }

        let load = propagate(&graph, 100.0, &[]);
        assert_eq!(load, vec![100.0, 100.0, 100.0, 200.0]);

        let load = propagate(&graph, 100.0, &[false, true, false, false]);
        assert_eq!(load, vec![100.0, 100.0, 100.0, 100.0]);
    }

    #[test]
    fn test_propagate_splits_entries_and_tolerates_cycles() {
        let mut graph = ArchitectureGraph::default();
        let a = add(&mut graph, "a", ServiceCategory::Service);
        let b = add(&mut graph, "b", ServiceCategory::Service);
        graph.connect(&a, &b, CommunicationType::Sync, None).unwrap();
        graph.connect(&b, &a, CommunicationType::Sync, None).unwrap();

        // no node lacks inbound edges, so both are entries
        let load = propagate(&graph, 100.0, &[]);
        assert_eq!(load, vec![50.0, 100.0]);
    }

    #[test]
    fn test_load_test_finds_breaking_point() {
        let mut graph = ArchitectureGraph::default();
        let gw = add(&mut graph, "gw", ServiceCategory::Gateway);
        let api = add(&mut graph, "api", ServiceCategory::Service);
        graph.connect(&gw, &api, CommunicationType::Https, None).unwrap();

        let report = run_load_test(&graph, &profile(LoadPattern::RampUp), Duration::from_secs(10));

        assert_eq!(report.timeline.len(), 11);
        assert_eq!(report.weakest_node.as_deref(), Some(api.as_str()));
        assert!((report.breaking_point_rps.unwrap() - 500.0).abs() < 1e-9);
        // api passes 0.8 * 500 = 400 rps at 75% of the ramp
        assert_eq!(report.first_saturation_ms, Some(80_000));
        assert!((report.peak_utilization - 1.0).abs() < 1e-9);
        assert!(report.timeline.iter().all(|s| s.estimated_error_rate.abs() < 1e-9));
    }

    #[test]
    fn test_empty_graph_load_test() {
        let report = run_load_test(&ArchitectureGraph::default(), &profile(LoadPattern::Wave), Duration::from_secs(50));
        assert_eq!(report.timeline.len(), 3);
        assert!(report.breaking_point_rps.is_none());
        assert!(report.first_saturation_ms.is_none());
    }
}
