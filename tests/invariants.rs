// SPDX-License-Identifier: AGPL-3.0-or-later
// SPDX-FileCopyrightText: 2025 Jonathan D.A. Jewell
//! Invariant tests for the diagram model, analyzers and simulation
//!
//! These tests verify:
//! 1. Cycle detection - each cycle reported once, none on a DAG
//! 2. Resource totals - sums over every replica
//! 3. Export fidelity - documents survive a JSON round-trip
//! 4. Simulation determinism - same seed, same run

use meshwright::analysis::architecture::{detect_cycles, resource_totals};
use meshwright::config::SimulationConfig;
use meshwright::document::{export_json, import_json};
use meshwright::graph::ArchitectureGraph;
use meshwright::simulation::{FailurePattern, HealthState, SimulationEngine};
use meshwright::types::{CommunicationType, Position, ServiceCategory, ServiceConfig, ServiceNode};
use proptest::prelude::*;
use std::time::Duration;
use tempfile::TempDir;

// =============================================================================
// Test Helpers
// =============================================================================

fn service(name: &str, category: ServiceCategory, replicas: u32, cpu: f64, memory: u64) -> ServiceNode {
    let mut config = ServiceConfig::new(name, category);
    config.replicas = replicas;
    config.cpu = cpu;
    config.memory = memory;
    ServiceNode::new(config, Position::default())
}

fn graph_with(n: usize, edges: &[(usize, usize)]) -> ArchitectureGraph {
    let mut graph = ArchitectureGraph::default();
    for i in 0..n {
        graph
            .add_node(service(&format!("s{i}"), ServiceCategory::Service, 1, 0.5, 256))
            .unwrap();
    }
    for &(a, b) in edges {
        if a != b {
            graph
                .connect(&format!("svc:s{a}"), &format!("svc:s{b}"), CommunicationType::Sync, None)
                .unwrap();
        }
    }
    graph
}

// =============================================================================
// Cycle detection
// =============================================================================

#[test]
fn test_triangle_cycle_reported_once() {
    let graph = graph_with(3, &[(0, 1), (1, 2), (2, 0)]);
    let cycles = detect_cycles(&graph);

    assert_eq!(cycles.len(), 1);
    assert_eq!(cycles[0], vec!["svc:s0", "svc:s1", "svc:s2"]);
}

#[test]
fn test_dag_has_no_cycles() {
    let graph = graph_with(5, &[(0, 1), (0, 2), (1, 3), (2, 3), (3, 4)]);
    assert!(detect_cycles(&graph).is_empty());
}

proptest! {
    // edges only go from lower to higher index, so the graph is acyclic
    #[test]
    fn prop_forward_edges_never_cycle(
        n in 2usize..12,
        raw in prop::collection::vec((0usize..12, 0usize..12), 0..40),
    ) {
        let edges: Vec<(usize, usize)> = raw
            .into_iter()
            .map(|(a, b)| (a % n, b % n))
            .filter(|(a, b)| a < b)
            .collect();
        let graph = graph_with(n, &edges);
        prop_assert!(detect_cycles(&graph).is_empty());
    }

    // every reported cycle follows real edges back to its first node
    #[test]
    fn prop_reported_cycles_are_real(
        n in 2usize..10,
        raw in prop::collection::vec((0usize..10, 0usize..10), 0..30),
    ) {
        let edges: Vec<(usize, usize)> = raw.into_iter().map(|(a, b)| (a % n, b % n)).collect();
        let graph = graph_with(n, &edges);
        for cycle in detect_cycles(&graph) {
            prop_assert!(cycle.len() >= 2);
            let closed: Vec<&String> = cycle.iter().chain(cycle.first()).collect();
            for pair in closed.windows(2) {
                prop_assert!(graph.edges_from(pair[0]).iter().any(|e| &e.target == pair[1]));
            }
        }
    }

    #[test]
    fn prop_import_export_preserves_counts(
        n in 0usize..10,
        raw in prop::collection::vec((0usize..10, 0usize..10), 0..20),
    ) {
        let edges: Vec<(usize, usize)> = if n == 0 {
            vec![]
        } else {
            raw.into_iter().map(|(a, b)| (a % n, b % n)).collect()
        };
        let graph = graph_with(n, &edges);
        let restored = import_json(&export_json(&graph).unwrap()).unwrap();

        prop_assert_eq!(restored.node_count(), graph.node_count());
        prop_assert_eq!(restored.edge_count(), graph.edge_count());
        prop_assert_eq!(restored.to_document(), graph.to_document());
    }
}

// =============================================================================
// Resource totals
// =============================================================================

#[test]
fn test_resource_totals_sum_nodes() {
    let mut graph = ArchitectureGraph::default();
    graph.add_node(service("api", ServiceCategory::Service, 3, 0.5, 512)).unwrap();
    graph.add_node(service("db", ServiceCategory::Database, 2, 2.0, 4096)).unwrap();
    graph.add_node(service("cache", ServiceCategory::Cache, 1, 0.25, 256)).unwrap();

    let totals = resource_totals(&graph);
    assert_eq!(totals.services, 3);
    assert_eq!(totals.replicas, 6);
    // per-replica resources times replicas
    assert!((totals.cpu - 5.75).abs() < 1e-9);
    assert_eq!(totals.memory, 9984);
}

// =============================================================================
// Persistence
// =============================================================================

#[test]
fn test_save_and_load_round_trip() {
    let dir = TempDir::new().unwrap();
    let graph = graph_with(3, &[(0, 1), (1, 2)]);
    graph.save(dir.path()).unwrap();

    let loaded = ArchitectureGraph::load(dir.path()).unwrap();
    assert_eq!(loaded.to_document(), graph.to_document());
}

#[test]
fn test_load_missing_store_is_empty() {
    let dir = TempDir::new().unwrap();
    assert!(ArchitectureGraph::load(dir.path()).unwrap().is_empty());
}

// =============================================================================
// Simulation
// =============================================================================

#[test]
fn test_same_seed_same_snapshots() {
    let graph = graph_with(4, &[(0, 1), (1, 2), (1, 3)]);
    let config = SimulationConfig::default();

    let mut a = SimulationEngine::new(graph.clone(), &config);
    let mut b = SimulationEngine::new(graph.clone(), &config);
    assert_eq!(a.run(10), b.run(10));

    let mut c = SimulationEngine::new(graph, &SimulationConfig { seed: 43, ..config });
    let mut d = SimulationEngine::new(graph_with(4, &[(0, 1), (1, 2), (1, 3)]), &SimulationConfig::default());
    assert_ne!(c.run(3), d.run(3));
}

#[test]
fn test_every_failure_recovers() {
    let mut graph = graph_with(2, &[(0, 1)]);
    graph.add_node(service("db", ServiceCategory::Database, 1, 1.0, 1024)).unwrap();
    graph
        .connect("svc:s1", "svc:db", CommunicationType::Sync, None)
        .unwrap();

    for pattern in FailurePattern::ALL {
        let mut engine = SimulationEngine::new(graph.clone(), &SimulationConfig::default());
        let target = if pattern == FailurePattern::DatabaseOutage { "svc:db" } else { "svc:s1" };
        engine.inject(target, pattern).unwrap();
        assert_ne!(engine.health(target), Some(HealthState::Healthy));

        let recover = pattern.spec().duration + Duration::from_secs(10);
        engine.advance(recover);
        for node in engine.graph().nodes() {
            assert_eq!(engine.health(&node.id), Some(HealthState::Healthy), "{pattern} {}", node.id);
        }
    }
}
