// SPDX-License-Identifier: AGPL-3.0-or-later
// SPDX-FileCopyrightText: 2025 Jonathan D.A. Jewell
//! Structural analysis: dependency cycles, bottlenecks, single points of
//! failure and resource totals

use crate::config::AnalysisConfig;
use crate::graph::ArchitectureGraph;
use serde::Serialize;
use tracing::{debug, info};

/// A node carrying more connections than the bottleneck threshold
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Bottleneck {
    /// Node ID
    pub node_id: String,
    /// Display name
    pub name: String,
    /// Inbound edge count
    pub inbound: usize,
    /// Outbound edge count
    pub outbound: usize,
}

impl Bottleneck {
    /// Inbound plus outbound
    #[must_use]
    pub fn connections(&self) -> usize {
        self.inbound + self.outbound
    }
}

/// A connected node running a single replica
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SinglePointOfFailure {
    /// Node ID
    pub node_id: String,
    /// Display name
    pub name: String,
    /// Nodes calling into this one
    pub dependents: usize,
}

/// Aggregate resource reservation of the whole diagram
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ResourceTotals {
    /// Number of services
    pub services: usize,
    /// Sum of replicas
    pub replicas: u64,
    /// Sum of cpu * replicas, in cores
    pub cpu: f64,
    /// Sum of memory * replicas, in MiB
    pub memory: u64,
}

/// Size and connectivity measures
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Complexity {
    /// Node count
    pub nodes: usize,
    /// Edge count
    pub edges: usize,
    /// Mean of inbound + outbound edges per node
    pub average_degree: f64,
    /// E / (N * (N - 1))
    pub density: f64,
}

/// Result of [`analyze`]
#[derive(Debug, Clone, Serialize)]
pub struct ArchitectureReport {
    /// Dependency cycles, one node-ID list per cycle
    pub cycles: Vec<Vec<String>>,
    /// Over-connected nodes, most connected first
    pub bottlenecks: Vec<Bottleneck>,
    /// Single-replica connected nodes
    pub single_points_of_failure: Vec<SinglePointOfFailure>,
    /// Resource totals
    pub resources: ResourceTotals,
    /// Size and connectivity
    pub complexity: Complexity,
    /// Suggested changes
    pub recommendations: Vec<String>,
}

/// Run the structural analysis
#[must_use]
pub fn analyze(graph: &ArchitectureGraph, config: &AnalysisConfig) -> ArchitectureReport {
    let cycles = detect_cycles(graph);
    let bottlenecks = find_bottlenecks(graph, config.bottleneck_threshold);
    let single_points_of_failure = find_single_points_of_failure(graph);
    let resources = resource_totals(graph);
    let complexity = complexity(graph);

    info!(
        "Architecture analysis: {} cycles, {} bottlenecks, {} SPOFs",
        cycles.len(),
        bottlenecks.len(),
        single_points_of_failure.len()
    );

    let recommendations = recommend(graph, &cycles, &bottlenecks, &single_points_of_failure);

    ArchitectureReport {
        cycles,
        bottlenecks,
        single_points_of_failure,
        resources,
        complexity,
        recommendations,
    }
}

/// Find dependency cycles with a depth-first search
///
/// Roots are tried in node insertion order and neighbors in edge insertion
/// order. Each root records at most the first cycle its search meets, and
/// the visited set is shared between roots, so every cycle is reported once.
/// A cycle is listed from the node the back edge points at.
#[must_use]
pub fn detect_cycles(graph: &ArchitectureGraph) -> Vec<Vec<String>> {
    if !petgraph::algo::is_cyclic_directed(graph.petgraph()) {
        return Vec::new();
    }

    let adj = graph.adjacency();
    let mut visited = vec![false; adj.len()];
    let mut on_stack = vec![false; adj.len()];
    let mut cycles = Vec::new();

    for root in 0..adj.len() {
        if visited[root] {
            continue;
        }
        if let Some(cycle) = first_cycle_from(root, &adj, &mut visited, &mut on_stack) {
            let ids: Vec<String> = cycle.into_iter().map(|i| graph.nodes()[i].id.clone()).collect();
            debug!("Cycle found: {}", ids.join(" -> "));
            cycles.push(ids);
        }
    }

    cycles
}

/// Iterative DFS from `root`; keeps walking after a hit so that every node
/// reachable from the root ends up visited.
fn first_cycle_from(
    root: usize,
    adj: &[Vec<usize>],
    visited: &mut [bool],
    on_stack: &mut [bool],
) -> Option<Vec<usize>> {
    // (node, index of the next neighbor to explore)
    let mut frames: Vec<(usize, usize)> = vec![(root, 0)];
    visited[root] = true;
    on_stack[root] = true;
    let mut found = None;

    while let Some(frame) = frames.last_mut() {
        let node = frame.0;
        match adj[node].get(frame.1).copied() {
            Some(next) => {
                frame.1 += 1;
                if on_stack[next] {
                    if found.is_none() {
                        if let Some(start) = frames.iter().position(|f| f.0 == next) {
                            found = Some(frames[start..].iter().map(|f| f.0).collect());
                        }
                    }
                } else if !visited[next] {
                    visited[next] = true;
                    on_stack[next] = true;
                    frames.push((next, 0));
                }
            }
            None => {
                on_stack[node] = false;
                frames.pop();
            }
        }
    }

    found
}

/// Nodes whose inbound + outbound edge count exceeds `threshold`
#[must_use]
pub fn find_bottlenecks(graph: &ArchitectureGraph, threshold: usize) -> Vec<Bottleneck> {
    let mut found: Vec<Bottleneck> = graph
        .nodes()
        .iter()
        .map(|node| Bottleneck {
            node_id: node.id.clone(),
            name: node.name().to_string(),
            inbound: graph.edges_to(&node.id).len(),
            outbound: graph.edges_from(&node.id).len(),
        })
        .filter(|b| b.connections() > threshold)
        .collect();

    found.sort_by(|a, b| b.connections().cmp(&a.connections()));
    found
}

/// Connected nodes that run a single replica
#[must_use]
pub fn find_single_points_of_failure(graph: &ArchitectureGraph) -> Vec<SinglePointOfFailure> {
    graph
        .nodes()
        .iter()
        .filter(|node| node.config.replicas == 1 && graph.degree(&node.id) > 0)
        .map(|node| SinglePointOfFailure {
            node_id: node.id.clone(),
            name: node.name().to_string(),
            dependents: graph.edges_to(&node.id).len(),
        })
        .collect()
}

/// Sum cpu and memory over every replica
#[must_use]
pub fn resource_totals(graph: &ArchitectureGraph) -> ResourceTotals {
    graph.nodes().iter().fold(
        ResourceTotals {
            services: 0,
            replicas: 0,
            cpu: 0.0,
            memory: 0,
        },
        |mut acc, node| {
            let replicas = u64::from(node.config.replicas);
            acc.services += 1;
            acc.replicas += replicas;
            acc.cpu += node.config.cpu * f64::from(node.config.replicas);
            acc.memory += node.config.memory * replicas;
            acc
        },
    )
}

/// Size and connectivity measures
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn complexity(graph: &ArchitectureGraph) -> Complexity {
    let n = graph.node_count();
    let e = graph.edge_count();
    let average_degree = if n == 0 { 0.0 } else { (2 * e) as f64 / n as f64 };
    let density = if n < 2 { 0.0 } else { e as f64 / (n * (n - 1)) as f64 };

    Complexity {
        nodes: n,
        edges: e,
        average_degree,
        density,
    }
}

fn recommend(
    graph: &ArchitectureGraph,
    cycles: &[Vec<String>],
    bottlenecks: &[Bottleneck],
    spofs: &[SinglePointOfFailure],
) -> Vec<String> {
    let mut out = Vec::new();

    for cycle in cycles {
        let names: Vec<&str> = cycle
            .iter()
            .map(|id| graph.node(id).map_or(id.as_str(), |n| n.name()))
            .collect();
        out.push(format!(
            "Break the dependency cycle {} -> {} with an async event or a shared abstraction",
            names.join(" -> "),
            names.first().copied().unwrap_or_default()
        ));
    }

    for b in bottlenecks {
        out.push(format!(
            "{} has {} connections; consider splitting it or fronting it with a queue",
            b.name,
            b.connections()
        ));
    }

    for spof in spofs {
        out.push(format!("Run {} with at least 2 replicas", spof.name));
    }

    if graph.node_count() > 1 && graph.edge_count() == 0 {
        out.push("No services are connected; add communication links".into());
    }

    out
}
