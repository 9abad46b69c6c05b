// SPDX-License-Identifier: AGPL-3.0-or-later
// SPDX-FileCopyrightText: 2025 Jonathan D.A. Jewell
//! Performance analysis - request path latency and capacity rules

use super::{score_findings, Finding, Grade, Severity};
use crate::config::AnalysisConfig;
use crate::graph::ArchitectureGraph;
use petgraph::graph::NodeIndex;
use crate::types::ServiceCategory;
use serde::Serialize;
use tracing::info;

/// Network overhead added by every synchronous hop, in milliseconds
pub const SYNC_HOP_MS: f64 = 2.0;

/// Slowest chain of synchronous calls through the diagram
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CriticalPath {
    /// Node IDs from the entry point onwards
    pub nodes: Vec<String>,
    /// Processing plus network latency along the path
    pub latency_ms: f64,
    /// Lowest capacity of any node on the path, in requests per second
    pub capacity_rps: f64,
}

impl CriticalPath {
    /// Number of synchronous hops
    #[must_use]
    pub fn hops(&self) -> usize {
        self.nodes.len().saturating_sub(1)
    }
}

/// Result of [`analyze`]
#[derive(Debug, Clone, Serialize)]
pub struct PerformanceReport {
    /// 0-100
    pub score: u32,
    /// Letter grade of the score
    pub grade: Grade,
    /// Slowest synchronous path, if the diagram has nodes
    pub critical_path: Option<CriticalPath>,
    /// Rule violations
    pub findings: Vec<Finding>,
}

/// Run the performance rules
#[must_use]
pub fn analyze(graph: &ArchitectureGraph, config: &AnalysisConfig) -> PerformanceReport {
    let critical_path = critical_path(graph);
    let mut findings = Vec::new();

    if let Some(path) = &critical_path {
        if path.hops() > config.sync_chain_limit {
            let severity = if path.hops() > config.sync_chain_limit * 2 {
                Severity::High
            } else {
                Severity::Medium
            };
            findings.push(Finding {
                rule: "sync-chain-depth".into(),
                severity,
                message: format!(
                    "Synchronous call chain of {} hops ({:.0} ms) exceeds the limit of {}",
                    path.hops(),
                    path.latency_ms,
                    config.sync_chain_limit
                ),
                nodes: path.nodes.clone(),
                edges: vec![],
            });
        }
    }

    check_data_store_fan_in(graph, config.fan_in_limit, &mut findings);
    check_overloaded_single_replicas(graph, &mut findings);
    check_missing_cache(graph, &mut findings);
    check_sync_external_calls(graph, &mut findings);

    let score = score_findings(&findings);
    info!("Performance analysis: score {} with {} findings", score, findings.len());

    PerformanceReport {
        score,
        grade: Grade::from_score(score),
        critical_path,
        findings,
    }
}

/// Processing latency of a single node
#[must_use]
pub fn node_latency_ms(category: ServiceCategory) -> f64 {
    category.base_latency_ms()
}

/// Find the slowest chain of synchronous calls
///
/// Edges that close a cycle are dropped (DFS back edges), then the
/// longest path is taken over the remaining DAG in topological order.
#[must_use]
pub fn critical_path(graph: &ArchitectureGraph) -> Option<CriticalPath> {
    let nodes = graph.nodes();
    if nodes.is_empty() {
        return None;
    }

    let dag = graph.acyclic_where(|e| e.kind.is_synchronous());

    let latency: Vec<f64> = nodes.iter().map(|n| node_latency_ms(n.category())).collect();
    let mut best = latency.clone();
    let mut pred: Vec<Option<usize>> = vec![None; nodes.len()];

    for u in ArchitectureGraph::topological_positions(&dag) {
        for v in dag.neighbors(NodeIndex::new(u)).map(|n| dag[n]) {
            let candidate = best[u] + SYNC_HOP_MS + latency[v];
            if candidate > best[v] {
                best[v] = candidate;
                pred[v] = Some(u);
            }
        }
    }

    let end = (0..nodes.len()).fold(0, |acc, i| if best[i] > best[acc] { i } else { acc });
    let mut path = vec![end];
    let mut cursor = end;
    while let Some(p) = pred[cursor] {
        path.push(p);
        cursor = p;
    }
    path.reverse();

    let capacity_rps = path
        .iter()
        .map(|&i| nodes[i].category().capacity_per_replica() * f64::from(nodes[i].config.replicas))
        .fold(f64::INFINITY, f64::min);

    Some(CriticalPath {
        nodes: path.iter().map(|&i| nodes[i].id.clone()).collect(),
        latency_ms: best[end],
        capacity_rps,
    })
}

fn check_data_store_fan_in(graph: &ArchitectureGraph, limit: usize, findings: &mut Vec<Finding>) {
    for node in graph.nodes().iter().filter(|n| n.category() == ServiceCategory::Database) {
        let consumers = graph.edges_to(&node.id);
        if consumers.len() > limit {
            findings.push(Finding {
                rule: "data-store-fan-in".into(),
                severity: Severity::Medium,
                message: format!(
                    "{} is accessed directly by {} services; shared data stores couple their owners",
                    node.name(),
                    consumers.len()
                ),
                nodes: std::iter::once(node.id.clone())
                    .chain(consumers.iter().map(|e| e.source.clone()))
                    .collect(),
                edges: consumers.iter().map(|e| e.id.clone()).collect(),
            });
        }
    }
}

fn check_overloaded_single_replicas(graph: &ArchitectureGraph, findings: &mut Vec<Finding>) {
    for node in graph.nodes().iter().filter(|n| n.config.replicas == 1) {
        let inbound = graph.edges_to(&node.id).len();
        if inbound > 2 {
            findings.push(Finding {
                rule: "overloaded-single-replica".into(),
                severity: Severity::Medium,
                message: format!(
                    "{} serves {} callers with a single replica",
                    node.name(),
                    inbound
                ),
                nodes: vec![node.id.clone()],
                edges: vec![],
            });
        }
    }
}

fn check_missing_cache(graph: &ArchitectureGraph, findings: &mut Vec<Finding>) {
    if graph.nodes().iter().any(|n| n.category() == ServiceCategory::Cache) {
        return;
    }

    let read_by_services: Vec<String> = graph
        .nodes()
        .iter()
        .filter(|n| n.category() == ServiceCategory::Database)
        .filter(|db| {
            graph.edges_to(&db.id).iter().any(|e| {
                graph
                    .node(&e.source)
                    .is_some_and(|src| src.category() == ServiceCategory::Service)
            })
        })
        .map(|db| db.id.clone())
        .collect();

    if !read_by_services.is_empty() {
        findings.push(Finding {
            rule: "missing-cache".into(),
            severity: Severity::Low,
            message: format!(
                "{} database(s) are read by services with no cache layer in the diagram",
                read_by_services.len()
            ),
            nodes: read_by_services,
            edges: vec![],
        });
    }
}

fn check_sync_external_calls(graph: &ArchitectureGraph, findings: &mut Vec<Finding>) {
    for edge in graph.edges().iter().filter(|e| e.kind.is_synchronous()) {
        let Some(target) = graph.node(&edge.target) else {
            continue;
        };
        if target.category() == ServiceCategory::External {
            findings.push(Finding {
                rule: "sync-external-call".into(),
                severity: Severity::Low,
                message: format!(
                    "Synchronous call to external system {} puts its latency on the request path",
                    target.name()
                ),
                nodes: vec![edge.source.clone(), edge.target.clone()],
                edges: vec![edge.id.clone()],
            });
        }
    }
}
