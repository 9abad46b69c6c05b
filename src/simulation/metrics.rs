// SPDX-License-Identifier: AGPL-3.0-or-later
// SPDX-FileCopyrightText: 2025 Jonathan D.A. Jewell
//! Synthetic per-node metrics

use super::distributions::{clamp_unit, gamma, log_normal_median, normal};
use super::HealthState;
use crate::types::ServiceNode;
use rand::Rng;
use serde::Serialize;

/// Latency reported for requests against a failed node
pub const TIMEOUT_MS: f64 = 30_000.0;

/// Extra stress applied to a node by an active failure
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Pressure {
    /// Multiplier on sampled latency
    pub latency_factor: f64,
    /// Added CPU utilisation, as a fraction
    pub cpu: f64,
    /// Added memory utilisation, as a fraction
    pub memory: f64,
}

impl Pressure {
    /// No extra stress
    pub const NONE: Self = Self {
        latency_factor: 1.0,
        cpu: 0.0,
        memory: 0.0,
    };
}

impl Default for Pressure {
    fn default() -> Self {
        Self::NONE
    }
}

/// Metrics sampled for one node at one tick
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NodeMetrics {
    /// Node ID
    pub node_id: String,
    /// Health at sampling time
    pub health: HealthState,
    /// CPU utilisation, 0-100
    pub cpu_percent: f64,
    /// Memory utilisation, 0-100
    pub memory_percent: f64,
    /// Median latency
    pub latency_p50_ms: f64,
    /// 95th percentile latency
    pub latency_p95_ms: f64,
    /// 99th percentile latency
    pub latency_p99_ms: f64,
    /// Successfully served requests per second
    pub throughput_rps: f64,
    /// Fraction of failed requests, 0-1
    pub error_rate: f64,
}

/// Sample metrics for a node receiving `load_rps`
///
/// Utilisation is load over capacity (replicas times the per-replica
/// capacity of the category). Latency is log-normal around the category
/// base latency, inflated as utilisation approaches 1; tails come from
/// gamma-distributed factors so p50 <= p95 <= p99 always holds.
pub fn sample_node<R: Rng + ?Sized>(
    rng: &mut R,
    node: &ServiceNode,
    load_rps: f64,
    health: HealthState,
    pressure: Pressure,
) -> NodeMetrics {
    if health == HealthState::Failed {
        return NodeMetrics {
            node_id: node.id.clone(),
            health,
            cpu_percent: (normal(rng, 2.0, 1.0)).clamp(0.0, 100.0),
            memory_percent: (normal(rng, 5.0, 2.0)).clamp(0.0, 100.0),
            latency_p50_ms: TIMEOUT_MS,
            latency_p95_ms: TIMEOUT_MS,
            latency_p99_ms: TIMEOUT_MS,
            throughput_rps: 0.0,
            error_rate: 1.0,
        };
    }

    let category = node.category();
    let capacity = category.capacity_per_replica() * f64::from(node.config.replicas);
    let utilization = (load_rps.max(0.0) / capacity).min(1.5);

    let cpu_percent = (normal(rng, 15.0 + 70.0 * utilization.min(1.0), 5.0) + pressure.cpu * 100.0)
        .clamp(0.0, 100.0);
    let memory_percent = (normal(rng, 30.0 + 40.0 * utilization.min(1.0), 4.0) + pressure.memory * 100.0)
        .clamp(0.0, 100.0);

    // queueing inflation, bounded at 20x
    let congestion = 1.0 / (1.0 - utilization.min(0.95));
    let median = category.base_latency_ms() * congestion * pressure.latency_factor * health.latency_multiplier();
    let p50 = log_normal_median(rng, median, 0.25);
    let p95 = p50 * (1.0 + gamma(rng, 2.0, 0.5));
    let p99 = p95 * (1.0 + gamma(rng, 2.0, 0.35));

    let overload = if utilization > 1.0 { (utilization - 1.0) / utilization } else { 0.0 };
    let mut error_rate = clamp_unit(gamma(rng, 1.0, 0.002) + overload);
    if health == HealthState::Degraded {
        error_rate = error_rate.max(0.05);
    }

    let served = load_rps.max(0.0).min(capacity);
    let throughput_rps = (served * (1.0 - error_rate) * normal(rng, 1.0, 0.02)).max(0.0);

    NodeMetrics {
        node_id: node.id.clone(),
        health,
        cpu_percent,
        memory_percent,
        latency_p50_ms: p50,
        latency_p95_ms: p95,
        latency_p99_ms: p99,
        throughput_rps,
        error_rate,
    }
}

/// Metrics for every node at one instant of virtual time
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MetricsSnapshot {
    /// Virtual time since the simulation started
    pub elapsed_ms: u64,
    /// One entry per node, in diagram order
    pub nodes: Vec<NodeMetrics>,
}

impl MetricsSnapshot {
    /// Metrics for a single node
    #[must_use]
    pub fn node(&self, id: &str) -> Option<&NodeMetrics> {
        self.nodes.iter().find(|m| m.node_id == id)
    }

    /// Sum of served requests per second
    #[must_use]
    pub fn total_throughput(&self) -> f64 {
        self.nodes.iter().map(|m| m.throughput_rps).sum()
    }

    /// Mean median latency over nodes that are serving
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn mean_latency_ms(&self) -> f64 {
        let serving: Vec<f64> = self
            .nodes
            .iter()
            .filter(|m| m.health.forwards_traffic())
            .map(|m| m.latency_p50_ms)
            .collect();
        if serving.is_empty() {
            0.0
        } else {
            serving.iter().sum::<f64>() / serving.len() as f64
        }
    }

    /// Nodes not currently healthy
    #[must_use]
    pub fn unhealthy(&self) -> usize {
        self.nodes.iter().filter(|m| m.health != HealthState::Healthy).count()
    }
}
