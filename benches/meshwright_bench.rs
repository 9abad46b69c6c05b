// SPDX-License-Identifier: AGPL-3.0-or-later
// SPDX-FileCopyrightText: 2025 Jonathan D.A. Jewell
//! Benchmarks for analysis and simulation over generated diagrams

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use meshwright::analysis::analyze_all;
use meshwright::config::{AnalysisConfig, SimulationConfig};
use meshwright::graph::ArchitectureGraph;
use meshwright::simulation::load::run_load_test;
use meshwright::simulation::{LoadPattern, LoadProfile, SimulationEngine};
use meshwright::types::{CommunicationType, Position, ServiceCategory, ServiceConfig, ServiceNode};
use std::time::Duration;

/// Layered diagram: each node calls the next two, with a back edge every tenth
fn layered(n: usize) -> ArchitectureGraph {
    let mut graph = ArchitectureGraph::default();
    for i in 0..n {
        let category = ServiceCategory::ALL[i % ServiceCategory::ALL.len()];
        let node = ServiceNode::new(ServiceConfig::new(format!("s{i}"), category), Position::default());
        let _ = graph.add_node(node);
    }
    for i in 0..n {
        for j in [i + 1, i + 2] {
            if j < n {
                let _ = graph.connect(&format!("svc:s{i}"), &format!("svc:s{j}"), CommunicationType::Sync, None);
            }
        }
        if i % 10 == 9 {
            let _ = graph.connect(&format!("svc:s{i}"), &format!("svc:s{}", i - 9), CommunicationType::Async, None);
        }
    }
    graph
}

fn bench_analysis(c: &mut Criterion) {
    let mut group = c.benchmark_group("analyze_all");
    for n in [10, 100, 500] {
        let graph = layered(n);
        group.bench_with_input(BenchmarkId::from_parameter(n), &graph, |b, g| {
            b.iter(|| analyze_all(black_box(g), &AnalysisConfig::default()));
        });
    }
    group.finish();
}

fn bench_simulation(c: &mut Criterion) {
    let graph = layered(100);
    c.bench_function("simulate_100_nodes_10_ticks", |b| {
        b.iter(|| {
            let mut engine = SimulationEngine::new(graph.clone(), &SimulationConfig::default());
            black_box(engine.run(10))
        });
    });

    let profile = LoadProfile {
        pattern: LoadPattern::Wave,
        base_rps: 100.0,
        peak_rps: 5000.0,
        duration: Duration::from_secs(300),
    };
    c.bench_function("load_test_100_nodes", |b| {
        b.iter(|| run_load_test(black_box(&graph), &profile, Duration::from_secs(5)));
    });
}

criterion_group!(benches, bench_analysis, bench_simulation);
criterion_main!(benches);
