// SPDX-License-Identifier: AGPL-3.0-or-later
// SPDX-FileCopyrightText: 2025 Jonathan D.A. Jewell
//! Chaos command - inject a failure and watch it cascade and recover

use super::CommandContext;
use crate::report;
use crate::simulation::{FailurePattern, MetricsSnapshot, SimulationEngine, SimulationEvent};
use anyhow::{bail, Result};
use serde::Serialize;
use std::time::Duration;
use tracing::info;

#[derive(Serialize)]
struct ChaosOutcome<'a> {
    target: String,
    pattern: FailurePattern,
    description: &'static str,
    cascaded: Vec<String>,
    during: MetricsSnapshot,
    after: MetricsSnapshot,
    events: &'a [SimulationEvent],
}

/// Inject `pattern` into `target`, then observe for `observe` seconds
pub fn run(
    ctx: &CommandContext,
    target: &str,
    pattern: &str,
    seed: Option<u64>,
    observe: u64,
) -> Result<()> {
    let pattern: FailurePattern = pattern.parse().map_err(|e: String| anyhow::anyhow!(e))?;
    let graph = ctx.load_graph()?;
    if graph.is_empty() {
        bail!("Diagram is empty. Add services before injecting failures.");
    }
    let target = graph.resolve(target)?;

    let mut sim = ctx.config.simulation.clone();
    if let Some(seed) = seed {
        sim.seed = seed;
    }

    let mut engine = SimulationEngine::new(graph, &sim);
    let cascaded = engine.inject(&target, pattern)?;
    info!("{} cascaded to {} node(s)", pattern, cascaded.len());

    let during = engine.tick();
    engine.advance(Duration::from_secs(observe));
    let after = engine.tick();

    if ctx.json {
        return super::print_json(&ChaosOutcome {
            target,
            pattern,
            description: pattern.description(),
            cascaded,
            during,
            after,
            events: engine.events(),
        });
    }

    let palette = ctx.palette();
    println!("{} {}: {}", palette.heading("Injected"), pattern, pattern.description());
    println!("  target: {}", target);
    if cascaded.is_empty() {
        println!("  No cascade.");
    } else {
        println!("  cascaded to: {}", cascaded.join(", "));
    }
    println!();
    println!("{}", report::snapshot(&during, palette));
    println!("{}", palette.heading("Events"));
    print!("{}", report::events(engine.events()));
    println!();
    print!("{}", report::snapshot(&after, palette));
    Ok(())
}
