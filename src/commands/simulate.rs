// SPDX-License-Identifier: AGPL-3.0-or-later
// SPDX-FileCopyrightText: 2025 Jonathan D.A. Jewell
//! Simulate command - sample synthetic metrics over virtual time

use super::CommandContext;
use crate::report;
use crate::simulation::SimulationEngine;
use anyhow::{bail, Result};

/// Tick the engine `ticks` times and print every snapshot
pub fn run(ctx: &CommandContext, ticks: usize, seed: Option<u64>) -> Result<()> {
    let graph = ctx.load_graph()?;
    if graph.is_empty() {
        bail!("Diagram is empty. Add services before simulating.");
    }

    let mut sim = ctx.config.simulation.clone();
    if let Some(seed) = seed {
        sim.seed = seed;
    }

    let mut engine = SimulationEngine::new(graph, &sim);
    let snapshots = engine.run(ticks);

    if ctx.json {
        return super::print_json(&snapshots);
    }

    let palette = ctx.palette();
    for snapshot in &snapshots {
        println!("{}", report::snapshot(snapshot, palette));
    }
    Ok(())
}
