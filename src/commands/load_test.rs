// SPDX-License-Identifier: AGPL-3.0-or-later
// SPDX-FileCopyrightText: 2025 Jonathan D.A. Jewell
//! Load-test command - push a traffic curve through the diagram

use super::CommandContext;
use crate::report;
use crate::simulation::load::{run_load_test, MAX_SAMPLES};
use crate::simulation::{LoadPattern, LoadProfile};
use anyhow::{bail, Result};
use std::time::Duration;

/// Load-test parameters
#[derive(Debug, Clone, clap::Args)]
pub struct LoadTestOptions {
    /// Traffic shape: constant, ramp-up, spike, step, wave
    #[arg(short, long, default_value = "ramp-up")]
    pub pattern: String,

    /// Quiet-period requests per second
    #[arg(long, default_value_t = 100.0)]
    pub base_rps: f64,

    /// Peak requests per second
    #[arg(long, default_value_t = 1000.0)]
    pub peak_rps: f64,

    /// Test length in seconds
    #[arg(short, long, default_value_t = 60)]
    pub duration: u64,

    /// Seconds between samples
    #[arg(short, long, default_value_t = 5)]
    pub step: u64,
}

/// Run the load test
pub fn run(ctx: &CommandContext, opts: &LoadTestOptions) -> Result<()> {
    let pattern: LoadPattern = opts.pattern.parse().map_err(|e: String| anyhow::anyhow!(e))?;
    if opts.base_rps < 0.0 || opts.peak_rps < opts.base_rps {
        bail!("Need 0 <= base rps <= peak rps, got {} and {}", opts.base_rps, opts.peak_rps);
    }
    if opts.step == 0 {
        bail!("--step must be at least 1 second");
    }
    if opts.duration / opts.step >= MAX_SAMPLES as u64 {
        bail!(
            "{}s at {}s steps exceeds {} samples; use a larger --step",
            opts.duration,
            opts.step,
            MAX_SAMPLES
        );
    }

    let graph = ctx.load_graph()?;
    if graph.is_empty() {
        bail!("Diagram is empty. Add services before load testing.");
    }

    let profile = LoadProfile {
        pattern,
        base_rps: opts.base_rps,
        peak_rps: opts.peak_rps,
        duration: Duration::from_secs(opts.duration),
    };
    let result = run_load_test(&graph, &profile, Duration::from_secs(opts.step));

    if ctx.json {
        return super::print_json(&result);
    }
    print!("{}", report::load_test(&result, ctx.palette()));
    Ok(())
}
