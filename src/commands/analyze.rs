// SPDX-License-Identifier: AGPL-3.0-or-later
// SPDX-FileCopyrightText: 2025 Jonathan D.A. Jewell
//! Analyze command - run the architecture, performance and security analyzers

use super::CommandContext;
use crate::analysis::{analyze_all, architecture, performance, security};
use crate::report;
use anyhow::{bail, Result};
use tracing::info;

/// Run analyzers selected by `kind` (all, architecture, performance, security)
pub fn run(ctx: &CommandContext, kind: &str) -> Result<()> {
    let graph = ctx.load_graph()?;
    let thresholds = &ctx.config.analysis;
    let palette = ctx.palette();
    info!("Analyzing {} services ({})", graph.node_count(), kind);

    if graph.is_empty() {
        eprintln!("Warning: Diagram is empty. Nothing to analyze.");
    }

    match kind {
        "all" => {
            let full = analyze_all(&graph, thresholds);
            if ctx.json {
                return super::print_json(&full);
            }
            println!("{}", report::architecture(&full.architecture, palette));
            println!("{}", report::performance(&full.performance, palette));
            print!("{}", report::security(&full.security, palette));
        }
        "architecture" | "arch" => {
            let r = architecture::analyze(&graph, thresholds);
            if ctx.json {
                return super::print_json(&r);
            }
            print!("{}", report::architecture(&r, palette));
        }
        "performance" | "perf" => {
            let r = performance::analyze(&graph, thresholds);
            if ctx.json {
                return super::print_json(&r);
            }
            print!("{}", report::performance(&r, palette));
        }
        "security" | "sec" => {
            let r = security::analyze(&graph);
            if ctx.json {
                return super::print_json(&r);
            }
            print!("{}", report::security(&r, palette));
        }
        other => {
            bail!("Unknown analysis: {}. Valid: all, architecture, performance, security", other);
        }
    }

    Ok(())
}
