// SPDX-License-Identifier: AGPL-3.0-or-later
// SPDX-FileCopyrightText: 2025 Jonathan D.A. Jewell
//! Edge management commands - connect and disconnect services

use super::CommandContext;
use crate::types::CommunicationType;
use anyhow::{bail, Result};
use tracing::info;

/// Run edge command
pub fn run(
    ctx: &CommandContext,
    action: &str,
    from: Option<String>,
    to: Option<String>,
    kind: Option<String>,
    label: Option<String>,
    id: Option<String>,
) -> Result<()> {
    let mut graph = ctx.load_graph()?;

    match action {
        "add" | "create" | "connect" => {
            let from = from.ok_or_else(|| anyhow::anyhow!("--from is required"))?;
            let to = to.ok_or_else(|| anyhow::anyhow!("--to is required"))?;
            let kind: CommunicationType = kind
                .as_deref()
                .unwrap_or("sync")
                .parse()
                .map_err(|e: String| anyhow::anyhow!(e))?;

            // Resolve node IDs (allow short names)
            let from_id = graph.resolve(&from)?;
            let to_id = graph.resolve(&to)?;

            let edge_id = graph.connect(&from_id, &to_id, kind, label.clone())?;
            ctx.save_graph(&graph)?;
            info!("Connected {} -> {} ({})", from_id, to_id, kind);

            println!("Created link: {} -> {} ({})", from_id, to_id, kind);
            if let Some(l) = label {
                println!("  label: {}", l);
            }
            println!("  id: {}", edge_id);
        }

        "remove" | "delete" | "rm" => {
            if let Some(edge_id) = id {
                let edge = graph.disconnect(&edge_id)?;
                ctx.save_graph(&graph)?;
                println!("Removed link {} -> {}", edge.source, edge.target);
                return Ok(());
            }

            let from = from.ok_or_else(|| anyhow::anyhow!("--from is required (or --id)"))?;
            let to = to.ok_or_else(|| anyhow::anyhow!("--to is required (or --id)"))?;
            let from_id = graph.resolve(&from)?;
            let to_id = graph.resolve(&to)?;

            let removed = graph.disconnect_between(&from_id, &to_id);
            if removed > 0 {
                ctx.save_graph(&graph)?;
                println!("Removed {} link(s) from {} -> {}", removed, from_id, to_id);
            } else {
                println!("No links found from {} -> {}", from_id, to_id);
            }
        }

        "list" | "ls" => {
            if ctx.json {
                return super::print_json(&graph.edges());
            }
            if graph.edges().is_empty() {
                println!("No links defined. Use 'meshwright edge add' to create one.");
                return Ok(());
            }

            println!("Links ({}):", graph.edge_count());
            for edge in graph.edges() {
                let from_name = graph.node(&edge.source).map_or(edge.source.as_str(), |n| n.name());
                let to_name = graph.node(&edge.target).map_or(edge.target.as_str(), |n| n.name());
                let label = edge.label.as_deref().unwrap_or("");
                println!("  {} --[{}/{}]--> {}  ({})", from_name, edge.kind, label, to_name, edge.id);
            }
        }

        other => {
            bail!("Unknown action: {}. Valid: add, remove, list", other);
        }
    }

    Ok(())
}
