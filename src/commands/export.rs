// SPDX-License-Identifier: AGPL-3.0-or-later
// SPDX-FileCopyrightText: 2025 Jonathan D.A. Jewell
//! Export command - write the diagram as JSON, YAML or DOT

use super::CommandContext;
use crate::document::{export, ExportFormat};
use anyhow::{Context, Result};
use std::fs;
use std::io::Write;
use std::path::PathBuf;
use tracing::info;

/// Run the export command
///
/// An output directory receives `architecture.<ext>` for the chosen format.
pub fn run(ctx: &CommandContext, format: &str, output: Option<PathBuf>) -> Result<()> {
    info!("Exporting to {}", format);

    let export_format = ExportFormat::parse(format)
        .ok_or_else(|| anyhow::anyhow!("Unknown export format: {}. Supported: json, yaml, dot", format))?;

    let graph = ctx.load_graph()?;
    if graph.is_empty() {
        eprintln!("Warning: Diagram is empty. Run 'meshwright node add' or 'meshwright import' first.");
    }

    let content = export(&graph, export_format)?;

    match output {
        Some(path) => {
            let path = if path.is_dir() {
                path.join(format!("architecture.{}", export_format.extension()))
            } else {
                path
            };
            fs::write(&path, &content)
                .with_context(|| format!("Failed to write to {}", path.display()))?;
            println!("Exported to {}", path.display());
        }
        None => {
            let mut stdout = std::io::stdout().lock();
            stdout.write_all(content.as_bytes())?;
            if !content.ends_with('\n') {
                stdout.write_all(b"\n")?;
            }
        }
    }

    Ok(())
}
