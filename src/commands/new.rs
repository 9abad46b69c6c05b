// SPDX-License-Identifier: AGPL-3.0-or-later
// SPDX-FileCopyrightText: 2025 Jonathan D.A. Jewell
//! New command - start an empty diagram

use super::CommandContext;
use crate::graph::{ArchitectureGraph, STORE_FILE};
use crate::types::DiagramMetadata;
use anyhow::{bail, Result};
use tracing::info;

/// Create an empty diagram, refusing to clobber one unless `force`
pub fn run(ctx: &CommandContext, name: &str, description: Option<String>, force: bool) -> Result<()> {
    let path = ctx.data_dir.join(STORE_FILE);
    if path.exists() && !force {
        bail!(
            "A diagram already exists at {}. Use --force to replace it.",
            path.display()
        );
    }

    let graph = ArchitectureGraph::new(DiagramMetadata::new(name, description.unwrap_or_default()));
    ctx.save_graph(&graph)?;
    info!("Created diagram '{}' at {}", name, path.display());

    println!("Created diagram '{}'", name);
    println!("  stored in: {}", path.display());
    Ok(())
}
