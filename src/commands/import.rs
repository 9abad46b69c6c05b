// SPDX-License-Identifier: AGPL-3.0-or-later
// SPDX-FileCopyrightText: 2025 Jonathan D.A. Jewell
//! Import command - replace the stored diagram with a JSON document

use super::CommandContext;
use crate::document::import_json;
use anyhow::{Context, Result};
use std::fs;
use std::path::Path;
use tracing::info;

/// Validate and store the document at `file`
///
/// An invalid document leaves the stored diagram untouched.
pub fn run(ctx: &CommandContext, file: &Path) -> Result<()> {
    let content = fs::read_to_string(file)
        .with_context(|| format!("Failed to read {}", file.display()))?;
    let graph = import_json(&content)
        .with_context(|| format!("Failed to import {}", file.display()))?;

    ctx.save_graph(&graph)?;
    info!("Imported {} from {}", graph.metadata().name, file.display());

    println!(
        "Imported '{}': {} services, {} links",
        graph.metadata().name,
        graph.node_count(),
        graph.edge_count()
    );
    Ok(())
}
