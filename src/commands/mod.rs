// SPDX-License-Identifier: AGPL-3.0-or-later
// SPDX-FileCopyrightText: 2025 Jonathan D.A. Jewell
//
//! Command implementations

pub mod analyze;
pub mod chaos;
pub mod completions;
pub mod config;
pub mod edge;
pub mod export;
pub mod import;
pub mod load_test;
pub mod new;
pub mod node;
pub mod simulate;

use crate::config::Config;
use crate::graph::ArchitectureGraph;
use crate::report::Palette;
use anyhow::{Context, Result};
use serde::Serialize;
use std::path::PathBuf;

/// Settings shared by every command
#[derive(Debug, Clone)]
pub struct CommandContext {
    /// Loaded configuration
    pub config: Config,
    /// Config file written by `config <key> <value>`
    pub config_path: PathBuf,
    /// Directory holding the diagram
    pub data_dir: PathBuf,
    /// Emit JSON instead of text
    pub json: bool,
    /// Colour text output
    pub color: bool,
}

impl CommandContext {
    /// Build a context; `data_dir` overrides the configured directory
    #[must_use]
    pub fn new(config: Config, config_path: PathBuf, data_dir: Option<PathBuf>, json: bool, color: bool) -> Self {
        let data_dir = data_dir.unwrap_or_else(|| config.data_dir.clone());
        Self {
            config,
            config_path,
            data_dir,
            json,
            color,
        }
    }

    /// Palette for text output
    #[must_use]
    pub fn palette(&self) -> Palette {
        Palette::new(self.color)
    }

    /// Load the stored diagram
    pub fn load_graph(&self) -> Result<ArchitectureGraph> {
        ArchitectureGraph::load(&self.data_dir)
            .with_context(|| format!("Failed to load diagram from {}", self.data_dir.display()))
    }

    /// Persist the diagram
    pub fn save_graph(&self, graph: &ArchitectureGraph) -> Result<()> {
        graph
            .save(&self.data_dir)
            .with_context(|| format!("Failed to save diagram to {}", self.data_dir.display()))
    }
}

/// Print a value as pretty JSON on stdout
pub fn print_json<T: Serialize>(value: &T) -> Result<()> {
    let text = serde_json::to_string_pretty(value).context("Failed to serialize output")?;
    println!("{text}");
    Ok(())
}
