// SPDX-License-Identifier: AGPL-3.0-or-later
// SPDX-FileCopyrightText: 2025 Jonathan D.A. Jewell
//! Node management commands - place, edit and remove services

use super::CommandContext;
use crate::types::{Position, ServiceCategory, ServiceConfig, ServiceNode};
use anyhow::{bail, Context, Result};
use tracing::info;

/// Service fields accepted by `node add` and `node set`
#[derive(Debug, Clone, Default, clap::Args)]
pub struct NodeOptions {
    /// Service name (add), or the node to edit (set, remove)
    pub name: Option<String>,

    /// Category: gateway, service, database, cache, queue, auth, frontend,
    /// monitoring, storage, external
    #[arg(short = 'k', long)]
    pub category: Option<String>,

    /// Technology label, e.g. "Node.js"
    #[arg(long)]
    pub tech: Option<String>,

    /// Listening port
    #[arg(long)]
    pub port: Option<u16>,

    /// CPU cores per replica
    #[arg(long)]
    pub cpu: Option<f64>,

    /// Memory per replica in MiB
    #[arg(long)]
    pub memory: Option<u64>,

    /// Replica count
    #[arg(long)]
    pub replicas: Option<u32>,

    /// Environment variable as KEY=VALUE (repeatable)
    #[arg(short, long = "env", value_name = "KEY=VALUE")]
    pub env: Vec<String>,

    /// Remove an environment variable (repeatable)
    #[arg(long = "unset-env", value_name = "KEY")]
    pub unset_env: Vec<String>,

    /// Canvas X coordinate
    #[arg(long, allow_hyphen_values = true)]
    pub x: Option<f64>,

    /// Canvas Y coordinate
    #[arg(long, allow_hyphen_values = true)]
    pub y: Option<f64>,
}

impl NodeOptions {
    /// Overlay the given fields onto `config`
    fn apply(&self, config: &mut ServiceConfig) -> Result<()> {
        if let Some(tech) = &self.tech {
            config.tech_stack.clone_from(tech);
        }
        if let Some(port) = self.port {
            config.port = port;
        }
        if let Some(cpu) = self.cpu {
            config.cpu = cpu;
        }
        if let Some(memory) = self.memory {
            config.memory = memory;
        }
        if let Some(replicas) = self.replicas {
            config.replicas = replicas;
        }
        for pair in &self.env {
            let (key, value) = pair
                .split_once('=')
                .with_context(|| format!("Environment entry must be KEY=VALUE, got '{pair}'"))?;
            config.environment.insert(key.trim().to_string(), value.to_string());
        }
        for key in &self.unset_env {
            config.environment.remove(key);
        }
        Ok(())
    }
}

/// Run node command
pub fn run(ctx: &CommandContext, action: &str, opts: &NodeOptions) -> Result<()> {
    let mut graph = ctx.load_graph()?;

    match action {
        "add" | "create" => {
            let name = opts
                .name
                .as_deref()
                .ok_or_else(|| anyhow::anyhow!("A service name is required"))?;
            let category: ServiceCategory = opts
                .category
                .as_deref()
                .unwrap_or("service")
                .parse()
                .map_err(|e: String| anyhow::anyhow!(e))?;

            let mut config = ServiceConfig::new(name, category);
            opts.apply(&mut config)?;
            let position = Position {
                x: opts.x.unwrap_or_default(),
                y: opts.y.unwrap_or_default(),
            };
            let node = ServiceNode::new(config, position);
            let id = node.id.clone();

            graph.add_node(node)?;
            ctx.save_graph(&graph)?;
            info!("Added node {}", id);

            println!("Added {} ({})", name, category);
            println!("  id: {}", id);
        }

        "set" | "update" => {
            let target = opts
                .name
                .as_deref()
                .ok_or_else(|| anyhow::anyhow!("Which node? Pass a name or ID"))?;
            if opts.category.is_some() {
                bail!("A node's category cannot change; remove and re-add it instead");
            }
            let id = graph.resolve(target)?;
            let node = graph
                .node(&id)
                .ok_or_else(|| anyhow::anyhow!("Node vanished: {}", id))?;
            let mut config = node.config.clone();
            let mut position = node.position;

            opts.apply(&mut config)?;
            graph.update_config(&id, config)?;
            if opts.x.is_some() || opts.y.is_some() {
                position.x = opts.x.unwrap_or(position.x);
                position.y = opts.y.unwrap_or(position.y);
                graph.move_node(&id, position)?;
            }
            ctx.save_graph(&graph)?;

            println!("Updated {}", id);
        }

        "remove" | "delete" | "rm" => {
            let target = opts
                .name
                .as_deref()
                .ok_or_else(|| anyhow::anyhow!("Which node? Pass a name or ID"))?;
            let id = graph.resolve(target)?;
            let edges = graph.degree(&id);
            graph.remove_node(&id)?;
            ctx.save_graph(&graph)?;

            println!("Removed {} and {} attached link(s)", id, edges);
        }

        "list" | "ls" => {
            if ctx.json {
                return super::print_json(&graph.nodes());
            }
            if graph.is_empty() {
                println!("No services defined. Use 'meshwright node add' to create one.");
                return Ok(());
            }

            println!("Services ({}):", graph.node_count());
            for node in graph.nodes() {
                let c = &node.config;
                println!(
                    "  {:<24} {:<10} {:<14} :{:<5} {}x {:.2} cpu {} MiB",
                    node.id,
                    c.category.to_string(),
                    c.tech_stack,
                    c.port,
                    c.replicas,
                    c.cpu,
                    c.memory
                );
            }
        }

        other => {
            bail!("Unknown action: {}. Valid: add, set, remove, list", other);
        }
    }

    Ok(())
}
