// SPDX-License-Identifier: AGPL-3.0-or-later
// SPDX-FileCopyrightText: 2025 Jonathan D.A. Jewell
//
//! Meshwright CLI - design, analyze and simulate microservice architectures

use anyhow::Result;
use clap::{CommandFactory, Parser, Subcommand};
use meshwright::commands::{self, node::NodeOptions, load_test::LoadTestOptions, CommandContext};
use std::io::IsTerminal;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "meshwright")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Quiet mode (suppress non-error output)
    #[arg(short, long, global = true)]
    quiet: bool,

    /// Configuration file path
    #[arg(short, long, env = "MESHWRIGHT_CONFIG", global = true)]
    config: Option<std::path::PathBuf>,

    /// Data directory override
    #[arg(long, env = "MESHWRIGHT_DATA_DIR", global = true)]
    data_dir: Option<std::path::PathBuf>,

    /// Disable colored output
    #[arg(long, env = "NO_COLOR", global = true)]
    no_color: bool,

    /// Output in JSON format
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Start a new, empty diagram
    New {
        /// Diagram name
        #[arg(short, long)]
        name: String,

        /// Free-form description
        #[arg(short, long)]
        description: Option<String>,

        /// Replace an existing diagram
        #[arg(long)]
        force: bool,
    },

    /// Import a diagram from a JSON document
    Import {
        /// Document to import
        file: std::path::PathBuf,
    },

    /// Export the diagram to various formats
    Export {
        /// Output format (json, yaml, dot)
        #[arg(short, long, default_value = "json")]
        format: String,

        /// Output file (stdout if not specified)
        #[arg(short, long)]
        output: Option<std::path::PathBuf>,
    },

    /// Manage services
    Node {
        /// Action: add, set, remove, list
        action: String,

        #[command(flatten)]
        options: NodeOptions,
    },

    /// Manage communication links
    Edge {
        /// Action: add, remove, list
        action: String,

        /// Calling service (name or ID)
        #[arg(long)]
        from: Option<String>,

        /// Called service (name or ID)
        #[arg(long)]
        to: Option<String>,

        /// Link type: sync, async, data-flow, https, tls-async, encrypted-data
        #[arg(short = 't', long = "type")]
        kind: Option<String>,

        /// Link label
        #[arg(long)]
        label: Option<String>,

        /// Link ID (remove)
        #[arg(long)]
        id: Option<String>,
    },

    /// Analyze the diagram
    Analyze {
        /// Which analysis: all, architecture, performance, security
        #[arg(short, long, default_value = "all")]
        kind: String,
    },

    /// Sample synthetic metrics over virtual time
    Simulate {
        /// Number of ticks to run
        #[arg(short, long, default_value_t = 5)]
        ticks: usize,

        /// RNG seed (overrides simulation.seed)
        #[arg(long)]
        seed: Option<u64>,
    },

    /// Inject a failure and observe the cascade
    Chaos {
        /// Service to break (name or ID)
        #[arg(short, long)]
        target: String,

        /// Failure pattern: service-crash, latency-spike, memory-leak,
        /// cpu-exhaustion, network-partition, database-outage
        #[arg(short, long)]
        pattern: String,

        /// RNG seed (overrides simulation.seed)
        #[arg(long)]
        seed: Option<u64>,

        /// Virtual seconds to observe after injection
        #[arg(long, default_value_t = 60)]
        observe: u64,
    },

    /// Push a traffic curve through the diagram
    LoadTest {
        #[command(flatten)]
        options: LoadTestOptions,
    },

    /// Get or set configuration
    Config {
        /// Configuration key
        key: String,

        /// Value to set (omit to get)
        value: Option<String>,
    },

    /// Generate shell completions
    Completions {
        /// Shell type (bash, zsh, fish, powershell)
        shell: clap_complete::Shell,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let config = meshwright::config::load(cli.config.as_deref())?;

    // Initialize logging; RUST_LOG wins over flags
    let log_level = match cli.verbose {
        0 if cli.quiet => "error".to_string(),
        0 => config.log_level.clone(),
        1 => "debug".to_string(),
        _ => "trace".to_string(),
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(log_level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let config_path = cli
        .config
        .clone()
        .unwrap_or_else(meshwright::config::default_config_path);
    let color = !cli.no_color && std::io::stdout().is_terminal();
    let ctx = CommandContext::new(config, config_path, cli.data_dir, cli.json, color);

    // Execute command
    match cli.command {
        Commands::New { name, description, force } => {
            commands::new::run(&ctx, &name, description, force)
        }
        Commands::Import { file } => commands::import::run(&ctx, &file),
        Commands::Export { format, output } => commands::export::run(&ctx, &format, output),
        Commands::Node { action, options } => commands::node::run(&ctx, &action, &options),
        Commands::Edge { action, from, to, kind, label, id } => {
            commands::edge::run(&ctx, &action, from, to, kind, label, id)
        }
        Commands::Analyze { kind } => commands::analyze::run(&ctx, &kind),
        Commands::Simulate { ticks, seed } => commands::simulate::run(&ctx, ticks, seed),
        Commands::Chaos { target, pattern, seed, observe } => {
            commands::chaos::run(&ctx, &target, &pattern, seed, observe)
        }
        Commands::LoadTest { options } => commands::load_test::run(&ctx, &options),
        Commands::Config { key, value } => commands::config::run(&ctx, &key, value),
        Commands::Completions { shell } => {
            commands::completions::run(shell, &mut Cli::command())
        }
    }
}
