// SPDX-License-Identifier: AGPL-3.0-or-later
// SPDX-FileCopyrightText: 2025 Jonathan D.A. Jewell
//! Configuration management
//!
//! Layers, lowest precedence first: built-in defaults, the TOML config file,
//! then `MESHWRIGHT_*` environment variables (`__` separates nested keys,
//! e.g. `MESHWRIGHT_SIMULATION__SEED=7`).

use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Keys accepted by `meshwright config <key> <value>`
pub const KNOWN_KEYS: &[&str] = &[
    "data_dir",
    "log_level",
    "analysis.bottleneck_threshold",
    "analysis.sync_chain_limit",
    "analysis.fan_in_limit",
    "simulation.seed",
    "simulation.tick_interval_ms",
    "simulation.recovery_window_secs",
    "simulation.max_cascade_depth",
    "simulation.base_load_rps",
];

/// Application configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Directory holding the persisted diagram
    pub data_dir: PathBuf,
    /// Log level (trace, debug, info, warn, error)
    pub log_level: String,
    /// Analyzer thresholds
    pub analysis: AnalysisConfig,
    /// Simulation parameters
    pub simulation: SimulationConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            data_dir: project_dirs()
                .map(|d| d.data_dir().to_path_buf())
                .unwrap_or_else(|| PathBuf::from(".meshwright")),
            log_level: "info".to_string(),
            analysis: AnalysisConfig::default(),
            simulation: SimulationConfig::default(),
        }
    }
}

/// Thresholds used by the analyzers
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalysisConfig {
    /// A node with more connections than this is a bottleneck
    pub bottleneck_threshold: usize,
    /// Longest acceptable chain of synchronous hops
    pub sync_chain_limit: usize,
    /// Direct consumers a database tolerates before it is flagged
    pub fan_in_limit: usize,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            bottleneck_threshold: 3,
            sync_chain_limit: 3,
            fan_in_limit: 3,
        }
    }
}

/// Parameters for the simulation engine
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulationConfig {
    /// RNG seed; identical seeds replay identical runs
    pub seed: u64,
    /// Virtual time between metric ticks
    pub tick_interval_ms: u64,
    /// Time a node spends recovering before it is healthy again
    pub recovery_window_secs: u64,
    /// How many hops a failure may cascade upstream
    pub max_cascade_depth: usize,
    /// Background traffic entering the diagram during metric ticks
    pub base_load_rps: f64,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            seed: 42,
            tick_interval_ms: 1000,
            recovery_window_secs: 10,
            max_cascade_depth: 3,
            base_load_rps: 100.0,
        }
    }
}

/// Platform directories for meshwright
#[must_use]
pub fn project_dirs() -> Option<directories::ProjectDirs> {
    directories::ProjectDirs::from("org", "hyperpolymath", "meshwright")
}

/// Config file used when none is given on the command line
#[must_use]
pub fn default_config_path() -> PathBuf {
    project_dirs()
        .map(|d| d.config_dir().join("meshwright.toml"))
        .unwrap_or_else(|| PathBuf::from("meshwright.toml"))
}

/// Load configuration from defaults, file and environment
///
/// A missing file is skipped, since `config <key> <value>` creates it on
/// first write.
pub fn load(path: Option<&Path>) -> Result<Config> {
    let file = path.map_or_else(default_config_path, Path::to_path_buf);

    let settings = config::Config::builder()
        .add_source(config::Config::try_from(&Config::default())?)
        .add_source(config::File::from(file.as_path()).format(config::FileFormat::Toml).required(false))
        .add_source(
            config::Environment::with_prefix("MESHWRIGHT")
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true),
        )
        .build()
        .with_context(|| format!("Failed to load configuration from {}", file.display()))?;

    settings.try_deserialize().context("Invalid configuration")
}

/// Read a dotted key from a loaded configuration
pub fn get_key(config: &Config, key: &str) -> Result<String> {
    let value = toml::Value::try_from(config).context("Failed to serialize configuration")?;
    let mut current = &value;
    for part in key.split('.') {
        current = current
            .get(part)
            .ok_or_else(|| anyhow::anyhow!("Unknown config key: {}", key))?;
    }
    Ok(match current {
        toml::Value::String(s) => s.clone(),
        other => other.to_string(),
    })
}

/// Persist a dotted key into a TOML config file
///
/// Keys whose default is a string always store a string. Other values are
/// stored as an integer, float or boolean when they parse as one. The merged
/// file must still deserialize.
pub fn set_key(path: &Path, key: &str, value: &str) -> Result<()> {
    if !KNOWN_KEYS.contains(&key) {
        bail!("Unknown config key: {}. Valid: {}", key, KNOWN_KEYS.join(", "));
    }

    let mut table: toml::Table = if path.exists() {
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display()))?;
        content
            .parse()
            .with_context(|| format!("Failed to parse {}", path.display()))?
    } else {
        toml::Table::new()
    };

    let parsed = if default_is_string(key)? {
        toml::Value::String(value.to_string())
    } else {
        parse_scalar(value)
    };
    let mut parts: Vec<&str> = key.split('.').collect();
    let leaf = parts.pop().unwrap_or(key);
    let mut current = &mut table;
    for part in parts {
        current = current
            .entry(part)
            .or_insert(toml::Value::Table(toml::Table::new()))
            .as_table_mut()
            .ok_or_else(|| anyhow::anyhow!("Config key {} is not a table", part))?;
    }
    current.insert(leaf.to_string(), parsed);

    let rendered = toml::to_string_pretty(&table).context("Failed to serialize configuration")?;
    toml::from_str::<Config>(&rendered).with_context(|| format!("Invalid value for {key}: {value}"))?;

    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create directory {}", parent.display()))?;
    }
    fs::write(path, rendered).with_context(|| format!("Failed to write {}", path.display()))?;
    Ok(())
}

fn default_is_string(key: &str) -> Result<bool> {
    let defaults = toml::Value::try_from(Config::default()).context("Failed to serialize configuration")?;
    let current = key.split('.').try_fold(&defaults, |v, part| v.get(part));
    Ok(matches!(current, Some(toml::Value::String(_))))
}

fn parse_scalar(value: &str) -> toml::Value {
    if let Ok(i) = value.parse::<i64>() {
        toml::Value::Integer(i)
    } else if let Ok(f) = value.parse::<f64>() {
        toml::Value::Float(f)
    } else if let Ok(b) = value.parse::<bool>() {
        toml::Value::Boolean(b)
    } else {
        toml::Value::String(value.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_defaults() {
        let config = Config::default();

        assert_eq!(config.analysis.bottleneck_threshold, 3);
        assert_eq!(config.simulation.seed, 42);
        assert_eq!(config.simulation.recovery_window_secs, 10);
    }

    #[test]
    fn test_set_then_load() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("meshwright.toml");

        set_key(&path, "simulation.seed", "7").unwrap();
        set_key(&path, "analysis.bottleneck_threshold", "5").unwrap();

        let config = load(Some(&path)).unwrap();
        assert_eq!(config.simulation.seed, 7);
        assert_eq!(config.analysis.bottleneck_threshold, 5);
        assert_eq!(get_key(&config, "simulation.seed").unwrap(), "7");
    }

    #[test]
    fn test_set_rejects_unknown_key_and_bad_value() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("meshwright.toml");

        assert!(set_key(&path, "simulation.warp_speed", "9").is_err());
        assert!(set_key(&path, "simulation.seed", "soon").is_err());
        assert!(!path.exists());
    }

    #[test]
    fn test_string_keys_keep_numeric_looking_values() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("meshwright.toml");

        set_key(&path, "data_dir", "2024").unwrap();
        set_key(&path, "log_level", "true").unwrap();

        let config = load(Some(&path)).unwrap();
        assert_eq!(config.data_dir, PathBuf::from("2024"));
        assert_eq!(config.log_level, "true");
        assert!(fs::read_to_string(&path).unwrap().contains("data_dir = \"2024\""));
    }

    #[test]
    fn test_get_unknown_key() {
        assert!(get_key(&Config::default(), "nope.nothing").is_err());
    }
}
