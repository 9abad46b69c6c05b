// SPDX-License-Identifier: AGPL-3.0-or-later
// SPDX-FileCopyrightText: 2025 Jonathan D.A. Jewell
//! Config command - read or persist a configuration key

use super::CommandContext;
use crate::config::{get_key, set_key};
use anyhow::Result;
use tracing::info;

/// Print `key`, or write `value` to it in the config file
pub fn run(ctx: &CommandContext, key: &str, value: Option<String>) -> Result<()> {
    match value {
        Some(v) => {
            info!("Setting {} = {}", key, v);
            set_key(&ctx.config_path, key, &v)?;
            println!("Set {} = {} in {}", key, v, ctx.config_path.display());
        }
        None => {
            let current = get_key(&ctx.config, key)?;
            if ctx.json {
                super::print_json(&serde_json::json!({ "key": key, "value": current }))?;
            } else {
                println!("{current}");
            }
        }
    }
    Ok(())
}
