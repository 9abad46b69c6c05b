// SPDX-License-Identifier: AGPL-3.0-or-later
// SPDX-FileCopyrightText: 2025 Jonathan D.A. Jewell
//
//! Seeded simulation over an architecture diagram
//!
//! Time is virtual: the engine's clock only moves when it is ticked or
//! advanced, so failure recovery is a deadline check rather than a timer.

pub mod distributions;
pub mod engine;
pub mod failure;
pub mod load;
pub mod metrics;

use serde::{Deserialize, Serialize};
use std::fmt;

pub use engine::{SimulationEngine, SimulationEvent};
pub use failure::FailurePattern;
pub use load::{LoadPattern, LoadProfile};
pub use metrics::{MetricsSnapshot, NodeMetrics};

/// Health of a node during simulation
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HealthState {
    /// Operating normally
    #[default]
    Healthy,
    /// Serving with elevated latency or errors
    Degraded,
    /// Not serving
    Failed,
    /// Failure over, still warming up
    Recovering,
}

impl HealthState {
    /// Multiplier applied to sampled latency
    #[must_use]
    pub fn latency_multiplier(&self) -> f64 {
        match self {
            Self::Healthy | Self::Failed => 1.0,
            Self::Degraded => 3.0,
            Self::Recovering => 1.5,
        }
    }

    /// Nodes in this state pass traffic downstream
    #[must_use]
    pub fn forwards_traffic(&self) -> bool {
        !matches!(self, Self::Failed)
    }
}

impl fmt::Display for HealthState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Healthy => "healthy",
            Self::Degraded => "degraded",
            Self::Failed => "failed",
            Self::Recovering => "recovering",
        };
        f.write_str(s)
    }
}
