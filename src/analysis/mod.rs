// SPDX-License-Identifier: AGPL-3.0-or-later
// SPDX-FileCopyrightText: 2025 Jonathan D.A. Jewell
//
//! Static analyzers over an architecture diagram
//!
//! All analyzers are deterministic functions of the graph and the
//! [`AnalysisConfig`] thresholds.

pub mod architecture;
pub mod performance;
pub mod security;

use crate::config::AnalysisConfig;
use crate::graph::ArchitectureGraph;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Severity of a finding
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    /// Cosmetic or best-practice issue
    Low,
    /// Worth fixing before production
    Medium,
    /// Likely to cause incidents
    High,
    /// Must be fixed
    Critical,
}

impl Severity {
    /// Points subtracted from a 100-point score
    #[must_use]
    pub fn weight(&self) -> u32 {
        match self {
            Self::Low => 2,
            Self::Medium => 5,
            Self::High => 10,
            Self::Critical => 20,
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Low => "low",
            Self::Medium => "medium",
            Self::High => "high",
            Self::Critical => "critical",
        };
        f.write_str(s)
    }
}

/// Letter grade derived from a 0-100 score
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Grade {
    /// 90 and above
    A,
    /// 80-89
    B,
    /// 70-79
    C,
    /// 60-69
    D,
    /// Below 60
    F,
}

impl Grade {
    /// Grade a score
    #[must_use]
    pub fn from_score(score: u32) -> Self {
        match score {
            90..=u32::MAX => Self::A,
            80..=89 => Self::B,
            70..=79 => Self::C,
            60..=69 => Self::D,
            _ => Self::F,
        }
    }
}

impl fmt::Display for Grade {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{self:?}")
    }
}

/// A rule violation reported by an analyzer
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Finding {
    /// Rule identifier, e.g. "unencrypted-link"
    pub rule: String,
    /// How bad it is
    pub severity: Severity,
    /// Human-readable description
    pub message: String,
    /// Node IDs involved
    #[serde(default)]
    pub nodes: Vec<String>,
    /// Edge IDs involved
    #[serde(default)]
    pub edges: Vec<String>,
}

/// Score 100 minus the sum of finding weights, floored at zero
#[must_use]
pub fn score_findings(findings: &[Finding]) -> u32 {
    let penalty: u32 = findings.iter().map(|f| f.severity.weight()).sum();
    100u32.saturating_sub(penalty)
}

/// Output of every analyzer
#[derive(Debug, Clone, Serialize)]
pub struct FullReport {
    /// Structural analysis
    pub architecture: architecture::ArchitectureReport,
    /// Latency and capacity analysis
    pub performance: performance::PerformanceReport,
    /// Security analysis
    pub security: security::SecurityReport,
}

/// Run every analyzer
#[must_use]
pub fn analyze_all(graph: &ArchitectureGraph, config: &AnalysisConfig) -> FullReport {
    FullReport {
        architecture: architecture::analyze(graph, config),
        performance: performance::analyze(graph, config),
        security: security::analyze(graph),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn finding(severity: Severity) -> Finding {
        Finding {
            rule: "test".into(),
            severity,
            message: String::new(),
            nodes: vec![],
            edges: vec![],
        }
    }

    #[test]
    fn test_grade_boundaries() {
        assert_eq!(Grade::from_score(100), Grade::A);
        assert_eq!(Grade::from_score(90), Grade::A);
        assert_eq!(Grade::from_score(89), Grade::B);
        assert_eq!(Grade::from_score(60), Grade::D);
        assert_eq!(Grade::from_score(59), Grade::F);
    }

    #[test]
    fn test_score_saturates() {
        let findings: Vec<_> = (0..8).map(|_| finding(Severity::Critical)).collect();
        assert_eq!(score_findings(&findings), 0);
        assert_eq!(score_findings(&[finding(Severity::Medium), finding(Severity::Low)]), 93);
    }

    #[test]
    fn test_severity_ordering() {
        assert!(Severity::Critical > Severity::High);
        assert!(Severity::Low < Severity::Medium);
    }
}
