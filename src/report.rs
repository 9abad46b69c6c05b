// SPDX-License-Identifier: AGPL-3.0-or-later
// SPDX-FileCopyrightText: 2025 Jonathan D.A. Jewell
//! Plain-text rendering of analysis and simulation results

use crate::analysis::architecture::ArchitectureReport;
use crate::analysis::performance::PerformanceReport;
use crate::analysis::security::SecurityReport;
use crate::analysis::{Finding, Grade, Severity};
use crate::simulation::engine::SimulationEvent;
use crate::simulation::load::LoadTestReport;
use crate::simulation::{HealthState, MetricsSnapshot};
use owo_colors::OwoColorize;
use std::fmt::Write;

/// Colouring switch for terminal output
#[derive(Debug, Clone, Copy)]
pub struct Palette {
    color: bool,
}

impl Palette {
    /// Create a palette; `color = false` renders plain text
    #[must_use]
    pub fn new(color: bool) -> Self {
        Self { color }
    }

    /// Section heading
    #[must_use]
    pub fn heading(&self, text: &str) -> String {
        if self.color {
            text.bold().underline().to_string()
        } else {
            text.to_string()
        }
    }

    /// Severity tag
    #[must_use]
    pub fn severity(&self, severity: Severity) -> String {
        let tag = format!("[{severity}]");
        if !self.color {
            return tag;
        }
        match severity {
            Severity::Low => tag.blue().to_string(),
            Severity::Medium => tag.yellow().to_string(),
            Severity::High => tag.red().to_string(),
            Severity::Critical => tag.red().bold().to_string(),
        }
    }

    /// Score with its grade
    #[must_use]
    pub fn grade(&self, score: u32, grade: Grade) -> String {
        let text = format!("{score}/100 ({grade})");
        if !self.color {
            return text;
        }
        match grade {
            Grade::A | Grade::B => text.green().to_string(),
            Grade::C | Grade::D => text.yellow().to_string(),
            Grade::F => text.red().to_string(),
        }
    }

    /// Health label
    #[must_use]
    pub fn health(&self, health: HealthState) -> String {
        let text = format!("{:<10}", health.to_string());
        if !self.color {
            return text;
        }
        match health {
            HealthState::Healthy => text.green().to_string(),
            HealthState::Degraded | HealthState::Recovering => text.yellow().to_string(),
            HealthState::Failed => text.red().to_string(),
        }
    }
}

fn write_findings(out: &mut String, palette: Palette, findings: &[Finding]) {
    if findings.is_empty() {
        let _ = writeln!(out, "  No findings.");
        return;
    }
    for finding in findings {
        let _ = writeln!(
            out,
            "  {} {}: {}",
            palette.severity(finding.severity),
            finding.rule,
            finding.message
        );
    }
}

/// Render the structural analysis
#[must_use]
pub fn architecture(report: &ArchitectureReport, palette: Palette) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "{}", palette.heading("Architecture"));

    let c = &report.complexity;
    let _ = writeln!(
        out,
        "  {} services, {} links, average degree {:.2}, density {:.3}",
        c.nodes, c.edges, c.average_degree, c.density
    );
    let r = &report.resources;
    let _ = writeln!(
        out,
        "  Resources: {} replicas, {:.1} CPU, {} MiB memory",
        r.replicas, r.cpu, r.memory
    );

    if report.cycles.is_empty() {
        let _ = writeln!(out, "  No dependency cycles.");
    } else {
        let _ = writeln!(out, "  Cycles:");
        for cycle in &report.cycles {
            let _ = writeln!(out, "    {}", cycle.join(" -> "));
        }
    }

    if !report.bottlenecks.is_empty() {
        let _ = writeln!(out, "  Bottlenecks:");
        for b in &report.bottlenecks {
            let _ = writeln!(
                out,
                "    {} ({} in, {} out)",
                b.name, b.inbound, b.outbound
            );
        }
    }

    if !report.single_points_of_failure.is_empty() {
        let _ = writeln!(out, "  Single points of failure:");
        for spof in &report.single_points_of_failure {
            let _ = writeln!(out, "    {} ({} connections)", spof.name, spof.dependents);
        }
    }

    if !report.recommendations.is_empty() {
        let _ = writeln!(out, "  Recommendations:");
        for rec in &report.recommendations {
            let _ = writeln!(out, "    - {rec}");
        }
    }
    out
}

/// Render the performance analysis
#[must_use]
pub fn performance(report: &PerformanceReport, palette: Palette) -> String {
    let mut out = String::new();
    let _ = writeln!(
        out,
        "{}  {}",
        palette.heading("Performance"),
        palette.grade(report.score, report.grade)
    );
    if let Some(path) = &report.critical_path {
        let _ = writeln!(
            out,
            "  Critical path: {} ({:.0} ms, {} hops, {:.0} rps capacity)",
            path.nodes.join(" -> "),
            path.latency_ms,
            path.hops(),
            path.capacity_rps
        );
    }
    write_findings(&mut out, palette, &report.findings);
    out
}

/// Render the security analysis
#[must_use]
pub fn security(report: &SecurityReport, palette: Palette) -> String {
    let mut out = String::new();
    let _ = writeln!(
        out,
        "{}  {}",
        palette.heading("Security"),
        palette.grade(report.score, report.grade)
    );
    let _ = writeln!(
        out,
        "  Encrypted links: {}/{}",
        report.encrypted_links, report.total_links
    );
    write_findings(&mut out, palette, &report.findings);
    out
}

/// Render one metrics snapshot as a table
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn snapshot(snapshot: &MetricsSnapshot, palette: Palette) -> String {
    let mut out = String::new();
    let _ = writeln!(
        out,
        "t={:>6.1}s  throughput {:.0} rps  mean p50 {:.1} ms  unhealthy {}",
        snapshot.elapsed_ms as f64 / 1000.0,
        snapshot.total_throughput(),
        snapshot.mean_latency_ms(),
        snapshot.unhealthy()
    );
    for m in &snapshot.nodes {
        let _ = writeln!(
            out,
            "  {:<24} {} cpu {:>5.1}%  mem {:>5.1}%  p50 {:>8.1}  p95 {:>8.1}  p99 {:>8.1}  {:>7.1} rps  err {:>5.1}%",
            m.node_id,
            palette.health(m.health),
            m.cpu_percent,
            m.memory_percent,
            m.latency_p50_ms,
            m.latency_p95_ms,
            m.latency_p99_ms,
            m.throughput_rps,
            m.error_rate * 100.0
        );
    }
    out
}

/// Render a list of health transitions
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn events(events: &[SimulationEvent]) -> String {
    let mut out = String::new();
    for e in events {
        let _ = writeln!(
            out,
            "  {:>7.1}s  {:<24} {:?}",
            e.at_ms as f64 / 1000.0,
            e.node_id,
            e.kind
        );
    }
    out
}

/// Render a load-test report
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn load_test(report: &LoadTestReport, palette: Palette) -> String {
    let mut out = String::new();
    let p = &report.profile;
    let _ = writeln!(
        out,
        "{}  {} {:.0} -> {:.0} rps over {}s",
        palette.heading("Load test"),
        p.pattern,
        p.base_rps,
        p.peak_rps,
        p.duration.as_secs()
    );
    for s in &report.timeline {
        let _ = writeln!(
            out,
            "  t={:>6.1}s  {:>8.0} rps  max util {:>5.2}  {:<24} err {:>5.1}%{}",
            s.t_ms as f64 / 1000.0,
            s.offered_rps,
            s.max_utilization,
            s.hottest_node.as_deref().unwrap_or("-"),
            s.estimated_error_rate * 100.0,
            if s.saturated.is_empty() { "" } else { "  saturated" }
        );
    }
    let _ = writeln!(out, "  Peak utilisation: {:.2}", report.peak_utilization);
    match report.first_saturation_ms {
        Some(ms) => {
            let _ = writeln!(out, "  First saturation at {:.1}s", ms as f64 / 1000.0);
        }
        None => {
            let _ = writeln!(out, "  No node saturated.");
        }
    }
    if let (Some(rps), Some(node)) = (report.breaking_point_rps, &report.weakest_node) {
        let _ = writeln!(out, "  Breaking point: {rps:.0} rps entry load ({node} at capacity)");
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plain_palette_has_no_escapes() {
        let palette = Palette::new(false);
        assert_eq!(palette.severity(Severity::High), "[high]");
        assert_eq!(palette.grade(73, Grade::C), "73/100 (C)");
        assert!(!palette.heading("Security").contains('\u{1b}'));
    }

    #[test]
    fn test_colored_palette_wraps_text() {
        let palette = Palette::new(true);
        let tag = palette.severity(Severity::Critical);
        assert!(tag.contains("[critical]"));
        assert!(tag.contains('\u{1b}'));
    }

    #[test]
    fn test_findings_render() {
        let report = SecurityReport {
            score: 90,
            grade: Grade::A,
            encrypted_links: 1,
            total_links: 2,
            findings: vec![Finding {
                rule: "unencrypted-link".into(),
                severity: Severity::Medium,
                message: "a -> b is plaintext".into(),
                nodes: vec![],
                edges: vec![],
            }],
        };
        let text = security(&report, Palette::new(false));
        assert!(text.contains("90/100 (A)"));
        assert!(text.contains("Encrypted links: 1/2"));
        assert!(text.contains("[medium] unencrypted-link: a -> b is plaintext"));
    }
}
