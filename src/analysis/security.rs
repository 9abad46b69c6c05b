// SPDX-License-Identifier: AGPL-3.0-or-later
// SPDX-FileCopyrightText: 2025 Jonathan D.A. Jewell
//! Security analysis - transport encryption, exposure and secret handling rules

use super::{score_findings, Finding, Grade, Severity};
use crate::graph::ArchitectureGraph;
use crate::types::ServiceCategory;
use serde::Serialize;
use tracing::info;

/// Environment key fragments that indicate a credential
pub const SECRET_MARKERS: &[&str] = &["PASSWORD", "SECRET", "TOKEN", "API_KEY", "PRIVATE_KEY"];

/// Well-known data store ports that scanners try first
pub const DEFAULT_DATA_PORTS: &[u16] = &[5432, 3306, 27017, 6379];

/// Result of [`analyze`]
#[derive(Debug, Clone, Serialize)]
pub struct SecurityReport {
    /// 0-100
    pub score: u32,
    /// Letter grade of the score
    pub grade: Grade,
    /// Links encrypted in transit
    pub encrypted_links: usize,
    /// All links
    pub total_links: usize,
    /// Rule violations, most severe first
    pub findings: Vec<Finding>,
}

/// Run the security rules
#[must_use]
pub fn analyze(graph: &ArchitectureGraph) -> SecurityReport {
    let mut findings = Vec::new();

    check_unencrypted_links(graph, &mut findings);
    check_direct_data_access(graph, &mut findings);
    check_missing_auth(graph, &mut findings);
    check_plaintext_secrets(graph, &mut findings);
    check_default_ports(graph, &mut findings);

    findings.sort_by(|a, b| b.severity.cmp(&a.severity));

    let encrypted_links = graph.edges().iter().filter(|e| e.kind.is_encrypted()).count();
    let score = score_findings(&findings);
    info!("Security analysis: score {} with {} findings", score, findings.len());

    SecurityReport {
        score,
        grade: Grade::from_score(score),
        encrypted_links,
        total_links: graph.edge_count(),
        findings,
    }
}

fn check_unencrypted_links(graph: &ArchitectureGraph, findings: &mut Vec<Finding>) {
    for edge in graph.edges().iter().filter(|e| !e.kind.is_encrypted()) {
        let name = |id: &str| graph.node(id).map_or(id.to_string(), |n| n.name().to_string());
        findings.push(Finding {
            rule: "unencrypted-link".into(),
            severity: Severity::Medium,
            message: format!(
                "{} -> {} uses unencrypted {} communication",
                name(&edge.source),
                name(&edge.target),
                edge.kind
            ),
            nodes: vec![edge.source.clone(), edge.target.clone()],
            edges: vec![edge.id.clone()],
        });
    }
}

fn check_direct_data_access(graph: &ArchitectureGraph, findings: &mut Vec<Finding>) {
    for edge in graph.edges() {
        let (Some(source), Some(target)) = (graph.node(&edge.source), graph.node(&edge.target)) else {
            continue;
        };
        let exposed = matches!(source.category(), ServiceCategory::Gateway | ServiceCategory::Frontend);
        if exposed && target.category() == ServiceCategory::Database {
            findings.push(Finding {
                rule: "direct-data-access".into(),
                severity: Severity::High,
                message: format!(
                    "{} {} reaches database {} without a service in between",
                    source.category(),
                    source.name(),
                    target.name()
                ),
                nodes: vec![source.id.clone(), target.id.clone()],
                edges: vec![edge.id.clone()],
            });
        }
    }
}

fn check_missing_auth(graph: &ArchitectureGraph, findings: &mut Vec<Finding>) {
    let gateways: Vec<String> = graph
        .nodes()
        .iter()
        .filter(|n| n.category() == ServiceCategory::Gateway)
        .map(|n| n.id.clone())
        .collect();
    let has_auth = graph.nodes().iter().any(|n| n.category() == ServiceCategory::Auth);

    if !gateways.is_empty() && !has_auth {
        findings.push(Finding {
            rule: "missing-auth".into(),
            severity: Severity::High,
            message: "Gateway exposes the system but no authentication service is present".into(),
            nodes: gateways,
            edges: vec![],
        });
    }
}

fn check_plaintext_secrets(graph: &ArchitectureGraph, findings: &mut Vec<Finding>) {
    for node in graph.nodes() {
        for (key, value) in &node.config.environment {
            if is_secret_key(key) && is_literal_value(value) {
                findings.push(Finding {
                    rule: "plaintext-secret".into(),
                    severity: Severity::Critical,
                    message: format!(
                        "{} sets {} to a literal value; reference a secret store instead",
                        node.name(),
                        key
                    ),
                    nodes: vec![node.id.clone()],
                    edges: vec![],
                });
            }
        }
    }
}

fn check_default_ports(graph: &ArchitectureGraph, findings: &mut Vec<Finding>) {
    for node in graph.nodes() {
        let data_tier = matches!(node.category(), ServiceCategory::Database | ServiceCategory::Cache);
        if data_tier && DEFAULT_DATA_PORTS.contains(&node.config.port) {
            findings.push(Finding {
                rule: "default-port".into(),
                severity: Severity::Low,
                message: format!("{} listens on default port {}", node.name(), node.config.port),
                nodes: vec![node.id.clone()],
                edges: vec![],
            });
        }
    }
}

/// Key names like `DB_PASSWORD` or `stripe_api_key`
#[must_use]
pub fn is_secret_key(key: &str) -> bool {
    let upper = key.to_uppercase();
    SECRET_MARKERS.iter().any(|m| upper.contains(m))
}

/// Non-empty values that are not `${...}` references
fn is_literal_value(value: &str) -> bool {
    let trimmed = value.trim();
    !trimmed.is_empty() && !(trimmed.starts_with("${") && trimmed.ends_with('}'))
}
