// SPDX-License-Identifier: AGPL-3.0-or-later
// SPDX-FileCopyrightText: 2025 Jonathan D.A. Jewell
//! Import and export of the architecture document format

use crate::error::{DesignError, DesignResult};
use crate::graph::ArchitectureGraph;
use crate::types::ArchitectureDocument;
use serde_json::Value;
use tracing::debug;

/// Supported export formats
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportFormat {
    /// Architecture document as JSON (re-importable)
    Json,
    /// Architecture document as YAML
    Yaml,
    /// Graphviz DOT format
    Dot,
}

impl ExportFormat {
    /// Parse format from string
    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "json" => Some(Self::Json),
            "yaml" | "yml" => Some(Self::Yaml),
            "dot" | "graphviz" => Some(Self::Dot),
            _ => None,
        }
    }

    /// Get file extension for format
    #[must_use]
    pub fn extension(&self) -> &'static str {
        match self {
            Self::Json => "json",
            Self::Yaml => "yaml",
            Self::Dot => "dot",
        }
    }
}

/// Render a graph in the requested format
pub fn export(graph: &ArchitectureGraph, format: ExportFormat) -> DesignResult<String> {
    match format {
        ExportFormat::Json => export_json(graph),
        ExportFormat::Yaml => export_yaml(graph),
        ExportFormat::Dot => Ok(graph.to_dot()),
    }
}

/// Serialize a graph as a pretty-printed JSON document
pub fn export_json(graph: &ArchitectureGraph) -> DesignResult<String> {
    Ok(serde_json::to_string_pretty(&graph.to_document())?)
}

/// Serialize a graph as a YAML document
pub fn export_yaml(graph: &ArchitectureGraph) -> DesignResult<String> {
    Ok(serde_yaml::to_string(&graph.to_document())?)
}

/// Parse and validate a JSON document into a graph
pub fn import_json(text: &str) -> DesignResult<ArchitectureGraph> {
    let value: Value = serde_json::from_str(text)?;
    check_shape(&value)?;

    let doc: ArchitectureDocument = serde_json::from_value(value)
        .map_err(|e| DesignError::InvalidDocument(e.to_string()))?;
    check_version(&doc.version)?;

    debug!(
        "Importing '{}' ({} nodes, {} edges)",
        doc.metadata.name,
        doc.nodes.len(),
        doc.edges.len()
    );
    ArchitectureGraph::from_document(doc)
}

/// Reject documents missing the top-level node and edge arrays
fn check_shape(value: &Value) -> DesignResult<()> {
    let obj = value
        .as_object()
        .ok_or_else(|| DesignError::InvalidDocument("document must be a JSON object".into()))?;

    for key in ["nodes", "edges"] {
        match obj.get(key) {
            Some(Value::Array(_)) => {}
            Some(_) => return Err(DesignError::InvalidDocument(format!("'{key}' must be an array"))),
            None => return Err(DesignError::InvalidDocument(format!("missing '{key}' array"))),
        }
    }
    if !obj.contains_key("metadata") {
        return Err(DesignError::InvalidDocument("missing 'metadata'".into()));
    }
    Ok(())
}

/// Only major version 1 is understood
fn check_version(version: &str) -> DesignResult<()> {
    let major = version.split('.').next().unwrap_or_default();
    if major == "1" {
        Ok(())
    } else {
        Err(DesignError::UnsupportedVersion(version.into()))
    }
}
