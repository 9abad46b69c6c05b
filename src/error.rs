// SPDX-License-Identifier: AGPL-3.0-or-later
// SPDX-FileCopyrightText: 2025 Jonathan D.A. Jewell
//! Error types for diagram editing, import and simulation

/// Errors raised by the library layer
#[derive(Debug, thiserror::Error)]
pub enum DesignError {
    /// Document failed shape or content validation
    #[error("invalid document: {0}")]
    InvalidDocument(String),

    /// Document was written by an incompatible format version
    #[error("unsupported document version: {0}")]
    UnsupportedVersion(String),

    /// A node with this ID already exists
    #[error("node already exists: {0}")]
    DuplicateNode(String),

    /// No node with this ID or name
    #[error("node not found: {0}")]
    NodeNotFound(String),

    /// No edge with this ID
    #[error("edge not found: {0}")]
    EdgeNotFound(String),

    /// A name matched more than one node
    #[error("ambiguous node name '{name}', candidates: {}", candidates.join(", "))]
    AmbiguousNode {
        /// The name that was looked up
        name: String,
        /// IDs of every match
        candidates: Vec<String>,
    },

    /// An edge would connect a node to itself
    #[error("self-loop not allowed on {0}")]
    SelfLoop(String),

    /// Service configuration is unusable
    #[error("invalid service config: {0}")]
    InvalidConfig(String),

    /// Failure pattern cannot apply to the chosen node
    #[error("pattern '{pattern}' does not apply to {node}: {reason}")]
    PatternNotApplicable {
        /// Pattern name
        pattern: String,
        /// Target node ID
        node: String,
        /// Why it was refused
        reason: String,
    },

    /// JSON (de)serialization failed
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    /// YAML serialization failed
    #[error("yaml error: {0}")]
    Yaml(#[from] serde_yaml::Error),
}

/// Result alias for library operations
pub type DesignResult<T> = Result<T, DesignError>;
