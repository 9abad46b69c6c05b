// SPDX-License-Identifier: AGPL-3.0-or-later
// SPDX-FileCopyrightText: 2025 Jonathan D.A. Jewell
//
//! Meshwright library - design, analyze and simulate microservice architectures
//!
//! A diagram is a directed graph of service nodes joined by typed
//! communication links. This crate stores diagrams, moves them in and out
//! of the JSON document format, runs the architecture, performance and
//! security analyzers over them, and drives seeded simulations (synthetic
//! metrics, failure injection, load shaping).

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod analysis;
pub mod commands;
pub mod config;
pub mod document;
pub mod error;
pub mod graph;
pub mod report;
pub mod simulation;

/// Core data types shared by the graph store, analyzers and simulation
pub mod types {
    use chrono::{DateTime, Utc};
    use serde::{Deserialize, Serialize};
    use sha2::{Digest, Sha256};
    use std::collections::BTreeMap;
    use std::fmt;
    use std::str::FromStr;

    /// Version written into exported documents
    pub const DOCUMENT_VERSION: &str = "1.0";

    // =========================================================================
    // Service Categories
    // =========================================================================

    /// Category tag of a service node
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
    #[serde(rename_all = "lowercase")]
    pub enum ServiceCategory {
        /// API gateway / ingress
        Gateway,
        /// Generic application service
        Service,
        /// Relational or document database
        Database,
        /// In-memory cache
        Cache,
        /// Message queue or broker
        Queue,
        /// Authentication / identity provider
        Auth,
        /// User-facing web or mobile frontend
        Frontend,
        /// Metrics, logging or tracing backend
        Monitoring,
        /// Object or block storage
        Storage,
        /// Third-party system outside the diagram's control
        External,
    }

    impl ServiceCategory {
        /// Every category, in palette order
        pub const ALL: [Self; 10] = [
            Self::Gateway,
            Self::Service,
            Self::Database,
            Self::Cache,
            Self::Queue,
            Self::Auth,
            Self::Frontend,
            Self::Monitoring,
            Self::Storage,
            Self::External,
        ];

        /// Get the wire tag for this category
        #[must_use]
        pub fn code(&self) -> &'static str {
            match self {
                Self::Gateway => "gateway",
                Self::Service => "service",
                Self::Database => "database",
                Self::Cache => "cache",
                Self::Queue => "queue",
                Self::Auth => "auth",
                Self::Frontend => "frontend",
                Self::Monitoring => "monitoring",
                Self::Storage => "storage",
                Self::External => "external",
            }
        }

        /// Typical processing latency of one request, in milliseconds
        #[must_use]
        pub fn base_latency_ms(&self) -> f64 {
            match self {
                Self::Gateway => 5.0,
                Self::Service => 20.0,
                Self::Database => 15.0,
                Self::Cache => 1.0,
                Self::Queue => 3.0,
                Self::Auth => 10.0,
                Self::Frontend => 8.0,
                Self::Monitoring => 2.0,
                Self::Storage => 25.0,
                Self::External => 50.0,
            }
        }

        /// Requests per second a single replica sustains
        #[must_use]
        pub fn capacity_per_replica(&self) -> f64 {
            match self {
                Self::Gateway => 5000.0,
                Self::Service => 500.0,
                Self::Database => 800.0,
                Self::Cache => 10_000.0,
                Self::Queue => 4000.0,
                Self::Auth => 1000.0,
                Self::Frontend => 2000.0,
                Self::Monitoring => 3000.0,
                Self::Storage => 400.0,
                Self::External => 300.0,
            }
        }

        /// Default tech stack label and port for a freshly placed node
        #[must_use]
        pub fn defaults(&self) -> (&'static str, u16) {
            match self {
                Self::Gateway => ("nginx", 80),
                Self::Service => ("node", 3000),
                Self::Database => ("postgres", 5432),
                Self::Cache => ("redis", 6379),
                Self::Queue => ("rabbitmq", 5672),
                Self::Auth => ("keycloak", 8080),
                Self::Frontend => ("react", 8000),
                Self::Monitoring => ("prometheus", 9090),
                Self::Storage => ("minio", 9000),
                Self::External => ("http", 443),
            }
        }

        /// Databases and storage hold persistent state
        #[must_use]
        pub fn is_data_store(&self) -> bool {
            matches!(self, Self::Database | Self::Storage)
        }
    }

    impl fmt::Display for ServiceCategory {
        fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            f.write_str(self.code())
        }
    }

    impl FromStr for ServiceCategory {
        type Err = String;

        fn from_str(s: &str) -> Result<Self, Self::Err> {
            let lower = s.to_lowercase();
            Self::ALL
                .into_iter()
                .find(|c| c.code() == lower)
                .ok_or_else(|| {
                    let valid: Vec<_> = Self::ALL.iter().map(Self::code).collect();
                    format!("Unknown category: {s}. Valid: {}", valid.join(", "))
                })
        }
    }

    // =========================================================================
    // Communication Types
    // =========================================================================

    /// How two services talk to each other
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
    #[serde(rename_all = "kebab-case")]
    pub enum CommunicationType {
        /// Plain request/response (HTTP, gRPC without TLS)
        Sync,
        /// Fire-and-forget messaging
        Async,
        /// Bulk data movement (replication, ETL)
        DataFlow,
        /// Request/response over TLS
        Https,
        /// Messaging over TLS
        TlsAsync,
        /// Encrypted bulk data movement
        EncryptedData,
    }

    impl CommunicationType {
        /// Every communication type
        pub const ALL: [Self; 6] = [
            Self::Sync,
            Self::Async,
            Self::DataFlow,
            Self::Https,
            Self::TlsAsync,
            Self::EncryptedData,
        ];

        /// Get the wire tag for this type
        #[must_use]
        pub fn code(&self) -> &'static str {
            match self {
                Self::Sync => "sync",
                Self::Async => "async",
                Self::DataFlow => "data-flow",
                Self::Https => "https",
                Self::TlsAsync => "tls-async",
                Self::EncryptedData => "encrypted-data",
            }
        }

        /// Traffic on this link is encrypted in transit
        #[must_use]
        pub fn is_encrypted(&self) -> bool {
            matches!(self, Self::Https | Self::TlsAsync | Self::EncryptedData)
        }

        /// The caller blocks on the callee
        #[must_use]
        pub fn is_synchronous(&self) -> bool {
            matches!(self, Self::Sync | Self::Https)
        }
    }

    impl fmt::Display for CommunicationType {
        fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            f.write_str(self.code())
        }
    }

    impl FromStr for CommunicationType {
        type Err = String;

        fn from_str(s: &str) -> Result<Self, Self::Err> {
            let lower = s.to_lowercase().replace('_', "-");
            Self::ALL
                .into_iter()
                .find(|c| c.code() == lower)
                .ok_or_else(|| {
                    let valid: Vec<_> = Self::ALL.iter().map(Self::code).collect();
                    format!("Unknown communication type: {s}. Valid: {}", valid.join(", "))
                })
        }
    }

    // =========================================================================
    // Service Node
    // =========================================================================

    /// Configuration edited through a node's config panel
    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    #[serde(rename_all = "camelCase")]
    pub struct ServiceConfig {
        /// Display name
        pub name: String,
        /// Category tag
        pub category: ServiceCategory,
        /// Tech stack label (e.g. "postgres", "spring-boot")
        pub tech_stack: String,
        /// Listening port
        pub port: u16,
        /// CPU cores per replica
        pub cpu: f64,
        /// Memory per replica, in MiB
        pub memory: u64,
        /// Replica count
        pub replicas: u32,
        /// Environment variables
        #[serde(default)]
        pub environment: BTreeMap<String, String>,
    }

    impl ServiceConfig {
        /// Create a config with the category defaults
        #[must_use]
        pub fn new(name: impl Into<String>, category: ServiceCategory) -> Self {
            let (tech_stack, port) = category.defaults();
            Self {
                name: name.into(),
                category,
                tech_stack: tech_stack.into(),
                port,
                cpu: 0.5,
                memory: 512,
                replicas: 1,
                environment: BTreeMap::new(),
            }
        }

        /// Check resource fields are usable
        pub fn validate(&self) -> Result<(), String> {
            if self.name.trim().is_empty() {
                return Err("service name must not be empty".into());
            }
            if !(self.cpu.is_finite() && self.cpu > 0.0) {
                return Err(format!("{}: cpu must be positive, got {}", self.name, self.cpu));
            }
            if self.memory == 0 {
                return Err(format!("{}: memory must be positive", self.name));
            }
            if self.replicas == 0 {
                return Err(format!("{}: replicas must be at least 1", self.name));
            }
            Ok(())
        }
    }

    /// Position on the canvas
    #[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
    pub struct Position {
        /// X coordinate
        pub x: f64,
        /// Y coordinate
        pub y: f64,
    }

    /// A service placed on the diagram
    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    pub struct ServiceNode {
        /// Unique identifier: svc:<slug>
        pub id: String,
        /// Canvas position
        #[serde(default)]
        pub position: Position,
        /// Service configuration
        pub config: ServiceConfig,
    }

    impl ServiceNode {
        /// Create a node whose ID is derived from the service name
        #[must_use]
        pub fn new(config: ServiceConfig, position: Position) -> Self {
            Self {
                id: Self::generate_id(&config.name),
                position,
                config,
            }
        }

        /// Generate a deterministic ID from a display name
        ///
        /// Letters and digits of any script are kept lowercased, runs of
        /// anything else become one `-`.
        #[must_use]
        pub fn generate_id(name: &str) -> String {
            let name = name.trim();
            let mut slug = String::with_capacity(name.len());
            for ch in name.chars() {
                if ch.is_alphanumeric() {
                    slug.extend(ch.to_lowercase());
                } else if !slug.ends_with('-') {
                    slug.push('-');
                }
            }
            let slug = slug.trim_matches('-');
            if slug.is_empty() {
                // nothing letter-like to keep, fall back to a name hash
                let hash = hex::encode(Sha256::digest(name.as_bytes()));
                return format!("svc:{}", &hash[..8]);
            }
            format!("svc:{slug}")
        }

        /// Display name
        #[must_use]
        pub fn name(&self) -> &str {
            &self.config.name
        }

        /// Category tag
        #[must_use]
        pub fn category(&self) -> ServiceCategory {
            self.config.category
        }
    }

    // =========================================================================
    // Communication Edge
    // =========================================================================

    /// Directed communication link between two services
    #[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
    pub struct CommunicationEdge {
        /// Content-hash ID: edge:<hash of (source, target, type, label)>
        pub id: String,
        /// Calling / producing node ID
        pub source: String,
        /// Called / consuming node ID
        pub target: String,
        /// Communication type
        #[serde(rename = "type")]
        pub kind: CommunicationType,
        /// Human-readable label
        #[serde(default, skip_serializing_if = "Option::is_none")]
        pub label: Option<String>,
    }

    impl CommunicationEdge {
        /// Create an edge with a generated ID
        #[must_use]
        pub fn new(source: &str, target: &str, kind: CommunicationType, label: Option<String>) -> Self {
            Self {
                id: Self::generate_id(source, target, kind, label.as_deref()),
                source: source.into(),
                target: target.into(),
                kind,
                label,
            }
        }

        /// Generate a deterministic ID for an edge
        #[must_use]
        pub fn generate_id(source: &str, target: &str, kind: CommunicationType, label: Option<&str>) -> String {
            let mut hasher = Sha256::new();
            hasher.update(source.as_bytes());
            hasher.update(target.as_bytes());
            hasher.update(kind.code().as_bytes());
            if let Some(l) = label {
                hasher.update(l.as_bytes());
            }
            let hash = hex::encode(hasher.finalize());
            format!("edge:{}", &hash[..8])
        }
    }

    // =========================================================================
    // Document
    // =========================================================================

    /// Diagram metadata
    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    #[serde(rename_all = "camelCase")]
    pub struct DiagramMetadata {
        /// Diagram name
        pub name: String,
        /// Free-form description
        #[serde(default)]
        pub description: String,
        /// When the diagram was created
        pub created_at: DateTime<Utc>,
        /// When the diagram last changed
        pub updated_at: DateTime<Utc>,
    }

    impl DiagramMetadata {
        /// Metadata stamped with the current time
        #[must_use]
        pub fn new(name: impl Into<String>, description: impl Into<String>) -> Self {
            let now = Utc::now();
            Self {
                name: name.into(),
                description: description.into(),
                created_at: now,
                updated_at: now,
            }
        }
    }

    impl Default for DiagramMetadata {
        fn default() -> Self {
            Self::new("Untitled architecture", "")
        }
    }

    /// Export/import wire format
    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    pub struct ArchitectureDocument {
        /// Document format version
        pub version: String,
        /// Diagram metadata
        pub metadata: DiagramMetadata,
        /// All service nodes
        pub nodes: Vec<ServiceNode>,
        /// All communication edges
        pub edges: Vec<CommunicationEdge>,
    }

    #[cfg(test)]
    mod tests {
        use super::*;

        #[test]
        fn test_node_id_slug() {
            assert_eq!(ServiceNode::generate_id("  Payment  Service! "), "svc:payment-service");
            assert_eq!(ServiceNode::generate_id("Zahlungsdienst Ä"), "svc:zahlungsdienst-ä");
        }

        #[test]
        fn test_node_id_keeps_non_latin_names_apart() {
            let orders = ServiceNode::generate_id("注文サービス");
            let payments = ServiceNode::generate_id("決済サービス");
            assert_eq!(orders, "svc:注文サービス");
            assert_ne!(orders, payments);

            let rocket = ServiceNode::generate_id("🚀");
            let satellite = ServiceNode::generate_id("🛰️");
            assert!(rocket.starts_with("svc:") && rocket.len() == 12);
            assert_ne!(rocket, "svc:");
            assert_ne!(rocket, satellite);
            assert_eq!(rocket, ServiceNode::generate_id(" 🚀 "));
        }

        #[test]
        fn test_communication_type_traits() {
            assert!(CommunicationType::TlsAsync.is_encrypted());
            assert!(!CommunicationType::TlsAsync.is_synchronous());
            assert!(CommunicationType::Https.is_encrypted() && CommunicationType::Https.is_synchronous());
            assert!(!CommunicationType::DataFlow.is_encrypted());
            assert_eq!("TLS_ASYNC".parse::<CommunicationType>(), Ok(CommunicationType::TlsAsync));
        }

        #[test]
        fn test_unknown_category_rejected() {
            assert_eq!("Cache".parse::<ServiceCategory>(), Ok(ServiceCategory::Cache));
            let err = "mainframe".parse::<ServiceCategory>().unwrap_err();
            assert!(err.contains("Unknown category: mainframe"));
        }
    }
}

/// Prelude for common imports
pub mod prelude {
    pub use crate::error::{DesignError, DesignResult};
    pub use crate::graph::ArchitectureGraph;
    pub use crate::types::*;
    pub use anyhow::{Context, Result};
}
