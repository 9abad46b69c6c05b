// SPDX-License-Identifier: AGPL-3.0-or-later
// SPDX-FileCopyrightText: 2025 Jonathan D.A. Jewell
//! Graph store for architecture diagrams, with petgraph backing for algorithms

use crate::error::{DesignError, DesignResult};
use crate::types::{
    ArchitectureDocument, CommunicationEdge, CommunicationType, DiagramMetadata, Position,
    ServiceConfig, ServiceNode, DOCUMENT_VERSION,
};
use anyhow::{Context, Result};
use chrono::Utc;
use petgraph::algo::toposort;
use petgraph::graph::{DiGraph, NodeIndex};
use petgraph::visit::{depth_first_search, DfsEvent, EdgeRef};
use std::collections::{HashMap, HashSet};
use std::fs;
use std::path::Path;
use tracing::debug;

/// File name of the persisted diagram inside the data directory
pub const STORE_FILE: &str = "architecture.json";

/// An architecture diagram: service nodes and communication edges
#[derive(Debug, Clone)]
pub struct ArchitectureGraph {
    /// The underlying directed graph (weights are node / edge IDs)
    graph: DiGraph<String, String>,
    /// Map from node ID to graph index
    node_indices: HashMap<String, NodeIndex>,
    metadata: DiagramMetadata,
    nodes: Vec<ServiceNode>,
    edges: Vec<CommunicationEdge>,
}

impl Default for ArchitectureGraph {
    fn default() -> Self {
        Self::new(DiagramMetadata::default())
    }
}

impl ArchitectureGraph {
    /// Create a new empty diagram
    #[must_use]
    pub fn new(metadata: DiagramMetadata) -> Self {
        Self {
            graph: DiGraph::new(),
            node_indices: HashMap::new(),
            metadata,
            nodes: Vec::new(),
            edges: Vec::new(),
        }
    }

    /// Build a graph from a document, validating its contents
    pub fn from_document(doc: ArchitectureDocument) -> DesignResult<Self> {
        let mut seen = HashSet::new();
        for node in &doc.nodes {
            if node.id.trim().is_empty() {
                return Err(DesignError::InvalidDocument("node with empty id".into()));
            }
            if !seen.insert(node.id.as_str()) {
                return Err(DesignError::InvalidDocument(format!("duplicate node id: {}", node.id)));
            }
            node.config.validate().map_err(DesignError::InvalidDocument)?;
        }

        let mut edge_ids = HashSet::new();
        for edge in &doc.edges {
            if !seen.contains(edge.source.as_str()) {
                return Err(DesignError::InvalidDocument(format!(
                    "edge {} references missing source {}",
                    edge.id, edge.source
                )));
            }
            if !seen.contains(edge.target.as_str()) {
                return Err(DesignError::InvalidDocument(format!(
                    "edge {} references missing target {}",
                    edge.id, edge.target
                )));
            }
            if edge.source == edge.target {
                return Err(DesignError::InvalidDocument(format!("edge {} is a self-loop", edge.id)));
            }
            if !edge_ids.insert(edge.id.as_str()) {
                return Err(DesignError::InvalidDocument(format!("duplicate edge id: {}", edge.id)));
            }
        }

        let mut graph = Self {
            graph: DiGraph::new(),
            node_indices: HashMap::new(),
            metadata: doc.metadata,
            nodes: doc.nodes,
            edges: doc.edges,
        };
        graph.rebuild_graph();
        Ok(graph)
    }

    /// Snapshot the graph as an exportable document
    #[must_use]
    pub fn to_document(&self) -> ArchitectureDocument {
        ArchitectureDocument {
            version: DOCUMENT_VERSION.into(),
            metadata: self.metadata.clone(),
            nodes: self.nodes.clone(),
            edges: self.edges.clone(),
        }
    }

    /// Load the diagram stored in a data directory
    ///
    /// A missing store file yields an empty diagram.
    pub fn load(dir: &Path) -> Result<Self> {
        let path = dir.join(STORE_FILE);
        if !path.exists() {
            debug!("No diagram at {}, starting empty", path.display());
            return Ok(Self::default());
        }

        let content = fs::read_to_string(&path)
            .with_context(|| format!("Failed to read {}", path.display()))?;
        crate::document::import_json(&content)
            .with_context(|| format!("Failed to parse {}", path.display()))
    }

    /// Save the diagram to a data directory
    pub fn save(&self, dir: &Path) -> Result<()> {
        fs::create_dir_all(dir)
            .with_context(|| format!("Failed to create directory {}", dir.display()))?;

        let path = dir.join(STORE_FILE);
        let json = crate::document::export_json(self).context("Failed to serialize diagram")?;
        fs::write(&path, json).with_context(|| format!("Failed to write {}", path.display()))?;

        debug!("Saved {} nodes / {} edges to {}", self.node_count(), self.edge_count(), path.display());
        Ok(())
    }

    /// Rebuild the petgraph from the store
    ///
    /// Node indices match positions in `nodes`, edge indices match `edges`.
    fn rebuild_graph(&mut self) {
        self.graph.clear();
        self.node_indices.clear();

        for node in &self.nodes {
            let idx = self.graph.add_node(node.id.clone());
            self.node_indices.insert(node.id.clone(), idx);
        }

        for edge in &self.edges {
            if let (Some(&from_idx), Some(&to_idx)) = (
                self.node_indices.get(&edge.source),
                self.node_indices.get(&edge.target),
            ) {
                self.graph.add_edge(from_idx, to_idx, edge.id.clone());
            }
        }
    }

    fn touch(&mut self) {
        self.metadata.updated_at = Utc::now();
    }

    // =========================================================================
    // Mutation
    // =========================================================================

    /// Add a service node
    pub fn add_node(&mut self, node: ServiceNode) -> DesignResult<()> {
        if self.node_indices.contains_key(&node.id) {
            return Err(DesignError::DuplicateNode(node.id));
        }
        node.config.validate().map_err(DesignError::InvalidConfig)?;

        let idx = self.graph.add_node(node.id.clone());
        self.node_indices.insert(node.id.clone(), idx);
        self.nodes.push(node);
        self.touch();
        Ok(())
    }

    /// Replace a node's configuration
    pub fn update_config(&mut self, id: &str, config: ServiceConfig) -> DesignResult<()> {
        config.validate().map_err(DesignError::InvalidConfig)?;
        let node = self
            .nodes
            .iter_mut()
            .find(|n| n.id == id)
            .ok_or_else(|| DesignError::NodeNotFound(id.into()))?;
        node.config = config;
        self.touch();
        Ok(())
    }

    /// Move a node on the canvas
    pub fn move_node(&mut self, id: &str, position: Position) -> DesignResult<()> {
        let node = self
            .nodes
            .iter_mut()
            .find(|n| n.id == id)
            .ok_or_else(|| DesignError::NodeNotFound(id.into()))?;
        node.position = position;
        Ok(())
    }

    /// Remove a node along with every edge touching it
    pub fn remove_node(&mut self, id: &str) -> DesignResult<ServiceNode> {
        let pos = self
            .nodes
            .iter()
            .position(|n| n.id == id)
            .ok_or_else(|| DesignError::NodeNotFound(id.into()))?;

        let node = self.nodes.remove(pos);
        let before = self.edges.len();
        self.edges.retain(|e| e.source != id && e.target != id);
        debug!("Removed {} with {} attached edges", id, before - self.edges.len());

        self.rebuild_graph();
        self.touch();
        Ok(node)
    }

    /// Connect two nodes; re-adding an identical edge is a no-op
    pub fn connect(
        &mut self,
        source: &str,
        target: &str,
        kind: CommunicationType,
        label: Option<String>,
    ) -> DesignResult<String> {
        let from_idx = *self
            .node_indices
            .get(source)
            .ok_or_else(|| DesignError::NodeNotFound(source.into()))?;
        let to_idx = *self
            .node_indices
            .get(target)
            .ok_or_else(|| DesignError::NodeNotFound(target.into()))?;
        if source == target {
            return Err(DesignError::SelfLoop(source.into()));
        }

        let edge = CommunicationEdge::new(source, target, kind, label);
        if self.edges.iter().any(|e| e.id == edge.id) {
            return Ok(edge.id);
        }

        let id = edge.id.clone();
        self.graph.add_edge(from_idx, to_idx, id.clone());
        self.edges.push(edge);
        self.touch();
        Ok(id)
    }

    /// Remove an edge by ID
    pub fn disconnect(&mut self, edge_id: &str) -> DesignResult<CommunicationEdge> {
        let pos = self
            .edges
            .iter()
            .position(|e| e.id == edge_id)
            .ok_or_else(|| DesignError::EdgeNotFound(edge_id.into()))?;
        let edge = self.edges.remove(pos);
        self.rebuild_graph();
        self.touch();
        Ok(edge)
    }

    /// Remove every edge from `source` to `target`, returning how many went
    pub fn disconnect_between(&mut self, source: &str, target: &str) -> usize {
        let before = self.edges.len();
        self.edges.retain(|e| !(e.source == source && e.target == target));
        let removed = before - self.edges.len();
        if removed > 0 {
            self.rebuild_graph();
            self.touch();
        }
        removed
    }

    // =========================================================================
    // Queries
    // =========================================================================

    /// Diagram metadata
    #[must_use]
    pub fn metadata(&self) -> &DiagramMetadata {
        &self.metadata
    }

    /// Get a node by ID
    #[must_use]
    pub fn node(&self, id: &str) -> Option<&ServiceNode> {
        self.node_indices.get(id).map(|idx| &self.nodes[idx.index()])
    }

    /// Get all nodes, in insertion order
    #[must_use]
    pub fn nodes(&self) -> &[ServiceNode] {
        &self.nodes
    }

    /// Get all edges, in insertion order
    #[must_use]
    pub fn edges(&self) -> &[CommunicationEdge] {
        &self.edges
    }

    /// Get edges leaving a node
    #[must_use]
    pub fn edges_from(&self, id: &str) -> Vec<&CommunicationEdge> {
        self.edges.iter().filter(|e| e.source == id).collect()
    }

    /// Get edges entering a node
    #[must_use]
    pub fn edges_to(&self, id: &str) -> Vec<&CommunicationEdge> {
        self.edges.iter().filter(|e| e.target == id).collect()
    }

    /// Inbound plus outbound edge count
    #[must_use]
    pub fn degree(&self, id: &str) -> usize {
        self.node_indices.get(id).map_or(0, |&idx| {
            self.graph.edges_directed(idx, petgraph::Direction::Outgoing).count()
                + self.graph.edges_directed(idx, petgraph::Direction::Incoming).count()
        })
    }

    /// Position of a node in `nodes()`
    #[must_use]
    pub fn index_of(&self, id: &str) -> Option<usize> {
        self.node_indices.get(id).map(|idx| idx.index())
    }

    /// Outgoing adjacency by node position, neighbors in edge insertion order
    #[must_use]
    pub fn adjacency(&self) -> Vec<Vec<usize>> {
        let mut adj = vec![Vec::new(); self.graph.node_count()];
        for edge in self.graph.edge_references() {
            adj[edge.source().index()].push(edge.target().index());
        }
        adj
    }

    /// Acyclic view of the links accepted by `include`
    ///
    /// Node weights are positions in `nodes()`. A depth-first search from
    /// every node in insertion order marks the links that close a cycle and
    /// those are left out, so the same diagram always loses the same links.
    #[must_use]
    pub fn acyclic_where(&self, include: impl Fn(&CommunicationEdge) -> bool) -> DiGraph<usize, ()> {
        let mut dag = DiGraph::with_capacity(self.nodes.len(), self.edges.len());
        for position in 0..self.nodes.len() {
            dag.add_node(position);
        }
        for edge in self.edges.iter().filter(|e| include(e)) {
            if let (Some(&s), Some(&t)) = (
                self.node_indices.get(&edge.source),
                self.node_indices.get(&edge.target),
            ) {
                dag.add_edge(s, t, ());
            }
        }

        let mut back_edges = HashSet::new();
        depth_first_search(&dag, dag.node_indices(), |event| {
            if let DfsEvent::BackEdge(u, v) = event {
                back_edges.insert((u, v));
            }
        });
        dag.retain_edges(|g, e| {
            g.edge_endpoints(e)
                .map_or(true, |ends| !back_edges.contains(&ends))
        });
        dag
    }

    /// Node positions of an acyclic view in topological order
    #[must_use]
    pub fn topological_positions(dag: &DiGraph<usize, ()>) -> Vec<usize> {
        toposort(dag, None)
            .map(|order| order.into_iter().map(|idx| dag[idx]).collect())
            .unwrap_or_default()
    }

    /// Backing petgraph, for algorithms that work on it directly
    #[must_use]
    pub fn petgraph(&self) -> &DiGraph<String, String> {
        &self.graph
    }

    /// Get node count
    #[must_use]
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// Get edge count
    #[must_use]
    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }

    /// Check if the diagram is empty
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Resolve a node ID or display name to an ID
    ///
    /// Tries an exact ID, then an exact name, then a unique substring of a name.
    pub fn resolve(&self, name_or_id: &str) -> DesignResult<String> {
        if self.node_indices.contains_key(name_or_id) {
            return Ok(name_or_id.to_string());
        }

        let exact: Vec<_> = self.nodes.iter().filter(|n| n.name() == name_or_id).collect();
        if exact.len() == 1 {
            return Ok(exact[0].id.clone());
        }

        let matches: Vec<_> = if exact.is_empty() {
            let needle = name_or_id.to_lowercase();
            self.nodes
                .iter()
                .filter(|n| n.name().to_lowercase().contains(&needle))
                .collect()
        } else {
            exact
        };

        match matches.len() {
            0 => Err(DesignError::NodeNotFound(name_or_id.into())),
            1 => Ok(matches[0].id.clone()),
            _ => Err(DesignError::AmbiguousNode {
                name: name_or_id.into(),
                candidates: matches.iter().map(|n| n.id.clone()).collect(),
            }),
        }
    }

    /// Export to DOT format for Graphviz
    #[must_use]
    pub fn to_dot(&self) -> String {
        let mut dot = String::from("digraph architecture {\n");
        dot.push_str("  rankdir=LR;\n");
        dot.push_str("  node [shape=box, style=rounded];\n\n");

        for node in &self.nodes {
            let label = format!(
                "{}\\n{} x{}",
                dot_escape(node.name()),
                dot_escape(&node.config.tech_stack),
                node.config.replicas
            );
            dot.push_str(&format!("  \"{}\" [label=\"{}\"];\n", dot_escape(&node.id), label));
        }

        dot.push('\n');

        for edge in &self.edges {
            let solid = edge.kind.is_synchronous() || edge.kind.is_encrypted();
            let style = if solid { "solid" } else { "dashed" };
            let color = if edge.kind.is_encrypted() { "darkgreen" } else { "black" };
            let label = edge.label.as_deref().unwrap_or(edge.kind.code());
            dot.push_str(&format!(
                "  \"{}\" -> \"{}\" [label=\"{}\", style={}, color={}];\n",
                dot_escape(&edge.source),
                dot_escape(&edge.target),
                dot_escape(label),
                style,
                color
            ));
        }

        dot.push_str("}\n");
        dot
    }
}

/// Escape a string for use inside a quoted DOT identifier
fn dot_escape(s: &str) -> String {
    s.replace('\\', "\\\\").replace('"', "\\\"")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::ServiceCategory;

    fn make_node(name: &str, category: ServiceCategory) -> ServiceNode {
        ServiceNode::new(ServiceConfig::new(name, category), Position::default())
    }

    fn three_node_graph() -> ArchitectureGraph {
        let mut graph = ArchitectureGraph::default();
        graph.add_node(make_node("gateway", ServiceCategory::Gateway)).unwrap();
        graph.add_node(make_node("orders", ServiceCategory::Service)).unwrap();
        graph.add_node(make_node("orders-db", ServiceCategory::Database)).unwrap();
        graph
            .connect("svc:gateway", "svc:orders", CommunicationType::Https, None)
            .unwrap();
        graph
            .connect("svc:orders", "svc:orders-db", CommunicationType::Sync, None)
            .unwrap();
        graph
    }

    #[test]
    fn test_add_node() {
        let mut graph = ArchitectureGraph::default();
        graph.add_node(make_node("Payment Service", ServiceCategory::Service)).unwrap();

        assert_eq!(graph.node_count(), 1);
        assert!(graph.node("svc:payment-service").is_some());
    }

    #[test]
    fn test_add_duplicate_node_rejected() {
        let mut graph = ArchitectureGraph::default();
        graph.add_node(make_node("orders", ServiceCategory::Service)).unwrap();
        let err = graph.add_node(make_node("orders", ServiceCategory::Service)).unwrap_err();

        assert!(matches!(err, DesignError::DuplicateNode(_)));
    }

    #[test]
    fn test_connect_and_query() {
        let graph = three_node_graph();

        assert_eq!(graph.edge_count(), 2);
        assert_eq!(graph.edges_from("svc:orders").len(), 1);
        assert_eq!(graph.edges_to("svc:orders").len(), 1);
        assert_eq!(graph.degree("svc:orders"), 2);
    }

    #[test]
    fn test_connect_is_idempotent() {
        let mut graph = three_node_graph();
        graph
            .connect("svc:gateway", "svc:orders", CommunicationType::Https, None)
            .unwrap();

        assert_eq!(graph.edge_count(), 2);
    }

    #[test]
    fn test_connect_rejects_missing_and_self_loop() {
        let mut graph = three_node_graph();

        assert!(matches!(
            graph.connect("svc:gateway", "svc:nope", CommunicationType::Sync, None),
            Err(DesignError::NodeNotFound(_))
        ));
        assert!(matches!(
            graph.connect("svc:orders", "svc:orders", CommunicationType::Sync, None),
            Err(DesignError::SelfLoop(_))
        ));
    }

    #[test]
    fn test_remove_node_cascades_edges() {
        let mut graph = three_node_graph();
        graph.remove_node("svc:orders").unwrap();

        assert_eq!(graph.node_count(), 2);
        assert_eq!(graph.edge_count(), 0);
        assert_eq!(graph.petgraph().edge_count(), 0);
        assert_eq!(graph.index_of("svc:orders-db"), Some(1));
    }

    #[test]
    fn test_disconnect_between() {
        let mut graph = three_node_graph();

        assert_eq!(graph.disconnect_between("svc:gateway", "svc:orders"), 1);
        assert_eq!(graph.disconnect_between("svc:gateway", "svc:orders"), 0);
        assert_eq!(graph.adjacency()[0], Vec::<usize>::new());
    }

    #[test]
    fn test_resolve_by_name() {
        let graph = three_node_graph();

        assert_eq!(graph.resolve("gateway").unwrap(), "svc:gateway");
        assert_eq!(graph.resolve("orders").unwrap(), "svc:orders");
        assert_eq!(graph.resolve("db").unwrap(), "svc:orders-db");
        assert!(matches!(graph.resolve("ord"), Err(DesignError::AmbiguousNode { .. })));
    }

    #[test]
    fn test_update_config_validates() {
        let mut graph = three_node_graph();
        let mut config = graph.node("svc:orders").unwrap().config.clone();
        config.replicas = 0;

        assert!(matches!(
            graph.update_config("svc:orders", config),
            Err(DesignError::InvalidConfig(_))
        ));
    }

    #[test]
    fn test_to_dot() {
        let mut graph = three_node_graph();
        graph.add_node(make_node("events", ServiceCategory::Queue)).unwrap();
        graph
            .connect("svc:orders", "svc:events", CommunicationType::Async, None)
            .unwrap();
        graph
            .connect("svc:gateway", "svc:orders-db", CommunicationType::EncryptedData, None)
            .unwrap();
        let dot = graph.to_dot();

        assert!(dot.contains("digraph architecture"));
        assert!(dot.contains("\"svc:gateway\" -> \"svc:orders\" [label=\"https\", style=solid, color=darkgreen]"));
        assert!(dot.contains("\"svc:orders\" -> \"svc:events\" [label=\"async\", style=dashed, color=black]"));
        assert!(dot.contains(
            "\"svc:gateway\" -> \"svc:orders-db\" [label=\"encrypted-data\", style=solid, color=darkgreen]"
        ));
    }

    #[test]
    fn test_to_dot_escapes_quotes() {
        let mut graph = ArchitectureGraph::default();
        let mut config = ServiceConfig::new("Bob's \"legacy\" API", ServiceCategory::Service);
        config.tech_stack = "C:\\bin".into();
        let node = ServiceNode::new(config, Position::default());
        let id = node.id.clone();
        graph.add_node(node).unwrap();
        graph.add_node(make_node("db", ServiceCategory::Database)).unwrap();
        graph
            .connect(&id, "svc:db", CommunicationType::Sync, Some("reads \"users\"".into()))
            .unwrap();
        let dot = graph.to_dot();

        assert!(dot.contains("[label=\"Bob's \\\"legacy\\\" API\\nC:\\\\bin x1\"]"));
        assert!(dot.contains("label=\"reads \\\"users\\\"\""));
    }

    #[test]
    fn test_acyclic_where_drops_cycle_closing_links() {
        let mut graph = ArchitectureGraph::default();
        for name in ["a", "b", "c", "d"] {
            graph.add_node(make_node(name, ServiceCategory::Service)).unwrap();
        }
        graph.connect("svc:a", "svc:b", CommunicationType::Sync, None).unwrap();
        graph.connect("svc:b", "svc:c", CommunicationType::Sync, None).unwrap();
        graph.connect("svc:c", "svc:a", CommunicationType::Sync, None).unwrap();
        graph.connect("svc:c", "svc:d", CommunicationType::Async, None).unwrap();

        let dag = graph.acyclic_where(|_| true);
        assert_eq!(dag.edge_count(), 3);
        assert!(!petgraph::algo::is_cyclic_directed(&dag));
        assert!(dag.find_edge(NodeIndex::new(2), NodeIndex::new(0)).is_none());
        assert_eq!(ArchitectureGraph::topological_positions(&dag), vec![0, 1, 2, 3]);

        let sync_only = graph.acyclic_where(|e| e.kind.is_synchronous());
        assert_eq!(sync_only.edge_count(), 2);
        assert_eq!(sync_only.node_count(), 4);
    }

    #[test]
    fn test_disconnect_by_edge_id() {
        let mut graph = three_node_graph();
        let edge_id = graph.edges()[0].id.clone();

        let removed = graph.disconnect(&edge_id).unwrap();
        assert_eq!(removed.source, "svc:gateway");
        assert_eq!(graph.edge_count(), 1);
        assert_eq!(graph.petgraph().edge_count(), 1);
        assert!(matches!(graph.disconnect(&edge_id), Err(DesignError::EdgeNotFound(_))));
    }
}
