//! Lifecycle graph projection.
//!
//! Turns stage records and cycle connection records into the node/edge lists
//! rendered by the dashboard diagram. Connections whose endpoints are not
//! known stages are dropped and reported, never fatal.

use super::layout::{DEFAULT_RADIUS, Position, circle_layout};
use super::{ConnectionKind, CycleConnection, Stage, normalize_stage_name};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// A stage as rendered in the diagram.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GraphNode {
    /// Stage identifier
    pub id: String,

    /// Display label
    pub label: String,

    /// Stage definition, shown on hover
    pub tooltip: String,

    pub position: Position,

    /// Rendering hint for the selected stage
    #[serde(default)]
    pub highlighted: bool,
}

/// A cycle connection as rendered in the diagram.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GraphEdge {
    pub source: String,
    pub target: String,
    pub kind: ConnectionKind,

    /// Set when either endpoint is the selected stage
    #[serde(default)]
    pub highlighted: bool,
}

/// A connection that was dropped because an endpoint is not a known stage.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SkippedEdge {
    pub start: String,
    pub end: String,
    pub kind: ConnectionKind,
}

/// The projected lifecycle diagram.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LifecycleGraph {
    pub nodes: Vec<GraphNode>,
    pub edges: Vec<GraphEdge>,

    /// Connections dropped during projection
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub skipped: Vec<SkippedEdge>,
}

impl LifecycleGraph {
    /// An empty graph, used when the underlying records cannot be read.
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty() && self.edges.is_empty()
    }

    /// Look up a node by stage identifier.
    pub fn node(&self, id: &str) -> Option<&GraphNode> {
        self.nodes.iter().find(|n| n.id == id)
    }

    /// Return a copy of this graph with `selected` and its incident edges
    /// highlighted. Any previous highlighting is cleared first, so applying the
    /// same selection repeatedly yields the same graph. `None` or an unknown
    /// identifier highlights nothing.
    pub fn with_selection(&self, selected: Option<&str>) -> LifecycleGraph {
        let selected = selected
            .map(normalize_stage_name)
            .filter(|s| self.node(s).is_some());

        let mut graph = self.clone();
        for node in &mut graph.nodes {
            node.highlighted = selected.as_deref() == Some(node.id.as_str());
        }
        for edge in &mut graph.edges {
            edge.highlighted = match selected.as_deref() {
                Some(s) => edge.source == s || edge.target == s,
                None => false,
            };
        }
        graph
    }

    /// Identifier of the highlighted node, if any.
    pub fn selected(&self) -> Option<&str> {
        self.nodes
            .iter()
            .find(|n| n.highlighted)
            .map(|n| n.id.as_str())
    }
}

/// Project stage and connection records into a renderable graph.
///
/// Nodes keep the order of `stages` and are laid out on a circle. A stage
/// identifier that appears more than once keeps its first record; later
/// duplicates are reported and ignored.
pub fn project(stages: &[Stage], connections: &[CycleConnection]) -> LifecycleGraph {
    let mut seen: HashSet<&str> = HashSet::with_capacity(stages.len());
    let mut unique: Vec<&Stage> = Vec::with_capacity(stages.len());
    for stage in stages {
        if seen.insert(stage.name.as_str()) {
            unique.push(stage);
        } else {
            tracing::warn!(stage = %stage.name, "duplicate stage identifier ignored");
        }
    }

    let positions = circle_layout(unique.len(), DEFAULT_RADIUS);
    let nodes: Vec<GraphNode> = unique
        .iter()
        .zip(positions)
        .map(|(stage, position)| GraphNode {
            id: stage.name.clone(),
            label: stage.name.clone(),
            tooltip: stage.description.clone(),
            position,
            highlighted: false,
        })
        .collect();

    let mut edges = Vec::with_capacity(connections.len());
    let mut skipped = Vec::new();
    for conn in connections {
        if seen.contains(conn.start.as_str()) && seen.contains(conn.end.as_str()) {
            edges.push(GraphEdge {
                source: conn.start.clone(),
                target: conn.end.clone(),
                kind: conn.kind,
                highlighted: false,
            });
        } else {
            tracing::warn!(
                start = %conn.start,
                end = %conn.end,
                kind = %conn.kind,
                "skipping connection with unknown endpoint"
            );
            skipped.push(SkippedEdge {
                start: conn.start.clone(),
                end: conn.end.clone(),
                kind: conn.kind,
            });
        }
    }

    LifecycleGraph {
        nodes,
        edges,
        skipped,
    }
}
