//! # Graph Corpus
//!
//! Labeled graphs and the immutable database the miner runs over.
//!
//! Adjacency lists are plain vectors so that edge enumeration order is the
//! input order. Undirected edges are stored once per endpoint and share a
//! graph-local edge id, which is what occurrence histories mark as used.

use crate::primitives::MAX_GRAPH_VERTICES;
use crate::{Frequency, GraphId, Label, SigspanError, VertexId};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::ops::Index;

// =============================================================================
// EDGE & VERTEX
// =============================================================================

/// One adjacency entry. `from` is always the vertex owning the entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Edge {
    pub from: VertexId,
    pub to: VertexId,
    pub label: Label,
    /// Graph-local id, shared by both directions of an undirected edge.
    pub id: usize,
}

/// A labeled vertex with its outgoing adjacency entries.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Vertex {
    pub label: Label,
    pub edges: Vec<Edge>,
}

// =============================================================================
// LABELED GRAPH
// =============================================================================

/// An immutable vertex- and edge-labeled graph.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(into = "SerializableGraph", try_from = "SerializableGraph")]
pub struct LabeledGraph {
    vertices: Vec<Vertex>,
    edge_count: usize,
    directed: bool,
}

impl LabeledGraph {
    /// Build a graph from vertex labels and `(from, to, label)` triples.
    ///
    /// Fails if an endpoint is not a declared vertex, if an edge is a self
    /// loop, or if the graph exceeds `MAX_GRAPH_VERTICES`.
    pub fn from_parts(
        directed: bool,
        labels: Vec<Label>,
        edges: &[(VertexId, VertexId, Label)],
    ) -> Result<Self, SigspanError> {
        if labels.len() > MAX_GRAPH_VERTICES {
            return Err(SigspanError::InvalidGraph(format!(
                "{} vertices exceeds maximum {}",
                labels.len(),
                MAX_GRAPH_VERTICES
            )));
        }
        for &(from, to, _) in edges {
            if from >= labels.len() || to >= labels.len() {
                return Err(SigspanError::InvalidGraph(format!(
                    "edge {} -> {} references an undeclared vertex",
                    from, to
                )));
            }
            if from == to {
                return Err(SigspanError::InvalidGraph(format!(
                    "self loop on vertex {}",
                    from
                )));
            }
        }
        Ok(Self::assemble(directed, labels, edges))
    }

    /// Build a graph from already validated parts.
    pub(crate) fn assemble(
        directed: bool,
        labels: Vec<Label>,
        edges: &[(VertexId, VertexId, Label)],
    ) -> Self {
        let mut vertices: Vec<Vertex> = labels
            .into_iter()
            .map(|label| Vertex {
                label,
                edges: Vec::new(),
            })
            .collect();

        for &(from, to, label) in edges {
            vertices[from].edges.push(Edge {
                from,
                to,
                label,
                id: 0,
            });
            if !directed {
                vertices[to].edges.push(Edge {
                    from: to,
                    to: from,
                    label,
                    id: 0,
                });
            }
        }

        let mut graph = Self {
            vertices,
            edge_count: 0,
            directed,
        };
        graph.assign_edge_ids();
        graph
    }

    /// A graph with one vertex and no edges.
    #[must_use]
    pub fn single_vertex(label: Label, directed: bool) -> Self {
        Self::assemble(directed, vec![label], &[])
    }

    /// Give every adjacency entry its edge id; both directions of an
    /// undirected edge map to the same key.
    fn assign_edge_ids(&mut self) {
        let mut ids: BTreeMap<(VertexId, VertexId, Label), usize> = BTreeMap::new();
        let directed = self.directed;

        for vertex in &mut self.vertices {
            for edge in &mut vertex.edges {
                let key = if directed || edge.from <= edge.to {
                    (edge.from, edge.to, edge.label)
                } else {
                    (edge.to, edge.from, edge.label)
                };
                let next = ids.len();
                edge.id = *ids.entry(key).or_insert(next);
            }
        }

        self.edge_count = ids.len();
    }

    /// Number of vertices.
    #[must_use]
    pub fn vertex_count(&self) -> usize {
        self.vertices.len()
    }

    /// Number of distinct edges (edge ids).
    #[must_use]
    pub fn edge_count(&self) -> usize {
        self.edge_count
    }

    /// Whether edges are directed.
    #[must_use]
    pub fn is_directed(&self) -> bool {
        self.directed
    }

    /// Check if the graph has no vertices.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.vertices.is_empty()
    }

    /// Label of vertex `v`.
    #[must_use]
    pub fn label(&self, v: VertexId) -> Label {
        self.vertices[v].label
    }

    /// All vertices in id order.
    pub fn vertices(&self) -> impl Iterator<Item = &Vertex> {
        self.vertices.iter()
    }

    /// Each stored edge once, as `(from, to, label)`, in adjacency order.
    pub fn edge_list(&self) -> impl Iterator<Item = (VertexId, VertexId, Label)> + '_ {
        let directed = self.directed;
        self.vertices
            .iter()
            .flat_map(|v| v.edges.iter())
            .filter(move |e| directed || e.from <= e.to)
            .map(|e| (e.from, e.to, e.label))
    }
}

impl Index<VertexId> for LabeledGraph {
    type Output = Vertex;

    fn index(&self, v: VertexId) -> &Vertex {
        &self.vertices[v]
    }
}

// =============================================================================
// GRAPH DATABASE
// =============================================================================

/// The ordered, immutable input corpus. Index = graph id.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GraphDatabase {
    graphs: Vec<LabeledGraph>,
    directed: bool,
}

impl GraphDatabase {
    /// Build a database; every graph must share the database's direction.
    pub fn from_graphs(graphs: Vec<LabeledGraph>, directed: bool) -> Result<Self, SigspanError> {
        if let Some(pos) = graphs.iter().position(|g| g.is_directed() != directed) {
            return Err(SigspanError::InvalidGraph(format!(
                "graph {} does not match the database direction",
                pos
            )));
        }
        Ok(Self { graphs, directed })
    }

    /// Number of graphs.
    #[must_use]
    pub fn len(&self) -> usize {
        self.graphs.len()
    }

    /// Check if the database holds no graphs.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.graphs.is_empty()
    }

    /// Whether every graph is directed.
    #[must_use]
    pub fn is_directed(&self) -> bool {
        self.directed
    }

    /// Get a graph by id.
    #[must_use]
    pub fn get(&self, id: GraphId) -> Option<&LabeledGraph> {
        self.graphs.get(id)
    }

    /// All graphs in id order.
    pub fn graphs(&self) -> impl Iterator<Item = &LabeledGraph> {
        self.graphs.iter()
    }

    /// Total vertices across the database.
    #[must_use]
    pub fn total_vertices(&self) -> usize {
        self.graphs.iter().map(LabeledGraph::vertex_count).sum()
    }

    /// Total distinct edges across the database.
    #[must_use]
    pub fn total_edges(&self) -> usize {
        self.graphs.iter().map(LabeledGraph::edge_count).sum()
    }

    /// For every vertex label, the number of graphs containing it.
    #[must_use]
    pub fn vertex_label_support(&self) -> BTreeMap<Label, Frequency> {
        let mut support: BTreeMap<Label, Frequency> = BTreeMap::new();
        for graph in &self.graphs {
            let labels: BTreeSet<Label> = graph.vertices().map(|v| v.label).collect();
            for label in labels {
                *support.entry(label).or_insert(0) += 1;
            }
        }
        support
    }
}

impl Index<GraphId> for GraphDatabase {
    type Output = LabeledGraph;

    fn index(&self, id: GraphId) -> &LabeledGraph {
        &self.graphs[id]
    }
}

// =============================================================================
// SERIALIZATION SUPPORT
// =============================================================================

/// Serializable representation of a graph: labels plus an edge listing.
/// Deserializing goes through the same validation as `from_parts`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SerializableGraph {
    pub directed: bool,
    pub labels: Vec<Label>,
    pub edges: Vec<(VertexId, VertexId, Label)>,
}

impl From<&LabeledGraph> for SerializableGraph {
    fn from(graph: &LabeledGraph) -> Self {
        Self {
            directed: graph.directed,
            labels: graph.vertices.iter().map(|v| v.label).collect(),
            edges: graph.edge_list().collect(),
        }
    }
}

impl From<LabeledGraph> for SerializableGraph {
    fn from(graph: LabeledGraph) -> Self {
        Self::from(&graph)
    }
}

impl TryFrom<SerializableGraph> for LabeledGraph {
    type Error = SigspanError;

    fn try_from(sg: SerializableGraph) -> Result<Self, SigspanError> {
        LabeledGraph::from_parts(sg.directed, sg.labels, &sg.edges)
    }
}

// =============================================================================
// TESTS
// =============================================================================
