//! # Occurrence Representation
//!
//! Embeddings of the growing pattern, stored as an arena of
//! `(graph id, edge, parent)` nodes.
//!
//! Each node records the database edge matched by the last tuple of the
//! code and a handle to the embedding of the code without that tuple. A
//! recursion level remembers `arena.len()` on entry and truncates back to it
//! on return, so handles never dangle while they are reachable.

use crate::graph::{Edge, LabeledGraph};
use crate::{GraphId, VertexId};
use std::ops::Index;

// =============================================================================
// ARENA
// =============================================================================

/// Handle to a node in an [`EmbeddingArena`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct EmbeddingId(usize);

/// One matched edge of one occurrence.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Embedding {
    pub graph_id: GraphId,
    pub edge: Edge,
    pub parent: Option<EmbeddingId>,
}

/// Stack-disciplined storage for embedding nodes.
#[derive(Debug, Default)]
pub struct EmbeddingArena {
    nodes: Vec<Embedding>,
}

impl EmbeddingArena {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Store a node and return its handle.
    pub fn push(&mut self, embedding: Embedding) -> EmbeddingId {
        let id = EmbeddingId(self.nodes.len());
        self.nodes.push(embedding);
        id
    }

    #[must_use]
    pub fn get(&self, id: EmbeddingId) -> Option<&Embedding> {
        self.nodes.get(id.0)
    }

    /// High-water mark to hand back to [`truncate`](Self::truncate).
    #[must_use]
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Drop every node allocated after `mark`.
    pub fn truncate(&mut self, mark: usize) {
        self.nodes.truncate(mark);
    }

    pub fn clear(&mut self) {
        self.nodes.clear();
    }
}

impl Index<EmbeddingId> for EmbeddingArena {
    type Output = Embedding;

    fn index(&self, id: EmbeddingId) -> &Embedding {
        &self.nodes[id.0]
    }
}

// =============================================================================
// HISTORY
// =============================================================================

/// The root-to-leaf edge sequence of one embedding, indexable by code
/// position, with used-edge and used-vertex marks.
///
/// Buffers are kept between builds.
#[derive(Debug, Default)]
pub struct History {
    edges: Vec<Edge>,
    has_edge: Vec<bool>,
    has_vertex: Vec<bool>,
}

impl History {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Materialize the chain ending at `leaf` inside `graph`.
    pub fn build(&mut self, graph: &LabeledGraph, arena: &EmbeddingArena, leaf: EmbeddingId) {
        self.edges.clear();
        self.has_edge.clear();
        self.has_edge.resize(graph.edge_count(), false);
        self.has_vertex.clear();
        self.has_vertex.resize(graph.vertex_count(), false);

        let mut cursor = Some(leaf);
        while let Some(id) = cursor {
            let node = &arena[id];
            let edge = node.edge;
            self.has_edge[edge.id] = true;
            self.has_vertex[edge.from] = true;
            self.has_vertex[edge.to] = true;
            self.edges.push(edge);
            cursor = node.parent;
        }

        self.edges.reverse();
    }

    /// Number of edges in the chain.
    #[must_use]
    pub fn len(&self) -> usize {
        self.edges.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.edges.is_empty()
    }

    /// Whether the edge with graph-local id `id` is part of the embedding.
    #[must_use]
    pub fn has_edge(&self, id: usize) -> bool {
        self.has_edge.get(id).copied().unwrap_or(false)
    }

    /// Whether vertex `v` is covered by the embedding.
    #[must_use]
    pub fn has_vertex(&self, v: VertexId) -> bool {
        self.has_vertex.get(v).copied().unwrap_or(false)
    }
}

impl Index<usize> for History {
    type Output = Edge;

    fn index(&self, position: usize) -> &Edge {
        &self.edges[position]
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn path() -> LabeledGraph {
        LabeledGraph::from_parts(false, vec![0, 1, 2, 3], &[(0, 1, 0), (1, 2, 0), (2, 3, 0)])
            .expect("path")
    }

    fn edge_between(graph: &LabeledGraph, from: VertexId, to: VertexId) -> Edge {
        *graph[from]
            .edges
            .iter()
            .find(|e| e.to == to)
            .expect("edge")
    }

    #[test]
    fn history_follows_parent_chain_in_growth_order() {
        let graph = path();
        let mut arena = EmbeddingArena::new();
        let root = arena.push(Embedding {
            graph_id: 0,
            edge: edge_between(&graph, 0, 1),
            parent: None,
        });
        let leaf = arena.push(Embedding {
            graph_id: 0,
            edge: edge_between(&graph, 1, 2),
            parent: Some(root),
        });

        let mut history = History::new();
        history.build(&graph, &arena, leaf);

        assert_eq!(history.len(), 2);
        assert_eq!(history[0].from, 0);
        assert_eq!(history[1].to, 2);
        assert!(history.has_vertex(2));
        assert!(!history.has_vertex(3));
        assert!(history.has_edge(history[1].id));
        assert!(!history.has_edge(edge_between(&graph, 2, 3).id));
    }

    #[test]
    fn rebuild_clears_previous_marks() {
        let graph = path();
        let mut arena = EmbeddingArena::new();
        let far = arena.push(Embedding {
            graph_id: 0,
            edge: edge_between(&graph, 2, 3),
            parent: None,
        });
        let near = arena.push(Embedding {
            graph_id: 0,
            edge: edge_between(&graph, 0, 1),
            parent: None,
        });

        let mut history = History::new();
        history.build(&graph, &arena, far);
        history.build(&graph, &arena, near);

        assert_eq!(history.len(), 1);
        assert!(!history.has_vertex(3));
        assert!(history.has_vertex(0));
    }

    #[test]
    fn truncate_restores_high_water_mark() {
        let graph = path();
        let mut arena = EmbeddingArena::new();
        let edge = edge_between(&graph, 0, 1);
        arena.push(Embedding {
            graph_id: 0,
            edge,
            parent: None,
        });

        let mark = arena.len();
        for _ in 0..5 {
            arena.push(Embedding {
                graph_id: 1,
                edge,
                parent: None,
            });
        }
        arena.truncate(mark);

        assert_eq!(arena.len(), 1);
        assert!(arena.get(EmbeddingId(1)).is_none());
    }
}
