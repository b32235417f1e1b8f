//! # Extension Rules
//!
//! One-edge extensions of an embedding along the right-most path. The
//! growth engine collects every candidate; the canonicality check takes the
//! smallest. Both must see exactly the same candidates, so the rules live
//! here once.
//!
//! - `min_label` is the root label of the code; no vertex below it is added
//! - Directed graphs only ever follow outgoing adjacency entries

use crate::Label;
use crate::embedding::History;
use crate::graph::{Edge, LabeledGraph, Vertex};

/// Edges that can start a code at `vertex`: the far endpoint's label is not
/// smaller than the vertex's own.
pub fn forward_root<'g>(
    graph: &'g LabeledGraph,
    vertex: &'g Vertex,
) -> impl Iterator<Item = &'g Edge> {
    vertex
        .edges
        .iter()
        .filter(move |e| vertex.label <= graph.label(e.to))
}

/// The cycle-closing edge from the right-most vertex (`leaf.to`) back to
/// `anchor.from`, if one exists and keeps the code ordered.
#[must_use]
pub fn backward(
    graph: &LabeledGraph,
    anchor: &Edge,
    leaf: &Edge,
    history: &History,
) -> Option<Edge> {
    graph[leaf.to]
        .edges
        .iter()
        .filter(|e| !history.has_edge(e.id))
        .find(|e| {
            e.to == anchor.from
                && (anchor.label < e.label
                    || (anchor.label == e.label
                        && graph.label(anchor.to) <= graph.label(leaf.to)))
        })
        .copied()
}

/// Edges from the right-most vertex (`leaf.to`) to vertices not yet covered.
pub fn forward_pure<'g>(
    graph: &'g LabeledGraph,
    leaf: &Edge,
    min_label: Label,
    history: &'g History,
) -> impl Iterator<Item = &'g Edge> + use<'g> {
    graph[leaf.to]
        .edges
        .iter()
        .filter(move |e| min_label <= graph.label(e.to) && !history.has_vertex(e.to))
}

/// Edges leaving `edge.from`, a vertex on the right-most path, towards a new
/// vertex, ordered no smaller than `edge` itself.
pub fn forward_rmpath<'g>(
    graph: &'g LabeledGraph,
    edge: &Edge,
    min_label: Label,
    history: &'g History,
) -> impl Iterator<Item = &'g Edge> + use<'g> {
    let on_path = *edge;
    let to_label = graph.label(on_path.to);

    graph[on_path.from].edges.iter().filter(move |e| {
        let next_label = graph.label(e.to);
        e.to != on_path.to
            && min_label <= next_label
            && !history.has_vertex(e.to)
            && (on_path.label < e.label || (on_path.label == e.label && to_label <= next_label))
    })
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::embedding::{Embedding, EmbeddingArena};
    use crate::VertexId;

    fn edge_between(graph: &LabeledGraph, from: VertexId, to: VertexId) -> Edge {
        *graph[from]
            .edges
            .iter()
            .find(|e| e.to == to)
            .expect("edge")
    }

    fn history_of(graph: &LabeledGraph, chain: &[(VertexId, VertexId)]) -> History {
        let mut arena = EmbeddingArena::new();
        let mut parent = None;
        for &(from, to) in chain {
            parent = Some(arena.push(Embedding {
                graph_id: 0,
                edge: edge_between(graph, from, to),
                parent,
            }));
        }
        let mut history = History::new();
        if let Some(leaf) = parent {
            history.build(graph, &arena, leaf);
        }
        history
    }

    #[test]
    fn forward_root_respects_label_order() {
        let graph = LabeledGraph::from_parts(false, vec![2, 1], &[(0, 1, 0)]).expect("graph");
        assert_eq!(forward_root(&graph, &graph[0]).count(), 0);
        assert_eq!(forward_root(&graph, &graph[1]).count(), 1);
    }

    #[test]
    fn backward_closes_triangle() {
        let graph =
            LabeledGraph::from_parts(false, vec![0, 0, 0], &[(0, 1, 0), (1, 2, 0), (2, 0, 0)])
                .expect("triangle");
        let history = history_of(&graph, &[(0, 1), (1, 2)]);

        let closing = backward(&graph, &history[0], &history[1], &history).expect("cycle edge");
        assert_eq!((closing.from, closing.to), (2, 0));
    }

    #[test]
    fn backward_skips_used_edges() {
        let graph = LabeledGraph::from_parts(false, vec![0, 0], &[(0, 1, 0)]).expect("edge");
        let history = history_of(&graph, &[(0, 1)]);
        assert!(backward(&graph, &history[0], &history[0], &history).is_none());
    }

    #[test]
    fn forward_pure_avoids_covered_vertices() {
        let graph =
            LabeledGraph::from_parts(false, vec![0, 0, 0], &[(0, 1, 0), (1, 2, 0), (2, 0, 0)])
                .expect("triangle");
        let history = history_of(&graph, &[(0, 1)]);

        let targets: Vec<_> = forward_pure(&graph, &history[0], 0, &history)
            .map(|e| e.to)
            .collect();
        assert_eq!(targets, vec![2]);
    }

    #[test]
    fn forward_pure_respects_min_label() {
        let graph =
            LabeledGraph::from_parts(false, vec![1, 1, 0], &[(0, 1, 0), (1, 2, 0)]).expect("path");
        let history = history_of(&graph, &[(0, 1)]);
        assert_eq!(forward_pure(&graph, &history[0], 1, &history).count(), 0);
    }

    #[test]
    fn forward_rmpath_requires_order_against_path_edge() {
        // Star: center 0 with leaves 1 (edge label 5) and 2 (edge label 3).
        let graph = LabeledGraph::from_parts(false, vec![0, 1, 1], &[(0, 1, 5), (0, 2, 3)])
            .expect("star");

        let history = history_of(&graph, &[(0, 1)]);
        assert_eq!(forward_rmpath(&graph, &history[0], 0, &history).count(), 0);

        let history = history_of(&graph, &[(0, 2)]);
        let targets: Vec<_> = forward_rmpath(&graph, &history[0], 0, &history)
            .map(|e| e.to)
            .collect();
        assert_eq!(targets, vec![1]);
    }
}
