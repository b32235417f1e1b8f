//! # Canonical Code Minimality Check
//!
//! A DFS code is canonical when no other valid growth order of the same
//! graph yields a smaller code. The check re-grows a code on the pattern
//! graph, always taking the smallest available extension, and compares it
//! tuple by tuple against the candidate. The first mismatch means the
//! candidate is a duplicate.
//!
//! The same greedy re-growth with nothing to compare against yields the
//! minimum code of an arbitrary connected graph.
//!
//! The checker owns its own arena and history so it never touches the
//! mining state.

use crate::code::{DfsCode, DfsTuple};
use crate::embedding::{Embedding, EmbeddingArena, EmbeddingId, History};
use crate::extension;
use crate::graph::LabeledGraph;
use crate::{Label, VertexId};
use std::collections::BTreeMap;

/// Reusable scratch space for canonicality checks.
#[derive(Debug, Default)]
pub struct CanonicalChecker {
    code: DfsCode,
    arena: EmbeddingArena,
    history: History,
}

impl CanonicalChecker {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether `candidate` is the minimum code of the graph it describes.
    pub fn is_min(&mut self, candidate: &DfsCode, directed: bool) -> bool {
        if candidate.len() <= 1 {
            return true;
        }
        let graph = candidate.to_graph(directed);
        self.grow(&graph, Some(candidate))
    }

    /// The minimum DFS code of a connected graph. Empty when the graph has
    /// no edges.
    pub fn min_code(&mut self, graph: &LabeledGraph) -> DfsCode {
        self.grow(graph, None);
        self.code.clone()
    }

    /// Greedy smallest-extension growth. Returns `false` as soon as the grown
    /// code departs from `target`.
    fn grow(&mut self, graph: &LabeledGraph, target: Option<&DfsCode>) -> bool {
        self.code.clear();
        self.arena.clear();

        let mut roots: BTreeMap<(Label, Label, Label), Vec<EmbeddingId>> = BTreeMap::new();
        for vertex in graph.vertices() {
            for edge in extension::forward_root(graph, vertex) {
                let id = self.arena.push(Embedding {
                    graph_id: 0,
                    edge: *edge,
                    parent: None,
                });
                roots
                    .entry((vertex.label, edge.label, graph.label(edge.to)))
                    .or_default()
                    .push(id);
            }
        }

        let Some(((from_label, edge_label, to_label), mut projected)) = roots.into_iter().next()
        else {
            return true;
        };
        self.code
            .push(DfsTuple::root(from_label, edge_label, to_label));
        if self.departs_from(target) {
            return false;
        }

        loop {
            let rmpath = self.code.rightmost_path();
            let (Some(&deepest), Some(min_label)) = (rmpath.first(), self.code.root_label()) else {
                return true;
            };
            let maxtoc = self.code[deepest].to;

            if let Some((tuple, next)) = self.smallest_backward(graph, &projected, &rmpath) {
                self.code.push(tuple);
                projected = next;
            } else if let Some((tuple, next)) =
                self.smallest_forward(graph, &projected, &rmpath, min_label, maxtoc)
            {
                self.code.push(tuple);
                projected = next;
            } else {
                return true;
            }

            if self.departs_from(target) {
                return false;
            }
        }
    }

    /// Backward extensions from the root-most right-most-path vertex that
    /// admits any; the smallest edge label wins.
    fn smallest_backward(
        &mut self,
        graph: &LabeledGraph,
        projected: &[EmbeddingId],
        rmpath: &[usize],
    ) -> Option<(DfsTuple, Vec<EmbeddingId>)> {
        let deepest = rmpath[0];
        let maxtoc = self.code[deepest].to;

        for &pos in rmpath.iter().skip(1).rev() {
            let mut found: BTreeMap<Label, Vec<EmbeddingId>> = BTreeMap::new();

            for &id in projected {
                self.history.build(graph, &self.arena, id);
                if let Some(edge) =
                    extension::backward(graph, &self.history[pos], &self.history[deepest], &self.history)
                {
                    let child = self.arena.push(Embedding {
                        graph_id: 0,
                        edge,
                        parent: Some(id),
                    });
                    found.entry(edge.label).or_default().push(child);
                }
            }

            if let Some((edge_label, next)) = found.into_iter().next() {
                let to = self.code[pos].from;
                return Some((DfsTuple::backward(maxtoc, to, edge_label), next));
            }
        }

        None
    }

    /// Pure-forward extensions first; otherwise forward extensions from the
    /// deepest right-most-path vertex that admits any.
    fn smallest_forward(
        &mut self,
        graph: &LabeledGraph,
        projected: &[EmbeddingId],
        rmpath: &[usize],
        min_label: Label,
        maxtoc: VertexId,
    ) -> Option<(DfsTuple, Vec<EmbeddingId>)> {
        let deepest = rmpath[0];
        let mut found: BTreeMap<(Label, Label), Vec<EmbeddingId>> = BTreeMap::new();

        for &id in projected {
            self.history.build(graph, &self.arena, id);
            for edge in extension::forward_pure(graph, &self.history[deepest], min_label, &self.history) {
                let child = self.arena.push(Embedding {
                    graph_id: 0,
                    edge: *edge,
                    parent: Some(id),
                });
                found
                    .entry((edge.label, graph.label(edge.to)))
                    .or_default()
                    .push(child);
            }
        }
        if let Some(((edge_label, to_label), next)) = found.into_iter().next() {
            return Some((DfsTuple::forward(maxtoc, maxtoc + 1, edge_label, to_label), next));
        }

        for &pos in rmpath {
            let mut found: BTreeMap<(Label, Label), Vec<EmbeddingId>> = BTreeMap::new();

            for &id in projected {
                self.history.build(graph, &self.arena, id);
                for edge in
                    extension::forward_rmpath(graph, &self.history[pos], min_label, &self.history)
                {
                    let child = self.arena.push(Embedding {
                        graph_id: 0,
                        edge: *edge,
                        parent: Some(id),
                    });
                    found
                        .entry((edge.label, graph.label(edge.to)))
                        .or_default()
                        .push(child);
                }
            }

            if let Some(((edge_label, to_label), next)) = found.into_iter().next() {
                let from = self.code[pos].from;
                return Some((
                    DfsTuple::forward(from, maxtoc + 1, edge_label, to_label),
                    next,
                ));
            }
        }

        None
    }

    fn departs_from(&self, target: Option<&DfsCode>) -> bool {
        let Some(target) = target else {
            return false;
        };
        let pos = self.code.len() - 1;
        target.get(pos) != self.code.get(pos)
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn triangle_code(order: [Label; 3]) -> DfsCode {
        let mut code = DfsCode::new();
        code.push(DfsTuple::root(0, order[0], 0));
        code.push(DfsTuple::forward(1, 2, order[1], 0));
        code.push(DfsTuple::backward(2, 0, order[2]));
        code
    }

    #[test]
    fn single_tuple_is_minimal() {
        let mut code = DfsCode::new();
        code.push(DfsTuple::root(3, 1, 4));
        assert!(CanonicalChecker::new().is_min(&code, false));
    }

    #[test]
    fn triangle_grown_from_smallest_edge_is_minimal() {
        let mut checker = CanonicalChecker::new();
        assert!(checker.is_min(&triangle_code([1, 2, 3]), false));
    }

    #[test]
    fn triangle_grown_from_larger_edge_is_not_minimal() {
        let mut checker = CanonicalChecker::new();
        assert!(!checker.is_min(&triangle_code([2, 3, 1]), false));
    }

    #[test]
    fn path_grown_from_wrong_end_is_not_minimal() {
        // a(0) -1- b(0) -2- c(0): growing from the middle over edge 2 first
        // is larger than starting at edge 1.
        let mut code = DfsCode::new();
        code.push(DfsTuple::root(0, 2, 0));
        code.push(DfsTuple::forward(0, 2, 1, 0));
        assert!(!CanonicalChecker::new().is_min(&code, false));
    }

    #[test]
    fn min_code_matches_minimal_candidate() {
        let mut checker = CanonicalChecker::new();
        let minimal = triangle_code([1, 2, 3]);
        let graph = triangle_code([2, 3, 1]).to_graph(false);

        assert_eq!(checker.min_code(&graph), minimal);
    }

    #[test]
    fn min_code_of_edgeless_graph_is_empty() {
        let graph = LabeledGraph::single_vertex(4, false);
        assert!(CanonicalChecker::new().min_code(&graph).is_empty());
    }

    #[test]
    fn checker_is_reusable() {
        let mut checker = CanonicalChecker::new();
        assert!(!checker.is_min(&triangle_code([2, 3, 1]), false));
        assert!(checker.is_min(&triangle_code([1, 2, 3]), false));
        assert!(!checker.is_min(&triangle_code([2, 3, 1]), false));
    }
}
