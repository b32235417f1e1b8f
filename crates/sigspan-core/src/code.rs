//! # DFS Code
//!
//! The growth-order description of a pattern: one 5-tuple per edge, in the
//! order the edges were added.
//!
//! A tuple is *forward* when it introduces a new vertex (`from < to`) and
//! *backward* when it closes a cycle onto an existing one. Labels already
//! fixed by an earlier tuple are left unset, so two codes describing the
//! same growth step compare equal tuple by tuple.

use crate::graph::LabeledGraph;
use crate::{Label, VertexId};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::Index;

/// One edge of a DFS code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DfsTuple {
    pub from: VertexId,
    pub to: VertexId,
    pub from_label: Option<Label>,
    pub edge_label: Label,
    pub to_label: Option<Label>,
}

impl DfsTuple {
    /// The first tuple of every code: both vertex labels present.
    #[must_use]
    pub fn root(from_label: Label, edge_label: Label, to_label: Label) -> Self {
        Self {
            from: 0,
            to: 1,
            from_label: Some(from_label),
            edge_label,
            to_label: Some(to_label),
        }
    }

    /// A cycle-closing tuple between two existing vertices.
    #[must_use]
    pub fn backward(from: VertexId, to: VertexId, edge_label: Label) -> Self {
        Self {
            from,
            to,
            from_label: None,
            edge_label,
            to_label: None,
        }
    }

    /// A tuple adding vertex `to` with label `to_label`.
    #[must_use]
    pub fn forward(from: VertexId, to: VertexId, edge_label: Label, to_label: Label) -> Self {
        Self {
            from,
            to,
            from_label: None,
            edge_label,
            to_label: Some(to_label),
        }
    }

    /// Whether this tuple introduces a new vertex.
    #[must_use]
    pub fn is_forward(&self) -> bool {
        self.from < self.to
    }
}

/// An ordered sequence of [`DfsTuple`]s, grown and shrunk in stack order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DfsCode {
    tuples: Vec<DfsTuple>,
}

impl DfsCode {
    /// Create an empty code.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a tuple.
    pub fn push(&mut self, tuple: DfsTuple) {
        self.tuples.push(tuple);
    }

    /// Remove the last tuple.
    pub fn pop(&mut self) -> Option<DfsTuple> {
        self.tuples.pop()
    }

    /// Remove all tuples.
    pub fn clear(&mut self) {
        self.tuples.clear();
    }

    /// Number of tuples (edges).
    #[must_use]
    pub fn len(&self) -> usize {
        self.tuples.len()
    }

    /// Check if the code has no tuples.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.tuples.is_empty()
    }

    /// Tuple at position `i`.
    #[must_use]
    pub fn get(&self, i: usize) -> Option<&DfsTuple> {
        self.tuples.get(i)
    }

    /// All tuples in growth order.
    pub fn iter(&self) -> impl Iterator<Item = &DfsTuple> {
        self.tuples.iter()
    }

    /// Label of the root vertex, the smallest label any vertex of the
    /// pattern may carry.
    #[must_use]
    pub fn root_label(&self) -> Option<Label> {
        self.tuples.first().and_then(|t| t.from_label)
    }

    /// Code positions of the forward tuples on the right-most path,
    /// deepest first.
    ///
    /// Element 0 is the tuple that introduced the right-most vertex.
    #[must_use]
    pub fn rightmost_path(&self) -> Vec<usize> {
        let mut path = Vec::new();
        let mut old_from = None;

        for (i, tuple) in self.tuples.iter().enumerate().rev() {
            if tuple.is_forward() && (path.is_empty() || old_from == Some(tuple.to)) {
                path.push(i);
                old_from = Some(tuple.from);
            }
        }

        path
    }

    /// Number of vertices the code describes.
    #[must_use]
    pub fn node_count(&self) -> usize {
        self.tuples
            .iter()
            .map(|t| t.from.max(t.to) + 1)
            .max()
            .unwrap_or(0)
    }

    /// Rebuild the pattern graph described by this code.
    #[must_use]
    pub fn to_graph(&self, directed: bool) -> LabeledGraph {
        let mut labels: Vec<Label> = vec![0; self.node_count()];
        let mut edges = Vec::with_capacity(self.tuples.len());

        for tuple in &self.tuples {
            if let Some(label) = tuple.from_label {
                labels[tuple.from] = label;
            }
            if let Some(label) = tuple.to_label {
                labels[tuple.to] = label;
            }
            edges.push((tuple.from, tuple.to, tuple.edge_label));
        }

        LabeledGraph::assemble(directed, labels, &edges)
    }
}

impl Index<usize> for DfsCode {
    type Output = DfsTuple;

    fn index(&self, i: usize) -> &DfsTuple {
        &self.tuples[i]
    }
}

impl fmt::Display for DfsCode {
    /// `(from,to,fromLabel,edgeLabel,toLabel)` per tuple, unset labels as `-`.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = |l: Option<Label>| l.map_or_else(|| "-".to_string(), |l| l.to_string());
        for (i, t) in self.tuples.iter().enumerate() {
            if i > 0 {
                write!(f, " ")?;
            }
            write!(
                f,
                "({},{},{},{},{})",
                t.from,
                t.to,
                label(t.from_label),
                t.edge_label,
                label(t.to_label)
            )?;
        }
        Ok(())
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    /// 0-1-2 path with a backward edge 2-0 and a branch 1-3.
    fn sample() -> DfsCode {
        let mut code = DfsCode::new();
        code.push(DfsTuple::root(1, 0, 1));
        code.push(DfsTuple::forward(1, 2, 0, 2));
        code.push(DfsTuple::backward(2, 0, 1));
        code.push(DfsTuple::forward(1, 3, 0, 3));
        code
    }

    #[test]
    fn rightmost_path_follows_forward_chain() {
        let code = sample();
        // Right-most vertex 3 hangs off 1, which hangs off 0.
        assert_eq!(code.rightmost_path(), vec![3, 0]);
    }

    #[test]
    fn rightmost_path_skips_backward_tuples() {
        let mut code = sample();
        code.pop();
        assert_eq!(code.rightmost_path(), vec![1, 0]);
    }

    #[test]
    fn node_count_and_graph() {
        let code = sample();
        assert_eq!(code.node_count(), 4);

        let graph = code.to_graph(false);
        assert_eq!(graph.vertex_count(), 4);
        assert_eq!(graph.edge_count(), 4);
        assert_eq!(graph.label(2), 2);
        assert_eq!(graph.label(3), 3);
    }

    #[test]
    fn empty_code() {
        let code = DfsCode::new();
        assert_eq!(code.node_count(), 0);
        assert!(code.rightmost_path().is_empty());
        assert_eq!(code.root_label(), None);
    }

    #[test]
    fn display_marks_unset_labels() {
        let mut code = DfsCode::new();
        code.push(DfsTuple::root(1, 0, 2));
        code.push(DfsTuple::backward(1, 0, 4));
        assert_eq!(code.to_string(), "(0,1,1,0,2) (1,0,-,4,-)");
    }
}
