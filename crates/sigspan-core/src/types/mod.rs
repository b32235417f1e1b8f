//! # Core Type Definitions
//!
//! This module contains the shared vocabulary of the mining engine:
//! - Scalar aliases (`Label`, `GraphId`, `VertexId`, `Frequency`)
//! - The reporting seam (`PatternSink`, `Pattern`)
//! - Error types (`SigspanError`)
//!
//! ## Determinism Guarantees
//!
//! Every identifier is a plain integer with a total order, so all grouping
//! in the engine goes through `BTreeMap` and produces the same discovery
//! order on every run.

use crate::code::DfsCode;
use crate::graph::LabeledGraph;
use serde::{Deserialize, Serialize};
use thiserror::Error;

// =============================================================================
// SCALARS
// =============================================================================

/// Vertex or edge label as read from the input corpus.
pub type Label = i32;

/// Position of a graph inside its [`GraphDatabase`](crate::graph::GraphDatabase).
pub type GraphId = usize;

/// Position of a vertex inside one graph.
pub type VertexId = usize;

/// Number of distinct graphs a pattern occurs in.
pub type Frequency = u32;

// =============================================================================
// PATTERN
// =============================================================================

/// A pattern accepted by the growth engine, as handed to a [`PatternSink`].
///
/// Single-vertex patterns carry an empty code.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Pattern {
    /// Report sequence number within the run.
    pub id: usize,
    /// Number of distinct graphs containing the pattern.
    pub support: Frequency,
    /// Minimum DFS code of the pattern.
    pub code: DfsCode,
    /// The pattern itself, rebuilt from its code.
    pub graph: LabeledGraph,
    /// Distinct graph ids the pattern occurs in, ascending.
    pub graph_ids: Vec<GraphId>,
}

impl Pattern {
    /// Number of vertices in the pattern.
    #[must_use]
    pub fn node_count(&self) -> usize {
        self.graph.vertex_count()
    }
}

// =============================================================================
// PATTERN SINK
// =============================================================================

/// The PatternSink trait is the interface between the engine and whatever
/// renders results.
///
/// The engine never formats anything itself. A sink receives every accepted
/// pattern in discovery order; returning an error stops the run and the
/// error is handed back to the caller of
/// [`Miner::run_with_sink`](crate::miner::Miner::run_with_sink).
pub trait PatternSink {
    /// Receive one accepted pattern.
    fn report(&mut self, pattern: &Pattern) -> Result<(), SigspanError>;
}

/// Collects patterns in memory.
impl PatternSink for Vec<Pattern> {
    fn report(&mut self, pattern: &Pattern) -> Result<(), SigspanError> {
        self.push(pattern.clone());
        Ok(())
    }
}

// =============================================================================
// ERROR TYPES
// =============================================================================

/// Errors that can occur in the sigspan system.
///
/// - Malformed input stops ingestion with no partial database
/// - Precondition violations stop the run; they are never turned into a value
/// - Use `Result<T, SigspanError>` for fallible operations
#[derive(Debug, Error)]
pub enum SigspanError {
    /// A graph record in the input could not be parsed.
    #[error("Malformed record at line {line}: {reason}")]
    MalformedRecord { line: usize, reason: String },

    /// A graph violates a shape invariant (dangling endpoint, self loop).
    #[error("Invalid graph: {0}")]
    InvalidGraph(String),

    /// Run parameters are inconsistent with the database.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// A testability precondition does not hold for the given parameters.
    #[error("Precondition violated: {0}")]
    PreconditionViolated(String),

    /// A serialization error occurred.
    #[error("Serialization error: {0}")]
    SerializationError(String),

    /// A deserialization error occurred.
    #[error("Deserialization error: {0}")]
    DeserializationError(String),

    /// An I/O error occurred.
    #[error("I/O error: {0}")]
    IoError(String),
}

impl From<std::io::Error> for SigspanError {
    fn from(err: std::io::Error) -> Self {
        Self::IoError(err.to_string())
    }
}

// =============================================================================
// TESTS
// =============================================================================
