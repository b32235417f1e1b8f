//! # sigspan-core
//!
//! The deterministic mining engine for sigspan - THE LOGIC.
//!
//! Two coupled parts:
//! - a canonical pattern-growth engine (gSpan-style DFS codes, right-most
//!   path extension, occurrence arenas, optional gain-bound pruning)
//! - a testability controller that derives, from class sizes and a target
//!   significance level, the frequency every reported pattern must reach
//!
//! The controller only ever sees the engine as an oracle mapping a minimum
//! support to pattern frequencies.
//!
//! ## Architectural Constraints
//!
//! - Pure Rust: NO async, NO network dependencies
//! - Deterministic: `BTreeMap` grouping, no hashing, no randomness
//! - Immutable input: the database is never modified by a run
//! - Total: after ingestion, only precondition checks and sink errors fail

// =============================================================================
// MODULES
// =============================================================================

pub mod canonical;
pub mod code;
pub mod embedding;
pub mod extension;
pub mod formats;
pub mod gain;
pub mod graph;
pub mod ingestor;
pub mod miner;
pub mod primitives;
pub mod testability;
pub mod types;

// =============================================================================
// RE-EXPORTS: Core Types (from types module)
// =============================================================================

pub use types::{Frequency, GraphId, Label, Pattern, PatternSink, SigspanError, VertexId};

// =============================================================================
// RE-EXPORTS: Mining Engine
// =============================================================================

pub use canonical::CanonicalChecker;
pub use code::{DfsCode, DfsTuple};
pub use gain::{BoostConfig, GainOracle, Objective, RankedPattern, RankedPatterns};
pub use graph::{Edge, GraphDatabase, LabeledGraph, SerializableGraph, Vertex};
pub use ingestor::Ingestor;
pub use miner::{Miner, MinerConfig};

// =============================================================================
// RE-EXPORTS: Testability
// =============================================================================

pub use testability::{
    Strategy, TestabilitySummary, bisection, decreasing_bound, early_termination,
    find_threshold, min_admissible_frequency, min_p_value, single_pass,
};

// =============================================================================
// RE-EXPORTS: Formats (from formats module)
// =============================================================================

pub use formats::{PersistenceHeader, database_from_bytes, database_to_bytes, is_snapshot};
