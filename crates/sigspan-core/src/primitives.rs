//! # Innate Primitives
//!
//! Hardcoded runtime constants for the sigspan CORE.
//!
//! These values are compiled into the binary and are immutable at runtime.

/// Slack added to the pruning threshold before a gain bound is allowed to
/// cut a subtree.
///
/// - A subtree is skipped when `bound <= tau + GAIN_TOLERANCE`.
/// - Absorbs rounding noise between the gain sums and the bound sums.
pub const GAIN_TOLERANCE: f64 = 1e-8;

/// Family-wise error level used when none is configured.
pub const DEFAULT_ALPHA: f64 = 0.05;

/// Magic bytes for the sigspan binary database header.
///
/// - File Header = Magic Bytes ("SGDB") + Version (u8) before payload.
pub const MAGIC_BYTES: &[u8; 4] = b"SGDB";

/// Current serialization format version.
///
/// Increment this when making breaking changes to the snapshot format.
pub const FORMAT_VERSION: u8 = 1;

// =============================================================================
// INPUT VALIDATION LIMITS
// =============================================================================

/// Maximum number of graphs accepted from one input stream.
///
/// Records past this limit make ingestion fail rather than truncate.
pub const MAX_DATABASE_GRAPHS: usize = 1_000_000;

/// Maximum number of vertices in a single input graph.
///
/// Prevents memory exhaustion from malformed vertex ids.
pub const MAX_GRAPH_VERTICES: usize = 100_000;
