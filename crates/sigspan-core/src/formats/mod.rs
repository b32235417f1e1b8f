//! # Formats
//!
//! Binary snapshots of a parsed graph database.
//!
//! The text format lives in [`crate::ingestor`]; this module only covers
//! the pre-parsed form, so large corpora are read once and reloaded fast.

pub mod persistence;

pub use persistence::{
    MAX_PERSISTENCE_PAYLOAD_SIZE, PersistenceHeader, database_from_bytes, database_to_bytes,
    is_snapshot,
};
