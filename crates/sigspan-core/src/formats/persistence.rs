//! # Persistence Format
//!
//! Binary serialization for graph databases.
//!
//! Format: Header (5 bytes) + postcard-serialized database.
//! - 4 bytes: Magic ("SGDB")
//! - 1 byte: Version
//!
//! File I/O is left to the binary; these are pure transformations.
//!
//! ## Validation
//!
//! - The payload size is checked before anything is parsed
//! - The header is checked before the payload is parsed
//! - Every graph goes through the same shape checks as text ingestion

use crate::graph::{GraphDatabase, LabeledGraph};
use crate::primitives::{self, MAX_DATABASE_GRAPHS};
use crate::SigspanError;
use serde::{Deserialize, Serialize};

/// Maximum accepted snapshot size.
///
/// Checked BEFORE deserialization so a corrupted length prefix cannot
/// trigger a huge allocation.
pub const MAX_PERSISTENCE_PAYLOAD_SIZE: usize = 500 * 1024 * 1024; // 500 MB

const HEADER_SIZE: usize = 5;

// =============================================================================
// FILE HEADER
// =============================================================================

/// The header preceding every snapshot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PersistenceHeader {
    pub magic: [u8; 4],
    pub version: u8,
}

impl PersistenceHeader {
    /// Header for the current format version.
    #[must_use]
    pub fn new() -> Self {
        Self {
            magic: *primitives::MAGIC_BYTES,
            version: primitives::FORMAT_VERSION,
        }
    }

    pub fn validate(&self) -> Result<(), SigspanError> {
        if &self.magic != primitives::MAGIC_BYTES {
            return Err(SigspanError::DeserializationError(
                "Invalid magic bytes".to_string(),
            ));
        }
        if self.version != primitives::FORMAT_VERSION {
            return Err(SigspanError::DeserializationError(format!(
                "Unsupported version: {} (expected {})",
                self.version,
                primitives::FORMAT_VERSION
            )));
        }
        Ok(())
    }

    #[must_use]
    pub fn to_bytes(&self) -> [u8; HEADER_SIZE] {
        let mut bytes = [0u8; HEADER_SIZE];
        bytes[0..4].copy_from_slice(&self.magic);
        bytes[4] = self.version;
        bytes
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self, SigspanError> {
        let Some(header) = bytes.get(..HEADER_SIZE) else {
            return Err(SigspanError::DeserializationError(
                "Header too short".to_string(),
            ));
        };
        let mut magic = [0u8; 4];
        magic.copy_from_slice(&header[0..4]);
        Ok(Self {
            magic,
            version: header[4],
        })
    }
}

impl Default for PersistenceHeader {
    fn default() -> Self {
        Self::new()
    }
}

/// Payload layout.
#[derive(Serialize, Deserialize)]
struct Snapshot {
    directed: bool,
    graphs: Vec<LabeledGraph>,
}

// =============================================================================
// SERIALIZATION FUNCTIONS
// =============================================================================

/// Whether `bytes` start with the snapshot magic.
#[must_use]
pub fn is_snapshot(bytes: &[u8]) -> bool {
    bytes.starts_with(primitives::MAGIC_BYTES)
}

/// Serialize a database to bytes (header + payload).
pub fn database_to_bytes(db: &GraphDatabase) -> Result<Vec<u8>, SigspanError> {
    let snapshot = Snapshot {
        directed: db.is_directed(),
        graphs: db.graphs().cloned().collect(),
    };
    let payload = postcard::to_stdvec(&snapshot)
        .map_err(|e| SigspanError::SerializationError(e.to_string()))?;

    let mut bytes = Vec::with_capacity(HEADER_SIZE + payload.len());
    bytes.extend_from_slice(&PersistenceHeader::new().to_bytes());
    bytes.extend_from_slice(&payload);
    Ok(bytes)
}

/// Deserialize a database from bytes.
pub fn database_from_bytes(bytes: &[u8]) -> Result<GraphDatabase, SigspanError> {
    if bytes.len() < HEADER_SIZE {
        return Err(SigspanError::DeserializationError(format!(
            "Data too short: minimum {} bytes required",
            HEADER_SIZE
        )));
    }
    if bytes.len() > MAX_PERSISTENCE_PAYLOAD_SIZE {
        return Err(SigspanError::DeserializationError(format!(
            "Data size {} bytes exceeds maximum allowed {} bytes",
            bytes.len(),
            MAX_PERSISTENCE_PAYLOAD_SIZE
        )));
    }

    PersistenceHeader::from_bytes(bytes)?.validate()?;

    let snapshot: Snapshot = postcard::from_bytes(&bytes[HEADER_SIZE..]).map_err(|e| {
        SigspanError::DeserializationError(format!("Failed to deserialize database: {}", e))
    })?;
    if snapshot.graphs.len() > MAX_DATABASE_GRAPHS {
        return Err(SigspanError::DeserializationError(format!(
            "{} graphs exceeds maximum {}",
            snapshot.graphs.len(),
            MAX_DATABASE_GRAPHS
        )));
    }

    GraphDatabase::from_graphs(snapshot.graphs, snapshot.directed)
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ingestor::Ingestor;

    fn sample() -> GraphDatabase {
        Ingestor::parse_str(
            "t # 0\nv 0 1\nv 1 2\nv 2 2\ne 0 1 3\ne 1 2 4\nt # 1\nv 0 7\n",
            false,
        )
        .expect("sample")
    }

    #[test]
    fn header_roundtrip() {
        let header = PersistenceHeader::new();
        let restored = PersistenceHeader::from_bytes(&header.to_bytes()).expect("parse header");
        assert_eq!(restored, header);
    }

    #[test]
    fn bytes_roundtrip_bit_exact() {
        let db = sample();
        let bytes1 = database_to_bytes(&db).expect("first serialize");
        let restored = database_from_bytes(&bytes1).expect("deserialize");
        let bytes2 = database_to_bytes(&restored).expect("second serialize");

        assert_eq!(
            bytes1, bytes2,
            "save -> load -> save must produce identical bytes"
        );
        assert_eq!(restored.len(), 2);
        assert_eq!(restored.total_edges(), 2);
        assert!(is_snapshot(&bytes1));
    }

    #[test]
    fn invalid_magic_rejected() {
        let mut bytes = database_to_bytes(&sample()).expect("serialize");
        bytes[0..4].copy_from_slice(b"XXXX");
        assert!(!is_snapshot(&bytes));
        assert!(database_from_bytes(&bytes).is_err());
    }

    #[test]
    fn future_version_rejected() {
        let mut bytes = database_to_bytes(&sample()).expect("serialize");
        bytes[4] = primitives::FORMAT_VERSION + 1;
        assert!(matches!(
            database_from_bytes(&bytes),
            Err(SigspanError::DeserializationError(_))
        ));
    }

    #[test]
    fn truncated_payload_rejected() {
        let bytes = database_to_bytes(&sample()).expect("serialize");
        assert!(database_from_bytes(&bytes[..bytes.len() - 3]).is_err());
        assert!(database_from_bytes(&bytes[..3]).is_err());
    }
}
