//! # Ingestor Module
//!
//! Reads a graph database from the gSpan text format.
//!
//! ```text
//! t # 0
//! v 0 1
//! v 1 2
//! e 0 1 0
//! t # 1
//! ...
//! ```
//!
//! - `t` opens a record, `v <id> <label>` declares vertices densely from 0,
//!   `e <from> <to> <label>` connects two declared vertices
//! - Ingestion stops at the first record with no vertices, or at end of input
//! - Any malformed line rejects the whole input: no partial database

use crate::graph::{GraphDatabase, LabeledGraph};
use crate::primitives::{MAX_DATABASE_GRAPHS, MAX_GRAPH_VERTICES};
use crate::{Label, SigspanError, VertexId};
use std::io::BufRead;
use std::str::FromStr;

/// Vertices and edges of the record currently being read.
#[derive(Debug, Default)]
struct Record {
    line: usize,
    labels: Vec<Label>,
    edges: Vec<(VertexId, VertexId, Label)>,
}

impl Record {
    fn opened_at(line: usize) -> Self {
        Self {
            line,
            ..Self::default()
        }
    }

    fn finish(self, directed: bool) -> Result<LabeledGraph, SigspanError> {
        LabeledGraph::from_parts(directed, self.labels, &self.edges).map_err(|e| {
            SigspanError::MalformedRecord {
                line: self.line,
                reason: e.to_string(),
            }
        })
    }
}

/// The Ingestor turns a byte stream into an immutable [`GraphDatabase`].
pub struct Ingestor;

impl Ingestor {
    /// Parse a database held in memory.
    pub fn parse_str(input: &str, directed: bool) -> Result<GraphDatabase, SigspanError> {
        Self::read_database(input.as_bytes(), directed)
    }

    /// Read a database from any buffered reader.
    ///
    /// # Errors
    /// Returns `SigspanError::MalformedRecord` naming the first offending
    /// line, or `SigspanError::IoError` if the reader fails.
    pub fn read_database<R: BufRead>(
        reader: R,
        directed: bool,
    ) -> Result<GraphDatabase, SigspanError> {
        let mut graphs = Vec::new();
        let mut current: Option<Record> = None;

        for (idx, line) in reader.lines().enumerate() {
            let line_no = idx + 1;
            let line = line?;
            let fields: Vec<&str> = line.split_whitespace().collect();
            let Some(&tag) = fields.first() else {
                continue;
            };

            match tag {
                "t" => {
                    if let Some(record) = current.take() {
                        // An empty record is the end-of-database sentinel.
                        if record.labels.is_empty() {
                            break;
                        }
                        Self::push_graph(&mut graphs, record.finish(directed)?, line_no)?;
                    }
                    current = Some(Record::opened_at(line_no));
                }
                "v" => {
                    let record = Self::open_record(&mut current, line_no)?;
                    Self::expect_arity(&fields, 3, line_no)?;
                    let id: VertexId = Self::field(fields[1], line_no, "vertex id")?;
                    let label: Label = Self::field(fields[2], line_no, "vertex label")?;

                    if id != record.labels.len() {
                        return Err(SigspanError::MalformedRecord {
                            line: line_no,
                            reason: format!(
                                "vertex id {} out of sequence (expected {})",
                                id,
                                record.labels.len()
                            ),
                        });
                    }
                    if id >= MAX_GRAPH_VERTICES {
                        return Err(SigspanError::MalformedRecord {
                            line: line_no,
                            reason: format!("more than {} vertices", MAX_GRAPH_VERTICES),
                        });
                    }
                    record.labels.push(label);
                }
                "e" => {
                    let record = Self::open_record(&mut current, line_no)?;
                    Self::expect_arity(&fields, 4, line_no)?;
                    let from: VertexId = Self::field(fields[1], line_no, "edge source")?;
                    let to: VertexId = Self::field(fields[2], line_no, "edge target")?;
                    let label: Label = Self::field(fields[3], line_no, "edge label")?;

                    if from >= record.labels.len() || to >= record.labels.len() {
                        return Err(SigspanError::MalformedRecord {
                            line: line_no,
                            reason: "define vertices before edges".to_string(),
                        });
                    }
                    if from == to {
                        return Err(SigspanError::MalformedRecord {
                            line: line_no,
                            reason: format!("self loop on vertex {}", from),
                        });
                    }
                    record.edges.push((from, to, label));
                }
                other => {
                    return Err(SigspanError::MalformedRecord {
                        line: line_no,
                        reason: format!("unknown record type '{}'", other),
                    });
                }
            }
        }

        if let Some(record) = current
            && !record.labels.is_empty()
        {
            let line = record.line;
            Self::push_graph(&mut graphs, record.finish(directed)?, line)?;
        }

        tracing::debug!(graphs = graphs.len(), directed, "graph database ingested");
        GraphDatabase::from_graphs(graphs, directed)
    }

    fn push_graph(
        graphs: &mut Vec<LabeledGraph>,
        graph: LabeledGraph,
        line: usize,
    ) -> Result<(), SigspanError> {
        if graphs.len() >= MAX_DATABASE_GRAPHS {
            return Err(SigspanError::MalformedRecord {
                line,
                reason: format!("more than {} graphs", MAX_DATABASE_GRAPHS),
            });
        }
        graphs.push(graph);
        Ok(())
    }

    fn open_record(current: &mut Option<Record>, line: usize) -> Result<&mut Record, SigspanError> {
        current.as_mut().ok_or_else(|| SigspanError::MalformedRecord {
            line,
            reason: "line outside a graph record".to_string(),
        })
    }

    fn expect_arity(fields: &[&str], arity: usize, line: usize) -> Result<(), SigspanError> {
        if fields.len() < arity {
            return Err(SigspanError::MalformedRecord {
                line,
                reason: format!("expected {} fields, found {}", arity, fields.len()),
            });
        }
        Ok(())
    }

    fn field<T: FromStr>(raw: &str, line: usize, what: &str) -> Result<T, SigspanError> {
        raw.parse().map_err(|_| SigspanError::MalformedRecord {
            line,
            reason: format!("invalid {} '{}'", what, raw),
        })
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    const TWO_GRAPHS: &str = "\
t # 0
v 0 1
v 1 2
e 0 1 0

t # 1
v 0 1
v 1 1
v 2 2
e 0 1 0
e 1 2 0
";

    #[test]
    fn reads_all_records() {
        let db = Ingestor::parse_str(TWO_GRAPHS, false).expect("parse");
        assert_eq!(db.len(), 2);
        assert_eq!(db[0].vertex_count(), 2);
        assert_eq!(db[1].edge_count(), 2);
        assert!(!db.is_directed());
    }

    #[test]
    fn stops_at_first_empty_record() {
        let input = "t # 0\nv 0 5\nt # 1\nt # 2\nv 0 7\n";
        let db = Ingestor::parse_str(input, false).expect("parse");
        assert_eq!(db.len(), 1);
        assert_eq!(db[0].label(0), 5);
    }

    #[test]
    fn lines_after_sentinel_are_not_parsed() {
        let input = "t # 0\nv 0 5\nt # -1\nt # 2\ngarbage here\n";
        let db = Ingestor::parse_str(input, false).expect("parse");
        assert_eq!(db.len(), 1);
    }

    #[test]
    fn edge_before_vertex_aborts() {
        let input = "t # 0\nv 0 1\ne 0 1 0\nv 1 1\n";
        let err = Ingestor::parse_str(input, false).expect_err("must fail");
        assert!(matches!(err, SigspanError::MalformedRecord { line: 3, .. }));
    }

    #[test]
    fn out_of_sequence_vertex_aborts() {
        let input = "t # 0\nv 0 1\nv 2 1\n";
        let err = Ingestor::parse_str(input, false).expect_err("must fail");
        assert!(matches!(err, SigspanError::MalformedRecord { line: 3, .. }));
    }

    #[test]
    fn malformed_later_record_yields_no_partial_database() {
        let input = "t # 0\nv 0 1\nt # 1\nv 0 x\n";
        assert!(Ingestor::parse_str(input, false).is_err());
    }

    #[test]
    fn unknown_tag_aborts() {
        let input = "t # 0\nv 0 1\nq 0\n";
        assert!(Ingestor::parse_str(input, false).is_err());
    }

    #[test]
    fn vertex_outside_record_aborts() {
        let input = "v 0 1\n";
        assert!(Ingestor::parse_str(input, false).is_err());
    }

    #[test]
    fn directed_flag_propagates() {
        let input = "t # 0\nv 0 1\nv 1 1\ne 0 1 0\n";
        let db = Ingestor::parse_str(input, true).expect("parse");
        assert!(db.is_directed());
        assert!(db[0][1].edges.is_empty());
    }
}
