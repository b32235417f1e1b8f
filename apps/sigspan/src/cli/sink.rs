//! # Pattern Sinks
//!
//! Writers for accepted patterns.
//!
//! Text output follows the gSpan convention:
//!
//! ```text
//! t # 3 * 12
//! v 0 1
//! v 1 2
//! e 0 1 0
//! x 0 4 7
//! ```
//!
//! The `x` line lists the graphs containing the pattern and is optional.
//! JSON output is one object per line.

use sigspan_core::{LabeledGraph, Pattern, PatternSink, RankedPattern, SigspanError};
use std::io::Write;

fn write_graph<W: Write>(out: &mut W, graph: &LabeledGraph) -> std::io::Result<()> {
    for (id, vertex) in graph.vertices().enumerate() {
        writeln!(out, "v {} {}", id, vertex.label)?;
    }
    for (from, to, label) in graph.edge_list() {
        writeln!(out, "e {} {} {}", from, to, label)?;
    }
    Ok(())
}

fn write_ids<W: Write>(out: &mut W, ids: impl Iterator<Item = String>) -> std::io::Result<()> {
    let ids: Vec<String> = ids.collect();
    writeln!(out, "x {}", ids.join(" "))
}

// =============================================================================
// TEXT SINK
// =============================================================================

/// gSpan-style text writer.
pub struct TextSink<W: Write> {
    out: W,
    graph_ids: bool,
}

impl<W: Write> TextSink<W> {
    /// Write to `out`, with an `x` line per pattern when `graph_ids` is set.
    pub fn new(out: W, graph_ids: bool) -> Self {
        Self { out, graph_ids }
    }

    /// Flush and hand back the writer.
    pub fn finish(mut self) -> Result<W, SigspanError> {
        self.out.flush()?;
        Ok(self.out)
    }
}

impl<W: Write> PatternSink for TextSink<W> {
    fn report(&mut self, pattern: &Pattern) -> Result<(), SigspanError> {
        writeln!(self.out, "t # {} * {}", pattern.id, pattern.support)?;
        write_graph(&mut self.out, &pattern.graph)?;
        if self.graph_ids {
            write_ids(&mut self.out, pattern.graph_ids.iter().map(|g| g.to_string()))?;
        }
        writeln!(self.out)?;
        Ok(())
    }
}

/// One ranked entry in text form; the `x` line carries `graph:count` pairs.
pub fn write_ranked_text<W: Write>(
    out: &mut W,
    rank: usize,
    entry: &RankedPattern,
) -> Result<(), SigspanError> {
    writeln!(
        out,
        "t # {} * {} gain {:.6} y {:+}",
        rank, entry.support, entry.gain, entry.y
    )?;
    write_graph(out, &entry.graph)?;
    write_ids(
        out,
        entry.counts.iter().map(|(g, n)| format!("{}:{}", g, n)),
    )?;
    writeln!(out)?;
    Ok(())
}

// =============================================================================
// JSON SINK
// =============================================================================

/// JSON-lines writer.
pub struct JsonSink<W: Write> {
    out: W,
}

impl<W: Write> JsonSink<W> {
    pub fn new(out: W) -> Self {
        Self { out }
    }

    /// Flush and hand back the writer.
    pub fn finish(mut self) -> Result<W, SigspanError> {
        self.out.flush()?;
        Ok(self.out)
    }
}

impl<W: Write> PatternSink for JsonSink<W> {
    fn report(&mut self, pattern: &Pattern) -> Result<(), SigspanError> {
        serde_json::to_writer(&mut self.out, pattern)
            .map_err(|e| SigspanError::SerializationError(e.to_string()))?;
        writeln!(self.out)?;
        Ok(())
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use sigspan_core::{Ingestor, Miner};

    const PATH: &str = "t # 0\nv 0 1\nv 1 2\ne 0 1 5\nt # 1\nv 0 1\nv 1 2\ne 0 1 5\n";

    fn mine(sink: &mut dyn PatternSink) {
        let db = Ingestor::parse_str(PATH, false).expect("parse");
        Miner::new(&db).run_with_sink(2, sink).expect("run");
    }

    #[test]
    fn text_sink_writes_gspan_records() {
        let mut sink = TextSink::new(Vec::new(), true);
        mine(&mut sink);
        let text = String::from_utf8(sink.finish().expect("flush")).expect("utf8");

        let expected = "\
t # 0 * 2
v 0 1
x 0 1

t # 1 * 2
v 0 2
x 0 1

t # 2 * 2
v 0 1
v 1 2
e 0 1 5
x 0 1

";
        assert_eq!(text, expected);
    }

    #[test]
    fn text_sink_without_graph_ids() {
        let mut sink = TextSink::new(Vec::new(), false);
        mine(&mut sink);
        let text = String::from_utf8(sink.finish().expect("flush")).expect("utf8");
        assert!(!text.contains("\nx "));
        assert_eq!(text.matches("t # ").count(), 3);
    }

    #[test]
    fn json_sink_writes_one_object_per_line() {
        let mut sink = JsonSink::new(Vec::new());
        mine(&mut sink);
        let text = String::from_utf8(sink.finish().expect("flush")).expect("utf8");

        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 3);
        let last: serde_json::Value = serde_json::from_str(lines[2]).expect("json");
        assert_eq!(last["support"], 2);
        assert_eq!(last["graph_ids"], serde_json::json!([0, 1]));
        assert_eq!(last["graph"]["labels"], serde_json::json!([1, 2]));
    }
}
