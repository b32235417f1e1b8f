//! # CLI Command Implementations
//!
//! This module contains the actual implementations of CLI commands.

use super::Globals;
use super::sink::{JsonSink, TextSink, write_ranked_text};
use sigspan_core::{
    BoostConfig, Frequency, GraphDatabase, Ingestor, Miner, MinerConfig, SigspanError, Strategy,
    TestabilitySummary, database_from_bytes, database_to_bytes, find_threshold, is_snapshot,
};
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use std::time::Instant;

// =============================================================================
// FILE SIZE LIMITS
// =============================================================================

/// Maximum size of a graph database file (500 MB).
///
/// Matches the snapshot payload limit so a packed database always loads.
const MAX_DATABASE_FILE_SIZE: u64 = 500 * 1024 * 1024;

/// Maximum size of a label file (10 MB).
const MAX_LABEL_FILE_SIZE: u64 = 10 * 1024 * 1024;

/// Validate file size before reading.
fn validate_file_size(path: &Path, max_size: u64) -> Result<(), SigspanError> {
    let metadata = std::fs::metadata(path)
        .map_err(|e| SigspanError::IoError(format!("Cannot read file metadata: {}", e)))?;

    if metadata.len() > max_size {
        return Err(SigspanError::IoError(format!(
            "File size {} bytes exceeds maximum allowed {} bytes",
            metadata.len(),
            max_size
        )));
    }
    Ok(())
}

/// Resolve an input path, which must name an existing regular file.
pub fn validate_file_path(path: &Path) -> Result<PathBuf, SigspanError> {
    let canonical = path.canonicalize().map_err(|e| {
        SigspanError::IoError(format!("Invalid file path '{}': {}", path.display(), e))
    })?;

    if !canonical.is_file() {
        return Err(SigspanError::IoError(format!(
            "Path '{}' is not a regular file",
            path.display()
        )));
    }

    Ok(canonical)
}

/// Resolve an output path, whose parent directory must exist.
fn validate_output_path(path: &Path) -> Result<PathBuf, SigspanError> {
    let parent = match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    };

    let canonical_parent = parent.canonicalize().map_err(|e| {
        SigspanError::IoError(format!(
            "Invalid output directory '{}': {}",
            parent.display(),
            e
        ))
    })?;

    if !canonical_parent.is_dir() {
        return Err(SigspanError::IoError(format!(
            "Output directory '{}' is not a valid directory",
            parent.display()
        )));
    }

    let filename = path
        .file_name()
        .ok_or_else(|| SigspanError::IoError("Output path has no filename".to_string()))?;

    Ok(canonical_parent.join(filename))
}

// =============================================================================
// INPUT LOADING
// =============================================================================

/// Load a database from a gSpan text file or a binary snapshot, told apart
/// by the snapshot magic.
pub fn load_database(path: &Path, directed: bool) -> Result<GraphDatabase, SigspanError> {
    let validated = validate_file_path(path)?;
    validate_file_size(&validated, MAX_DATABASE_FILE_SIZE)?;

    let bytes = std::fs::read(&validated)
        .map_err(|e| SigspanError::IoError(format!("Read database: {}", e)))?;

    let db = if is_snapshot(&bytes) {
        let db = database_from_bytes(&bytes)?;
        if directed && !db.is_directed() {
            tracing::warn!("snapshot is undirected; --directed has no effect");
        }
        db
    } else {
        Ingestor::read_database(bytes.as_slice(), directed)?
    };

    tracing::info!(
        path = %path.display(),
        graphs = db.len(),
        directed = db.is_directed(),
        "database loaded"
    );
    Ok(db)
}

/// Read per-graph class labels, one integer per non-empty line.
pub fn read_labels(path: &Path) -> Result<Vec<i8>, SigspanError> {
    let validated = validate_file_path(path)?;
    validate_file_size(&validated, MAX_LABEL_FILE_SIZE)?;

    let text = std::fs::read_to_string(&validated)
        .map_err(|e| SigspanError::IoError(format!("Read labels: {}", e)))?;

    let mut labels = Vec::new();
    for (idx, line) in text.lines().enumerate() {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        let label = line
            .parse::<i8>()
            .map_err(|e| SigspanError::MalformedRecord {
                line: idx + 1,
                reason: format!("class label '{}': {}", line, e),
            })?;
        labels.push(label);
    }
    Ok(labels)
}

/// Pretty JSON followed by a newline.
fn write_json<W: Write>(out: &mut W, value: &serde_json::Value) -> Result<(), SigspanError> {
    serde_json::to_writer_pretty(&mut *out, value)
        .map_err(|e| SigspanError::SerializationError(e.to_string()))?;
    writeln!(out)?;
    out.flush()?;
    Ok(())
}

fn print_json(value: &serde_json::Value) -> Result<(), SigspanError> {
    write_json(&mut std::io::stdout().lock(), value)
}

// =============================================================================
// INFO COMMAND
// =============================================================================

/// Show database statistics.
pub fn cmd_info(globals: Globals, input: &Path) -> Result<(), SigspanError> {
    let db = load_database(input, globals.directed)?;
    let label_support = db.vertex_label_support();

    if globals.json_mode {
        let labels: Vec<_> = label_support
            .iter()
            .map(|(label, support)| serde_json::json!({ "label": label, "support": support }))
            .collect();
        print_json(&serde_json::json!({
            "database": input.to_string_lossy(),
            "graphs": db.len(),
            "directed": db.is_directed(),
            "vertices": db.total_vertices(),
            "edges": db.total_edges(),
            "vertex_labels": labels
        }))?;
        return Ok(());
    }

    println!("sigspan Database");
    println!("================");
    println!("Database: {:?}", input);
    println!();
    println!("Graphs:   {}", db.len());
    println!("Directed: {}", db.is_directed());
    println!("Vertices: {}", db.total_vertices());
    println!("Edges:    {}", db.total_edges());

    if !globals.quiet {
        println!();
        println!("Vertex label supports:");
        for (label, support) in &label_support {
            println!("  {:>6}  {}", label, support);
        }
    }

    Ok(())
}

// =============================================================================
// MINE COMMAND
// =============================================================================

/// Report every frequent pattern to stdout or `output`.
pub fn cmd_mine(
    globals: Globals,
    input: &Path,
    min_support: Frequency,
    limits: MinerConfig,
    graph_ids: bool,
    output: Option<&Path>,
) -> Result<(), SigspanError> {
    let db = load_database(input, globals.directed)?;
    let miner = Miner::with_config(&db, limits);

    let writer: Box<dyn Write> = match output {
        Some(path) => {
            let path = validate_output_path(path)?;
            let file = File::create(&path)
                .map_err(|e| SigspanError::IoError(format!("Create output: {}", e)))?;
            Box::new(BufWriter::new(file))
        }
        None => Box::new(BufWriter::new(std::io::stdout().lock())),
    };

    let start = Instant::now();
    let supports = if globals.json_mode {
        let mut sink = JsonSink::new(writer);
        let supports = miner.run_with_sink(min_support, &mut sink)?;
        sink.finish()?;
        supports
    } else {
        let mut sink = TextSink::new(writer, graph_ids);
        let supports = miner.run_with_sink(min_support, &mut sink)?;
        sink.finish()?;
        supports
    };

    if !globals.quiet {
        tracing::info!(
            patterns = supports.len(),
            min_support,
            elapsed_ms = start.elapsed().as_millis() as u64,
            "mining complete"
        );
    }
    Ok(())
}

// =============================================================================
// THRESHOLD COMMAND
// =============================================================================

/// Parameters of a threshold search, after merging file and flags.
#[derive(Debug, Clone, PartialEq)]
pub struct ThresholdRequest {
    pub n1: Frequency,
    pub n2: Frequency,
    pub alpha: f64,
    pub strategies: Vec<Strategy>,
    pub summary: bool,
}

/// Outcome of one strategy.
#[derive(Debug, Clone, PartialEq)]
pub struct ThresholdOutcome {
    pub strategy: Strategy,
    pub threshold: Frequency,
    pub elapsed_ms: u64,
    pub summary: Option<TestabilitySummary>,
}

/// Run each requested strategy against the database.
pub fn find_thresholds(
    db: &GraphDatabase,
    limits: MinerConfig,
    request: &ThresholdRequest,
) -> Result<Vec<ThresholdOutcome>, SigspanError> {
    let miner = Miner::with_config(db, limits);
    let mut outcomes = Vec::with_capacity(request.strategies.len());

    for &strategy in &request.strategies {
        let start = Instant::now();
        let threshold = find_threshold(&miner, strategy, request.n1, request.n2, request.alpha)?;
        let elapsed_ms = start.elapsed().as_millis() as u64;

        let summary = request
            .summary
            .then(|| TestabilitySummary::compute(&miner, threshold, request.alpha));
        outcomes.push(ThresholdOutcome {
            strategy,
            threshold,
            elapsed_ms,
            summary,
        });
    }
    Ok(outcomes)
}

/// Find and print the testability threshold.
pub fn cmd_threshold(
    globals: Globals,
    input: &Path,
    limits: MinerConfig,
    request: &ThresholdRequest,
) -> Result<(), SigspanError> {
    let db = load_database(input, globals.directed)?;
    let outcomes = find_thresholds(&db, limits, request)?;

    if globals.json_mode {
        let results: Vec<_> = outcomes
            .iter()
            .map(|o| {
                serde_json::json!({
                    "strategy": o.strategy.name(),
                    "threshold": o.threshold,
                    "elapsed_ms": o.elapsed_ms,
                    "summary": o.summary
                })
            })
            .collect();
        print_json(&serde_json::json!({
            "n1": request.n1,
            "n2": request.n2,
            "alpha": request.alpha,
            "results": results
        }))?;
        return Ok(());
    }

    if globals.quiet {
        for outcome in &outcomes {
            println!("{}", outcome.threshold);
        }
        return Ok(());
    }

    println!("sigspan Testability Threshold");
    println!("=============================");
    println!(
        "n1: {}  n2: {}  alpha: {}",
        request.n1, request.n2, request.alpha
    );
    println!();
    for outcome in &outcomes {
        println!(
            "{:<18} threshold {:>4}   ({} ms)",
            outcome.strategy.name(),
            outcome.threshold,
            outcome.elapsed_ms
        );
        if let Some(summary) = &outcome.summary {
            println!(
                "  testable: {}  tarone level: {:e}",
                summary.testable, summary.tarone_level
            );
            println!(
                "  total:    {}  bonferroni level: {:e}",
                summary.total, summary.bonferroni_level
            );
        }
    }

    Ok(())
}

// =============================================================================
// BOOST COMMAND
// =============================================================================

/// Rank patterns by supervised gain and print the top entries.
pub fn cmd_boost(
    globals: Globals,
    input: &Path,
    min_support: Frequency,
    limits: MinerConfig,
    config: &BoostConfig,
) -> Result<(), SigspanError> {
    let db = load_database(input, globals.directed)?;
    let start = Instant::now();
    let ranked = Miner::with_config(&db, limits).run_supervised(min_support, config)?;

    if !globals.quiet {
        tracing::info!(
            objective = %config.objective,
            ranked = ranked.len(),
            tau = ranked.tau(),
            elapsed_ms = start.elapsed().as_millis() as u64,
            "boosting step complete"
        );
    }

    if globals.json_mode {
        let entries = serde_json::to_value(ranked.entries())
            .map_err(|e| SigspanError::SerializationError(e.to_string()))?;
        print_json(&entries)?;
        return Ok(());
    }

    let mut out = BufWriter::new(std::io::stdout().lock());
    for (rank, entry) in ranked.entries().iter().enumerate() {
        write_ranked_text(&mut out, rank, entry)?;
    }
    out.flush()?;
    Ok(())
}

// =============================================================================
// PACK COMMAND
// =============================================================================

/// Write a database as a binary snapshot.
pub fn cmd_pack(globals: Globals, input: &Path, output: &Path) -> Result<(), SigspanError> {
    let db = load_database(input, globals.directed)?;
    let bytes = database_to_bytes(&db)?;

    let path = validate_output_path(output)?;
    std::fs::write(&path, &bytes)
        .map_err(|e| SigspanError::IoError(format!("Write snapshot: {}", e)))?;

    if globals.json_mode {
        print_json(&serde_json::json!({
            "output": path.to_string_lossy(),
            "graphs": db.len(),
            "bytes": bytes.len()
        }))?;
    } else if !globals.quiet {
        println!("Packed {} graphs into {:?} ({} bytes)", db.len(), path, bytes.len());
    }
    Ok(())
}

// =============================================================================
// TESTS
// =============================================================================
