//! Integration tests for command parsing, database loading and threshold
//! commands.

// Allow unwrap and panic in tests - these are standard for test code
#![allow(clippy::unwrap_used, clippy::panic)]

use clap::Parser;
use sigspan::cli::{
    Cli, Commands, ThresholdRequest, execute, find_thresholds, load_database, read_labels,
};
use sigspan::config::RunConfig;
use sigspan_core::{Miner, MinerConfig, SigspanError, Strategy};
use std::io::Write;
use std::path::PathBuf;
use tempfile::TempDir;

const TRIANGLES: &str = "\
t # 0
v 0 0
v 1 0
v 2 1
e 0 1 0
e 1 2 0
e 2 0 0
t # 1
v 0 0
v 1 0
v 2 1
e 0 1 0
e 1 2 0
e 2 0 0
t # 2
v 0 0
v 1 0
e 0 1 0
";

fn write_file(dir: &TempDir, name: &str, contents: &str) -> PathBuf {
    let path = dir.path().join(name);
    let mut file = std::fs::File::create(&path).unwrap();
    file.write_all(contents.as_bytes()).unwrap();
    path
}

/// 59 single-vertex graphs; labels 0..=8 occur in 15, 9, 8, 7, 6, 5, 4, 3
/// and 2 graphs.
fn label_scenario() -> String {
    let mut text = String::new();
    let mut id = 0;
    for (label, support) in [15, 9, 8, 7, 6, 5, 4, 3, 2].into_iter().enumerate() {
        for _ in 0..support {
            text.push_str(&format!("t # {}\nv 0 {}\n", id, label));
            id += 1;
        }
    }
    text
}

// =============================================================================
// ARGUMENT PARSING
// =============================================================================

#[test]
fn test_parse_mine_command() {
    let cli = Cli::try_parse_from([
        "sigspan", "--quiet", "mine", "-i", "graphs.txt", "-s", "3", "--max-nodes", "4", "-w",
    ])
    .unwrap();

    assert!(cli.quiet);
    match cli.command {
        Commands::Mine {
            min_support,
            max_nodes,
            graph_ids,
            ..
        } => {
            assert_eq!(min_support, 3);
            assert_eq!(max_nodes, Some(4));
            assert!(graph_ids);
        }
        other => panic!("unexpected command {:?}", other),
    }
}

#[test]
fn test_parse_threshold_strategy() {
    let cli = Cli::try_parse_from([
        "sigspan",
        "threshold",
        "-i",
        "graphs.txt",
        "--strategy",
        "bisection",
        "--n1",
        "15",
        "--n2",
        "44",
    ])
    .unwrap();

    match cli.command {
        Commands::Threshold {
            strategy, n1, n2, ..
        } => {
            assert_eq!(strategy, Some(Strategy::Bisection));
            assert_eq!((n1, n2), (Some(15), Some(44)));
        }
        other => panic!("unexpected command {:?}", other),
    }
}

#[test]
fn test_parse_rejects_unknown_strategy() {
    let result = Cli::try_parse_from([
        "sigspan",
        "threshold",
        "-i",
        "graphs.txt",
        "--strategy",
        "fastest",
    ]);
    assert!(result.is_err());
}

// =============================================================================
// DATABASE LOADING
// =============================================================================

#[test]
fn test_load_text_database() {
    let dir = TempDir::new().unwrap();
    let path = write_file(&dir, "graphs.txt", TRIANGLES);

    let db = load_database(&path, false).unwrap();
    assert_eq!(db.len(), 3);
    assert_eq!(db.total_edges(), 7);
}

#[test]
fn test_load_missing_file() {
    let dir = TempDir::new().unwrap();
    let result = load_database(&dir.path().join("absent.txt"), false);
    assert!(matches!(result, Err(SigspanError::IoError(_))));
}

#[test]
fn test_load_directory_rejected() {
    let dir = TempDir::new().unwrap();
    let result = load_database(dir.path(), false);
    assert!(matches!(result, Err(SigspanError::IoError(_))));
}

#[test]
fn test_malformed_database_rejected() {
    let dir = TempDir::new().unwrap();
    let path = write_file(&dir, "bad.txt", "t # 0\nv 0 1\ne 0 0 1\n");
    let result = load_database(&path, false);
    assert!(matches!(
        result,
        Err(SigspanError::MalformedRecord { line: 3, .. })
    ));
}

#[test]
fn test_pack_then_load_snapshot() {
    let dir = TempDir::new().unwrap();
    let input = write_file(&dir, "graphs.txt", TRIANGLES);
    let output = dir.path().join("graphs.sgdb");

    let cli = Cli::try_parse_from([
        "sigspan",
        "--quiet",
        "pack",
        "-i",
        input.to_str().unwrap(),
        "-o",
        output.to_str().unwrap(),
    ])
    .unwrap();
    execute(cli).unwrap();

    let bytes = std::fs::read(&output).unwrap();
    assert!(bytes.starts_with(b"SGDB"));

    let from_snapshot = load_database(&output, false).unwrap();
    let from_text = load_database(&input, false).unwrap();
    assert_eq!(from_snapshot.len(), from_text.len());
    assert_eq!(from_snapshot.total_edges(), from_text.total_edges());
    assert_eq!(
        Miner::new(&from_snapshot).run(1),
        Miner::new(&from_text).run(1)
    );
}

#[test]
fn test_read_labels() {
    let dir = TempDir::new().unwrap();
    let path = write_file(&dir, "labels.txt", "1\n-1\n\n1\n");
    assert_eq!(read_labels(&path).unwrap(), vec![1, -1, 1]);

    let bad = write_file(&dir, "bad.txt", "1\nyes\n");
    assert!(matches!(
        read_labels(&bad),
        Err(SigspanError::MalformedRecord { line: 2, .. })
    ));
}

// =============================================================================
// THRESHOLDS
// =============================================================================

#[test]
fn test_thresholds_on_label_scenario() {
    let dir = TempDir::new().unwrap();
    let path = write_file(&dir, "labels.txt", &label_scenario());
    let db = load_database(&path, false).unwrap();

    let request = ThresholdRequest {
        n1: 15,
        n2: 44,
        alpha: 0.05,
        strategies: Strategy::ALL.to_vec(),
        summary: true,
    };
    let outcomes = find_thresholds(&db, MinerConfig::default(), &request).unwrap();

    let thresholds: Vec<u32> = outcomes.iter().map(|o| o.threshold).collect();
    assert_eq!(thresholds, vec![4, 4, 4, 3]);

    let summary = outcomes[0].summary.unwrap();
    assert_eq!(summary.testable, 7);
    assert_eq!(summary.total, 9);
}

#[test]
fn test_threshold_precondition_is_an_error() {
    let dir = TempDir::new().unwrap();
    let input = write_file(&dir, "one.txt", "t # 0\nv 0 1\n");

    let cli = Cli::try_parse_from([
        "sigspan",
        "--quiet",
        "threshold",
        "-i",
        input.to_str().unwrap(),
        "--n1",
        "15",
        "--n2",
        "44",
    ])
    .unwrap();
    assert!(matches!(
        execute(cli),
        Err(SigspanError::PreconditionViolated(_))
    ));
}

#[test]
fn test_threshold_without_class_sizes_is_rejected() {
    let dir = TempDir::new().unwrap();
    let input = write_file(&dir, "graphs.txt", TRIANGLES);

    let cli = Cli::try_parse_from(["sigspan", "threshold", "-i", input.to_str().unwrap()])
        .unwrap();
    assert!(matches!(execute(cli), Err(SigspanError::InvalidConfig(_))));
}

#[test]
fn test_threshold_alpha_flag_is_validated() {
    let dir = TempDir::new().unwrap();
    let input = write_file(&dir, "labels.txt", &label_scenario());

    for alpha in ["1.5", "1", "0"] {
        let cli = Cli::try_parse_from([
            "sigspan",
            "--quiet",
            "threshold",
            "-i",
            input.to_str().unwrap(),
            "--n1",
            "15",
            "--n2",
            "44",
            "--alpha",
            alpha,
        ])
        .unwrap();
        assert!(
            matches!(execute(cli), Err(SigspanError::InvalidConfig(_))),
            "alpha {} accepted",
            alpha
        );
    }
}

// =============================================================================
// CONFIGURATION FILE
// =============================================================================

#[test]
fn test_config_file_loads() {
    let dir = TempDir::new().unwrap();
    let path = write_file(
        &dir,
        "run.toml",
        "[testability]\nalpha = 0.01\nstrategy = \"decreasing-bound\"\n\n[limits]\nmax_nodes = 3\n",
    );

    let config = RunConfig::load(&path).unwrap();
    assert_eq!(config.testability.strategy, Strategy::DecreasingBound);
    assert_eq!(config.limits.max_nodes, Some(3));
}

#[test]
fn test_boost_with_config_labels() {
    let dir = TempDir::new().unwrap();
    let input = write_file(&dir, "graphs.txt", TRIANGLES);
    let config = write_file(
        &dir,
        "run.toml",
        "[boost]\nobjective = \"2-class\"\nmax_ranked = 2\nlabels = [1, 1, -1]\n",
    );

    let cli = Cli::try_parse_from([
        "sigspan",
        "--quiet",
        "--config",
        config.to_str().unwrap(),
        "boost",
        "-i",
        input.to_str().unwrap(),
    ])
    .unwrap();
    execute(cli).unwrap();
}

#[test]
fn test_boost_label_count_mismatch() {
    let dir = TempDir::new().unwrap();
    let input = write_file(&dir, "graphs.txt", TRIANGLES);
    let labels = write_file(&dir, "labels.txt", "1\n-1\n");

    let cli = Cli::try_parse_from([
        "sigspan",
        "--quiet",
        "boost",
        "-i",
        input.to_str().unwrap(),
        "-l",
        labels.to_str().unwrap(),
    ])
    .unwrap();
    assert!(matches!(execute(cli), Err(SigspanError::InvalidConfig(_))));
}
