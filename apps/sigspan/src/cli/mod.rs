//! # sigspan CLI Module
//!
//! This module implements the command line interface.
//!
//! ## Available Commands
//!
//! - `info` - Show database statistics
//! - `mine` - Report every frequent canonical pattern
//! - `threshold` - Find the testability frequency threshold
//! - `boost` - Rank discriminative patterns by gain
//! - `pack` - Convert a text database into a binary snapshot

mod commands;
mod sink;

use crate::config::RunConfig;
use clap::{Parser, Subcommand};
use sigspan_core::{Frequency, Objective, SigspanError, Strategy};
use std::path::PathBuf;

pub use commands::*;
pub use sink::{JsonSink, TextSink};

// =============================================================================
// CLI STRUCTURE
// =============================================================================

/// sigspan - Significant Subgraph Mining
///
/// Canonical frequent subgraph search coupled to a multiple-testing
/// frequency threshold.
#[derive(Parser, Debug)]
#[command(name = "sigspan")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Enable verbose (debug) logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Suppress summaries, print results only
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Treat edges of text input as directed
    #[arg(short, long, global = true)]
    pub directed: bool,

    /// Output in JSON format (for programmatic access)
    #[arg(long, global = true)]
    pub json_mode: bool,

    /// Run configuration file (TOML)
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,
}

/// Available CLI commands.
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Show database statistics
    Info {
        /// Graph database (gSpan text or binary snapshot)
        #[arg(short, long)]
        input: PathBuf,
    },

    /// Report every pattern reaching the minimum support
    Mine {
        /// Graph database (gSpan text or binary snapshot)
        #[arg(short, long)]
        input: PathBuf,

        /// Minimum number of graphs a pattern must occur in
        #[arg(short = 's', long, default_value = "1")]
        min_support: Frequency,

        /// Smallest reported pattern, in vertices
        #[arg(long)]
        min_nodes: Option<usize>,

        /// Largest reported pattern, in vertices
        #[arg(long)]
        max_nodes: Option<usize>,

        /// Also list the ids of the graphs containing each pattern
        #[arg(short = 'w', long)]
        graph_ids: bool,

        /// Write patterns here instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Find the frequency threshold controlling the family-wise error rate
    Threshold {
        /// Graph database (gSpan text or binary snapshot)
        #[arg(short, long)]
        input: PathBuf,

        /// Search strategy (single-pass, decreasing-bound, early-termination, bisection)
        #[arg(short = 't', long)]
        strategy: Option<Strategy>,

        /// Target family-wise error rate
        #[arg(short, long)]
        alpha: Option<f64>,

        /// Graphs in the class of interest
        #[arg(long)]
        n1: Option<Frequency>,

        /// All other graphs
        #[arg(long)]
        n2: Option<Frequency>,

        /// Run every strategy instead of one
        #[arg(long)]
        all: bool,

        /// Also count testable patterns and report corrected levels
        #[arg(long)]
        summary: bool,
    },

    /// Rank patterns by supervised gain
    Boost {
        /// Graph database (gSpan text or binary snapshot)
        #[arg(short, long)]
        input: PathBuf,

        /// Per-graph class labels, one `1` or `-1` per line
        #[arg(short, long)]
        labels: Option<PathBuf>,

        /// Minimum number of graphs a pattern must occur in
        #[arg(short = 's', long, default_value = "1")]
        min_support: Frequency,

        /// Gain function (1.5-class, 2-class)
        #[arg(long)]
        objective: Option<Objective>,

        /// Number of patterns to keep
        #[arg(short = 'k', long)]
        top: Option<usize>,
    },

    /// Convert a text database into a binary snapshot
    Pack {
        /// gSpan text database
        #[arg(short, long)]
        input: PathBuf,

        /// Snapshot file to write
        #[arg(short, long)]
        output: PathBuf,
    },
}

// =============================================================================
// COMMAND EXECUTION
// =============================================================================

/// Options shared by every command.
#[derive(Debug, Clone, Copy)]
pub struct Globals {
    pub quiet: bool,
    pub directed: bool,
    pub json_mode: bool,
}

/// Execute the CLI with parsed arguments.
pub fn execute(cli: Cli) -> Result<(), SigspanError> {
    let mut config = match &cli.config {
        Some(path) => RunConfig::load(&validate_file_path(path)?)?,
        None => RunConfig::default(),
    };
    let globals = Globals {
        quiet: cli.quiet,
        directed: cli.directed,
        json_mode: cli.json_mode,
    };

    match cli.command {
        Commands::Info { input } => cmd_info(globals, &input),
        Commands::Mine {
            input,
            min_support,
            min_nodes,
            max_nodes,
            graph_ids,
            output,
        } => {
            if let Some(min) = min_nodes {
                config.limits.min_nodes = min;
            }
            if max_nodes.is_some() {
                config.limits.max_nodes = max_nodes;
            }
            config.validate()?;
            cmd_mine(
                globals,
                &input,
                min_support,
                config.limits,
                graph_ids,
                output.as_deref(),
            )
        }
        Commands::Threshold {
            input,
            strategy,
            alpha,
            n1,
            n2,
            all,
            summary,
        } => {
            // Flags override the file; the merged result is checked again.
            let testability = &mut config.testability;
            if let Some(strategy) = strategy {
                testability.strategy = strategy;
            }
            if let Some(alpha) = alpha {
                testability.alpha = alpha;
            }
            testability.n1 = n1.or(testability.n1);
            testability.n2 = n2.or(testability.n2);
            config.validate()?;

            let testability = &config.testability;
            let (n1, n2) = testability.class_sizes(&config.boost.labels)?;

            let strategies = if all {
                Strategy::ALL.to_vec()
            } else {
                vec![testability.strategy]
            };
            let request = ThresholdRequest {
                n1,
                n2,
                alpha: testability.alpha,
                strategies,
                summary,
            };
            cmd_threshold(globals, &input, config.limits, &request)
        }
        Commands::Boost {
            input,
            labels,
            min_support,
            objective,
            top,
        } => {
            let mut boost = config.boost;
            if let Some(objective) = objective {
                boost.objective = objective;
            }
            if let Some(top) = top {
                boost.max_ranked = top;
            }
            if let Some(path) = labels {
                boost.labels = read_labels(&path)?;
            }
            cmd_boost(globals, &input, min_support, config.limits, &boost)
        }
        Commands::Pack { input, output } => cmd_pack(globals, &input, &output),
    }
}
