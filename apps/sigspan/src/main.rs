//! # sigspan - Significant Subgraph Mining
//!
//! The main binary for the sigspan workspace.
//!
//! ## Architecture
//!
//! ```text
//! ┌───────────────────────────────────────────────────────────┐
//! │                  apps/sigspan (THE BINARY)                │
//! │                                                           │
//! │  ┌─────────────┐   ┌──────────────┐   ┌───────────────┐   │
//! │  │    CLI      │   │  Run Config  │   │ Pattern Sinks │   │
//! │  │   (clap)    │   │   (toml)     │   │ (text / json) │   │
//! │  └──────┬──────┘   └──────┬───────┘   └───────┬───────┘   │
//! │         └─────────────────┼───────────────────┘           │
//! │                           ▼                               │
//! │                   ┌───────────────┐                       │
//! │                   │ sigspan-core  │                       │
//! │                   │  (THE LOGIC)  │                       │
//! │                   └───────────────┘                       │
//! └───────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//!
//! ```bash
//! # Frequent patterns in gSpan text format
//! sigspan mine -i graphs.txt -s 10
//!
//! # Tarone threshold for 15 positives and 44 negatives
//! sigspan threshold -i graphs.txt --n1 15 --n2 44 --strategy early-termination
//!
//! # Top 5 discriminative patterns
//! sigspan boost -i graphs.txt -l labels.txt -k 5
//! ```

use clap::Parser;
use sigspan::cli;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

// =============================================================================
// APPLICATION ENTRY POINT
// =============================================================================

fn main() {
    // SIGSPAN_LOG_FORMAT=json enables machine-parseable output.
    let log_format = std::env::var("SIGSPAN_LOG_FORMAT").unwrap_or_else(|_| "text".to_string());

    let cli = cli::Cli::parse();

    let default_filter = if cli.verbose {
        "sigspan=debug,sigspan_core=debug"
    } else {
        "sigspan=info,sigspan_core=info"
    };
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| default_filter.into());

    // Logs go to stderr so pattern output on stdout stays parseable.
    match log_format.as_str() {
        "json" => {
            tracing_subscriber::registry()
                .with(filter)
                .with(
                    tracing_subscriber::fmt::layer()
                        .json()
                        .with_writer(std::io::stderr),
                )
                .init();
        }
        _ => {
            tracing_subscriber::registry()
                .with(filter)
                .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
                .init();
        }
    }

    if let Err(e) = cli::execute(cli) {
        tracing::error!("Error: {}", e);
        std::process::exit(1);
    }
}
