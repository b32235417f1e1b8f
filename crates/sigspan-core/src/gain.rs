//! # Gain Oracle
//!
//! Supervised scoring for LPBoost-style pattern selection.
//!
//! Every graph carries a weight `w` and a class label `l ∈ {-1, +1}`. A
//! pattern paired with a sign `y` is a weak classifier; its gain measures
//! how well it agrees with the weighted labels:
//!
//! - *1.5-class*: `Σ_{containing} w·l·y`
//! - *2-class*: `Σ_{containing} w·l·y − Σ_{not containing} w·l·y`
//!
//! The bound caps the gain any supergraph of the pattern can reach, which is
//! what lets the engine cut whole subtrees.

use crate::code::DfsCode;
use crate::graph::LabeledGraph;
use crate::{Frequency, GraphId, SigspanError};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

// =============================================================================
// CONFIGURATION
// =============================================================================

/// Which gain function a supervised run optimizes.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum Objective {
    /// Only graphs containing the pattern contribute.
    #[default]
    #[serde(rename = "1.5-class")]
    OneAndHalfClass,
    /// Graphs lacking the pattern contribute with the opposite sign.
    #[serde(rename = "2-class")]
    TwoClass,
}

impl fmt::Display for Objective {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::OneAndHalfClass => write!(f, "1.5-class"),
            Self::TwoClass => write!(f, "2-class"),
        }
    }
}

impl FromStr for Objective {
    type Err = SigspanError;

    fn from_str(s: &str) -> Result<Self, SigspanError> {
        match s {
            "1.5-class" | "1.5" => Ok(Self::OneAndHalfClass),
            "2-class" | "2" => Ok(Self::TwoClass),
            other => Err(SigspanError::InvalidConfig(format!(
                "unknown objective '{}' (expected 1.5-class or 2-class)",
                other
            ))),
        }
    }
}

/// Parameters of a supervised run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BoostConfig {
    pub objective: Objective,
    /// Size of the ranked result set. Must be at least 1.
    pub max_ranked: usize,
    /// Starting pruning threshold.
    pub initial_gain_bound: f64,
    /// Cut off the search after this many patterns were examined. 0 disables.
    pub max_patterns_examined: usize,
    /// Class label per graph, `-1` or `+1`.
    pub labels: Vec<i8>,
    /// Weight per graph. Uniform `1/n` when absent.
    pub weights: Option<Vec<f64>>,
}

impl Default for BoostConfig {
    fn default() -> Self {
        Self {
            objective: Objective::default(),
            max_ranked: 1,
            initial_gain_bound: 0.0,
            max_patterns_examined: 0,
            labels: Vec::new(),
            weights: None,
        }
    }
}

impl BoostConfig {
    /// Check the configuration against a database of `graphs` graphs.
    pub fn validate(&self, graphs: usize) -> Result<(), SigspanError> {
        if self.max_ranked == 0 {
            return Err(SigspanError::InvalidConfig(
                "max_ranked must be at least 1".to_string(),
            ));
        }
        if !self.initial_gain_bound.is_finite() {
            return Err(SigspanError::InvalidConfig(
                "initial_gain_bound must be finite".to_string(),
            ));
        }
        if self.labels.len() != graphs {
            return Err(SigspanError::InvalidConfig(format!(
                "{} labels for {} graphs",
                self.labels.len(),
                graphs
            )));
        }
        if let Some(pos) = self.labels.iter().position(|&l| l != 1 && l != -1) {
            return Err(SigspanError::InvalidConfig(format!(
                "label of graph {} is {} (expected -1 or +1)",
                pos, self.labels[pos]
            )));
        }
        if let Some(weights) = &self.weights {
            if weights.len() != graphs {
                return Err(SigspanError::InvalidConfig(format!(
                    "{} weights for {} graphs",
                    weights.len(),
                    graphs
                )));
            }
            if weights.iter().any(|w| !w.is_finite() || *w < 0.0) {
                return Err(SigspanError::InvalidConfig(
                    "weights must be finite and non-negative".to_string(),
                ));
            }
        }
        Ok(())
    }
}

// =============================================================================
// ORACLE
// =============================================================================

/// Gain and gain-bound evaluation for one run.
///
/// Occurrence lists are passed as the ascending, distinct graph ids a
/// pattern occurs in.
#[derive(Debug, Clone)]
pub struct GainOracle {
    objective: Objective,
    labels: Vec<f64>,
    weights: Vec<f64>,
    /// `Σ w·l` over the whole database.
    balance: f64,
}

impl GainOracle {
    /// Validate `config` and precompute the per-run weight balance.
    pub fn new(config: &BoostConfig, graphs: usize) -> Result<Self, SigspanError> {
        config.validate(graphs)?;

        let labels: Vec<f64> = config.labels.iter().map(|&l| f64::from(l)).collect();
        let weights = match &config.weights {
            Some(w) => w.clone(),
            None => vec![1.0 / graphs.max(1) as f64; graphs],
        };
        let balance = labels.iter().zip(&weights).map(|(l, w)| l * w).sum();

        Ok(Self {
            objective: config.objective,
            labels,
            weights,
            balance,
        })
    }

    #[must_use]
    pub fn objective(&self) -> Objective {
        self.objective
    }

    /// Gain of the classifier `(pattern, y)`.
    #[must_use]
    pub fn gain(&self, graph_ids: &[GraphId], y: f64) -> f64 {
        let term = |g: GraphId| self.labels[g] * self.weights[g] * y;

        match self.objective {
            Objective::OneAndHalfClass => graph_ids.iter().map(|&g| term(g)).sum(),
            Objective::TwoClass => {
                let mut gain = 0.0;
                let mut next = 0;
                for &g in graph_ids {
                    for skipped in next..g {
                        gain -= term(skipped);
                    }
                    gain += term(g);
                    next = g + 1;
                }
                for skipped in next..self.labels.len() {
                    gain -= term(skipped);
                }
                gain
            }
        }
    }

    /// The better of `y = +1` and (2-class only) `y = -1`. Ties favour `+1`.
    #[must_use]
    pub fn best_gain(&self, graph_ids: &[GraphId]) -> (f64, i8) {
        let positive = self.gain(graph_ids, 1.0);
        match self.objective {
            Objective::OneAndHalfClass => (positive, 1),
            Objective::TwoClass => {
                let negative = self.gain(graph_ids, -1.0);
                if positive >= negative {
                    (positive, 1)
                } else {
                    (negative, -1)
                }
            }
        }
    }

    /// Upper bound on the gain of any supergraph of the pattern.
    #[must_use]
    pub fn bound(&self, graph_ids: &[GraphId]) -> f64 {
        let (mut positive, mut negative) = (0.0, 0.0);
        for &g in graph_ids {
            if self.labels[g] > 0.0 {
                positive += self.weights[g];
            } else {
                negative += self.weights[g];
            }
        }

        match self.objective {
            Objective::OneAndHalfClass => positive,
            Objective::TwoClass => {
                (2.0 * negative + self.balance).max(2.0 * positive - self.balance)
            }
        }
    }
}

// =============================================================================
// RANKED RESULT SET
// =============================================================================

/// One entry of the top-K set.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RankedPattern {
    pub gain: f64,
    /// Sign of the weak classifier, `+1` or `-1`.
    pub y: i8,
    pub support: Frequency,
    pub code: DfsCode,
    pub graph: LabeledGraph,
    /// Embeddings of the pattern per graph id.
    pub counts: BTreeMap<GraphId, u32>,
}

/// Top-K patterns by gain, best first.
///
/// Once K entries are held, the K-th gain is the pruning threshold `tau`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RankedPatterns {
    entries: Vec<RankedPattern>,
    capacity: usize,
    tau: f64,
}

impl RankedPatterns {
    /// An empty set holding at most `capacity` entries, starting from
    /// threshold `tau`.
    #[must_use]
    pub fn new(capacity: usize, tau: f64) -> Self {
        Self {
            entries: Vec::with_capacity(capacity.saturating_add(1)),
            capacity,
            tau,
        }
    }

    /// Current pruning threshold.
    #[must_use]
    pub fn tau(&self) -> f64 {
        self.tau
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Entries, best first.
    #[must_use]
    pub fn entries(&self) -> &[RankedPattern] {
        &self.entries
    }

    #[must_use]
    pub fn into_entries(self) -> Vec<RankedPattern> {
        self.entries
    }

    /// Insert ahead of the first entry with a gain not above the new one,
    /// then evict the worst entry if over capacity.
    pub(crate) fn insert(&mut self, entry: RankedPattern) {
        let at = self
            .entries
            .iter()
            .position(|e| entry.gain >= e.gain)
            .unwrap_or(self.entries.len());
        self.entries.insert(at, entry);

        if self.entries.len() > self.capacity {
            self.entries.pop();
        }
    }

    /// Raise `tau` to the worst held gain once the set is full.
    pub(crate) fn tighten(&mut self) {
        if self.entries.len() >= self.capacity
            && let Some(last) = self.entries.last()
        {
            self.tau = last.gain;
        }
    }
}

// =============================================================================
// TESTS
// =============================================================================
