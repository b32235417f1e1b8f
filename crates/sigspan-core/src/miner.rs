//! # Pattern Growth Engine
//!
//! Depth-first canonical pattern growth over a [`GraphDatabase`].
//!
//! A run first reports frequent single vertex labels, then grows every
//! frequent root edge along its right-most path. At each node:
//!
//! 1. support (distinct graphs) below the minimum prunes the node
//! 2. a non-canonical code prunes the node
//! 3. the pattern is accepted according to the run mode
//! 4. in supervised runs the gain bound may cut the extensions
//! 5. one-edge extensions are grouped and explored in code order
//!
//! ## Run Modes
//!
//! | Entry point | Mode |
//! |---|---|
//! | [`Miner::run`] / [`Miner::run_with_sink`] | enumerate every frequent pattern |
//! | [`Miner::run_with_budget`] | stop the whole search once `count × min_p_value > alpha` |
//! | [`Miner::run_supervised`] | keep the top-K patterns by gain, prune by gain bound |
//!
//! All per-run state lives in a private context, so one `Miner` serves any
//! number of runs.

use crate::canonical::CanonicalChecker;
use crate::code::{DfsCode, DfsTuple};
use crate::embedding::{Embedding, EmbeddingArena, EmbeddingId, History};
use crate::extension;
use crate::gain::{BoostConfig, GainOracle, RankedPattern, RankedPatterns};
use crate::graph::{GraphDatabase, LabeledGraph};
use crate::primitives::GAIN_TOLERANCE;
use crate::{Frequency, GraphId, Label, Pattern, PatternSink, SigspanError, VertexId};
use serde::{Deserialize, Serialize};
use std::cmp::Reverse;
use std::collections::BTreeMap;

// =============================================================================
// CONFIGURATION
// =============================================================================

/// Pattern size limits, in vertices.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MinerConfig {
    /// Smaller patterns are grown but not reported. Single vertex patterns
    /// are only considered when this is at most 1.
    pub min_nodes: usize,
    /// Larger patterns are neither reported nor extended. Only active when
    /// greater than `min_nodes`.
    pub max_nodes: Option<usize>,
}

impl MinerConfig {
    fn too_large(&self, node_count: usize) -> bool {
        self.max_nodes
            .is_some_and(|max| max > self.min_nodes && node_count > max)
    }

    fn admits(&self, node_count: usize) -> bool {
        node_count >= self.min_nodes && !self.too_large(node_count)
    }
}

// =============================================================================
// MINER
// =============================================================================

/// The growth engine, bound to one immutable database.
#[derive(Debug, Clone, Copy)]
pub struct Miner<'db> {
    db: &'db GraphDatabase,
    config: MinerConfig,
}

impl<'db> Miner<'db> {
    /// A miner with no size limits.
    #[must_use]
    pub fn new(db: &'db GraphDatabase) -> Self {
        Self::with_config(db, MinerConfig::default())
    }

    #[must_use]
    pub fn with_config(db: &'db GraphDatabase, config: MinerConfig) -> Self {
        Self { db, config }
    }

    #[must_use]
    pub fn database(&self) -> &'db GraphDatabase {
        self.db
    }

    #[must_use]
    pub fn config(&self) -> MinerConfig {
        self.config
    }

    /// Supports of every frequent canonical pattern, in discovery order.
    #[must_use]
    pub fn run(&self, min_support: Frequency) -> Vec<Frequency> {
        let mut ctx = RunContext::new(self, min_support, RunMode::Enumerate { sink: None });
        ctx.mine();
        ctx.out.supports
    }

    /// Like [`run`](Self::run), but the whole search stops as soon as the
    /// number of reported patterns times `min_p_value` exceeds `alpha`.
    #[must_use]
    pub fn run_with_budget(
        &self,
        min_support: Frequency,
        min_p_value: f64,
        alpha: f64,
    ) -> Vec<Frequency> {
        let mode = RunMode::Budgeted { min_p_value, alpha };
        let mut ctx = RunContext::new(self, min_support, mode);
        ctx.mine();
        ctx.out.supports
    }

    /// Like [`run`](Self::run), also handing every accepted pattern to
    /// `sink`. The first sink error stops the run and is returned.
    pub fn run_with_sink(
        &self,
        min_support: Frequency,
        sink: &mut dyn PatternSink,
    ) -> Result<Vec<Frequency>, SigspanError> {
        let mut ctx = RunContext::new(self, min_support, RunMode::Enumerate { sink: Some(sink) });
        ctx.mine();
        match ctx.out.failure {
            Some(err) => Err(err),
            None => Ok(ctx.out.supports),
        }
    }

    /// Top patterns by gain under the supervised objective in `config`.
    pub fn run_supervised(
        &self,
        min_support: Frequency,
        config: &BoostConfig,
    ) -> Result<RankedPatterns, SigspanError> {
        let mut supervision = Supervision {
            oracle: GainOracle::new(config, self.db.len())?,
            ranked: RankedPatterns::new(config.max_ranked, config.initial_gain_bound),
            examined: 0,
            max_examined: config.max_patterns_examined,
        };

        RunContext::new(self, min_support, RunMode::Supervised(&mut supervision)).mine();

        tracing::debug!(
            examined = supervision.examined,
            ranked = supervision.ranked.len(),
            tau = supervision.ranked.tau(),
            "supervised ranking complete"
        );
        Ok(supervision.ranked)
    }
}

// =============================================================================
// RUN CONTEXT
// =============================================================================

enum RunMode<'run> {
    Enumerate {
        sink: Option<&'run mut dyn PatternSink>,
    },
    Budgeted {
        min_p_value: f64,
        alpha: f64,
    },
    Supervised(&'run mut Supervision),
}

/// State of a supervised run, owned by the caller so the ranking outlives
/// the run context.
struct Supervision {
    oracle: GainOracle,
    ranked: RankedPatterns,
    /// Multi-vertex patterns seen so far.
    examined: usize,
    max_examined: usize,
}

/// The pattern an accepted report describes.
#[derive(Clone, Copy)]
enum Shape<'a> {
    Vertex(Label),
    Code(&'a DfsCode),
}

impl Shape<'_> {
    fn node_count(&self) -> usize {
        match self {
            Self::Vertex(_) => 1,
            Self::Code(code) => code.node_count(),
        }
    }

    fn code(&self) -> DfsCode {
        match self {
            Self::Vertex(_) => DfsCode::new(),
            Self::Code(code) => (*code).clone(),
        }
    }

    fn graph(&self, directed: bool) -> LabeledGraph {
        match self {
            Self::Vertex(label) => LabeledGraph::single_vertex(*label, directed),
            Self::Code(code) => code.to_graph(directed),
        }
    }
}

/// A frequent canonical pattern handed to the run mode.
struct Accepted<'a> {
    support: Frequency,
    graph_ids: &'a [GraphId],
    /// Embeddings per graph. Only filled in supervised runs.
    counts: BTreeMap<GraphId, u32>,
    shape: Shape<'a>,
}

/// Everything a run produces, kept apart from the growth state so the
/// current code can be borrowed while reporting.
struct Outcome<'run> {
    config: MinerConfig,
    directed: bool,
    supports: Vec<Frequency>,
    next_id: usize,
    halted: bool,
    failure: Option<SigspanError>,
    mode: RunMode<'run>,
}

impl Outcome<'_> {
    fn accept(&mut self, pattern: Accepted<'_>) {
        let admitted = self.config.admits(pattern.shape.node_count());

        match &mut self.mode {
            RunMode::Enumerate { sink } => {
                if !admitted {
                    return;
                }
                self.supports.push(pattern.support);
                if let Some(sink) = sink {
                    let report = Pattern {
                        id: self.next_id,
                        support: pattern.support,
                        code: pattern.shape.code(),
                        graph: pattern.shape.graph(self.directed),
                        graph_ids: pattern.graph_ids.to_vec(),
                    };
                    if let Err(err) = sink.report(&report) {
                        self.failure = Some(err);
                        self.halted = true;
                    }
                }
                self.next_id += 1;
            }
            RunMode::Budgeted { min_p_value, alpha } => {
                if !admitted {
                    return;
                }
                self.supports.push(pattern.support);
                self.next_id += 1;
                if self.supports.len() as f64 * *min_p_value > *alpha {
                    self.halted = true;
                }
            }
            RunMode::Supervised(supervision) => {
                let (gain, y) = supervision.oracle.best_gain(pattern.graph_ids);
                if gain > supervision.ranked.tau() {
                    if admitted {
                        supervision.ranked.insert(RankedPattern {
                            gain,
                            y,
                            support: pattern.support,
                            code: pattern.shape.code(),
                            graph: pattern.shape.graph(self.directed),
                            counts: pattern.counts,
                        });
                        self.next_id += 1;
                    }
                    supervision.ranked.tighten();
                }
                if let Shape::Code(_) = pattern.shape {
                    supervision.examined += 1;
                }
            }
        }
    }

    /// Whether the examined-pattern cap of a supervised run is exhausted.
    fn over_examined(&self) -> bool {
        match &self.mode {
            RunMode::Supervised(supervision) => {
                supervision.max_examined > 0 && supervision.examined > supervision.max_examined
            }
            _ => false,
        }
    }

    /// Whether no extension of a pattern occurring in `graph_ids` can enter
    /// the ranked set.
    fn bound_prunes(&self, graph_ids: &[GraphId]) -> bool {
        match &self.mode {
            RunMode::Supervised(supervision) => {
                supervision.oracle.bound(graph_ids) <= supervision.ranked.tau() + GAIN_TOLERANCE
            }
            _ => false,
        }
    }
}

struct RunContext<'db, 'run> {
    db: &'db GraphDatabase,
    min_support: Frequency,
    code: DfsCode,
    arena: EmbeddingArena,
    history: History,
    checker: CanonicalChecker,
    out: Outcome<'run>,
}

impl<'db, 'run> RunContext<'db, 'run> {
    fn new(miner: &Miner<'db>, min_support: Frequency, mode: RunMode<'run>) -> Self {
        Self {
            db: miner.db,
            min_support,
            code: DfsCode::new(),
            arena: EmbeddingArena::new(),
            history: History::new(),
            checker: CanonicalChecker::new(),
            out: Outcome {
                config: miner.config,
                directed: miner.db.is_directed(),
                supports: Vec::new(),
                next_id: 0,
                halted: false,
                failure: None,
                mode,
            },
        }
    }

    fn mine(&mut self) {
        tracing::debug!(
            min_support = self.min_support,
            graphs = self.db.len(),
            "run started"
        );

        if self.out.config.min_nodes <= 1 {
            self.mine_single_vertices();
        }

        let db = self.db;
        let mut roots: BTreeMap<(Label, Label, Label), Vec<EmbeddingId>> = BTreeMap::new();
        for (graph_id, graph) in db.graphs().enumerate() {
            for vertex in graph.vertices() {
                for edge in extension::forward_root(graph, vertex) {
                    let id = self.arena.push(Embedding {
                        graph_id,
                        edge: *edge,
                        parent: None,
                    });
                    roots
                        .entry((vertex.label, edge.label, graph.label(edge.to)))
                        .or_default()
                        .push(id);
                }
            }
        }

        for ((from_label, edge_label, to_label), projected) in roots {
            if self.out.halted {
                break;
            }
            self.code
                .push(DfsTuple::root(from_label, edge_label, to_label));
            self.project(&projected);
            self.code.pop();
        }

        tracing::debug!(
            min_support = self.min_support,
            reported = self.out.next_id,
            halted = self.out.halted,
            "run finished"
        );
    }

    /// Vertex labels in ascending order, supported by the number of graphs
    /// containing them.
    fn mine_single_vertices(&mut self) {
        let mut per_label: BTreeMap<Label, BTreeMap<GraphId, u32>> = BTreeMap::new();
        for (graph_id, graph) in self.db.graphs().enumerate() {
            for vertex in graph.vertices() {
                *per_label
                    .entry(vertex.label)
                    .or_default()
                    .entry(graph_id)
                    .or_insert(0) += 1;
            }
        }

        for (label, counts) in per_label {
            if self.out.halted {
                break;
            }
            let support = counts.len() as Frequency;
            if support < self.min_support {
                continue;
            }
            let graph_ids: Vec<GraphId> = counts.keys().copied().collect();
            self.out.accept(Accepted {
                support,
                graph_ids: &graph_ids,
                counts,
                shape: Shape::Vertex(label),
            });
        }
    }

    fn project(&mut self, projected: &[EmbeddingId]) {
        if self.out.halted || self.out.over_examined() {
            return;
        }

        let graph_ids = self.graph_ids(projected);
        let support = graph_ids.len() as Frequency;
        if support < self.min_support {
            return;
        }
        if !self.checker.is_min(&self.code, self.out.directed) {
            return;
        }

        let counts = self.embedding_counts(projected);
        self.out.accept(Accepted {
            support,
            graph_ids: &graph_ids,
            counts,
            shape: Shape::Code(&self.code),
        });
        if self.out.halted
            || self.out.config.too_large(self.code.node_count())
            || self.out.bound_prunes(&graph_ids)
        {
            return;
        }

        let mark = self.arena.len();
        self.extend(projected);
        self.arena.truncate(mark);
    }

    /// Enumerate one-edge extensions of every embedding in `projected` and
    /// recurse into each group in code order.
    fn extend(&mut self, projected: &[EmbeddingId]) {
        let rmpath = self.code.rightmost_path();
        let (Some(&deepest), Some(min_label)) = (rmpath.first(), self.code.root_label()) else {
            return;
        };
        let maxtoc = self.code[deepest].to;
        let db = self.db;

        let mut backward: BTreeMap<(VertexId, Label), Vec<EmbeddingId>> = BTreeMap::new();
        let mut forward: BTreeMap<(Reverse<VertexId>, Label, Label), Vec<EmbeddingId>> =
            BTreeMap::new();

        for &id in projected {
            let graph_id = self.arena[id].graph_id;
            let graph = &db[graph_id];
            self.history.build(graph, &self.arena, id);

            // Backward, from the root-most right-most-path vertex down.
            for &pos in rmpath.iter().skip(1).rev() {
                if let Some(edge) = extension::backward(
                    graph,
                    &self.history[pos],
                    &self.history[deepest],
                    &self.history,
                ) {
                    let child = self.arena.push(Embedding {
                        graph_id,
                        edge,
                        parent: Some(id),
                    });
                    backward
                        .entry((self.code[pos].from, edge.label))
                        .or_default()
                        .push(child);
                }
            }

            for edge in
                extension::forward_pure(graph, &self.history[deepest], min_label, &self.history)
            {
                let child = self.arena.push(Embedding {
                    graph_id,
                    edge: *edge,
                    parent: Some(id),
                });
                forward
                    .entry((Reverse(maxtoc), edge.label, graph.label(edge.to)))
                    .or_default()
                    .push(child);
            }

            for &pos in &rmpath {
                for edge in
                    extension::forward_rmpath(graph, &self.history[pos], min_label, &self.history)
                {
                    let child = self.arena.push(Embedding {
                        graph_id,
                        edge: *edge,
                        parent: Some(id),
                    });
                    forward
                        .entry((Reverse(self.code[pos].from), edge.label, graph.label(edge.to)))
                        .or_default()
                        .push(child);
                }
            }
        }

        for ((to, edge_label), children) in backward {
            if self.out.halted {
                return;
            }
            self.code.push(DfsTuple::backward(maxtoc, to, edge_label));
            self.project(&children);
            self.code.pop();
        }

        for ((Reverse(from), edge_label, to_label), children) in forward {
            if self.out.halted {
                return;
            }
            self.code
                .push(DfsTuple::forward(from, maxtoc + 1, edge_label, to_label));
            self.project(&children);
            self.code.pop();
        }
    }

    /// Distinct graph ids of an occurrence list, which is ordered by graph.
    fn graph_ids(&self, projected: &[EmbeddingId]) -> Vec<GraphId> {
        let mut ids: Vec<GraphId> = Vec::new();
        for &id in projected {
            let graph_id = self.arena[id].graph_id;
            if ids.last() != Some(&graph_id) {
                ids.push(graph_id);
            }
        }
        ids
    }

    fn embedding_counts(&self, projected: &[EmbeddingId]) -> BTreeMap<GraphId, u32> {
        let mut counts = BTreeMap::new();
        if matches!(self.out.mode, RunMode::Supervised(_)) {
            for &id in projected {
                *counts.entry(self.arena[id].graph_id).or_insert(0) += 1;
            }
        }
        counts
    }
}

// =============================================================================
// TESTS
// =============================================================================
