//! Heterogeneous walk policy with a learned edge-type correlation matrix.
//!
//! Transition weights combine three factors: the learned correlation between
//! the arrival edge's type pair and the candidate's type pair, the
//! second-order p/q bias, and the raw edge weight. The matrix starts flat
//! (all 1.0) and is refit once per generation pass from the previous pass's
//! walks: per ordered edge-type pair, the Pearson correlation between
//! per-start-vertex count vectors, squashed through a bounded sigmoid into
//! (0, 1) and mirrored across the diagonal.
//!
//! An edge type is an ordered pair of vertex types:
//! `edge_type(t1, t2) = (t1-1) * type_count + (t2-1)`.

use super::{pq_bias, previous_vertex, PassAccumulator, State};
use crate::error::ConfigError;
use crate::storage::CsrGraph;
use rand::Rng;
use tracing::debug;

/// Computation range of the sigmoid lookup table; correlations map into
/// sigmoid(-6)..sigmoid(6).
const SIGMOID_BOUND: f64 = 6.0;
/// Table size; small enough to stay L1-resident.
const SIGMOID_TABLE_SIZE: usize = 1024;

/// Default number of generation passes.
const DEFAULT_PASSES: usize = 4;

/// Correlation-reweighted heterogeneous policy.
#[derive(Debug, Clone)]
pub struct HeterogeneousLearned {
    p: f32,
    q: f32,
    passes: usize,
    type_count: usize,
    /// Number of edge types (`type_count` squared); row stride of `matrix`
    edge_type_count: usize,
    /// Row-major `edge_type_count` x `edge_type_count`, all 1.0 before the
    /// first refit, symmetric after every refit
    matrix: Vec<f32>,
    sigmoid_table: Vec<f32>,
}

impl HeterogeneousLearned {
    /// Build the model with `DEFAULT_PASSES` generation passes.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::TypedGraphRequired`] when the graph carries no
    /// vertex types.
    pub fn new(graph: &CsrGraph, p: f32, q: f32) -> Result<Self, ConfigError> {
        Self::with_passes(graph, p, q, DEFAULT_PASSES)
    }

    /// Build the model with an explicit pass count.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] for an untyped graph or a zero pass count.
    pub fn with_passes(
        graph: &CsrGraph,
        p: f32,
        q: f32,
        passes: usize,
    ) -> Result<Self, ConfigError> {
        if !graph.is_typed() {
            return Err(ConfigError::TypedGraphRequired { model: "heterogeneous" });
        }
        if passes == 0 {
            return Err(ConfigError::ParameterOutOfRange {
                name: "passes",
                reason: "must be at least 1".to_owned(),
            });
        }

        let type_count = graph.type_count();
        let edge_type_count = type_count * type_count;
        Ok(Self {
            p,
            q,
            passes,
            type_count,
            edge_type_count,
            matrix: vec![1.0; edge_type_count * edge_type_count],
            sigmoid_table: build_sigmoid_table(),
        })
    }

    /// Ordered vertex-type pair to edge type (types are 1-based)
    fn edge_type(&self, t1: u32, t2: u32) -> usize {
        (t1 as usize - 1) * self.type_count + (t2 as usize - 1)
    }

    /// Matrix entry for (row, col) edge types
    fn correlation(&self, row: usize, col: usize) -> f32 {
        self.matrix[row * self.edge_type_count + col]
    }

    /// Bounded sigmoid via the lookup table; saturates outside +-6.
    fn bounded_sigmoid(&self, x: f64) -> f32 {
        if x <= -SIGMOID_BOUND {
            self.sigmoid_table[0]
        } else if x >= SIGMOID_BOUND {
            self.sigmoid_table[SIGMOID_TABLE_SIZE - 1]
        } else {
            #[allow(clippy::cast_sign_loss, clippy::cast_possible_truncation)]
            let index = ((x + SIGMOID_BOUND) / (2.0 * SIGMOID_BOUND)
                * (SIGMOID_TABLE_SIZE as f64)) as usize;
            self.sigmoid_table[index.min(SIGMOID_TABLE_SIZE - 1)]
        }
    }

    pub(crate) fn weight(&self, graph: &CsrGraph, state: State, candidate: usize) -> f32 {
        let cur = state.vertex;
        let prev = previous_vertex(graph, state);
        let next = graph.edge_target(candidate);

        let arrival = self.edge_type(graph.vertex_type(prev), graph.vertex_type(cur));
        let departure = self.edge_type(graph.vertex_type(cur), graph.vertex_type(next));

        self.correlation(arrival, departure)
            * pq_bias(graph, prev, next, self.p, self.q)
            * graph.weight(candidate)
    }

    pub(crate) fn next_state(&self, graph: &CsrGraph, _state: State, chosen: usize) -> State {
        State::new(graph.edge_target(chosen), graph.arrival_slot(chosen))
    }

    pub(crate) fn initial_state<R: Rng>(
        &self,
        graph: &CsrGraph,
        vertex: u32,
        rng: &mut R,
    ) -> Option<State> {
        let degree = graph.degree(vertex);
        if degree == 0 {
            return None;
        }
        Some(State::new(vertex, rng.random_range(0..degree)))
    }

    pub(crate) fn state_count(&self, graph: &CsrGraph, vertex: u32) -> usize {
        graph.degree(vertex)
    }

    /// Generation passes this model drives
    #[must_use]
    pub fn passes(&self) -> usize {
        self.passes
    }

    /// Number of edge types (matrix stride)
    #[must_use]
    pub fn edge_type_count(&self) -> usize {
        self.edge_type_count
    }

    /// Current correlation matrix, row-major
    #[must_use]
    pub fn correlation_matrix(&self) -> &[f32] {
        &self.matrix
    }

    /// Count the walk's edge-type occurrences and record them under its
    /// start vertex (a later walk from the same start replaces the counts).
    pub(crate) fn record_walk(&self, graph: &CsrGraph, walk: &[u32], acc: &mut PassAccumulator) {
        let Some(&start) = walk.first() else {
            return;
        };
        if walk.len() < 2 {
            return;
        }

        let mut counts = vec![0u32; self.edge_type_count].into_boxed_slice();
        for pair in walk.windows(2) {
            let et = self.edge_type(graph.vertex_type(pair[0]), graph.vertex_type(pair[1]));
            counts[et] += 1;
        }
        acc.record(start, counts);
    }

    /// Refit the correlation matrix from one pass's accumulated walks.
    ///
    /// For each ordered edge-type pair, the Pearson correlation between the
    /// per-vertex count vectors (vertices without a recorded walk count as
    /// zero) is squashed through the bounded sigmoid; pairs with zero mass
    /// or zero variance keep their previous entry. The result is mirrored
    /// across the diagonal so the matrix stays symmetric.
    pub(crate) fn end_pass(&mut self, graph: &CsrGraph, acc: &PassAccumulator) {
        let etn = self.edge_type_count;
        let n = graph.vertex_count() as i64;

        let mut flat_sum = vec![0i64; etn];
        let mut square_sum = vec![0i64; etn];
        let mut prod_sum = vec![0i64; etn * etn];

        for start in acc.starts() {
            // Walks are only recorded with counts, so this always resolves.
            let Some(counts) = acc.counts_for(start) else {
                continue;
            };
            for i in 0..etn {
                let ci = i64::from(counts[i]);
                flat_sum[i] += ci;
                square_sum[i] += ci * ci;
                for j in 0..=i {
                    prod_sum[i * etn + j] += ci * i64::from(counts[j]);
                }
            }
        }

        let mut refit = 0usize;
        for i in 0..etn {
            for j in 0..=i {
                if flat_sum[i] == 0 || flat_sum[j] == 0 {
                    continue;
                }
                let numerator = (n * prod_sum[i * etn + j] - flat_sum[i] * flat_sum[j]) as f64;
                let var_i = (n * square_sum[i] - flat_sum[i] * flat_sum[i]) as f64;
                let var_j = (n * square_sum[j] - flat_sum[j] * flat_sum[j]) as f64;
                let denominator = (var_i * var_j).sqrt();
                if denominator.is_nan() || denominator <= 0.0 {
                    continue;
                }
                self.matrix[i * etn + j] = self.bounded_sigmoid(numerator / denominator);
                refit += 1;
            }
        }

        // Symmetric completion: the lower triangle holds the fresh values.
        for i in 0..etn {
            for j in 0..i {
                self.matrix[j * etn + i] = self.matrix[i * etn + j];
            }
        }

        debug!(edge_types = etn, refit, "correlation matrix recomputed");
    }
}

fn build_sigmoid_table() -> Vec<f32> {
    (0..SIGMOID_TABLE_SIZE)
        .map(|k| {
            let x = (k as f64 / SIGMOID_TABLE_SIZE as f64) * 2.0 * SIGMOID_BOUND - SIGMOID_BOUND;
            #[allow(clippy::cast_possible_truncation)]
            let y = (1.0 / (1.0 + (-x).exp())) as f32;
            y
        })
        .collect()
}
